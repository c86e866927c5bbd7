/// Render rows under a header, right-aligning every cell to its column's
/// widest entry
///
/// Widths count chars, so wide unicode glyphs will misalign.
pub fn format_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> =
        header.iter().map(|cell| cell.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: Vec<String>| {
        for (cell, &width) in cells.iter().zip(widths.iter()) {
            out.push_str(&format!("  {cell:>width$}"));
        }
        out.push('\n');
    };

    push_line(header.to_vec());
    push_line(widths.iter().map(|&w| "-".repeat(w)).collect());
    rows.iter().for_each(|row| push_line(row.clone()));
    out
}

pub fn print_table(header: &[String], rows: &[Vec<String>]) {
    print!("{}", format_table(header, rows));
}
