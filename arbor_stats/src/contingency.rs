use crate::chi_square::chi_square_cdf;

/// Joint counts of two discrete variables
#[derive(Clone, Debug, PartialEq)]
pub struct ContingencyTable {
    n_rows: usize,
    n_cols: usize,
    counts: Vec<usize>,
    total: usize,
}

impl ContingencyTable {
    /// Count the pairs in `codes`. The first of each pair must be less than
    /// `n_rows` and the second less than `n_cols`.
    pub fn new<I>(n_rows: usize, n_cols: usize, codes: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut counts = vec![0; n_rows * n_cols];
        let mut total = 0;
        codes.into_iter().for_each(|(a, b)| {
            counts[a * n_cols + b] += 1;
            total += 1;
        });
        ContingencyTable {
            n_rows,
            n_cols,
            counts,
            total,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn get(&self, a: usize, b: usize) -> usize {
        self.counts[a * self.n_cols + b]
    }

    pub fn row_totals(&self) -> Vec<usize> {
        (0..self.n_rows)
            .map(|a| (0..self.n_cols).map(|b| self.get(a, b)).sum())
            .collect()
    }

    pub fn col_totals(&self) -> Vec<usize> {
        (0..self.n_cols)
            .map(|b| (0..self.n_rows).map(|a| self.get(a, b)).sum())
            .collect()
    }

    /// Pearson's chi-square statistic for independence along with the number
    /// of occupied rows and columns. Empty rows and columns are ignored.
    pub fn chi_square(&self) -> (f64, usize, usize) {
        let row_totals = self.row_totals();
        let col_totals = self.col_totals();
        let occupied_rows = row_totals.iter().filter(|&&n| n > 0).count();
        let occupied_cols = col_totals.iter().filter(|&&n| n > 0).count();

        if self.total == 0 {
            return (0.0, occupied_rows, occupied_cols);
        }

        let n = self.total as f64;
        let mut stat = 0.0;
        for (a, &ra) in row_totals.iter().enumerate().filter(|(_, &r)| r > 0) {
            for (b, &cb) in
                col_totals.iter().enumerate().filter(|(_, &c)| c > 0)
            {
                let expected = (ra as f64) * (cb as f64) / n;
                let diff = self.get(a, b) as f64 - expected;
                stat += diff * diff / expected;
            }
        }
        (stat, occupied_rows, occupied_cols)
    }

    /// Cramér's V, in [0, 1]. Zero if either variable takes a single value.
    pub fn cramers_v(&self) -> f64 {
        let (stat, r, c) = self.chi_square();
        let m = r.min(c);
        if m < 2 {
            0.0
        } else {
            (stat / (self.total as f64 * (m - 1) as f64))
                .sqrt()
                .clamp(0.0, 1.0)
        }
    }

    /// The p-value of the chi-square test of independence. One if either
    /// variable takes a single value.
    pub fn independence_p_value(&self) -> f64 {
        let (stat, r, c) = self.chi_square();
        if r < 2 || c < 2 {
            1.0
        } else {
            let dof = ((r - 1) * (c - 1)) as f64;
            1.0 - chi_square_cdf(stat, dof)
        }
    }
}
