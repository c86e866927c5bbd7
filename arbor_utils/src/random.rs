use rand::Rng;

use crate::cumsum;

/// Draw an index from a vector of non-negative weights. The weights need not
/// be normalized.
///
/// # Example
///
/// ```rust
/// # use arbor_utils::pflip;
/// let mut rng = rand::thread_rng();
/// let ix = pflip(&[0.0, 1.0, 0.0], &mut rng);
/// assert_eq!(ix, 1);
/// ```
pub fn pflip<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    assert!(!weights.is_empty(), "Empty container");

    let ws: Vec<f64> = cumsum(weights);
    let scale: f64 = ws[ws.len() - 1];
    let r = rng.gen::<f64>() * scale;

    match ws.iter().position(|&w| w > r) {
        Some(ix) => ix,
        // r landed exactly on the scale because of round-off; pick the last
        // entry that carries mass
        None => weights.iter().rposition(|&w| w > 0.0).unwrap_or(0),
    }
}
