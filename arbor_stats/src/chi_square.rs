//! Chi-squared distribution and goodness of fit
use special::Gamma;

/// CDF of the chi-squared distribution with `k` degrees of freedom
pub fn chi_square_cdf(x: f64, k: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        (x / 2.0).inc_gamma(k / 2.0)
    }
}

/// Chi-square goodness of fit test comparing the observed (sample) frequencies
/// in `freq_obs` with the expected (true) frequencies, `freq_exp`. Returns the
/// statistic and the p-value.
pub fn chi_square_test(freq_obs: &[f64], freq_exp: &[f64]) -> (f64, f64) {
    assert_eq!(freq_obs.len(), freq_exp.len());
    let stat: f64 =
        freq_obs
            .iter()
            .zip(freq_exp.iter())
            .fold(0.0, |acc, (o, e)| {
                let diff = o - e;
                acc + diff * diff / e
            });

    let k = freq_obs.len() - 1;
    let p = 1.0 - chi_square_cdf(stat, k as f64);

    (stat, p)
}
