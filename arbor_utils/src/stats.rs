//! Summary statistics over streams of `f64`

/// The mean of the values. Returns zero for an empty iterator.
pub fn mean<I: IntoIterator<Item = f64>>(xs: I) -> f64 {
    let (n, sum) = xs
        .into_iter()
        .fold((0_usize, 0.0_f64), |(n, acc), x| (n + 1, acc + x));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// The median of the values. Sorts `xs` in place. `None` if `xs` is empty.
///
/// # Example
///
/// ```
/// # use arbor_utils::stats::median;
/// assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
/// assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
/// ```
pub fn median(xs: &mut [f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = xs.len();
    if n % 2 == 0 {
        Some((xs[n / 2 - 1] + xs[n / 2]) / 2.0)
    } else {
        Some(xs[n / 2])
    }
}

/// Online mean and sum of squared deviations (Welford)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    n: usize,
    mean: f64,
    sse: f64,
}

impl Moments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I: IntoIterator<Item = f64>>(xs: I) -> Self {
        let mut moments = Self::new();
        xs.into_iter().for_each(|x| moments.observe(x));
        moments
    }

    /// Add one value. The mean stays finite for any finite inputs; the sum
    /// of squared deviations saturates to infinity once it exceeds `f64`.
    #[inline]
    pub fn observe(&mut self, x: f64) {
        self.n += 1;
        let n = self.n as f64;
        let prev = self.mean;
        self.mean += x / n - prev / n;
        self.sse = (x - prev).mul_add(x - self.mean, self.sse);
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the mean
    #[inline]
    pub fn sse(&self) -> f64 {
        self.sse
    }

    /// Population variance. Zero if there are no observations.
    pub fn var_population(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sse / self.n as f64
        }
    }

    /// Unbiased sample variance. `None` with fewer than two observations.
    pub fn var_unbiased(&self) -> Option<f64> {
        if self.n < 2 {
            None
        } else {
            Some(self.sse / (self.n - 1) as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    #[test]
    fn mean_1() {
        let xs: Vec<f64> = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(mean(xs), 2.0, epsilon = 10E-10);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(Vec::<f64>::new()), 0.0);
    }

    #[test]
    fn median_of_nothing_is_none() {
        assert!(median(&mut []).is_none());
    }

    #[test]
    fn population_var() {
        let xs: Vec<f64> = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let moments = Moments::from_values(xs);
        assert_relative_eq!(moments.var_population(), 2.0, epsilon = 10E-10);
    }

    #[test]
    fn unbiased_var() {
        let xs: Vec<f64> = vec![1.0 / 3.0, 2.0 / 3.0, 5.0 / 8.0, 11.0 / 12.0];
        let moments = Moments::from_values(xs);
        assert_relative_eq!(
            moments.var_unbiased().unwrap(),
            0.057_146_990_740_740_73,
            epsilon = 10E-8
        );
    }

    #[test]
    fn mean_of_extreme_values_is_finite() {
        let moments = Moments::from_values(vec![1.7e308, -1.7e308, 1.0]);
        assert!(moments.mean().is_finite());
        assert_relative_eq!(moments.mean(), 1.0 / 3.0, epsilon = 1E-6);
        assert!(moments.sse() >= 0.0);
    }

    #[test]
    fn mean_of_large_equal_values_is_exact() {
        let moments = Moments::from_values(vec![f64::MAX; 4]);
        assert_eq!(moments.mean(), f64::MAX);
        assert_eq!(moments.sse(), 0.0);
    }

    #[test]
    fn unbiased_var_needs_two_values() {
        assert!(Moments::from_values(vec![1.0]).var_unbiased().is_none());
    }
}
