use std::mem::swap;
use std::ops::AddAssign;

pub trait MinMax {
    type Inner: PartialOrd;
    /// Simultaneously compute the min and max of items in an Iterator. Returns
    /// `None` if the iterator is empty.
    fn minmax(&mut self) -> Option<(Self::Inner, Self::Inner)>;
}

impl<T> MinMax for T
where
    T: Iterator,
    T::Item: PartialOrd + Clone,
{
    type Inner = T::Item;
    fn minmax(&mut self) -> Option<(Self::Inner, Self::Inner)> {
        let mut min = self.next()?;

        let mut max = if let Some(item) = self.next() {
            item
        } else {
            return Some((min.clone(), min));
        };

        if min > max {
            swap(&mut min, &mut max);
        }

        for item in self {
            if item > max {
                max = item;
            } else if item < min {
                min = item;
            }
        }
        Some((min, max))
    }
}

/// Cumulative sum of `xs`
#[inline]
pub fn cumsum<T>(xs: &[T]) -> Vec<T>
where
    T: AddAssign + Clone,
{
    let mut summed: Vec<T> = xs.to_vec();
    for i in 1..xs.len() {
        let l = summed[i - 1].clone();
        summed[i] += l;
    }
    summed
}

/// Returns the index of the largest element in xs.
///
/// If there are multiple largest elements, returns the index of the first.
///
/// # Example
///
/// ```rust
/// # use arbor_utils::argmax;
/// assert_eq!(argmax(&[0.1, 0.7, 0.2, 0.7]), 1);
/// ```
#[inline]
pub fn argmax<T: PartialOrd>(xs: &[T]) -> usize {
    assert!(!xs.is_empty(), "Empty container");

    if xs.len() == 1 {
        0
    } else {
        let (max_ix, _) = xs.iter().enumerate().skip(1).fold(
            (0, &xs[0]),
            |(max_ix, max_val), (ix, x)| {
                if x > max_val {
                    (ix, x)
                } else {
                    (max_ix, max_val)
                }
            },
        );
        max_ix
    }
}

/// Numerically stable `log(sum(exp(xs))`
///
/// Returns negative infinity if every entry is negative infinity, rather than
/// the `NaN` that the naive shift would produce.
#[inline]
pub fn logsumexp(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        panic!("Empty container");
    } else if xs.len() == 1 {
        xs[0]
    } else {
        let maxval = xs
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, |acc, x| if x > acc { x } else { acc });
        if maxval == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        xs.iter()
            .fold(0.0_f64, |acc, x| acc + (x - maxval).exp())
            .ln()
            + maxval
    }
}
