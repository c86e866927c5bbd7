use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FormatError;

/// The largest number of categories a categorical column may declare
pub const MAX_CATEGORIES: usize = 1 << 16;

/// The largest magnitude a continuous value may take. Squared deviations of
/// values within this range cannot overflow an `f64` sum.
pub const MAX_CONTINUOUS_MAGNITUDE: f64 = 1E100;

/// The kind of a column
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ColType {
    /// Real-valued
    Continuous,
    /// Takes values in `{0, 1, ..., k - 1}`
    Categorical { k: usize },
}

/// Describes why a value cannot belong to a column
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValueError {
    #[error("value {value} is not finite")]
    NotFinite { value: f64 },
    #[error("value {value} exceeds the largest supported magnitude, {max}")]
    TooLarge { value: f64, max: f64 },
    #[error("value {value} is not an integral category index")]
    NotIntegral { value: f64 },
    #[error("category {value} is out of range for a column with {k} categories")]
    CategoryOutOfRange { value: f64, k: usize },
}

impl std::fmt::Display for ColType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continuous => write!(f, "Continuous"),
            Self::Categorical { k } => write!(f, "Categorical({k})"),
        }
    }
}

impl ColType {
    /// Convert an entry of a `category_counts` header. Zero means continuous;
    /// two up to [`MAX_CATEGORIES`] is the arity of a categorical column.
    pub fn from_category_count(
        col_ix: usize,
        count: usize,
    ) -> Result<Self, FormatError> {
        match count {
            0 => Ok(Self::Continuous),
            k if (2..=MAX_CATEGORIES).contains(&k) => {
                Ok(Self::Categorical { k })
            }
            _ => Err(FormatError::InvalidCategoryCount { col_ix, count }),
        }
    }

    /// The `category_counts` header entry for this column
    pub fn category_count(self) -> usize {
        match self {
            Self::Continuous => 0,
            Self::Categorical { k } => k,
        }
    }

    pub fn is_continuous(self) -> bool {
        matches!(self, Self::Continuous)
    }

    pub fn is_categorical(self) -> bool {
        matches!(self, Self::Categorical { .. })
    }

    /// The number of categories, if categorical
    pub fn k(self) -> Option<usize> {
        match self {
            Self::Continuous => None,
            Self::Categorical { k } => Some(k),
        }
    }

    /// Check that `value` is a legal value for a column of this type
    ///
    /// # Example
    ///
    /// ```
    /// # use arbor_data::{ColType, ValueError};
    /// let coltype = ColType::Categorical { k: 3 };
    ///
    /// assert!(coltype.validate(2.0).is_ok());
    /// assert_eq!(
    ///     coltype.validate(3.0),
    ///     Err(ValueError::CategoryOutOfRange { value: 3.0, k: 3 })
    /// );
    /// assert!(ColType::Continuous.validate(f64::NAN).is_err());
    /// ```
    pub fn validate(self, value: f64) -> Result<(), ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NotFinite { value });
        }

        match self {
            Self::Continuous => {
                if value.abs() > MAX_CONTINUOUS_MAGNITUDE {
                    Err(ValueError::TooLarge {
                        value,
                        max: MAX_CONTINUOUS_MAGNITUDE,
                    })
                } else {
                    Ok(())
                }
            }
            Self::Categorical { k } => {
                if value.fract() != 0.0 {
                    Err(ValueError::NotIntegral { value })
                } else if value < 0.0 || value >= k as f64 {
                    Err(ValueError::CategoryOutOfRange { value, k })
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_count_round_trips() {
        for count in [0_usize, 2, 3, 17] {
            let coltype = ColType::from_category_count(0, count).unwrap();
            assert_eq!(coltype.category_count(), count);
        }
    }

    #[test]
    fn category_count_of_one_is_rejected() {
        let err = ColType::from_category_count(4, 1).unwrap_err();
        assert!(matches!(
            err,
            FormatError::InvalidCategoryCount {
                col_ix: 4,
                count: 1
            }
        ));
    }

    #[test]
    fn category_count_above_cap_is_rejected() {
        assert!(ColType::from_category_count(0, MAX_CATEGORIES).is_ok());

        let huge = 4_611_686_018_427_387_904_usize;
        for count in [MAX_CATEGORIES + 1, huge] {
            let err = ColType::from_category_count(2, count).unwrap_err();
            assert!(matches!(
                err,
                FormatError::InvalidCategoryCount { col_ix: 2, count: c }
                    if c == count
            ));
        }
    }

    #[test]
    fn continuous_rejects_values_beyond_magnitude_cap() {
        assert!(ColType::Continuous
            .validate(MAX_CONTINUOUS_MAGNITUDE)
            .is_ok());
        assert_eq!(
            ColType::Continuous.validate(-1.7e308),
            Err(ValueError::TooLarge {
                value: -1.7e308,
                max: MAX_CONTINUOUS_MAGNITUDE
            })
        );
    }

    #[test]
    fn continuous_accepts_finite_values_in_range() {
        assert!(ColType::Continuous.validate(-1e12).is_ok());
        assert!(ColType::Continuous.validate(0.123).is_ok());
        assert_eq!(
            ColType::Continuous.validate(f64::INFINITY),
            Err(ValueError::NotFinite {
                value: f64::INFINITY
            })
        );
    }

    #[test]
    fn categorical_rejects_fractional_and_negative_values() {
        let coltype = ColType::Categorical { k: 2 };
        assert_eq!(
            coltype.validate(0.5),
            Err(ValueError::NotIntegral { value: 0.5 })
        );
        assert_eq!(
            coltype.validate(-1.0),
            Err(ValueError::CategoryOutOfRange { value: -1.0, k: 2 })
        );
    }

    #[test]
    fn serializes_as_snake_case() {
        let s = serde_json::to_string(&ColType::Categorical { k: 4 }).unwrap();
        assert_eq!(s, "{\"categorical\":{\"k\":4}}");
        let s = serde_json::to_string(&ColType::Continuous).unwrap();
        assert_eq!(s, "\"continuous\"");
    }
}
