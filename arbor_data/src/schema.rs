use serde::{Deserialize, Serialize};

use crate::{ColType, FormatError};

/// The column types (and optionally the names) of a dataset
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(try_from = "SchemaRepr")]
pub struct Schema {
    coltypes: Vec<ColType>,
    #[serde(default)]
    names: Option<Vec<String>>,
}

/// Unchecked wire form of a [`Schema`]
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaRepr {
    coltypes: Vec<ColType>,
    #[serde(default)]
    names: Option<Vec<String>>,
}

impl TryFrom<SchemaRepr> for Schema {
    type Error = FormatError;

    fn try_from(repr: SchemaRepr) -> Result<Self, Self::Error> {
        let counts: Vec<usize> =
            repr.coltypes.iter().map(|ct| ct.category_count()).collect();
        let schema = Self::from_category_counts(&counts)?;
        match repr.names {
            Some(names) => schema.with_names(names),
            None => Ok(schema),
        }
    }
}

impl Schema {
    pub fn new(coltypes: Vec<ColType>) -> Self {
        Schema {
            coltypes,
            names: None,
        }
    }

    /// Build a schema from a `category_counts` header
    ///
    /// # Example
    ///
    /// ```
    /// # use arbor_data::{ColType, Schema};
    /// let schema = Schema::from_category_counts(&[0, 3]).unwrap();
    ///
    /// assert_eq!(schema.n_cols(), 2);
    /// assert_eq!(schema.coltype(0), ColType::Continuous);
    /// assert_eq!(schema.coltype(1), ColType::Categorical { k: 3 });
    /// ```
    pub fn from_category_counts(counts: &[usize]) -> Result<Self, FormatError> {
        counts
            .iter()
            .enumerate()
            .map(|(col_ix, &count)| ColType::from_category_count(col_ix, count))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Attach column names. There must be exactly one name per column.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self, FormatError> {
        if names.len() != self.coltypes.len() {
            Err(FormatError::FeatureCountMismatch {
                n_names: names.len(),
                n_cols: self.coltypes.len(),
            })
        } else {
            self.names = Some(names);
            Ok(self)
        }
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.coltypes.len()
    }

    /// The type of column `col_ix`. Panics if out of bounds.
    #[inline]
    pub fn coltype(&self, col_ix: usize) -> ColType {
        self.coltypes[col_ix]
    }

    pub fn coltypes(&self) -> &[ColType] {
        &self.coltypes
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// The name of column `col_ix`, falling back to its index
    pub fn col_name(&self, col_ix: usize) -> String {
        self.names
            .as_ref()
            .and_then(|names| names.get(col_ix).cloned())
            .unwrap_or_else(|| col_ix.to_string())
    }

    pub fn category_counts(&self) -> Vec<usize> {
        self.coltypes.iter().map(|ct| ct.category_count()).collect()
    }
}
