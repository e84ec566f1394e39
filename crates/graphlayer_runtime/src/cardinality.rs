//! Projections from a batch of values to a field result.
//!
//! Batched lookups return every matching value for a key; the field's declared
//! cardinality decides what the field resolves to.

use graphlayer_core::{GraphError, GraphResult, Value};

/// How many values a field resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    /// A list of every value.
    #[default]
    Many,
    /// Exactly one value.
    Single,
    /// Zero or one value; zero resolves to null.
    SingleOrNull,
}

impl Cardinality {
    /// Projects `values` according to this cardinality.
    pub fn apply(self, mut values: Vec<Value>) -> GraphResult<Value> {
        match (self, values.len()) {
            (Self::Many, _) => Ok(Value::List(values)),
            (Self::Single | Self::SingleOrNull, 1) => Ok(values.swap_remove(0)),
            (Self::SingleOrNull, 0) => Ok(Value::Null),
            (Self::Single, found) => Err(GraphError::Cardinality {
                expected: "one value",
                found,
            }),
            (Self::SingleOrNull, found) => Err(GraphError::Cardinality {
                expected: "zero or one values",
                found,
            }),
        }
    }
}
