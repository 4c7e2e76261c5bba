use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Guid(Uuid);

impl Guid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed `[min, max]` interval spanned by a scalar array.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalarRange {
    pub min: f64,
    pub max: f64,
}

impl ScalarRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range over the finite values of `values`; `None` when there are none.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<Self> {
        values
            .into_iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(Self::new(v, v)),
                Some(range) => Some(Self::new(range.min.min(v), range.max.max(v))),
            })
    }
}

impl std::fmt::Display for ScalarRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Inclusive threshold pair. Ordering of the two sides is not enforced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `lower <= value <= upper`. Never true for inverted bounds.
    pub fn passes(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn is_inverted(&self) -> bool {
        self.lower > self.upper
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("unknown node {0}")]
    UnknownNode(Guid),
    #[error("connecting {upstream} -> {downstream} would create a cycle")]
    Cycle { upstream: Guid, downstream: Guid },
    #[error("node is not a {expected}")]
    NodeType { expected: &'static str },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_skips_non_finite_values() {
        let values = [3.0, f64::NAN, -2.0, f64::INFINITY, 7.5];
        let range = ScalarRange::from_values(&values);
        assert_eq!(range, Some(ScalarRange::new(-2.0, 7.5)));
    }

    #[test]
    fn range_of_empty_values_is_none() {
        assert_eq!(ScalarRange::from_values(&[]), None);
        assert_eq!(ScalarRange::from_values(&[f64::NAN]), None);
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = Bounds::new(0.0, 10.0);
        assert!(bounds.passes(0.0));
        assert!(bounds.passes(10.0));
        assert!(!bounds.passes(10.000_1));
    }

    #[test]
    fn inverted_bounds_pass_nothing() {
        let bounds = Bounds::new(5.0, 1.0);
        assert!(bounds.is_inverted());
        assert!(!bounds.passes(3.0));
        assert!(!bounds.passes(5.0));
    }
}
