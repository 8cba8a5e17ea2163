//! Milestone thresholds and crossing detection.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Thresholds `m` with `prev < m <= new`, in ascending order.
///
/// `thresholds` must be ascending. Returns an empty list when nothing was
/// crossed, including `prev == new` and any decrease.
pub fn crossed(prev: u8, new: u8, thresholds: &[u8]) -> Vec<u8> {
    thresholds
        .iter()
        .copied()
        .filter(|&m| prev < m && m <= new)
        .collect()
}

/// A milestone with the amount still missing once it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MilestoneMark {
    pub percent: u8,
    pub remaining: f64,
}

/// Validated, immutable milestone set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Milestones(Vec<u8>);

impl Milestones {
    /// Thresholds must be non-empty, within 1..=100 and strictly ascending.
    pub fn new(thresholds: Vec<u8>) -> Result<Self, ValidationError> {
        if thresholds.is_empty() {
            return Err(ValidationError::EmptyCollection("goal.milestones".into()));
        }
        if let Some(&bad) = thresholds.iter().find(|&&m| m == 0 || m > 100) {
            return Err(ValidationError::InvalidValue {
                field: "goal.milestones".into(),
                message: format!("{bad} is outside 1..=100"),
            });
        }
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ValidationError::InvalidValue {
                field: "goal.milestones".into(),
                message: "thresholds must be strictly ascending".into(),
            });
        }
        Ok(Self(thresholds))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn crossed(&self, prev: u8, new: u8) -> Vec<u8> {
        crossed(prev, new, &self.0)
    }

    /// Remaining amount at each milestone for the given target.
    pub fn marks(&self, target: f64) -> Vec<MilestoneMark> {
        self.0
            .iter()
            .map(|&percent| MilestoneMark {
                percent,
                remaining: crate::money::round2((target * (1.0 - percent as f64 / 100.0)).max(0.0)),
            })
            .collect()
    }
}

impl Default for Milestones {
    fn default() -> Self {
        Self((1..=9).map(|i| i * 10).collect())
    }
}

impl TryFrom<Vec<u8>> for Milestones {
    type Error = ValidationError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Milestones> for Vec<u8> {
    fn from(value: Milestones) -> Self {
        value.0
    }
}
