use std::cmp::Ordering;
use std::hash::Hash;
use std::hash::Hasher;

use derive_more::Display;
use derive_more::From;
use derive_new::new;
use serde::Deserialize;
use serde::Serialize;

/// A single `(x, y)` data point.
///
/// Equality, ordering and hashing all go through [`f64::total_cmp`], so the
/// order is lexicographic (x first, then y) and total even in the presence of
/// NaN. As a consequence `-0.0` and `0.0` are distinct observations.
#[derive(Clone, Copy, Debug, Default, Display, From, Serialize, Deserialize, new)]
#[display(fmt = "Observation [{:?}, {:?}]", x, y)]
pub struct Observation {
    x: f64,
    y: f64,
}

impl Observation {
    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

impl From<Observation> for (f64, f64) {
    fn from(o: Observation) -> Self {
        (o.x, o.y)
    }
}

impl PartialEq for Observation {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Observation {}

impl PartialOrd for Observation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Observation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl Hash for Observation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}
