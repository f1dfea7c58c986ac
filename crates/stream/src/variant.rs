use serde::{Deserialize, Serialize};

/// One asteroid model variant: its draw weight and uniform scale range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsteroidVariant {
    pub weight: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl AsteroidVariant {
    pub const fn new(weight: f32, min_scale: f32, max_scale: f32) -> Self {
        Self {
            weight,
            min_scale,
            max_scale,
        }
    }
}

/// The three shipped asteroid models: one large rock, two small fragments.
pub fn default_variants() -> Vec<AsteroidVariant> {
    vec![
        AsteroidVariant::new(0.4, 5.0, 15.0),
        AsteroidVariant::new(0.4, 0.1, 0.2),
        AsteroidVariant::new(0.2, 0.1, 0.2),
    ]
}

/// Pick an index by comparing `sample` against the running sum of `weights`.
///
/// Returns the first index whose cumulative weight exceeds `sample`. Falls
/// back to index 0 when nothing matches (floating-point shortfall at the top
/// of the range, or an empty table).
pub fn pick_weighted(weights: &[f32], sample: f32) -> usize {
    let mut cumulative = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if sample < cumulative {
            return i;
        }
    }
    0
}
