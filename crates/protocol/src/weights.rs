use crate::candidate::SourceKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed deviation of the weight sum from 1.0 before renormalization.
pub const WEIGHT_SUM_TOLERANCE: f32 = 0.01;

#[derive(Debug, Error, PartialEq)]
pub enum WeightError {
    #[error("fusion weights must be non-negative, got {0} for {1}")]
    Negative(f32, SourceKind),

    #[error("fusion weights must be finite")]
    NonFinite,

    #[error("fusion weights sum to zero and cannot be normalized")]
    ZeroSum,
}

/// Per-source fusion weights. Invariant: non-negative and summing to 1.0
/// within [`WEIGHT_SUM_TOLERANCE`]; construct via [`FusionWeights::normalized`]
/// to enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    values: [f32; SourceKind::COUNT],
}

impl FusionWeights {
    pub const fn new(similarity: f32, graph: f32, document: f32) -> Self {
        Self {
            values: [similarity, graph, document],
        }
    }

    pub const fn get(&self, kind: SourceKind) -> f32 {
        self.values[kind.index()]
    }

    pub fn sum(&self) -> f32 {
        self.values.iter().sum()
    }

    /// Returns weights guaranteed to satisfy the sum invariant.
    ///
    /// Within tolerance the input is kept as-is; otherwise each weight is
    /// scaled proportionally so the sum becomes exactly 1.0. All-zero or
    /// non-finite input cannot be repaired and is rejected.
    pub fn normalized(&self) -> Result<Self, WeightError> {
        for kind in SourceKind::ALL {
            let value = self.get(kind);
            if !value.is_finite() {
                return Err(WeightError::NonFinite);
            }
            if value < 0.0 {
                return Err(WeightError::Negative(value, kind));
            }
        }

        let sum = self.sum();
        if sum <= f32::EPSILON {
            return Err(WeightError::ZeroSum);
        }
        if (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
            return Ok(*self);
        }

        let mut values = self.values;
        for value in &mut values {
            *value /= sum;
        }
        Ok(Self { values })
    }
}

impl Default for FusionWeights {
    /// Similarity 0.4, graph 0.35, document 0.25.
    fn default() -> Self {
        Self::new(0.4, 0.35, 0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_weights_already_satisfy_invariant() {
        let weights = FusionWeights::default();
        assert_eq!(weights.normalized().unwrap(), weights);
    }

    #[test]
    fn oversized_sum_is_renormalized_proportionally() {
        let weights = FusionWeights::new(0.5, 0.3, 0.3).normalized().unwrap();
        assert!((weights.get(SourceKind::Similarity) - 0.4545).abs() < 1e-3);
        assert!((weights.get(SourceKind::Graph) - 0.2727).abs() < 1e-3);
        assert!((weights.get(SourceKind::Document) - 0.2727).abs() < 1e-3);
        assert!((weights.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn within_tolerance_weights_are_untouched() {
        let weights = FusionWeights::new(0.4, 0.35, 0.255);
        assert_eq!(weights.normalized().unwrap(), weights);
    }

    #[test]
    fn degenerate_weights_are_rejected() {
        assert_eq!(
            FusionWeights::new(0.0, 0.0, 0.0).normalized(),
            Err(WeightError::ZeroSum)
        );
        assert_eq!(
            FusionWeights::new(f32::NAN, 0.5, 0.5).normalized(),
            Err(WeightError::NonFinite)
        );
        assert!(matches!(
            FusionWeights::new(-0.1, 0.6, 0.5).normalized(),
            Err(WeightError::Negative(_, SourceKind::Similarity))
        ));
    }

    proptest! {
        #[test]
        fn normalization_always_lands_on_unit_sum(
            similarity in 0.001f32..10.0,
            graph in 0.0f32..10.0,
            document in 0.0f32..10.0,
        ) {
            let weights = FusionWeights::new(similarity, graph, document)
                .normalized()
                .unwrap();
            prop_assert!((weights.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE);
        }
    }
}
