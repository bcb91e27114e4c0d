//! Evaluator trait for position evaluation.
//!
//! The evaluator maps an encoded position (all symmetry variants stacked) to
//! one value estimate per variant and one policy vector per variant. The
//! search controller averages over variants itself, so evaluators stay
//! oblivious to the game's symmetries.

use thiserror::Error;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Evaluator returned {actual} {what} entries, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Model error: {0}")]
    ModelError(String),
}

/// Result of evaluating one encoded position.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    /// One value estimate per variant, for the side to move, in [-1, 1].
    pub values: Vec<f32>,

    /// Flat `[variant][policy_index]` move probabilities.
    pub policy: Vec<f32>,
}

impl EvalResult {
    /// Check the result has one value per variant and a full policy per variant.
    pub fn validate(&self, num_variants: usize, policy_size: usize) -> Result<(), EvaluatorError> {
        if self.values.len() != num_variants {
            return Err(EvaluatorError::ShapeMismatch {
                what: "value",
                expected: num_variants,
                actual: self.values.len(),
            });
        }
        let expected = num_variants * policy_size;
        if self.policy.len() != expected {
            return Err(EvaluatorError::ShapeMismatch {
                what: "policy",
                expected,
                actual: self.policy.len(),
            });
        }
        Ok(())
    }

    /// Mean of the per-variant values.
    pub fn mean_value(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().map(|&v| v as f64).sum::<f64>() / self.values.len() as f64
    }
}

/// Trait for position evaluators.
///
/// `evaluate` takes `&mut self`: an evaluator is owned by exactly one engine
/// session and is never invoked concurrently.
///
/// Implementations:
/// - [`UniformEvaluator`]: neutral value, uniform policy (testing, no model)
/// - `OnnxEvaluator`: neural network inference (feature `onnx`)
pub trait Evaluator: Send {
    /// Evaluate one encoded position.
    ///
    /// # Arguments
    /// * `input` - Flattened model input for all variants
    /// * `num_variants` - Number of stacked symmetry variants in `input`
    /// * `policy_size` - Entries in each variant's policy vector
    fn evaluate(
        &mut self,
        input: &[f32],
        num_variants: usize,
        policy_size: usize,
    ) -> Result<EvalResult, EvaluatorError>;
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(
        &mut self,
        input: &[f32],
        num_variants: usize,
        policy_size: usize,
    ) -> Result<EvalResult, EvaluatorError> {
        (**self).evaluate(input, num_variants, policy_size)
    }
}

/// Evaluator that assigns equal probability to every policy entry.
/// Value is always 0.0 (neutral). Useful for testing and for running
/// without a model.
#[derive(Debug, Clone, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate(
        &mut self,
        _input: &[f32],
        num_variants: usize,
        policy_size: usize,
    ) -> Result<EvalResult, EvaluatorError> {
        let prob = if policy_size > 0 {
            1.0 / policy_size as f32
        } else {
            0.0
        };
        Ok(EvalResult {
            values: vec![0.0; num_variants],
            policy: vec![prob; num_variants * policy_size],
        })
    }
}
