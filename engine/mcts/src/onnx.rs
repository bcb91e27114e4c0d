//! ONNX Runtime evaluator for neural network inference.
//!
//! # Model Format
//!
//! The ONNX model is expected to have:
//! - Input: "input" - shape (variants, channels, rows, cols) float32
//! - Output: "value" - shape (variants, 1) float32, already in [-1, 1]
//! - Output: "policy" - shape (variants, policy_size) float32 move
//!   probabilities
//!
//! For chess: channels=17, rows=cols=8, policy_size=4096. Models whose policy
//! head stops before its softmax are loaded with
//! [`OnnxEvaluator::with_policy_logits`], and each variant's logits are then
//! normalised here.

use std::path::Path;
use std::time::Instant;

use ndarray::Array4;
use ort::{session::Session, value::Value};
use tracing::{debug, info};

use crate::evaluator::{EvalResult, Evaluator, EvaluatorError};

/// Log inference statistics every this many calls.
const STATS_INTERVAL: u64 = 10_000;

/// Evaluator backed by an ONNX Runtime session.
pub struct OnnxEvaluator {
    session: Session,
    /// Per-variant input shape: (channels, rows, cols).
    sample_shape: [usize; 3],
    /// Softmax the policy output per variant.
    policy_logits: bool,
    inference_count: u64,
    total_inference_time_us: u64,
}

impl std::fmt::Debug for OnnxEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEvaluator")
            .field("sample_shape", &self.sample_shape)
            .field("policy_logits", &self.policy_logits)
            .field("inference_count", &self.inference_count)
            .finish_non_exhaustive()
    }
}

impl OnnxEvaluator {
    /// Load an ONNX model from the given path.
    ///
    /// # Arguments
    /// * `model_path` - Path to the .onnx model file
    /// * `sample_shape` - Input shape of one variant, e.g. `[17, 8, 8]`
    /// * `intra_threads` - ONNX Runtime intra-op thread count
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        sample_shape: [usize; 3],
        intra_threads: usize,
    ) -> Result<Self, EvaluatorError> {
        let path = model_path.as_ref();
        let session = Session::builder()
            .map_err(|e| {
                EvaluatorError::ModelError(format!("Failed to create session builder: {}", e))
            })?
            .with_intra_threads(intra_threads)
            .map_err(|e| EvaluatorError::ModelError(format!("Failed to set intra threads: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| {
                EvaluatorError::ModelError(format!("Failed to load {}: {}", path.display(), e))
            })?;

        info!(path = %path.display(), ?sample_shape, intra_threads, "Loaded ONNX model");
        Ok(Self {
            session,
            sample_shape,
            policy_logits: false,
            inference_count: 0,
            total_inference_time_us: 0,
        })
    }

    /// Treat the policy output as logits rather than probabilities.
    pub fn with_policy_logits(mut self, logits: bool) -> Self {
        self.policy_logits = logits;
        self
    }

    /// Number of inferences run so far.
    pub fn inference_count(&self) -> u64 {
        self.inference_count
    }

    fn record_inference(&mut self, started: Instant) {
        self.total_inference_time_us += started.elapsed().as_micros() as u64;
        self.inference_count += 1;

        #[allow(clippy::manual_is_multiple_of)]
        if self.inference_count % STATS_INTERVAL == 0 {
            let avg_us = self.total_inference_time_us / self.inference_count;
            debug!(
                calls = self.inference_count,
                avg_ms = avg_us as f64 / 1000.0,
                "ONNX inference stats"
            );
        }
    }
}

/// Softmax over each `chunk`-sized slice of `logits`, in place.
fn softmax_rows(logits: &mut [f32], chunk: usize) {
    if chunk == 0 {
        return;
    }
    for row in logits.chunks_mut(chunk) {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if !max.is_finite() {
            row.iter_mut().for_each(|p| *p = 0.0);
            continue;
        }
        let mut sum = 0.0;
        for p in row.iter_mut() {
            *p = (*p - max).exp();
            sum += *p;
        }
        if sum > 0.0 {
            row.iter_mut().for_each(|p| *p /= sum);
        }
    }
}

/// Turn the raw policy output into per-variant move probabilities.
fn finish_policy(policy: &mut [f32], policy_size: usize, logits: bool) {
    if logits {
        softmax_rows(policy, policy_size);
    }
}

impl Evaluator for OnnxEvaluator {
    fn evaluate(
        &mut self,
        input: &[f32],
        num_variants: usize,
        policy_size: usize,
    ) -> Result<EvalResult, EvaluatorError> {
        let [channels, rows, cols] = self.sample_shape;
        let expected = num_variants * channels * rows * cols;
        if input.len() != expected {
            return Err(EvaluatorError::ShapeMismatch {
                what: "input",
                expected,
                actual: input.len(),
            });
        }

        let input_array =
            Array4::from_shape_vec((num_variants, channels, rows, cols), input.to_vec())
                .map_err(|e| {
                    EvaluatorError::EvaluationFailed(format!("Failed to create input array: {}", e))
                })?;
        let input_value = Value::from_array(input_array).map_err(|e| {
            EvaluatorError::ModelError(format!("Failed to create input tensor: {}", e))
        })?;

        let started = Instant::now();
        let (values, mut policy) = {
            let outputs = self
                .session
                .run(ort::inputs!["input" => input_value])
                .map_err(|e| EvaluatorError::EvaluationFailed(format!("Inference failed: {}", e)))?;

            let value_output = outputs
                .get("value")
                .ok_or_else(|| EvaluatorError::ModelError("Missing value output".to_string()))?;
            let (_shape, value_data) = value_output.try_extract_tensor::<f32>().map_err(|e| {
                EvaluatorError::ModelError(format!("Failed to extract value tensor: {}", e))
            })?;

            let policy_output = outputs
                .get("policy")
                .ok_or_else(|| EvaluatorError::ModelError("Missing policy output".to_string()))?;
            let (_shape, policy_data) = policy_output.try_extract_tensor::<f32>().map_err(|e| {
                EvaluatorError::ModelError(format!("Failed to extract policy tensor: {}", e))
            })?;

            let values: Vec<f32> = value_data.iter().map(|v| v.clamp(-1.0, 1.0)).collect();
            (values, policy_data.to_vec())
        };
        self.record_inference(started);

        finish_policy(&mut policy, policy_size, self.policy_logits);
        let result = EvalResult { values, policy };
        result.validate(num_variants, policy_size)?;
        Ok(result)
    }
}
