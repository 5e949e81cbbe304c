use thiserror::Error;

/// Errors returned by a single prediction. Each kind maps to its own HTTP
/// status in `server`
#[derive(Debug, Error)]
pub enum PredictError {
    /// The requested image does not exist
    #[error("Image file not found: {0}")]
    NotFound(String),

    /// The model output does not line up with the label table
    #[error("ValueError: Prediction output shape mismatch. Expected shape: (batch_size, {expected}), but got: {}", shape_tuple(.got))]
    ShapeMismatch { expected: usize, got: Vec<i64> },

    /// The selected class has no entry in the label table
    #[error("ValueError: Class index {index} out of bounds. Expected index between 0 and {}", .len.saturating_sub(1))]
    IndexOutOfBounds { index: usize, len: usize },

    /// Decode, tensor and inference failures
    #[error("Prediction failed: {0:#}")]
    Failed(#[from] anyhow::Error),
}

/// Render a tensor shape as a tuple, `(1, 10)` or `(10,)`
fn shape_tuple(shape: &[i64]) -> String {
    match shape {
        [single] => format!("({single},)"),
        dims => {
            let dims: Vec<String> = dims.iter().map(i64::to_string).collect();
            format!("({})", dims.join(", "))
        }
    }
}

impl PredictError {
    pub fn failed(msg: impl std::fmt::Display) -> Self {
        PredictError::Failed(anyhow::anyhow!("{msg}"))
    }
}
