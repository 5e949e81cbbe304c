//! Code for loading and running (trained) PyTorch models

use anyhow::{Context, Result};
use std::path::Path;
use tch::{no_grad, Device, Kind, Tensor};

/// A model that maps an input batch to per-class scores
pub trait Classifier: Send + Sync {
    /// Run the forward pass on `input`, returning a `[batch, classes]` tensor
    fn forward(&self, input: &Tensor) -> Result<Tensor>;
}

/// Load and run a TorchScript file
#[derive(Debug)]
pub struct TorchModel {
    /// The loaded torch model
    model: tch::CModule,
}

impl TorchModel {
    pub fn new(filename: impl AsRef<Path>) -> Result<Self> {
        let filename = filename.as_ref();
        let mut model = tch::CModule::load(filename)
            .with_context(|| format!("failed to load TorchScript model {}", filename.display()))?;
        model.set_eval();
        Ok(TorchModel { model })
    }
}

impl Classifier for TorchModel {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let output = no_grad(|| self.model.forward_ts(&[input]))?;
        Ok(output.to_device(Device::Cpu).to_kind(Kind::Float))
    }
}

/// Copy the scores of the single batch item out of a `[1, classes]` tensor
pub fn scores(output: &Tensor) -> Result<Vec<f32>> {
    let row = output.get(0).to_kind(Kind::Float);
    Ok(Vec::<f32>::try_from(&row)?)
}

/// Index of the highest score. Ties go to the first occurrence and, as in
/// numpy, a NaN counts as the maximum so the first NaN wins
pub fn argmax(scores: &[f32]) -> Option<usize> {
    if let Some(nan) = scores.iter().position(|s| s.is_nan()) {
        return Some(nan);
    }
    let (first, rest) = scores.split_first()?;
    let mut best = (0, *first);
    for (i, &score) in rest.iter().enumerate() {
        if score > best.1 {
            best = (i + 1, score);
        }
    }
    Some(best.0)
}
