//! The inference service: a model and its label table, loaded once and
//! shared read-only by every request

use crate::config::Settings;
use crate::error::PredictError;
use crate::labels::LabelTable;
use crate::preprocess::Preprocessor;
use crate::torch::{self, Classifier, TorchModel};
use anyhow::{Context, Result};
use image::io::Reader as ImageReader;
use std::io::ErrorKind;
use std::path::Path;
use tracing::*;

pub struct Predictor {
    model: Box<dyn Classifier>,
    labels: LabelTable,
    preprocessor: Preprocessor,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("labels", &self.labels.len())
            .field("preprocessor", &self.preprocessor)
            .finish_non_exhaustive()
    }
}

impl Predictor {
    pub fn new(model: Box<dyn Classifier>, labels: LabelTable, preprocessor: Preprocessor) -> Self {
        Predictor {
            model,
            labels,
            preprocessor,
        }
    }

    /// Load the TorchScript model and the label table named in `settings`
    pub fn load(settings: &Settings) -> Result<Self> {
        info!("loading model from {}", settings.model_path.display());
        let model = TorchModel::new(&settings.model_path)?;

        info!(
            "loading labels {:?} from {}",
            settings.labels_key,
            settings.annotations_path.display()
        );
        let labels = LabelTable::load(&settings.annotations_path, &settings.labels_key)
            .context("failed to load label table")?;
        info!("loaded {} class labels", labels.len());

        Ok(Predictor::new(
            Box::new(model),
            labels,
            Preprocessor::from_settings(settings),
        ))
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Classify the image at `image_path`, returning its class name
    #[tracing::instrument(skip(self))]
    pub fn predict(&self, image_path: &str) -> Result<String, PredictError> {
        let path = Path::new(image_path);
        if !path.exists() {
            return Err(PredictError::NotFound(image_path.to_string()));
        }

        // Sniff the format from the file contents, the extension may lie
        let reader = ImageReader::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PredictError::NotFound(image_path.to_string()),
            _ => PredictError::Failed(anyhow::Error::new(e)),
        })?;
        let image = reader
            .with_guessed_format()
            .context("failed to read image header")?
            .decode()
            .map_err(anyhow::Error::new)?;
        let input = self.preprocessor.to_tensor(&image)?;

        let output = self.model.forward(&input)?;

        // The table must line up with the model output before we index it
        let shape = output.size();
        if shape.len() != 2 || shape[0] != 1 || shape[1] != self.labels.len() as i64 {
            warn!("model output {shape:?} does not match {} labels", self.labels.len());
            return Err(PredictError::ShapeMismatch {
                expected: self.labels.len(),
                got: shape,
            });
        }

        let scores = torch::scores(&output)?;
        let index = torch::argmax(&scores).unwrap_or(0);
        let label = self
            .labels
            .get(index)
            .ok_or(PredictError::IndexOutOfBounds {
                index,
                len: self.labels.len(),
            })?;

        debug!("predicted class {index} ({label})");
        Ok(label.to_string())
    }
}
