//! Service settings. Defaults are layered under an optional TOML file and
//! `CARCLASS_*` environment variables

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Default settings file, read if present
pub const DEFAULT_CONFIG_FILE: &str = "carclass.toml";

/// Prefix of the environment variables that override the settings file
pub const ENV_PREFIX: &str = "CARCLASS";

/// Largest accepted model input side, in pixels
pub const MAX_IMAGE_SIDE: u32 = 8192;

/// How pixel values are scaled before the forward pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// BGR channel order, 0..255 range, ImageNet channel means subtracted
    Caffe,

    /// RGB, scaled to 0..1 then standardized with ImageNet mean and std
    Imagenet,

    /// RGB, scaled to 0..1
    Unit,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    /// Number of HTTP workers; actix picks one per core when unset
    pub workers: Option<usize>,

    /// TorchScript classifier
    pub model_path: PathBuf,

    /// JSON annotation file holding the label table
    pub annotations_path: PathBuf,

    /// Key of the label table inside the annotation file
    pub labels_key: String,

    pub image_width: u32,
    pub image_height: u32,
    pub normalization: Normalization,

    /// Lay the input out as NHWC instead of NCHW
    pub channels_last: bool,

    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".into(),
            port: 8000,
            workers: None,
            model_path: "resnet50_custom_model.pt".into(),
            annotations_path: "cars_annos.json".into(),
            labels_key: "class_names".into(),
            image_width: 128,
            image_height: 128,
            normalization: Normalization::Caffe,
            channels_last: false,
            log_level: "info".into(),
        }
    }
}

impl Settings {
    /// Load settings from `file` (optional on disk) and the environment
    pub fn load(file: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read settings from {file}"))?
            .try_deserialize::<Settings>()
            .context("invalid settings")?;

        if settings.image_width == 0 || settings.image_height == 0 {
            anyhow::bail!(
                "image size must be non-zero, got {}x{}",
                settings.image_width,
                settings.image_height
            );
        }

        if settings.image_width > MAX_IMAGE_SIDE || settings.image_height > MAX_IMAGE_SIDE {
            anyhow::bail!(
                "image size {}x{} exceeds the {MAX_IMAGE_SIDE} pixel limit",
                settings.image_width,
                settings.image_height
            );
        }

        Ok(settings)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse `log_level`, falling back to INFO for unknown names
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
