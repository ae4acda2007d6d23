use std::path::PathBuf;

use anyhow::Context as _;

use crate::error::{LayerswapError, LayerswapResult};

/// A canonical target canvas. Candidate assets are matched against bases by
/// aspect ratio, and each base owns the templates authored for it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BaseRecord {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Prepended to output file names produced for this base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_prefix: Option<String>,
}

/// A stored layered template document, owned by exactly one base.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplateRecord {
    pub id: String,
    pub base_id: String,
    pub name: String,
    pub template_path: PathBuf,
    /// Appended to output file names produced from this template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_suffix: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl BaseRecord {
    pub fn validate(&self) -> LayerswapResult<()> {
        if self.id.trim().is_empty() {
            return Err(LayerswapError::validation("base id must be non-empty"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(LayerswapError::validation(format!(
                "base '{}' must have width/height > 0",
                self.id
            )));
        }
        Ok(())
    }

    /// Width over height. `validate` guarantees this is finite and > 0.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl TemplateRecord {
    pub fn validate(&self) -> LayerswapResult<()> {
        if self.id.trim().is_empty() || self.base_id.trim().is_empty() {
            return Err(LayerswapError::validation(
                "template id and base_id must be non-empty",
            ));
        }
        if self.template_path.as_os_str().is_empty() {
            return Err(LayerswapError::validation(format!(
                "template '{}' has an empty path",
                self.id
            )));
        }
        Ok(())
    }
}

/// An incoming raster the user wants placed into a template. Held only for the
/// duration of one substitution; never persisted.
#[derive(Clone, Debug)]
pub struct CandidateAsset {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CandidateAsset {
    /// Probe dimensions from the encoded bytes. Fails with
    /// `UnsupportedEncoding` when the buffer is not a decodable raster image.
    pub fn from_bytes(bytes: Vec<u8>) -> LayerswapResult<Self> {
        let (width, height) = image::load_from_memory(&bytes)
            .map(|img| (img.width(), img.height()))
            .context("decode candidate asset")
            .map_err(|e| LayerswapError::unsupported_encoding(format!("{e:#}")))?;
        Ok(Self {
            bytes,
            width,
            height,
        })
    }

    pub fn ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Compose the output file name for a finished composite:
/// `{base prefix}{stem}{template suffix}.ltd`.
pub fn output_file_name(base: &BaseRecord, template: &TemplateRecord, stem: &str) -> String {
    let prefix = base.file_prefix.as_deref().unwrap_or("");
    let suffix = template.file_suffix.as_deref().unwrap_or("");
    format!("{prefix}{stem}{suffix}.ltd")
}
