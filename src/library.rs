//! JSON-file-backed store for base and template metadata.
//!
//! A [`Library`] is an explicitly passed handle: open it once at startup and
//! thread it through, rather than reaching for ambient global state. Every
//! mutating operation validates its inputs, applies the change to a staged
//! copy, persists that copy, and only then commits it in memory, so a failed
//! write never leaves the handle and the file disagreeing.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    error::{LayerswapError, LayerswapResult},
    matcher,
    records::{BaseRecord, TemplateRecord},
};

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
struct LibraryState {
    bases: Vec<BaseRecord>,
    templates: Vec<TemplateRecord>,
}

#[derive(Debug)]
pub struct Library {
    path: PathBuf,
    state: LibraryState,
}

/// Partial update for a stored template; `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub template_path: Option<PathBuf>,
    pub file_suffix: Option<Option<String>>,
    pub enabled: Option<bool>,
}

pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Library {
    /// Open the library at `path`, creating an empty one if the file does not
    /// exist yet.
    pub fn open(path: impl Into<PathBuf>) -> LayerswapResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let raw = std::fs::read(&path)
                .with_context(|| format!("read library '{}'", path.display()))?;
            serde_json::from_slice(&raw)
                .map_err(|e| LayerswapError::store(format!("malformed library file: {e}")))?
        } else {
            LibraryState::default()
        };
        Ok(Self { path, state })
    }

    pub fn bases(&self) -> &[BaseRecord] {
        &self.state.bases
    }

    pub fn base(&self, base_id: &str) -> Option<&BaseRecord> {
        self.state.bases.iter().find(|b| b.id == base_id)
    }

    pub fn template(&self, template_id: &str) -> Option<&TemplateRecord> {
        self.state.templates.iter().find(|t| t.id == template_id)
    }

    /// Templates owned by `base_id`, in insertion order.
    pub fn templates_for(&self, base_id: &str) -> Vec<&TemplateRecord> {
        self.state
            .templates
            .iter()
            .filter(|t| t.base_id == base_id)
            .collect()
    }

    /// Closest base within `tolerance` (ratio units), or `None` when nothing
    /// qualifies. Insertion order breaks ties.
    pub fn find_base(&self, candidate_ratio: f64, tolerance: f64) -> Option<&BaseRecord> {
        matcher::best_match(candidate_ratio, &self.state.bases, tolerance)
    }

    pub fn add_base(&mut self, base: BaseRecord) -> LayerswapResult<()> {
        base.validate()?;
        if self.base(&base.id).is_some() {
            return Err(LayerswapError::store(format!(
                "base '{}' already exists",
                base.id
            )));
        }
        let mut staged = self.state.clone();
        staged.bases.push(base);
        self.commit(staged)
    }

    pub fn add_template(&mut self, template: TemplateRecord) -> LayerswapResult<()> {
        template.validate()?;
        if self.base(&template.base_id).is_none() {
            return Err(LayerswapError::store(format!(
                "template '{}' references unknown base '{}'",
                template.id, template.base_id
            )));
        }
        if self.template(&template.id).is_some() {
            return Err(LayerswapError::store(format!(
                "template '{}' already exists",
                template.id
            )));
        }
        let mut staged = self.state.clone();
        staged.templates.push(template);
        self.commit(staged)
    }

    pub fn update_template(
        &mut self,
        template_id: &str,
        update: TemplateUpdate,
    ) -> LayerswapResult<()> {
        let mut staged = self.state.clone();
        let template = staged
            .templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(|| LayerswapError::store(format!("template '{template_id}' not found")))?;
        if let Some(name) = update.name {
            template.name = name;
        }
        if let Some(path) = update.template_path {
            template.template_path = path;
        }
        if let Some(suffix) = update.file_suffix {
            template.file_suffix = suffix;
        }
        if let Some(enabled) = update.enabled {
            template.enabled = enabled;
        }
        template.validate()?;
        self.commit(staged)
    }

    pub fn delete_template(&mut self, template_id: &str) -> LayerswapResult<()> {
        let mut staged = self.state.clone();
        let before = staged.templates.len();
        staged.templates.retain(|t| t.id != template_id);
        if staged.templates.len() == before {
            return Err(LayerswapError::store(format!(
                "template '{template_id}' not found"
            )));
        }
        self.commit(staged)
    }

    /// Delete a base, its dependent templates, and their backing files as one
    /// unit. Backing files are removed first; a file that is already absent
    /// counts as removed, and any real removal failure aborts the operation
    /// before metadata changes, so the library never points at files it has
    /// deleted.
    pub fn delete_base(&mut self, base_id: &str) -> LayerswapResult<()> {
        if self.base(base_id).is_none() {
            return Err(LayerswapError::store(format!("base '{base_id}' not found")));
        }

        for template in self.templates_for(base_id) {
            match std::fs::remove_file(&template.template_path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(
                        template = %template.id,
                        path = %template.template_path.display(),
                        "backing file already absent"
                    );
                }
                Err(e) => {
                    return Err(LayerswapError::store(format!(
                        "failed to remove '{}' for template '{}': {e}",
                        template.template_path.display(),
                        template.id
                    )));
                }
            }
        }

        let mut staged = self.state.clone();
        staged.bases.retain(|b| b.id != base_id);
        staged.templates.retain(|t| t.base_id != base_id);
        self.commit(staged)
    }

    /// Read the stored document bytes for a template.
    pub fn template_bytes(&self, template_id: &str) -> LayerswapResult<Vec<u8>> {
        let template = self
            .template(template_id)
            .ok_or_else(|| LayerswapError::store(format!("template '{template_id}' not found")))?;
        let bytes = std::fs::read(&template.template_path)
            .with_context(|| format!("read template '{}'", template.template_path.display()))?;
        Ok(bytes)
    }

    fn commit(&mut self, staged: LibraryState) -> LayerswapResult<()> {
        let json = serde_json::to_vec_pretty(&staged)
            .map_err(|e| LayerswapError::store(format!("encode library: {e}")))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create library dir '{}'", parent.display()))?;
        }
        std::fs::write(&self.path, json)
            .with_context(|| format!("write library '{}'", self.path.display()))?;
        self.state = staged;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
