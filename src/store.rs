//! Persistence of named mapping configurations.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::export::ExportConfig;
use crate::mapping::MappingSpec;

/// A saved mapping project. `spec` flattens so the wire shape keeps
/// `mappings` and `transformationRules` at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub spec: MappingSpec,
    #[serde(default)]
    pub export_config: ExportConfig,
}

impl ProjectConfig {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        spec: MappingSpec,
        export_config: ExportConfig,
    ) -> Self {
        let now = Utc::now();
        ProjectConfig {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
            spec,
            export_config,
        }
    }
}

/// Injected key-value persistence for configs. Implementations own where
/// and how the configs live; callers only see ids.
pub trait ConfigStore {
    fn list(&self) -> Result<Vec<ProjectConfig>>;
    fn load(&self, id: &str) -> Result<Option<ProjectConfig>>;
    /// Upsert by id. Replacing an existing config refreshes `updated_at`.
    fn save(&mut self, config: ProjectConfig) -> Result<()>;
    /// Returns whether a config with the id existed.
    fn delete(&mut self, id: &str) -> Result<bool>;
}

/// Stores every config as one pretty-printed JSON array. A missing file
/// reads as an empty store; writes rename a temp file into place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    fn read_all(&self) -> Result<Vec<ProjectConfig>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Reading config store {:?}", self.path))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("Parsing config store {:?}", self.path))
    }

    fn write_all(&self, configs: &[ProjectConfig]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Creating config store directory {parent:?}"))?;
            }
        }
        let serialized =
            serde_json::to_string_pretty(configs).context("Serializing config store")?;
        let staged = self.path.with_extension("tmp");
        fs::write(&staged, serialized)
            .with_context(|| format!("Writing config store staging file {staged:?}"))?;
        fs::rename(&staged, &self.path)
            .with_context(|| format!("Replacing config store {:?}", self.path))
    }
}

impl ConfigStore for JsonFileStore {
    fn list(&self) -> Result<Vec<ProjectConfig>> {
        self.read_all()
    }

    fn load(&self, id: &str) -> Result<Option<ProjectConfig>> {
        Ok(self.read_all()?.into_iter().find(|config| config.id == id))
    }

    fn save(&mut self, config: ProjectConfig) -> Result<()> {
        let mut configs = self.read_all()?;
        match configs.iter_mut().find(|existing| existing.id == config.id) {
            Some(existing) => {
                *existing = ProjectConfig {
                    updated_at: Utc::now(),
                    ..config
                };
            }
            None => configs.push(config),
        }
        self.write_all(&configs)
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let mut configs = self.read_all()?;
        let before = configs.len();
        configs.retain(|config| config.id != id);
        if configs.len() == before {
            return Ok(false);
        }
        self.write_all(&configs)?;
        Ok(true)
    }
}
