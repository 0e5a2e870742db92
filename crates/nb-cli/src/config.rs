//! Run configuration, optionally loaded from the file named by
//! `NNBAR_PLOTS_CONFIG`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nb_viz_render::VizConfig;
use serde::Deserialize;

/// Environment variable naming an optional YAML (or `.json`) run configuration.
pub const CONFIG_ENV: &str = "NNBAR_PLOTS_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub input: FileLayout,
    /// Plots go to `<output_dir>/<sample>/`, which must exist.
    pub output_dir: PathBuf,
    pub modules: ModuleConfig,
    pub render: VizConfig,
}

impl RunConfig {
    /// Defaults, or the file named by [`CONFIG_ENV`] when it is set.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                read_run_config(&path)
                    .with_context(|| format!("failed to load run config {} (from {CONFIG_ENV})", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn sample_output_dir(&self, sample: &str) -> PathBuf {
        self.output_dir.join(sample)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: FileLayout::default(),
            output_dir: PathBuf::from("./plots"),
            modules: ModuleConfig::default(),
            render: VizConfig::default(),
        }
    }
}

pub fn read_run_config(path: &Path) -> Result<RunConfig> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: RunConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        // Default: YAML (serde_yaml_ng).
        serde_yaml_ng::from_slice(&bytes)?
    };
    Ok(cfg)
}

/// Where the per-run analyzer files of a sample live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileLayout {
    pub base_dir: PathBuf,
    /// File indices `0..max_files` are probed.
    pub max_files: usize,
    /// Tree path inside each file.
    pub table: String,
}

impl Default for FileLayout {
    fn default() -> Self {
        Self { base_dir: PathBuf::from("./nnbarana"), max_files: 1100, table: "nnbar/nnbar".into() }
    }
}

impl FileLayout {
    /// `<base_dir>/<sample>/anahist_<index>.root`
    pub fn file_path(&self, sample: &str, index: usize) -> PathBuf {
        self.base_dir.join(sample).join(format!("anahist_{index}.root"))
    }
}

/// Per-module multiplicity differences.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Read the difference fields as one nested value per detector module.
    pub per_module: bool,
    /// Module index -> display name.
    pub names: BTreeMap<usize, String>,
}

impl ModuleConfig {
    pub fn name(&self, index: usize) -> String {
        self.names.get(&index).cloned().unwrap_or_else(|| format!("module{index}"))
    }
}
