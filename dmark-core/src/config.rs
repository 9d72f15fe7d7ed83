use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;

// Default value functions for serde
fn default_suggestion_cutoff() -> f64 {
    0.6
}

fn default_max_suggestions() -> usize {
    3
}

/// Tunables for the preprocessor, loadable from a YAML file. Everything has
/// a sensible default; a missing or unreadable file falls back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    /// Minimum normalized similarity for an "undefined reference" suggestion
    /// (0.0–1.0). Tuned to avoid noisy false suggestions.
    #[serde(default = "default_suggestion_cutoff")]
    pub suggestion_cutoff: f64,
    /// Maximum number of suggestions attached to one diagnostic.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// Extra callout kind → fence style entries, merged over the built-ins.
    #[serde(default)]
    pub callout_styles: IndexMap<String, String>,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            suggestion_cutoff: default_suggestion_cutoff(),
            max_suggestions: default_max_suggestions(),
            callout_styles: IndexMap::new(),
        }
    }
}

impl PreprocessorConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read config {path}"))?;
        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config {path}"))?;
        Ok(config)
    }

    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|err| {
                warn!("failed to load config from {p}, using defaults: {err:#}");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
