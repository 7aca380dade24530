use anyhow::{Context, Result};
use mdseo::diagram::{MermaidCli, MermaidOptions};
use mdseo::storage::{DEFAULT_DB_NAME, DEFAULT_STORE_NAME};
use mdseo::{PageConfig, ParseOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "mdseo.json";

/// Top-level mdseo.json schema.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MdseoConfig {
    pub parse: ParseSection,
    pub storage: StorageSection,
    pub diagram: DiagramSection,
    pub page: PageSection,
}

/// Parser options.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseSection {
    pub gfm: bool,
    pub math: bool,
    pub max_input_bytes: Option<usize>,
    pub deep_headings: bool,
}

impl Default for ParseSection {
    fn default() -> Self {
        let defaults = ParseOptions::default();
        Self {
            gfm: defaults.gfm,
            math: defaults.math,
            max_input_bytes: defaults.max_input_bytes,
            deep_headings: defaults.deep_headings,
        }
    }
}

impl ParseSection {
    pub fn to_options(&self) -> ParseOptions {
        ParseOptions {
            gfm: self.gfm,
            math: self.math,
            max_input_bytes: self.max_input_bytes,
            deep_headings: self.deep_headings,
        }
    }
}

/// Where the file tree lives on disk.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSection {
    pub data_dir: PathBuf,
    pub db_name: String,
    pub store_name: String,
    /// Legacy flat key-value file. Defaults to `<dataDir>/legacy.json`.
    pub legacy_file: Option<PathBuf>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".mdseo"),
            db_name: DEFAULT_DB_NAME.to_string(),
            store_name: DEFAULT_STORE_NAME.to_string(),
            legacy_file: None,
        }
    }
}

impl StorageSection {
    pub fn legacy_path(&self) -> PathBuf {
        self.legacy_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("legacy.json"))
    }
}

/// Mermaid renderer settings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagramSection {
    pub command: String,
    pub theme: String,
    pub font_family: String,
    pub security_level: String,
}

impl Default for DiagramSection {
    fn default() -> Self {
        let defaults = MermaidOptions::default();
        Self {
            command: "mmdc".to_string(),
            theme: defaults.theme,
            font_family: defaults.font_family,
            security_level: defaults.security_level,
        }
    }
}

impl DiagramSection {
    pub fn to_backend(&self) -> MermaidCli {
        MermaidCli::new(
            self.command.clone(),
            MermaidOptions {
                theme: self.theme.clone(),
                font_family: self.font_family.clone(),
                security_level: self.security_level.clone(),
            },
        )
    }
}

/// Defaults for `mdseo build` pages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSection {
    pub lang: Option<String>,
    pub description: Option<String>,
    pub canonical_url: Option<String>,
}

impl PageSection {
    pub fn to_page_config(&self, title: Option<&str>) -> PageConfig {
        PageConfig {
            title: title.map(|t| t.to_string()),
            canonical_url: self.canonical_url.clone(),
            description: self.description.clone(),
            lang: self.lang.clone(),
        }
    }
}

/// Load config from an explicit path, or from `mdseo.json` in the current
/// directory. A missing default file yields defaults; a missing explicit file
/// is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<MdseoConfig> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                read_config(path)
            } else {
                Ok(MdseoConfig::default())
            }
        }
    }
}

fn read_config(path: &Path) -> Result<MdseoConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: MdseoConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}
