//! Run configuration.
//!
//! Both pipelines resolve their input and output paths against a base
//! directory. An optional `relatorios.toml` there can move those paths and
//! teach the column normalizer extra header synonyms; without it the
//! defaults below apply.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    domain::{normalize::SynonymTable, sale::Field},
    error::{Error, Result},
};

pub const CONFIG_FILE: &str = "relatorios.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Multi-workbook merge into the monthly report.
    pub merge: MergeConfig,

    /// Single CSV export cleanup.
    pub export: ExportConfig,

    /// Extra header spellings, on top of the built-in ones.
    pub synonyms: BTreeMap<String, Field>,

    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    pub input_dir: PathBuf,
    pub extension: String,
    pub output: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("dados_brutos"),
            extension: "xlsx".to_string(),
            output: PathBuf::from("relatorio_anual.xlsx"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("export_bruto.csv"),
            output: PathBuf::from("dados_limpos.xlsx"),
        }
    }
}

impl Config {
    /// Load `relatorios.toml` from `base_dir`, or the defaults if there is
    /// none.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);

        let mut config = match fs::read_to_string(&path) {
            Ok(content) => {
                info!(path = %path.display(), "loading configuration");
                Self::parse(&content).map_err(|source| Error::ConfigError {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Self::default()
            }
            Err(err) => return Err(err.into()),
        };

        config.base_dir = base_dir.to_path_buf();
        Ok(config)
    }

    fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Defaults rooted at `base_dir`, ignoring any configuration file.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// The built-in synonym table extended with the configured synonyms.
    pub fn synonym_table(&self) -> SynonymTable {
        let mut table = SynonymTable::default();
        for (synonym, field) in &self.synonyms {
            table.insert(synonym, *field);
        }
        table
    }
}
