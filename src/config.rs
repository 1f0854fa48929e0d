use std::fs;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::entities::roster::{DEFAULT_WORK_TYPE_OPTIONS, DEFAULT_WORK_TYPE_QUESTION};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "sheetflow";
const APPLICATION: &str = "sheetflow";
const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "workbook.sqlite";

pub const DB_ENV_VAR: &str = "SHEETFLOW_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Workbook file. Unset means the platform data directory.
    pub db_path: Option<PathBuf>,
    /// Offset applied to generated `Created Date` values.
    pub utc_offset_hours: i32,
    pub predefined_teams: Vec<String>,
    pub work_type_question: String,
    pub work_type_options: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            utc_offset_hours: 6,
            predefined_teams: ["CM", "SMD", "QAC", "Class Ops"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            work_type_question: DEFAULT_WORK_TYPE_QUESTION.to_string(),
            work_type_options: DEFAULT_WORK_TYPE_OPTIONS
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .ok_or_else(|| anyhow!("unable to resolve project directories"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_local_dir().join(DB_FILE))
}

/// Reads `path`, or the default config file when `path` is `None`. A
/// missing default file yields the defaults; a missing explicit file is an
/// error.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let (config_file, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (default_config_path()?, false),
    };

    match fs::File::open(&config_file) {
        Ok(file) => {
            let config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse config: {}", config_file.display()))?;
            info!(path = %config_file.display(), "config loaded");
            Ok(config)
        }
        Err(err) if err.kind() == ErrorKind::NotFound && !explicit => {
            debug!(path = %config_file.display(), "no config file, using defaults");
            Ok(AppConfig::default())
        }
        Err(err) => Err(err)
            .with_context(|| format!("failed to open config: {}", config_file.display())),
    }
}

impl AppConfig {
    /// `--db` flag, then `SHEETFLOW_DB`, then the config file, then the
    /// platform default.
    pub fn resolve_db_path(&self, flag: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = flag {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(DB_ENV_VAR).filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        default_db_path()
    }
}
