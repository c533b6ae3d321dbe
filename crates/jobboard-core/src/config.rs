use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5080;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_CONFIG_PATH: &str = "jobboard.toml";
pub const DEFAULT_DB_PATH: &str = "jobboard.db";

/// Top-level config (jobboard.toml + JOBBOARD_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobboardConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Settings for the external ingestion script.
///
/// Every key is optional at load time. A run started while any of them is
/// missing or blank ends without launching a process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Interpreter or binary, relative to `working_directory` unless absolute.
    pub executable: Option<String>,
    /// Sole argument passed to the executable, resolved the same way.
    pub script_path: Option<String>,
    /// Directory the process runs in; relative values resolve against the
    /// gateway's current directory.
    pub working_directory: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl JobboardConfig {
    /// Load config from a TOML file with JOBBOARD_* env var overrides.
    ///
    /// Nested keys use a double underscore in the environment, e.g.
    /// `JOBBOARD_PIPELINE__SCRIPT_PATH`. A missing file is not an error; the
    /// defaults and environment still apply.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);

        let config: JobboardConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("JOBBOARD_").split("__"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        tracing::debug!(path = %path, "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = JobboardConfig::load(Some("/nonexistent/jobboard.toml")).unwrap();
        assert_eq!(config.gateway.port, DEFAULT_PORT);
        assert_eq!(config.gateway.bind, DEFAULT_BIND);
        assert_eq!(config.database.path, DEFAULT_DB_PATH);
        assert!(config.pipeline.executable.is_none());
    }

    #[test]
    fn pipeline_section_is_read_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[gateway]
port = 9000

[pipeline]
executable = "venv/bin/python"
script_path = "src/pipeline/run_pipeline.py"
working_directory = ".."
"#
        )
        .unwrap();

        let config = JobboardConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.bind, DEFAULT_BIND);
        assert_eq!(config.pipeline.executable.as_deref(), Some("venv/bin/python"));
        assert_eq!(
            config.pipeline.script_path.as_deref(),
            Some("src/pipeline/run_pipeline.py")
        );
        assert_eq!(config.pipeline.working_directory.as_deref(), Some(".."));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gateway]\nport = \"not a number\"").unwrap();

        let err = JobboardConfig::load(file.path().to_str()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
