//! Validated configuration for the generate pipeline.
//!
//! Everything here is checked before any method is processed; a
//! [`ConfigError`] aborts the run.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracegen_synth::DEFAULT_INLINE_LIMIT;
use tracegen_types::env_utils::{env_bool, env_var};
use tracegen_types::SerializationFormat;

use crate::args::GenerateArgs;

pub const ENV_INLINE_LIMIT: &str = "TRACEGEN_INLINE_LIMIT";
pub const ENV_THREADS: &str = "TRACEGEN_THREADS";
pub const ENV_INCLUDE_VOID: &str = "TRACEGEN_INCLUDE_VOID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateConfig {
    pub model: PathBuf,
    pub invoked: PathBuf,
    pub dumps: PathBuf,
    pub out_dir: PathBuf,
    pub serializer: SerializationFormat,
    pub classfiles: Vec<PathBuf>,
    pub include_void: bool,
    pub inline_limit: usize,
    /// `None` uses one worker per core
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Non-capture serializer without compiled class metadata
    MissingClassfiles { serializer: SerializationFormat },
    ClassfilesNotFound { paths: Vec<PathBuf> },
    InputNotFound { what: &'static str, path: PathBuf },
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingClassfiles { serializer } => write!(
                f,
                "serializer '{}' needs compiled classes of the target program; pass --classfiles",
                serializer
            ),
            ConfigError::ClassfilesNotFound { paths } => {
                let list: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "classfile locations not found: {}", list.join(", "))
            }
            ConfigError::InputNotFound { what, path } => {
                write!(f, "{} not found: {}", what, path.display())
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl GenerateConfig {
    /// Build from CLI arguments, filling unset knobs from the environment.
    pub fn from_args(args: &GenerateArgs) -> Result<Self, ConfigError> {
        let inline_limit = match args.inline_limit {
            Some(limit) => limit,
            None => env_override(ENV_INLINE_LIMIT)?.unwrap_or(DEFAULT_INLINE_LIMIT),
        };
        let threads = match args.threads {
            Some(threads) => Some(threads),
            None => env_override(ENV_THREADS)?,
        };

        let config = Self {
            model: args.model.clone(),
            invoked: args.invoked.clone(),
            dumps: args.dumps.clone(),
            out_dir: args.out_dir.clone(),
            serializer: args.serializer.into(),
            classfiles: args.classfiles.clone(),
            include_void: args.include_void || env_bool(ENV_INCLUDE_VOID),
            inline_limit,
            threads,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serializer != SerializationFormat::CAPTURE && self.classfiles.is_empty() {
            return Err(ConfigError::MissingClassfiles {
                serializer: self.serializer,
            });
        }
        let missing: Vec<PathBuf> = self
            .classfiles
            .iter()
            .filter(|p| !p.exists())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::ClassfilesNotFound { paths: missing });
        }

        require_file("program model", &self.model)?;
        require_file("capture log", &self.invoked)?;
        if !self.dumps.is_dir() {
            return Err(ConfigError::InputNotFound {
                what: "dump directory",
                path: self.dumps.clone(),
            });
        }

        if self.threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "threads",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Whether snapshots must be transcoded for the runtime serializer.
    pub fn needs_transcoding(&self) -> bool {
        self.serializer != SerializationFormat::CAPTURE
    }
}

fn env_override<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    env_var(key).map_err(|value| ConfigError::InvalidValue { key, value })
}

fn require_file(what: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::InputNotFound {
            what,
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::SerializerArg;
    use std::fs;
    use tempfile::TempDir;

    fn inputs(dir: &TempDir) -> GenerateArgs {
        let model = dir.path().join("model.json");
        let invoked = dir.path().join("invoked-methods.csv");
        let dumps = dir.path().join("dumps");
        fs::write(&model, "{}").unwrap();
        fs::write(&invoked, "").unwrap();
        fs::create_dir(&dumps).unwrap();
        GenerateArgs {
            model,
            invoked,
            dumps,
            out_dir: dir.path().join("out"),
            serializer: SerializerArg::Xml,
            classfiles: Vec::new(),
            include_void: false,
            inline_limit: Some(64),
            threads: Some(2),
        }
    }

    #[test]
    fn test_default_serializer_needs_no_classfiles() {
        let dir = TempDir::new().unwrap();
        let config = GenerateConfig::from_args(&inputs(&dir)).unwrap();
        assert_eq!(config.serializer, SerializationFormat::Xml);
        assert_eq!(config.inline_limit, 64);
        assert_eq!(config.threads, Some(2));
        assert!(!config.needs_transcoding());
    }

    #[test]
    fn test_json_serializer_without_classfiles_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut args = inputs(&dir);
        args.serializer = SerializerArg::Json;
        assert_eq!(
            GenerateConfig::from_args(&args),
            Err(ConfigError::MissingClassfiles {
                serializer: SerializationFormat::Json
            })
        );
    }

    #[test]
    fn test_classfiles_must_exist() {
        let dir = TempDir::new().unwrap();
        let mut args = inputs(&dir);
        args.serializer = SerializerArg::Json;
        let present = dir.path().join("classes");
        fs::create_dir(&present).unwrap();
        let absent = dir.path().join("nope.jar");
        args.classfiles = vec![present.clone(), absent.clone()];
        assert_eq!(
            GenerateConfig::from_args(&args),
            Err(ConfigError::ClassfilesNotFound { paths: vec![absent] })
        );

        args.classfiles = vec![present];
        let config = GenerateConfig::from_args(&args).unwrap();
        assert!(config.needs_transcoding());
    }

    #[test]
    fn test_missing_inputs_are_reported() {
        let dir = TempDir::new().unwrap();
        let mut args = inputs(&dir);
        args.dumps = dir.path().join("missing");
        let err = GenerateConfig::from_args(&args).unwrap_err();
        assert!(matches!(err, ConfigError::InputNotFound { what: "dump directory", .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_unparsable_env_overrides_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut args = inputs(&dir);

        std::env::set_var(ENV_THREADS, "many");
        args.threads = None;
        assert_eq!(
            GenerateConfig::from_args(&args),
            Err(ConfigError::InvalidValue {
                key: ENV_THREADS,
                value: "many".to_string()
            })
        );
        // A CLI value means the environment is never consulted.
        args.threads = Some(3);
        assert_eq!(GenerateConfig::from_args(&args).unwrap().threads, Some(3));
        std::env::remove_var(ENV_THREADS);

        std::env::set_var(ENV_INLINE_LIMIT, "10kb");
        args.inline_limit = None;
        let err = GenerateConfig::from_args(&args).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for TRACEGEN_INLINE_LIMIT: '10kb'");
        std::env::set_var(ENV_INLINE_LIMIT, "128");
        assert_eq!(GenerateConfig::from_args(&args).unwrap().inline_limit, 128);
        std::env::remove_var(ENV_INLINE_LIMIT);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let dir = TempDir::new().unwrap();
        let mut args = inputs(&dir);
        args.threads = Some(0);
        assert!(matches!(
            GenerateConfig::from_args(&args),
            Err(ConfigError::InvalidValue { key: "threads", .. })
        ));
    }
}
