use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("environment variable not set and no fallback given: {0}")]
    MissingEnvironmentValue(String),

    #[error("failed to parse {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("failed to encode value at '{path}': {message}")]
    Encode { path: String, message: String },

    #[error("failed to decode value at '{path}': {message}")]
    Decode { path: String, message: String },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("invalid path: '{0}'")]
    InvalidPath(String),

    #[error("invalid bind target: {0}")]
    InvalidTarget(String),

    #[error("field '{field}' not assigned from '{path}'")]
    NotAssigned { field: String, path: String },

    #[error("field '{field}': {source}")]
    Field {
        field: String,
        source: Box<ConfigError>,
    },

    #[error("{0}")]
    Bind(BindErrors),
}

/// Every field failure collected during one bind call.
#[derive(Debug, Default)]
pub struct BindErrors(Vec<ConfigError>);

impl BindErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: ConfigError) -> &mut Self {
        self.0.push(err);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing failed, otherwise the aggregate as a [`ConfigError::Bind`].
    pub fn into_result(self) -> Result<(), ConfigError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Bind(self))
        }
    }
}

impl fmt::Display for BindErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BindErrors {}

impl IntoIterator for BindErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
