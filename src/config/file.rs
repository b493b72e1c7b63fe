//! Loading [`Properties`] straight from a file.

use std::path::Path;

use super::builder::Properties;
use super::env::EnvSnapshot;
use super::format::Format;
use super::ConfigError;

/// Loads a file, picking the format from its extension (YAML when unknown).
///
/// The process environment is captured once for interpolation.
pub fn load_file(path: impl AsRef<Path>) -> Result<Properties, ConfigError> {
    let path = path.as_ref();
    load_file_as(path, Format::from_path(path).unwrap_or_default())
}

pub fn load_yaml_file(path: impl AsRef<Path>) -> Result<Properties, ConfigError> {
    load_file_as(path, Format::Yaml)
}

pub fn load_json_file(path: impl AsRef<Path>) -> Result<Properties, ConfigError> {
    load_file_as(path, Format::Json)
}

pub fn load_toml_file(path: impl AsRef<Path>) -> Result<Properties, ConfigError> {
    load_file_as(path, Format::Toml)
}

/// Loads a file in the given format.
pub fn load_file_as(path: impl AsRef<Path>, format: Format) -> Result<Properties, ConfigError> {
    let path = path.as_ref();
    let contents = read_config_file(path)?;

    let props = Properties::builder().format(format).build();
    props.load(&contents, &EnvSnapshot::capture())?;
    Ok(props)
}

fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_load_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        let body = r#"server:
  host: {{ env "FIG_TEST_UNSET_HOST" "localhost" }}"#;
        writeln!(file, "{body}").unwrap();

        let props = load_yaml_file(file.path()).unwrap();
        assert_eq!(props.get("server.host", ""), "localhost");
    }

    #[test]
    fn test_format_from_extension() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"retries": 3}}"#).unwrap();

        let props = load_file(file.path()).unwrap();
        let retries: u32 = props.get_value("retries").unwrap();
        assert_eq!(retries, 3);
    }

    #[test]
    fn test_missing_file() {
        let result = load_toml_file("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not = [valid").unwrap();

        let result = load_toml_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { format: "toml", .. })));
    }
}
