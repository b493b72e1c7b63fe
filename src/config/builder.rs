use std::io::Read;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::env::{interpolate, EnvSnapshot};
use super::format::{DocumentParser, Format, ValueTree};
use super::store::DocumentStore;
use super::ConfigError;
use crate::bind::{self, Bindable, TagStack};

/// A loaded configuration document with path lookups and struct binding.
///
/// Loading runs in two phases: environment placeholders are interpolated into
/// the raw text, then the text is parsed. Lookups are memoized per path until
/// the next load.
///
/// ## Example
///
/// ```
/// use dragon_fig::{EnvSnapshot, Properties};
///
/// let env: EnvSnapshot = [("DB_HOST", "db.internal")].into_iter().collect();
/// let props = Properties::builder().build();
///
/// props.load("database:\n  host: ${DB_HOST}\n  port: ${DB_PORT:-5432}\n", &env)?;
/// assert_eq!(props.get("database.host", ""), "db.internal");
/// assert_eq!(props.get("database.port", "0"), "5432");
///
/// let port: u16 = props.get_value("database.port")?;
/// assert_eq!(port, 5432);
/// # Ok::<(), dragon_fig::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct Properties {
    parser: Box<dyn DocumentParser>,
    store: DocumentStore,
    env: Option<EnvSnapshot>,
}

impl Properties {
    /// Creates a new builder. Defaults to YAML.
    pub fn builder() -> PropertiesBuilder {
        PropertiesBuilder::default()
    }

    /// Interpolates `env` into `raw`, parses it and replaces the current document.
    ///
    /// On error the previous document stays in place.
    pub fn load(&self, raw: &str, env: &EnvSnapshot) -> Result<(), ConfigError> {
        let text = interpolate(raw, env)?;
        let tree = self.parser.parse(&text)?;
        debug!(bytes = raw.len(), "configuration document loaded");
        self.store.replace(tree);
        Ok(())
    }

    /// Reads the whole document from `reader` and loads it with the builder's
    /// environment, or a fresh snapshot of the process environment.
    pub fn read_value(&self, mut reader: impl Read) -> Result<(), ConfigError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;

        match &self.env {
            Some(env) => self.load(&raw, env),
            None => self.load(&raw, &EnvSnapshot::capture()),
        }
    }

    /// The value at `path` as text, or `default` if it does not resolve.
    pub fn get(&self, path: &str, default: &str) -> String {
        self.store.get(path, default)
    }

    /// The value at `path` decoded into `T`.
    pub fn get_value<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        self.store.get_value(path)
    }

    /// Binds `target` with the default `fig_px` / `fig` tags.
    pub fn fill<B: Bindable + ?Sized>(&self, target: &mut B) -> Result<(), ConfigError> {
        self.fill_ex(target, false)
    }

    /// Like [`fill`](Self::fill); untagged fields fall back to their own name
    /// when `use_field_name` is set.
    pub fn fill_ex<B: Bindable + ?Sized>(
        &self,
        target: &mut B,
        use_field_name: bool,
    ) -> Result<(), ConfigError> {
        self.fill_with_tags(target, use_field_name, &TagStack::default())
    }

    /// Binds `target` reading tags in the priority order of `tags`.
    pub fn fill_with_tags<B: Bindable + ?Sized>(
        &self,
        target: &mut B,
        use_field_name: bool,
        tags: &TagStack,
    ) -> Result<(), ConfigError> {
        bind::bind(&self.store, target, tags, use_field_name)
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }
}

/// Builder for [`Properties`].
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct PropertiesBuilder {
    format: Format,
    parser: Option<Box<dyn DocumentParser>>,
    codec: Option<Format>,
    env: Option<EnvSnapshot>,
}

impl PropertiesBuilder {
    /// Uses `format` for both parsing and structured lookups.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Overrides the document parser.
    pub fn parser(mut self, parser: Box<dyn DocumentParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Overrides the format used for structured lookups.
    pub fn codec(mut self, codec: Format) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Environment used by [`Properties::read_value`] instead of the process environment.
    pub fn env(mut self, env: EnvSnapshot) -> Self {
        self.env = Some(env);
        self
    }

    pub fn build(self) -> Properties {
        let format = self.format;
        let codec = self.codec.unwrap_or(format);
        Properties {
            parser: self
                .parser
                .unwrap_or_else(|| Box::new(format) as Box<dyn DocumentParser>),
            store: DocumentStore::new(ValueTree::Object(Default::default()), codec),
            env: self.env,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvSnapshot {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_load_and_get() {
        let props = Properties::builder().build();
        props
            .load("app:\n  name: ${APP_NAME}\n  workers: 4\n", &env(&[("APP_NAME", "svc")]))
            .unwrap();

        assert_eq!(props.get("app.name", ""), "svc");
        assert_eq!(props.get("app.workers", ""), "4");
        assert_eq!(props.get("app.missing", "dflt"), "dflt");
    }

    #[test]
    fn test_missing_env_aborts_load() {
        let props = Properties::builder().build();
        props.load("a: 1\n", &EnvSnapshot::default()).unwrap();

        let err = props.load("a: ${NOPE}\n", &EnvSnapshot::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvironmentValue(_)));
        assert_eq!(props.get("a", ""), "1");
    }

    #[test]
    fn test_reload_changes_results() {
        let props = Properties::builder().format(Format::Json).build();
        props.load(r#"{"level": "info"}"#, &EnvSnapshot::default()).unwrap();
        assert_eq!(props.get("level", ""), "info");

        props.load(r#"{"level": "debug"}"#, &EnvSnapshot::default()).unwrap();
        assert_eq!(props.get("level", ""), "debug");
    }

    #[test]
    fn test_read_value_uses_builder_env() {
        let props = Properties::builder()
            .format(Format::Toml)
            .env(env(&[("REGION", "eu-west-1")]))
            .build();
        props
            .read_value("[cloud]\nregion = \"${REGION}\"\n".as_bytes())
            .unwrap();

        assert_eq!(props.get("cloud.region", ""), "eu-west-1");
    }

    #[test]
    fn test_json_parser_with_yaml_codec() {
        let props = Properties::builder()
            .parser(Box::new(Format::Json))
            .codec(Format::Yaml)
            .build();
        props
            .load(r#"{"ports": [80, 443]}"#, &EnvSnapshot::default())
            .unwrap();

        let ports: Vec<u16> = props.get_value("ports").unwrap();
        assert_eq!(ports, vec![80, 443]);
        assert_eq!(props.get("ports", ""), "- 80\n- 443");
    }

    #[test]
    fn test_get_value_string_from_yaml_number() {
        let props = Properties::builder().build();
        props
            .load("app:\n  version: 2\n  pin: 0123\n", &EnvSnapshot::default())
            .unwrap();

        assert_eq!(props.get_value::<String>("app.version").unwrap(), "2");
        let version: u32 = props.get_value("app.version").unwrap();
        assert_eq!(version, 2);
    }
}
