//! Configuration loading, lookup and the document formats.

mod builder;
mod env;
mod error;
mod file;
mod format;
mod store;

pub use builder::{Properties, PropertiesBuilder};
pub use env::{interpolate, EnvSnapshot};
pub use error::{BindErrors, ConfigError};
pub use file::{load_file, load_file_as, load_json_file, load_toml_file, load_yaml_file};
pub use format::{CodecError, DocumentParser, Format, FragmentCodec, ValueTree};
pub use store::DocumentStore;
