pub mod bind;
pub mod coerce;
pub mod config;
mod error;

pub use bind::{Bindable, Field, TagStack};
pub use coerce::{Coerce, Dynamic};
pub use config::{
    load_file, load_json_file, load_toml_file, load_yaml_file, ConfigError, DocumentStore,
    EnvSnapshot, Format, Properties,
};
pub use error::Error;
