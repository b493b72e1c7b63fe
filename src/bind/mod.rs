//! Filling tagged struct fields from a [`DocumentStore`].
//!
//! A destination describes its fields by implementing [`Bindable`]. Each
//! [`Field`] carries `(tag name, tag value)` pairs; a [`TagStack`] decides
//! which tags are read and in what order.
//!
//! ```
//! use dragon_fig::bind::{Bindable, Field};
//!
//! #[derive(Default)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Bindable for Server {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::marker("_server").tag("fig_px", "server"),
//!             Field::new("host", &mut self.host).tag("fig", "host"),
//!             Field::new("port", &mut self.port).tag("fig", "port,default=8080"),
//!         ]
//!     }
//! }
//! ```

mod tags;

pub use tags::{FieldBinding, TagLayer, TagStack, LEAF_TAG, PREFIX_TAG, SKIP};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::coerce::{Coerce, Dynamic};
use crate::config::{BindErrors, ConfigError, DocumentStore};
use tags::{FieldKey, KeyResolver};

/// A struct whose fields can be bound.
pub trait Bindable {
    /// Field descriptors in declaration order.
    fn fields(&mut self) -> Vec<Field<'_>>;
}

/// Something a resolved value can be written into.
pub trait BindTarget {
    /// Structured lookup at `path`, decoded into the target.
    fn decode_from(&mut self, store: &DocumentStore, path: &str) -> Result<(), ConfigError>;

    /// Coerces a scalar into the target, returning whether it was assigned.
    fn coerce_from(&mut self, value: &Dynamic) -> bool;
}

struct Coerced<'a, T>(&'a mut T);

impl<T: Coerce + DeserializeOwned> BindTarget for Coerced<'_, T> {
    fn decode_from(&mut self, store: &DocumentStore, path: &str) -> Result<(), ConfigError> {
        *self.0 = store.get_value(path)?;
        Ok(())
    }

    fn coerce_from(&mut self, value: &Dynamic) -> bool {
        self.0.assign(value)
    }
}

struct Structured<'a, T>(&'a mut T);

impl<T: DeserializeOwned> BindTarget for Structured<'_, T> {
    fn decode_from(&mut self, store: &DocumentStore, path: &str) -> Result<(), ConfigError> {
        *self.0 = store.get_value(path)?;
        Ok(())
    }

    fn coerce_from(&mut self, _value: &Dynamic) -> bool {
        false
    }
}

/// One field of a [`Bindable`] struct.
pub struct Field<'a> {
    name: &'static str,
    tags: Vec<(&'static str, &'static str)>,
    target: Option<Box<dyn BindTarget + 'a>>,
}

impl<'a> Field<'a> {
    /// A field that accepts both structured values and `default=` literals.
    pub fn new<T: Coerce + DeserializeOwned>(name: &'static str, target: &'a mut T) -> Self {
        Self::with_target(name, Box::new(Coerced(target)))
    }

    /// A field filled only by structured lookup.
    ///
    /// A `default=` literal cannot be coerced into it and is reported as not assigned.
    pub fn structured<T: DeserializeOwned>(name: &'static str, target: &'a mut T) -> Self {
        Self::with_target(name, Box::new(Structured(target)))
    }

    /// A field with tags but nothing to assign, typically carrying a prefix tag.
    pub fn marker(name: &'static str) -> Self {
        Self {
            name,
            tags: Vec::new(),
            target: None,
        }
    }

    pub fn with_target(name: &'static str, target: Box<dyn BindTarget + 'a>) -> Self {
        Self {
            name,
            tags: Vec::new(),
            target: Some(target),
        }
    }

    #[must_use]
    pub fn tag(mut self, name: &'static str, value: &'static str) -> Self {
        self.tags.push((name, value));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The value of tag `name`. Empty values count as absent.
    pub fn tag_value(&self, name: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(tag, _)| *tag == name)
            .map(|(_, value)| *value)
            .filter(|value| !value.is_empty())
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("marker", &self.target.is_none())
            .finish()
    }
}

/// Binds every tagged field of `target` from `store`.
///
/// Fields are processed independently: a failing field is recorded and the
/// rest are still bound. All failures come back together as
/// [`ConfigError::Bind`]. An unusable `tags` stack fails with
/// [`ConfigError::InvalidTarget`] before any field is touched.
pub fn bind<B: Bindable + ?Sized>(
    store: &DocumentStore,
    target: &mut B,
    tags: &TagStack,
    use_field_name: bool,
) -> Result<(), ConfigError> {
    tags.validate()?;

    let mut keys = KeyResolver::new(tags, use_field_name);
    let mut errors = BindErrors::new();

    for mut field in target.fields() {
        let binding = match keys.resolve(&field) {
            FieldKey::Bound(binding) => binding,
            FieldKey::Skip => {
                debug!(field = field.name, "field skipped");
                continue;
            }
            FieldKey::Unbound => continue,
        };
        let Some(slot) = field.target.as_mut() else {
            continue;
        };

        debug!(field = field.name, path = %binding.path, "binding field");
        match binding.default {
            Some(default) => {
                let text = store.get(&binding.path, &default);
                if !slot.coerce_from(&Dynamic::Str(text)) {
                    warn!(field = field.name, path = %binding.path, "value not assignable");
                    errors.push(ConfigError::NotAssigned {
                        field: field.name.to_string(),
                        path: binding.path,
                    });
                }
            }
            None => {
                if let Err(err) = slot.decode_from(store, &binding.path) {
                    warn!(field = field.name, path = %binding.path, error = %err, "field not bound");
                    errors.push(ConfigError::Field {
                        field: field.name.to_string(),
                        source: Box::new(err),
                    });
                }
            }
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Format;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Server {
        host: String,
        port: u16,
        debug: bool,
        secret: String,
    }

    impl Bindable for Server {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::marker("_server").tag("fig_px", "server"),
                Field::new("host", &mut self.host).tag("fig", "host"),
                Field::new("port", &mut self.port).tag("fig", "port,default=8080"),
                Field::new("debug", &mut self.debug).tag("fig", "debug,default=false"),
                Field::new("secret", &mut self.secret).tag("fig", "-"),
            ]
        }
    }

    fn store(tree: serde_json::Value) -> DocumentStore {
        DocumentStore::new(tree, Format::Yaml)
    }

    #[test]
    fn test_bind_with_prefix_and_defaults() {
        let store = store(json!({"server": {"host": "example.com", "debug": true}}));
        let mut server = Server {
            secret: "untouched".into(),
            ..Default::default()
        };

        bind(&store, &mut server, &TagStack::default(), false).unwrap();

        assert_eq!(server.host, "example.com");
        assert_eq!(server.port, 8080);
        assert!(server.debug);
        assert_eq!(server.secret, "untouched");
    }

    #[test]
    fn test_bind_reports_failures() {
        let store = store(json!({"server": {"port": "not-a-port"}}));
        let mut server = Server {
            host: "before".into(),
            ..Default::default()
        };

        let err = bind(&store, &mut server, &TagStack::default(), false).unwrap_err();
        let ConfigError::Bind(errors) = err else {
            panic!("expected aggregate error");
        };

        let names: Vec<String> = errors
            .iter()
            .map(|e| match e {
                ConfigError::Field { field, .. } | ConfigError::NotAssigned { field, .. } => field.clone(),
                other => panic!("unexpected {other}"),
            })
            .collect();
        assert_eq!(names, vec!["host", "port"]);
        assert_eq!(server.host, "before");
    }

    #[test]
    fn test_structured_field_with_default_is_not_assigned() {
        #[derive(Default)]
        struct Holder {
            items: Vec<serde_json::Value>,
        }

        impl Bindable for Holder {
            fn fields(&mut self) -> Vec<Field<'_>> {
                vec![Field::structured("items", &mut self.items).tag("fig", "items,default=[]")]
            }
        }

        let store = store(json!({}));
        let err = bind(&store, &mut Holder::default(), &TagStack::default(), false).unwrap_err();
        assert!(err.to_string().contains("'items'"));
    }

    #[test]
    fn test_empty_stack_is_invalid_target() {
        let store = store(json!({}));
        let mut server = Server::default();
        let err = bind(&store, &mut server, &TagStack::new(), false).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTarget(_)));
    }
}
