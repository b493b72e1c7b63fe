//! Computing a field's configuration key from its tags.

use tracing::debug;

use super::Field;
use crate::config::ConfigError;

/// Default prefix tag name.
pub const PREFIX_TAG: &str = "fig_px";
/// Default leaf tag name.
pub const LEAF_TAG: &str = "fig";
/// Leaf value that excludes a field from binding.
pub const SKIP: &str = "-";

const DEFAULT_MARKER: &str = "default=";

/// One priority layer: the tag naming a path prefix and the tag naming the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLayer {
    pub prefix: String,
    pub leaf: String,
}

/// Tag layers in priority order.
///
/// The default stack has a single `fig_px` / `fig` layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStack {
    layers: Vec<TagLayer>,
}

impl TagStack {
    /// An empty stack. Add layers with [`with_layer`](Self::with_layer).
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    #[must_use]
    pub fn with_layer(mut self, prefix: impl Into<String>, leaf: impl Into<String>) -> Self {
        self.layers.push(TagLayer {
            prefix: prefix.into(),
            leaf: leaf.into(),
        });
        self
    }

    pub fn layers(&self) -> &[TagLayer] {
        &self.layers
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.layers.is_empty() {
            return Err(ConfigError::InvalidTarget("no tag layers given".into()));
        }
        if let Some(layer) = self
            .layers
            .iter()
            .find(|l| l.prefix.is_empty() || l.leaf.is_empty())
        {
            return Err(ConfigError::InvalidTarget(format!(
                "tag layer has an empty tag name: {layer:?}"
            )));
        }
        Ok(())
    }
}

impl Default for TagStack {
    fn default() -> Self {
        Self::new().with_layer(PREFIX_TAG, LEAF_TAG)
    }
}

/// The effective lookup for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub path: String,
    /// Literal fallback from `default=`; selects scalar lookup plus coercion.
    pub default: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FieldKey {
    Bound(FieldBinding),
    Skip,
    Unbound,
}

/// Walks fields in declaration order, carrying each layer's active prefix.
pub(crate) struct KeyResolver<'s> {
    stack: &'s TagStack,
    prefixes: Vec<Option<&'static str>>,
    use_field_name: bool,
}

impl<'s> KeyResolver<'s> {
    pub(crate) fn new(stack: &'s TagStack, use_field_name: bool) -> Self {
        Self {
            stack,
            prefixes: vec![None; stack.layers.len()],
            use_field_name,
        }
    }

    pub(crate) fn resolve(&mut self, field: &Field<'_>) -> FieldKey {
        let last = self.stack.layers.len().saturating_sub(1);

        for (i, layer) in self.stack.layers.iter().enumerate() {
            if let Some(prefix) = field.tag_value(&layer.prefix) {
                debug!(field = field.name(), prefix, layer = i, "prefix set");
                self.prefixes[i] = Some(prefix);
                continue;
            }

            let leaf = match field.tag_value(&layer.leaf) {
                Some(SKIP) => return FieldKey::Skip,
                Some(leaf) => leaf,
                None if i < last => continue,
                None if self.use_field_name => field.name(),
                None => continue,
            };

            return FieldKey::Bound(compose(self.prefixes[i], leaf));
        }

        FieldKey::Unbound
    }
}

/// Splits `key,default=X` and joins the key onto `prefix`.
fn compose(prefix: Option<&str>, leaf: &str) -> FieldBinding {
    let mut parts = leaf.split(',');
    let key = parts.next().unwrap_or_default();
    let default = parts
        .find_map(|part| part.strip_prefix(DEFAULT_MARKER))
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let path = match prefix {
        Some(prefix) => format!("{prefix}.{key}"),
        None => key.to_string(),
    };

    FieldBinding { path, default }
}
