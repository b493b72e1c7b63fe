//! Environment interpolation for raw configuration text.
//!
//! Runs before the document is parsed, so it works the same for every format.
//! Recognised placeholders:
//!
//! - `${NAME}` and `${NAME:-fallback}`
//! - `{{ env "NAME" }}`, `{{ env "NAME" "fallback" }}` and `{{ .Env.NAME }}`
//!
//! `$${` produces a literal `${`. Anything else, including a `$$` elsewhere and
//! unterminated or unrecognised placeholders, is copied through untouched.

use std::collections::HashMap;

use tracing::debug;

use super::ConfigError;

/// Environment variables captured once for a single load.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Snapshots the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Replaces every environment placeholder in `text`.
///
/// Fails with [`ConfigError::MissingEnvironmentValue`] when a referenced
/// variable is absent and the placeholder carries no fallback.
pub fn interpolate(text: &str, env: &EnvSnapshot) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(text.len());
    let mut substitutions = 0usize;
    let mut rest = text;

    while let Some(pos) = rest.find(&['$', '{'][..]) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("$${") {
            out.push_str("${");
            rest = tail;
            continue;
        }

        if let Some(tail) = rest.strip_prefix("${") {
            if let Some(end) = tail.find('}') {
                if let Some(value) = dollar_placeholder(&tail[..end], env)? {
                    out.push_str(&value);
                    substitutions += 1;
                    rest = &tail[end + 1..];
                    continue;
                }
            }
            out.push_str("${");
            rest = tail;
            continue;
        }

        if let Some(tail) = rest.strip_prefix("{{") {
            if let Some(end) = tail.find("}}") {
                if let Some(value) = template_placeholder(&tail[..end], env)? {
                    out.push_str(&value);
                    substitutions += 1;
                    rest = &tail[end + 2..];
                    continue;
                }
            }
            out.push_str("{{");
            rest = tail;
            continue;
        }

        // Lone '$' or '{'; both are single-byte.
        out.push_str(&rest[..1]);
        rest = &rest[1..];
    }
    out.push_str(rest);

    debug!(substitutions, "interpolated environment placeholders");
    Ok(out)
}

/// Body of `${...}`. `Ok(None)` means "not a placeholder, leave it alone".
fn dollar_placeholder(body: &str, env: &EnvSnapshot) -> Result<Option<String>, ConfigError> {
    let (name, fallback) = match body.split_once(":-") {
        Some((name, fallback)) => (name, Some(fallback)),
        None => (body, None),
    };
    if !is_var_name(name) {
        return Ok(None);
    }
    lookup(env, name, fallback).map(Some)
}

/// Body of `{{ ... }}`.
fn template_placeholder(body: &str, env: &EnvSnapshot) -> Result<Option<String>, ConfigError> {
    let body = body.trim();

    if let Some(name) = body.strip_prefix(".Env.") {
        if !is_var_name(name) {
            return Ok(None);
        }
        return lookup(env, name, None).map(Some);
    }

    let Some(args) = body.strip_prefix("env") else {
        return Ok(None);
    };
    if !args.starts_with(char::is_whitespace) {
        return Ok(None);
    }
    let args = match quoted_args(args) {
        Some(args) if (1..=2).contains(&args.len()) => args,
        _ => return Ok(None),
    };

    let name = args[0].strip_prefix(".Env.").unwrap_or(&args[0]);
    lookup(env, name, args.get(1).map(String::as_str)).map(Some)
}

fn lookup(env: &EnvSnapshot, name: &str, fallback: Option<&str>) -> Result<String, ConfigError> {
    match (env.get(name), fallback) {
        (Some(value), _) => Ok(value.to_string()),
        (None, Some(fallback)) => Ok(fallback.to_string()),
        (None, None) => Err(ConfigError::MissingEnvironmentValue(name.to_string())),
    }
}

fn is_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits `"a" "b"` into its unquoted parts. `None` on anything unquoted.
fn quoted_args(s: &str) -> Option<Vec<String>> {
    let mut args = Vec::new();
    let mut chars = s.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => return Some(args),
            Some('"') => {}
            Some(_) => return None,
        }

        let mut arg = String::new();
        loop {
            match chars.next()? {
                '"' => break,
                '\\' => arg.push(chars.next()?),
                c => arg.push(c),
            }
        }
        args.push(arg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> EnvSnapshot {
        [("HOST", "db.internal"), ("PORT", "5432")].into_iter().collect()
    }

    #[test]
    fn test_dollar_placeholder() {
        let out = interpolate("url: postgres://${HOST}:${PORT}/app", &env()).unwrap();
        assert_eq!(out, "url: postgres://db.internal:5432/app");
    }

    #[test]
    fn test_dollar_fallback() {
        let out = interpolate("level: ${LOG_LEVEL:-info}", &env()).unwrap();
        assert_eq!(out, "level: info");

        let out = interpolate("host: ${HOST:-localhost}", &env()).unwrap();
        assert_eq!(out, "host: db.internal");
    }

    #[test]
    fn test_template_forms() {
        let text = r#"a: {{ env "HOST" }}
b: {{ env "MISSING" "fallback" }}
c: {{ .Env.PORT }}
d: {{env ".Env.HOST"}}"#;
        let out = interpolate(text, &env()).unwrap();
        assert_eq!(out, "a: db.internal\nb: fallback\nc: 5432\nd: db.internal");
    }

    #[test]
    fn test_missing_without_fallback() {
        let result = interpolate("x: ${NOPE}", &env());
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvironmentValue(name)) if name == "NOPE"
        ));

        let result = interpolate(r#"x: {{ env "NOPE" }}"#, &env());
        assert!(matches!(result, Err(ConfigError::MissingEnvironmentValue(_))));
    }

    #[test]
    fn test_escape_sequence() {
        let out = interpolate("value: $${HOST} costs $5", &env()).unwrap();
        assert_eq!(out, "value: ${HOST} costs $5");
    }

    #[test]
    fn test_double_dollar_in_plain_text() {
        let text = "password: pa$$w0rd\nprice: $$5 and $$$\n";
        assert_eq!(interpolate(text, &env()).unwrap(), text);
    }

    #[test]
    fn test_unrecognised_text_is_untouched() {
        let text = r#"{"a": {"b": [1, 2]}, "t": "{{ .Value }}", "u": "${not closed", "v": "${1BAD}"}"#;
        let out = interpolate(text, &env()).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_quoted_args() {
        assert_eq!(
            quoted_args(r#" "a" "b \"c\"" "#),
            Some(vec!["a".to_string(), "b \"c\"".to_string()])
        );
        assert_eq!(quoted_args(" bare"), None);
        assert_eq!(quoted_args(r#" "open"#), None);
    }
}
