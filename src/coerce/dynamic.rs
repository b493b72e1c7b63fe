use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone};

use super::Kind;
use crate::config::ValueTree;

/// A dynamically-typed source value.
#[derive(Debug, Clone)]
pub enum Dynamic {
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<Dynamic>),
    /// Ordered key/value pairs; keys may be of any kind.
    Map(Vec<(Dynamic, Dynamic)>),
    Time(DateTime<FixedOffset>),
    Struct(Opaque),
    Pointer(Option<Box<Dynamic>>),
    Channel(Opaque),
}

impl Dynamic {
    pub fn kind(&self) -> Kind {
        match self {
            Dynamic::Bool(_) => Kind::Bool,
            Dynamic::Int(_) => Kind::Int,
            Dynamic::Uint(_) => Kind::Uint,
            Dynamic::F32(_) | Dynamic::F64(_) => Kind::Float,
            Dynamic::Str(_) => Kind::String,
            Dynamic::Bytes(_) => Kind::Bytes,
            Dynamic::Seq(_) => Kind::Seq,
            Dynamic::Map(_) => Kind::Map,
            Dynamic::Time(_) => Kind::Time,
            Dynamic::Struct(_) => Kind::Struct,
            Dynamic::Pointer(_) => Kind::Pointer,
            Dynamic::Channel(_) => Kind::Channel,
        }
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Dynamic::Bytes(bytes.into())
    }

    pub fn pointer(target: Option<Dynamic>) -> Self {
        Dynamic::Pointer(target.map(Box::new))
    }
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Bool(b) => write!(f, "{b}"),
            Dynamic::Int(i) => write!(f, "{i}"),
            Dynamic::Uint(u) => write!(f, "{u}"),
            Dynamic::F32(x) => write!(f, "{x}"),
            Dynamic::F64(x) => write!(f, "{x}"),
            Dynamic::Str(s) => f.write_str(s),
            Dynamic::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Dynamic::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Dynamic::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("}")
            }
            Dynamic::Time(t) => f.write_str(&t.to_rfc3339()),
            Dynamic::Struct(o) | Dynamic::Channel(o) => write!(f, "<{}>", o.type_name()),
            Dynamic::Pointer(None) => f.write_str("<nil>"),
            Dynamic::Pointer(Some(target)) => write!(f, "{target}"),
        }
    }
}

/// A shared, type-erased value for struct and channel sources.
#[derive(Clone)]
pub struct Opaque {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.type_name).finish()
    }
}

macro_rules! from_as {
    ($variant:ident, $target:ty: $($t:ty),+) => {
        $(
            impl From<$t> for Dynamic {
                fn from(v: $t) -> Self {
                    Dynamic::$variant(v as $target)
                }
            }
        )+
    };
}

from_as!(Int, i64: i8, i16, i32, i64, isize);
from_as!(Uint, u64: u8, u16, u32, u64, usize);

impl From<bool> for Dynamic {
    fn from(v: bool) -> Self {
        Dynamic::Bool(v)
    }
}

impl From<f32> for Dynamic {
    fn from(v: f32) -> Self {
        Dynamic::F32(v)
    }
}

impl From<f64> for Dynamic {
    fn from(v: f64) -> Self {
        Dynamic::F64(v)
    }
}

impl From<String> for Dynamic {
    fn from(v: String) -> Self {
        Dynamic::Str(v)
    }
}

impl From<&str> for Dynamic {
    fn from(v: &str) -> Self {
        Dynamic::Str(v.to_string())
    }
}

impl From<&[u8]> for Dynamic {
    fn from(v: &[u8]) -> Self {
        Dynamic::Bytes(v.to_vec())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Dynamic {
    fn from(v: DateTime<Tz>) -> Self {
        Dynamic::Time(v.fixed_offset())
    }
}

impl From<&ValueTree> for Dynamic {
    fn from(v: &ValueTree) -> Self {
        match v {
            ValueTree::Null => Dynamic::Pointer(None),
            ValueTree::Bool(b) => Dynamic::Bool(*b),
            ValueTree::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Dynamic::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Dynamic::Uint(u)
                } else {
                    Dynamic::F64(n.as_f64().unwrap_or_default())
                }
            }
            ValueTree::String(s) => Dynamic::Str(s.clone()),
            ValueTree::Array(items) => Dynamic::Seq(items.iter().map(Dynamic::from).collect()),
            ValueTree::Object(map) => Dynamic::Map(
                map.iter()
                    .map(|(k, v)| (Dynamic::Str(k.clone()), Dynamic::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_tree() {
        let tree = json!({"n": 3, "big": u64::MAX, "f": 1.5, "s": "x", "z": null, "l": [true]});
        let Dynamic::Map(pairs) = Dynamic::from(&tree) else {
            panic!("expected map");
        };
        let find = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| matches!(k, Dynamic::Str(s) if s == key))
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert!(matches!(find("n"), Dynamic::Int(3)));
        assert!(matches!(find("big"), Dynamic::Uint(u64::MAX)));
        assert!(matches!(find("f"), Dynamic::F64(f) if f == 1.5));
        assert!(matches!(find("z"), Dynamic::Pointer(None)));
        assert!(matches!(find("l"), Dynamic::Seq(ref v) if v.len() == 1));
    }

    #[test]
    fn test_display() {
        let seq = Dynamic::Seq(vec![Dynamic::from(1i32), Dynamic::from("a")]);
        assert_eq!(seq.to_string(), "[1 a]");

        let map = Dynamic::Map(vec![(Dynamic::from("k"), Dynamic::from(true))]);
        assert_eq!(map.to_string(), "{k:true}");

        assert_eq!(Dynamic::pointer(None).to_string(), "<nil>");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Dynamic::from(1u8).kind(), Kind::Uint);
        assert_eq!(Dynamic::from(1.0f32).kind(), Kind::Float);
        assert_eq!(Dynamic::bytes(b"x".to_vec()).kind(), Kind::Bytes);
    }
}
