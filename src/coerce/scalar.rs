use std::str::FromStr;

use super::{Coerce, Dynamic, Kind};

/// Parses UTF-8 text from a string or byte source.
fn parse_text<T: FromStr>(src: &Dynamic) -> Option<T> {
    match src {
        Dynamic::Str(s) => s.parse().ok(),
        Dynamic::Bytes(b) => std::str::from_utf8(b).ok()?.parse().ok(),
        _ => None,
    }
}

/// Strict boolean text: `1 t T TRUE true True` and `0 f F FALSE false False`.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl Coerce for bool {
    const KIND: Kind = Kind::Bool;

    fn assign(&mut self, src: &Dynamic) -> bool {
        let value = match src {
            Dynamic::Bool(b) => *b,
            Dynamic::Bytes(b) => match b.first() {
                Some(first) => *first != 0,
                None => return false,
            },
            Dynamic::Int(i) => *i != 0,
            Dynamic::Uint(u) => *u != 0,
            Dynamic::Str(s) => match parse_bool(s) {
                Some(b) => b,
                None => return false,
            },
            _ => return false,
        };
        *self = value;
        true
    }

    fn convert(src: &Dynamic) -> Option<Self> {
        match src {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Coerce for String {
    const KIND: Kind = Kind::String;

    fn assign(&mut self, src: &Dynamic) -> bool {
        *self = match src {
            Dynamic::Str(s) => s.clone(),
            Dynamic::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Dynamic::Int(i) => i.to_string(),
            Dynamic::Uint(u) => u.to_string(),
            Dynamic::F32(x) => x.to_string(),
            Dynamic::F64(x) => x.to_string(),
            Dynamic::Bool(b) => b.to_string(),
            other => other.to_string(),
        };
        true
    }

    fn convert(src: &Dynamic) -> Option<Self> {
        match src {
            Dynamic::Str(s) => Some(s.clone()),
            Dynamic::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }
}

/// Numeric-to-numeric conversion shared by every number type.
macro_rules! numeric_convert {
    ($t:ty) => {
        fn convert(src: &Dynamic) -> Option<Self> {
            match src {
                Dynamic::Int(i) => Some(*i as $t),
                Dynamic::Uint(u) => Some(*u as $t),
                Dynamic::F32(x) => Some(*x as $t),
                Dynamic::F64(x) => Some(*x as $t),
                _ => None,
            }
        }
    };
}

macro_rules! impl_signed {
    ($($t:ty => $byte_sized:expr),+ $(,)?) => {
        $(
            impl Coerce for $t {
                const KIND: Kind = Kind::Int;
                const BYTE_SIZED: bool = $byte_sized;

                fn assign(&mut self, src: &Dynamic) -> bool {
                    let value = match src {
                        Dynamic::Int(i) => *i,
                        Dynamic::Str(_) | Dynamic::Bytes(_) => match parse_text::<i64>(src) {
                            Some(i) => i,
                            None => return false,
                        },
                        _ => return false,
                    };
                    // Narrower destinations truncate.
                    *self = value as $t;
                    true
                }

                numeric_convert!($t);

                fn from_byte(byte: u8) -> Option<Self> {
                    $byte_sized.then(|| byte as $t)
                }
            }
        )+
    };
}

macro_rules! impl_unsigned {
    ($($t:ty => $byte_sized:expr),+ $(,)?) => {
        $(
            impl Coerce for $t {
                const KIND: Kind = Kind::Uint;
                const BYTE_SIZED: bool = $byte_sized;

                fn assign(&mut self, src: &Dynamic) -> bool {
                    let value = match src {
                        Dynamic::Uint(u) => *u,
                        Dynamic::Int(i) => *i as u64,
                        Dynamic::Str(_) | Dynamic::Bytes(_) => match parse_text::<u64>(src) {
                            Some(u) => u,
                            None => return false,
                        },
                        _ => return false,
                    };
                    *self = value as $t;
                    true
                }

                numeric_convert!($t);

                fn from_byte(byte: u8) -> Option<Self> {
                    $byte_sized.then(|| byte as $t)
                }
            }
        )+
    };
}

macro_rules! impl_float {
    ($($t:ty),+) => {
        $(
            impl Coerce for $t {
                const KIND: Kind = Kind::Float;

                fn assign(&mut self, src: &Dynamic) -> bool {
                    let value = match src {
                        Dynamic::F32(x) => f64::from(*x),
                        Dynamic::F64(x) => *x,
                        Dynamic::Str(_) | Dynamic::Bytes(_) => match parse_text::<f64>(src) {
                            Some(x) => x,
                            None => return false,
                        },
                        _ => return false,
                    };
                    *self = value as $t;
                    true
                }

                numeric_convert!($t);
            }
        )+
    };
}

impl_signed!(i8 => true, i16 => false, i32 => false, i64 => false, isize => false);
impl_unsigned!(u8 => true, u16 => false, u32 => false, u64 => false, usize => false);
impl_float!(f32, f64);
