//! Assigning dynamically-typed values into statically-typed destinations.
//!
//! Every destination type implements [`Coerce`], which encodes which source
//! kinds it accepts and how they are converted. An unsupported pairing leaves
//! the destination untouched and reports `false`; it is never an error.
//!
//! | destination           | accepted sources                                      |
//! |-----------------------|-------------------------------------------------------|
//! | `bool`                | bool, bytes (first byte), integers (nonzero), string  |
//! | maps                  | map with matching key kind, values converted          |
//! | `Vec<T>`              | string (byte-sized `T` only), sequence, bytes         |
//! | `String`              | everything                                            |
//! | signed integers       | signed integer, bytes/string (decimal)                |
//! | floats                | float, bytes/string (decimal)                         |
//! | unsigned integers     | unsigned, signed (reinterpreted), bytes/string        |
//! | timestamps            | timestamp, signed integer (epoch secs), bytes/string  |
//! | structs               | struct of the same type                               |
//! | `Option<T>`           | pointer whose target converts to `T`                  |
//! | channel senders       | channel of the same type                              |
//! | [`Dynamic`]           | everything, as-is                                     |

mod compound;
mod dynamic;
mod scalar;
pub mod time;

pub use dynamic::{Dynamic, Opaque};

/// Coarse classification shared by source values and destination types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Seq,
    Map,
    Time,
    Struct,
    Pointer,
    Channel,
    Any,
}

/// A destination that a [`Dynamic`] can be assigned into.
pub trait Coerce: Sized {
    const KIND: Kind;

    /// Whether a string source may be taken as raw bytes for a `Vec<Self>`.
    const BYTE_SIZED: bool = false;

    /// Assigns `src` into `self`, returning whether anything was assigned.
    fn assign(&mut self, src: &Dynamic) -> bool;

    /// Direct assignment or conversion only, without text parsing.
    ///
    /// Used for the elements of sequences and maps.
    fn convert(src: &Dynamic) -> Option<Self>;

    /// One raw byte as an element, for byte-sized types.
    fn from_byte(_byte: u8) -> Option<Self> {
        None
    }
}

/// Assigns `src` into `dst`. See [`Coerce`].
pub fn assign<T: Coerce>(dst: &mut T, src: &Dynamic) -> bool {
    dst.assign(src)
}

/// Implements [`Coerce`] for user types carried as [`Dynamic::Struct`].
///
/// The type must be `Clone + Send + Sync + 'static`.
#[macro_export]
macro_rules! impl_coerce_struct {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::coerce::Coerce for $ty {
                const KIND: $crate::coerce::Kind = $crate::coerce::Kind::Struct;

                fn assign(&mut self, src: &$crate::coerce::Dynamic) -> bool {
                    match <Self as $crate::coerce::Coerce>::convert(src) {
                        Some(value) => {
                            *self = value;
                            true
                        }
                        None => false,
                    }
                }

                fn convert(src: &$crate::coerce::Dynamic) -> Option<Self> {
                    match src {
                        $crate::coerce::Dynamic::Struct(opaque) => opaque.downcast_ref::<$ty>().cloned(),
                        _ => None,
                    }
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Endpoint {
        url: String,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Other;

    crate::impl_coerce_struct!(Endpoint);

    #[test]
    fn test_struct_same_type() {
        let mut dst = Endpoint::default();
        let src = Dynamic::Struct(Opaque::new(Endpoint { url: "http://a".into() }));
        assert!(assign(&mut dst, &src));
        assert_eq!(dst.url, "http://a");
    }

    #[test]
    fn test_struct_other_type_rejected() {
        let mut dst = Endpoint { url: "keep".into() };
        assert!(!assign(&mut dst, &Dynamic::Struct(Opaque::new(Other))));
        assert!(!assign(&mut dst, &Dynamic::from("http://b")));
        assert_eq!(dst.url, "keep");
    }

    #[test]
    fn test_any_destination_takes_everything() {
        let mut dst = Dynamic::Bool(false);
        assert!(assign(&mut dst, &Dynamic::from(42i32)));
        assert!(matches!(dst, Dynamic::Int(42)));

        assert!(assign(&mut dst, &Dynamic::Seq(vec![Dynamic::from("x")])));
        assert!(matches!(dst, Dynamic::Seq(ref items) if items.len() == 1));
    }
}
