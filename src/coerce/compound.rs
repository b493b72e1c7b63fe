use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::sync::mpsc::{Sender, SyncSender};

use super::{Coerce, Dynamic, Kind};

/// Replaces `dst` with the converted value, if there is one.
fn assign_converted<T: Coerce>(dst: &mut T, src: &Dynamic) -> bool {
    match T::convert(src) {
        Some(value) => {
            *dst = value;
            true
        }
        None => false,
    }
}

impl<T: Coerce> Coerce for Vec<T> {
    const KIND: Kind = Kind::Seq;

    fn assign(&mut self, src: &Dynamic) -> bool {
        assign_converted(self, src)
    }

    fn convert(src: &Dynamic) -> Option<Self> {
        match src {
            Dynamic::Str(s) if T::BYTE_SIZED => s.bytes().map(T::from_byte).collect(),
            Dynamic::Bytes(b) => Some(
                b.iter()
                    .filter_map(|&byte| T::convert(&Dynamic::Uint(u64::from(byte))))
                    .collect(),
            ),
            // Elements that neither convert nor assign are dropped.
            Dynamic::Seq(items) => Some(items.iter().filter_map(T::convert).collect()),
            _ => None,
        }
    }
}

/// Converted entries of a map source, or `None` when a key has the wrong kind.
fn map_entries<K: Coerce, V: Coerce>(src: &Dynamic) -> Option<Vec<(K, V)>> {
    let Dynamic::Map(pairs) = src else {
        return None;
    };
    if pairs.iter().any(|(k, _)| k.kind() != K::KIND) {
        return None;
    }
    Some(
        pairs
            .iter()
            .filter_map(|(k, v)| Some((K::convert(k)?, V::convert(v)?)))
            .collect(),
    )
}

impl<K, V, S> Coerce for HashMap<K, V, S>
where
    K: Coerce + Eq + Hash,
    V: Coerce,
    S: BuildHasher + Default,
{
    const KIND: Kind = Kind::Map;

    fn assign(&mut self, src: &Dynamic) -> bool {
        assign_converted(self, src)
    }

    fn convert(src: &Dynamic) -> Option<Self> {
        map_entries(src).map(|entries| entries.into_iter().collect())
    }
}

impl<K: Coerce + Ord, V: Coerce> Coerce for BTreeMap<K, V> {
    const KIND: Kind = Kind::Map;

    fn assign(&mut self, src: &Dynamic) -> bool {
        assign_converted(self, src)
    }

    fn convert(src: &Dynamic) -> Option<Self> {
        map_entries(src).map(|entries| entries.into_iter().collect())
    }
}

impl<T: Coerce> Coerce for Option<T> {
    const KIND: Kind = Kind::Pointer;

    fn assign(&mut self, src: &Dynamic) -> bool {
        assign_converted(self, src)
    }

    fn convert(src: &Dynamic) -> Option<Self> {
        match src {
            Dynamic::Pointer(None) => Some(None),
            Dynamic::Pointer(Some(target)) => T::convert(target).map(Some),
            _ => None,
        }
    }
}

macro_rules! impl_channel {
    ($($chan:ident),+) => {
        $(
            impl<T: Send + 'static> Coerce for $chan<T> {
                const KIND: Kind = Kind::Channel;

                fn assign(&mut self, src: &Dynamic) -> bool {
                    assign_converted(self, src)
                }

                fn convert(src: &Dynamic) -> Option<Self> {
                    match src {
                        Dynamic::Channel(opaque) => opaque.downcast_ref::<$chan<T>>().cloned(),
                        _ => None,
                    }
                }
            }
        )+
    };
}

impl_channel!(Sender, SyncSender);

impl Coerce for Dynamic {
    const KIND: Kind = Kind::Any;

    fn assign(&mut self, src: &Dynamic) -> bool {
        *self = src.clone();
        true
    }

    fn convert(src: &Dynamic) -> Option<Self> {
        Some(src.clone())
    }
}
