//! Builtin [`Describe`] implementations.
//!
//! - Primitives describe as primitive descriptors named after the Rust type.
//! - `Option<T>` describes as the nullable form of `T`.
//! - Sequences and sets describe as list-like descriptors, maps as map-like descriptors.
//! - Smart pointers and references are transparent.
//! - Tuples describe as hand-assembled records whose type parameters are their element types.
//! - `Bytes`/`BytesMut` describe as a list of `u8`.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::{Describe, PrimitiveKind, SerialDescriptor};

/// Serial names of the builtin collection descriptors.
pub const LIST_NAME: &str = "Vec";
pub const VEC_DEQUE_NAME: &str = "VecDeque";
pub const LINKED_LIST_NAME: &str = "LinkedList";
pub const BINARY_HEAP_NAME: &str = "BinaryHeap";
pub const ARRAY_NAME: &str = "Array";
pub const HASH_SET_NAME: &str = "HashSet";
pub const BTREE_SET_NAME: &str = "BTreeSet";
pub const HASH_MAP_NAME: &str = "HashMap";
pub const BTREE_MAP_NAME: &str = "BTreeMap";
pub const BYTES_NAME: &str = "Bytes";
pub const UNIT_NAME: &str = "()";
pub const PHANTOM_NAME: &str = "PhantomData";

// --- Primitives ---
macro_rules! impl_primitive {
    ($($ty:ty => $kind:ident, $name:literal;)+) => {
        $(
            impl Describe for $ty {
                fn descriptor() -> SerialDescriptor {
                    SerialDescriptor::primitive($name, PrimitiveKind::$kind)
                }
            }
        )+
    };
}

impl_primitive! {
    bool => Bool, "bool";
    char => Char, "char";
    i8 => I8, "i8";
    i16 => I16, "i16";
    i32 => I32, "i32";
    i64 => I64, "i64";
    i128 => I128, "i128";
    isize => I64, "isize";
    u8 => U8, "u8";
    u16 => U16, "u16";
    u32 => U32, "u32";
    u64 => U64, "u64";
    u128 => U128, "u128";
    usize => U64, "usize";
    f32 => F32, "f32";
    f64 => F64, "f64";
    String => String, "String";
    str => String, "String";
}

// --- Unit and markers ---
impl Describe for () {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::object(UNIT_NAME)
    }
}

impl<T: ?Sized> Describe for PhantomData<T> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::object(PHANTOM_NAME)
    }
}

// --- Option ---
/// `None` is written as an absent value, so `Option<T>` is the nullable form of `T`.
impl<T: Describe> Describe for Option<T> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::nullable(T::descriptor())
    }
}

// --- Transparent wrappers ---
macro_rules! impl_transparent {
    ($($wrapper:ident),+) => {
        $(
            impl<T: Describe + ?Sized> Describe for $wrapper<T> {
                fn descriptor() -> SerialDescriptor {
                    T::descriptor()
                }
            }
        )+
    };
}

impl_transparent!(Box, Rc, Arc);

impl<T: Describe + ?Sized> Describe for &T {
    fn descriptor() -> SerialDescriptor {
        T::descriptor()
    }
}

impl<T: Describe + ?Sized> Describe for &mut T {
    fn descriptor() -> SerialDescriptor {
        T::descriptor()
    }
}

impl<T: Describe + ToOwned + ?Sized> Describe for Cow<'_, T> {
    fn descriptor() -> SerialDescriptor {
        T::descriptor()
    }
}

impl<T: Describe> Describe for Cell<T> {
    fn descriptor() -> SerialDescriptor {
        T::descriptor()
    }
}

impl<T: Describe + ?Sized> Describe for RefCell<T> {
    fn descriptor() -> SerialDescriptor {
        T::descriptor()
    }
}

// --- Sequences and sets ---
macro_rules! impl_list {
    ($($collection:ident => $name:ident),+) => {
        $(
            impl<T: Describe> Describe for $collection<T> {
                fn descriptor() -> SerialDescriptor {
                    SerialDescriptor::list($name, T::descriptor())
                }
            }
        )+
    };
}

impl_list!(
    Vec => LIST_NAME,
    VecDeque => VEC_DEQUE_NAME,
    LinkedList => LINKED_LIST_NAME,
    BinaryHeap => BINARY_HEAP_NAME,
    BTreeSet => BTREE_SET_NAME
);

impl<T: Describe, S> Describe for HashSet<T, S> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::list(HASH_SET_NAME, T::descriptor())
    }
}

impl<T: Describe> Describe for [T] {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::list(LIST_NAME, T::descriptor())
    }
}

/// Fixed-size arrays share one descriptor whatever their length.
impl<T: Describe, const N: usize> Describe for [T; N] {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::list(ARRAY_NAME, T::descriptor())
    }
}

// --- Maps ---
impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::map(HASH_MAP_NAME, K::descriptor(), V::descriptor())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::map(BTREE_MAP_NAME, K::descriptor(), V::descriptor())
    }
}

// --- Bytes ---
impl Describe for Bytes {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::list(BYTES_NAME, u8::descriptor())
    }
}

impl Describe for BytesMut {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::list(BYTES_NAME, u8::descriptor())
    }
}

// --- Tuple ---
macro_rules! impl_tuple {
    ($($T:ident),+) => {
        impl<$($T: Describe),+> Describe for ($($T,)+) {
            fn descriptor() -> SerialDescriptor {
                SerialDescriptor::tuple(vec![$($T::descriptor()),+])
            }
        }
    };
}

impl_tuple!(T0);
impl_tuple!(T0, T1);
impl_tuple!(T0, T1, T2);
impl_tuple!(T0, T1, T2, T3);
impl_tuple!(T0, T1, T2, T3, T4);
impl_tuple!(T0, T1, T2, T3, T4, T5);
impl_tuple!(T0, T1, T2, T3, T4, T5, T6);
impl_tuple!(T0, T1, T2, T3, T4, T5, T6, T7);
impl_tuple!(T0, T1, T2, T3, T4, T5, T6, T7, T8);
impl_tuple!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_tuple!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_tuple!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
