#[cfg(feature = "ahash")]
use ahash::{AHashMap, AHashSet};
#[cfg(feature = "bigdecimal")]
use bigdecimal::BigDecimal;
#[cfg(feature = "chrono")]
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
#[cfg(feature = "indexmap")]
use indexmap::{IndexMap, IndexSet};
#[cfg(feature = "rust_decimal")]
use rust_decimal::Decimal;
#[cfg(feature = "smol_str")]
use smol_str::SmolStr;
#[cfg(feature = "ulid")]
use ulid::Ulid;
#[cfg(feature = "uuid")]
use uuid::Uuid;

#[allow(unused_imports)]
use crate::{Describe, PrimitiveKind, SerialDescriptor};

// Types carried as their textual form describe as string primitives under their own name.
#[allow(unused_macros)]
macro_rules! impl_string_like {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn descriptor() -> SerialDescriptor {
                    SerialDescriptor::primitive($name, PrimitiveKind::String)
                }
            }
        )+
    };
}

// --- IndexSet / IndexMap ---
#[cfg(feature = "indexmap")]
impl<T: Describe, S> Describe for IndexSet<T, S> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::list("IndexSet", T::descriptor())
    }
}

#[cfg(feature = "indexmap")]
impl<K: Describe, V: Describe, S> Describe for IndexMap<K, V, S> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::map("IndexMap", K::descriptor(), V::descriptor())
    }
}

// --- AHashSet / AHashMap ---
#[cfg(feature = "ahash")]
impl<T: Describe, S> Describe for AHashSet<T, S> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::list(crate::core::HASH_SET_NAME, T::descriptor())
    }
}

#[cfg(feature = "ahash")]
impl<K: Describe, V: Describe, S> Describe for AHashMap<K, V, S> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::map(crate::core::HASH_MAP_NAME, K::descriptor(), V::descriptor())
    }
}

// --- chrono ---
#[cfg(feature = "chrono")]
impl<Tz: TimeZone> Describe for DateTime<Tz> {
    fn descriptor() -> SerialDescriptor {
        SerialDescriptor::primitive("chrono::DateTime", PrimitiveKind::String)
    }
}

#[cfg(feature = "chrono")]
impl_string_like! {
    NaiveDate => "chrono::NaiveDate",
    NaiveTime => "chrono::NaiveTime",
    NaiveDateTime => "chrono::NaiveDateTime",
}

// --- Decimal ---
#[cfg(feature = "rust_decimal")]
impl_string_like!(Decimal => "rust_decimal::Decimal");

#[cfg(feature = "bigdecimal")]
impl_string_like!(BigDecimal => "bigdecimal::BigDecimal");

// --- UUID / ULID ---
#[cfg(feature = "uuid")]
impl_string_like!(Uuid => "uuid::Uuid");

#[cfg(feature = "ulid")]
impl_string_like!(Ulid => "ulid::Ulid");

// --- SmolStr ---
// Same wire form as `String`, so it shares its serial name.
#[cfg(feature = "smol_str")]
impl_string_like!(SmolStr => "String");
