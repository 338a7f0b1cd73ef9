//! # senax-schema
//!
//! Schema descriptors and nested field-tag tracking for format-agnostic serialization.
//!
//! - [`SerialDescriptor`] describes the shape of a serializable type: its serial name, its
//!   elements (name, optionality, annotations, child descriptor) and its generic type arguments.
//! - [`DescriptorBuilder`] is the two-phase construction API used by generated code.
//! - Descriptor equality is structural: same serial name and equal resolved type parameters.
//!   It terminates on self-referential schemas.
//! - [`TagStack`] tracks the currently open field path while a tag-prefixed codec walks a
//!   recursive object graph.
//! - `#[derive(Describe)]` generates descriptors for structs and unit-only enums.
//!
//! ## Attribute Macros
//!
//! - `#[describe(rename = "name")]`: On a type: overrides the serial name (defaults to
//!   `module_path!()::TypeName`). On a field: overrides the element name.
//! - `#[describe(default)]`: Marks the element optional. `Option<T>` fields are optional anyway.
//! - `#[describe(id = N)]`: Attaches a [`proto::ProtoNumber`] annotation to the element.
//! - `#[describe(signed)]` / `#[describe(fixed)]`: Attaches a [`proto::ProtoType`] annotation.
//! - `#[describe(packed)]`: Attaches a [`proto::ProtoPacked`] annotation.
//! - `#[describe(skip)]`: The field is not part of the schema.
//! - `#[describe(annotate = expr)]`: Attaches any [`Annotation`] value. On a type it becomes a
//!   class annotation.
//!
//! ## Feature Flags
//!
//! The following optional features enable [`Describe`] for popular crates and types:
//!
//! - `chrono`: `chrono::DateTime`, `NaiveDate`, `NaiveTime` and `NaiveDateTime`.
//! - `uuid`: `uuid::Uuid`.
//! - `ulid`: `ulid::Ulid`.
//! - `rust_decimal`: `rust_decimal::Decimal`.
//! - `bigdecimal`: `bigdecimal::BigDecimal`.
//! - `indexmap`: `IndexMap` and `IndexSet`.
//! - `ahash`: `ahash::AHashMap` and `ahash::AHashSet`.
//! - `smol_str`: `smol_str::SmolStr`.
//!
//! `HashMap` and `HashSet` describe the same whatever their hasher, so aliases such as
//! `fxhash::FxHashMap` need no feature.

mod builder;
pub mod core;
mod descriptor;
mod equality;
mod features;
pub mod proto;
mod registry;
mod tag;

pub use builder::DescriptorBuilder;
pub use descriptor::{
    Annotation, DescriptorGenerator, FnDescriptorGenerator, PrimitiveKind, SerialDescriptor,
    SerialKind, UNKNOWN_NAME,
};
pub use registry::DescriptorRegistry;
pub use senax_schema_derive::Describe;
pub use tag::{TagDescriptor, TagStack, MISSING_TAG};

/// Errors reported by descriptor construction, descriptor lookups and the tag stack.
///
/// None of these describe bad input data. They all indicate a caller or code generator that
/// broke a structural contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A strict `peek`/`pop` was issued on an empty [`TagStack`].
    #[error("No tag in stack for requested element")]
    EmptyStack,
    /// An element index outside `[0, elements_count)`.
    #[error("{name} descriptor has only {count} elements, index: {index}")]
    IndexOutOfRange {
        name: String,
        count: usize,
        index: usize,
    },
    /// The builder was driven past its declared shape.
    #[error("Descriptor builder misuse for {name}: {reason}")]
    BuilderOveruse { name: String, reason: &'static str },
    /// `build()` was called before every declared element was added.
    #[error("Descriptor {name} declares {expected} elements but only {actual} were added")]
    IncompleteDescriptor {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// A protobuf field number that cannot be used on the wire.
    #[error("Invalid protobuf field number: {0}")]
    InvalidTag(u64),
}

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Types with a statically known schema.
///
/// Most users should use `#[derive(Describe)]` instead of a manual implementation. Builtin
/// implementations live in [`core`].
pub trait Describe {
    /// Builds the descriptor for this type.
    ///
    /// Implementations must not eagerly build the descriptors of their elements, otherwise
    /// self-referential types recurse forever. Generated records resolve children lazily through
    /// a [`DescriptorGenerator`].
    fn descriptor() -> SerialDescriptor;
}

/// Convenience function returning the descriptor of `T`.
///
/// # Example
/// ```rust
/// use senax_schema::{descriptor_of, Describe};
///
/// #[derive(Describe)]
/// struct MyStruct {
///     id: u32,
///     name: Option<String>,
/// }
///
/// let descriptor = descriptor_of::<MyStruct>();
/// assert_eq!(descriptor.elements_count(), 2);
/// assert!(descriptor.is_element_optional(1).unwrap());
/// ```
pub fn descriptor_of<T: Describe + ?Sized>() -> SerialDescriptor {
    T::descriptor()
}
