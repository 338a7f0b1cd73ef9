//! Protobuf field annotations and tag extraction.
//!
//! Tag-prefixed codecs read these annotations off a [`SerialDescriptor`] element to build the
//! [`TagDescriptor`] they push onto a [`crate::TagStack`]. Elements without a
//! [`ProtoNumber`] use their 1-based element position as field number.

use crate::{Result, SchemaError, SerialDescriptor, TagDescriptor};

/// Smallest field number protobuf accepts.
pub const MIN_FIELD_NUMBER: u32 = 1;
/// Largest field number protobuf accepts.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;
/// Field numbers reserved for the protobuf implementation itself.
pub const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<u32> = 19_000..=19_999;

/// How an integer field is laid out on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ProtoIntegerType {
    /// Plain varint.
    #[default]
    Default = 0,
    /// Zig-zag varint.
    Signed = 1,
    /// Fixed-width little endian.
    Fixed = 2,
}

impl ProtoIntegerType {
    pub(crate) const fn from_bits(bits: u64) -> Self {
        match bits {
            1 => ProtoIntegerType::Signed,
            2 => ProtoIntegerType::Fixed,
            _ => ProtoIntegerType::Default,
        }
    }
}

/// Assigns an explicit protobuf field number to an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProtoNumber(pub u32);

/// Selects the integer layout of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProtoType(pub ProtoIntegerType);

/// Marks a repeated element as packed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProtoPacked;

/// Checks that `number` may be used as a field number.
///
/// # Errors
/// Returns [`SchemaError::InvalidTag`] for numbers outside `1..=2^29-1` and for the reserved
/// `19000..=19999` range.
pub fn check_field_number(number: u64) -> Result<u32> {
    let valid = u32::try_from(number)
        .ok()
        .filter(|n| (MIN_FIELD_NUMBER..=MAX_FIELD_NUMBER).contains(n))
        .filter(|n| !RESERVED_FIELD_NUMBERS.contains(n));
    valid.ok_or(SchemaError::InvalidTag(number))
}

/// Builds the tag for element `index` of `descriptor`.
///
/// # Errors
/// Returns [`SchemaError::IndexOutOfRange`] for a bad index and [`SchemaError::InvalidTag`]
/// when the element's field number cannot be used on the wire.
pub fn extract_tag(descriptor: &SerialDescriptor, index: usize) -> Result<TagDescriptor> {
    let annotations = descriptor.element_annotations(index)?;
    let mut number = index as u64 + 1;
    let mut integer_type = ProtoIntegerType::Default;
    let mut packed = false;
    for annotation in annotations {
        if let Some(ProtoNumber(n)) = annotation.downcast_ref::<ProtoNumber>() {
            number = u64::from(*n);
        } else if let Some(ProtoType(t)) = annotation.downcast_ref::<ProtoType>() {
            integer_type = *t;
        } else if annotation.is::<ProtoPacked>() {
            packed = true;
        }
    }
    let number = check_field_number(number)?;
    Ok(TagDescriptor::new(number, integer_type, packed))
}

/// Finds the element carrying field number `number`, for skipping or matching fields on decode.
///
/// Returns `None` when no element uses it.
pub fn element_index_for_number(descriptor: &SerialDescriptor, number: u32) -> Option<usize> {
    (0..descriptor.elements_count()).find(|&index| {
        extract_tag(descriptor, index)
            .map(|tag| tag.field_number() == number)
            .unwrap_or(false)
    })
}
