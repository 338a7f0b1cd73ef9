//! Structural equality and hashing of descriptors.
//!
//! Two descriptors are equal when their serial names match and their resolved type-parameter
//! lists are pairwise equal. The list is resolved per descriptor variant, see
//! [`SerialDescriptor::type_parameters`].
//!
//! Which comparison runs is chosen by the left operand. Records (generated or hand-assembled)
//! compare against whatever the right operand resolves to, while list-like, map-like,
//! nullable, primitive and enum descriptors only ever equal a descriptor of their own variant.
//! So `record == list` can hold while `list == record` does not.
//!
//! Comparisons always descend into a type argument, and a type has finitely many distinct
//! type-argument substitutions, so equality and hashing terminate on self-referential schemas.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use crate::descriptor::DescriptorRepr;
use crate::SerialDescriptor;

impl SerialDescriptor {
    /// Descriptors of the generic arguments this descriptor was instantiated with.
    ///
    /// - generated records: what their generator reports, computed once;
    /// - hand-assembled descriptors: the list they were built with;
    /// - list-like: `[element]`;
    /// - map-like: `[key, value]`;
    /// - nullable: the wrapped descriptor's list;
    /// - anything else: empty.
    pub fn type_parameters(&self) -> Cow<'_, [SerialDescriptor]> {
        match self.repr() {
            DescriptorRepr::Generated(generated) => Cow::Borrowed(
                generated.type_parameters.get_or_init(|| {
                    generated
                        .generator
                        .as_ref()
                        .map(|generator| generator.type_parameter_descriptors())
                        .unwrap_or_default()
                        .into_boxed_slice()
                }),
            ),
            DescriptorRepr::Structural(structural) => {
                Cow::Borrowed(&structural.type_parameters[..])
            }
            DescriptorRepr::List { element } => Cow::Owned(vec![element.clone()]),
            DescriptorRepr::Map { key, value } => Cow::Owned(vec![key.clone(), value.clone()]),
            DescriptorRepr::Nullable { original } => original.type_parameters(),
            DescriptorRepr::Primitive(_) | DescriptorRepr::Enum(_) => Cow::Borrowed(&[]),
        }
    }
}

impl PartialEq for SerialDescriptor {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.repr(), other.repr()) {
            (DescriptorRepr::Generated(_) | DescriptorRepr::Structural(_), _) => {
                self.serial_name() == other.serial_name()
                    && *self.type_parameters() == *other.type_parameters()
            }
            (
                DescriptorRepr::List { element },
                DescriptorRepr::List {
                    element: other_element,
                },
            ) => self.serial_name() == other.serial_name() && element == other_element,
            (
                DescriptorRepr::Map { key, value },
                DescriptorRepr::Map {
                    key: other_key,
                    value: other_value,
                },
            ) => {
                self.serial_name() == other.serial_name()
                    && key == other_key
                    && value == other_value
            }
            (
                DescriptorRepr::Nullable { original },
                DescriptorRepr::Nullable {
                    original: other_original,
                },
            ) => original == other_original,
            (DescriptorRepr::Primitive(kind), DescriptorRepr::Primitive(other_kind)) => {
                kind == other_kind && self.serial_name() == other.serial_name()
            }
            (DescriptorRepr::Enum(_), DescriptorRepr::Enum(_)) => {
                self.serial_name() == other.serial_name()
                    && self.element_names().eq(other.element_names())
            }
            _ => false,
        }
    }
}

impl Eq for SerialDescriptor {}

impl Hash for SerialDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serial_name().hash(state);
        self.type_parameters().hash(state);
    }
}
