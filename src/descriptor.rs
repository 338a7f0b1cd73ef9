use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::{Result, SchemaError};

/// Returned by [`SerialDescriptor::element_index`] for names the descriptor does not have.
///
/// Codecs use it to skip unrecognized fields instead of failing.
pub const UNKNOWN_NAME: usize = usize::MAX;

/// Metadata attached to a type or to one of its elements.
///
/// Any `'static + Send + Sync + Debug` value is an annotation. Look annotations up by type with
/// [`SerialDescriptor::find_annotation`] or `dyn Annotation::downcast_ref`.
pub trait Annotation: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + fmt::Debug> Annotation for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Annotation {
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Supplies the children and generic arguments of a generated record descriptor.
///
/// Children are resolved on first access, never while the descriptor is being built, so a
/// record may contain itself. The resolved lists are kept for the descriptor's lifetime.
pub trait DescriptorGenerator: Send + Sync {
    /// Descriptors of every element, in element order.
    fn child_descriptors(&self) -> Vec<SerialDescriptor>;

    /// Descriptors of the generic arguments of this instantiation.
    fn type_parameter_descriptors(&self) -> Vec<SerialDescriptor> {
        Vec::new()
    }
}

/// A [`DescriptorGenerator`] backed by two closures.
pub struct FnDescriptorGenerator<C, P> {
    children: C,
    type_parameters: P,
}

impl<C, P> FnDescriptorGenerator<C, P>
where
    C: Fn() -> Vec<SerialDescriptor> + Send + Sync,
    P: Fn() -> Vec<SerialDescriptor> + Send + Sync,
{
    pub fn new(children: C, type_parameters: P) -> Self {
        FnDescriptorGenerator {
            children,
            type_parameters,
        }
    }
}

impl<C, P> DescriptorGenerator for FnDescriptorGenerator<C, P>
where
    C: Fn() -> Vec<SerialDescriptor> + Send + Sync,
    P: Fn() -> Vec<SerialDescriptor> + Send + Sync,
{
    fn child_descriptors(&self) -> Vec<SerialDescriptor> {
        (self.children)()
    }

    fn type_parameter_descriptors(&self) -> Vec<SerialDescriptor> {
        (self.type_parameters)()
    }
}

/// Primitive value categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    String,
}

/// Structural category of a descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SerialKind {
    /// A record with named elements.
    Class,
    /// A value without elements (unit structs, enum variants).
    Object,
    /// A sequence: one element describing every item.
    List,
    /// A map: key element then value element.
    Map,
    /// A unit-only enum: one element per variant.
    Enum,
    Primitive(PrimitiveKind),
}

/// Per-element metadata shared by records and enums.
pub(crate) struct ElementTable {
    pub(crate) names: Box<[String]>,
    pub(crate) optional: Box<[bool]>,
    // Most elements carry no annotations.
    pub(crate) annotations: Box<[Option<Box<[Arc<dyn Annotation>]>>]>,
    pub(crate) class_annotations: Box<[Arc<dyn Annotation>]>,
    indices: OnceLock<HashMap<String, usize>>,
}

impl ElementTable {
    pub(crate) fn new(
        names: Box<[String]>,
        optional: Box<[bool]>,
        annotations: Box<[Option<Box<[Arc<dyn Annotation>]>>]>,
        class_annotations: Box<[Arc<dyn Annotation>]>,
    ) -> Self {
        ElementTable {
            names,
            optional,
            annotations,
            class_annotations,
            indices: OnceLock::new(),
        }
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    /// Duplicate names resolve to the last element carrying them.
    fn index_of(&self, name: &str) -> Option<usize> {
        self.indices
            .get_or_init(|| {
                self.names
                    .iter()
                    .enumerate()
                    .map(|(index, name)| (name.clone(), index))
                    .collect()
            })
            .get(name)
            .copied()
    }
}

pub(crate) struct GeneratedDescriptor {
    pub(crate) elements: ElementTable,
    pub(crate) generator: Option<Arc<dyn DescriptorGenerator>>,
    pub(crate) children: OnceLock<Box<[SerialDescriptor]>>,
    pub(crate) type_parameters: OnceLock<Box<[SerialDescriptor]>>,
}

impl GeneratedDescriptor {
    fn child(&self, index: usize) -> Option<SerialDescriptor> {
        let generator = self.generator.as_ref()?;
        self.children
            .get_or_init(|| generator.child_descriptors().into_boxed_slice())
            .get(index)
            .cloned()
    }
}

pub(crate) struct StructuralDescriptor {
    pub(crate) kind: SerialKind,
    pub(crate) elements: ElementTable,
    pub(crate) element_descriptors: Box<[SerialDescriptor]>,
    pub(crate) type_parameters: Box<[SerialDescriptor]>,
}

pub(crate) struct EnumDescriptor {
    pub(crate) elements: ElementTable,
    pub(crate) variants: Box<[SerialDescriptor]>,
}

/// The closed set of descriptor variants. Type-parameter resolution and equality dispatch on it.
pub(crate) enum DescriptorRepr {
    /// Built by generated code through a [`DescriptorGenerator`].
    Generated(GeneratedDescriptor),
    /// Assembled by hand with explicit children.
    Structural(StructuralDescriptor),
    List {
        element: SerialDescriptor,
    },
    Map {
        key: SerialDescriptor,
        value: SerialDescriptor,
    },
    Nullable {
        original: SerialDescriptor,
    },
    Primitive(PrimitiveKind),
    Enum(EnumDescriptor),
}

pub(crate) struct DescriptorInner {
    pub(crate) serial_name: String,
    pub(crate) repr: DescriptorRepr,
}

/// Shape of one serializable type.
///
/// A cheap handle: clones share the same immutable descriptor. Descriptors are `Send + Sync`
/// and may be read from any number of threads once built.
#[derive(Clone)]
pub struct SerialDescriptor(pub(crate) Arc<DescriptorInner>);

static NO_ANNOTATIONS: [Arc<dyn Annotation>; 0] = [];

impl SerialDescriptor {
    pub(crate) fn from_repr(serial_name: impl Into<String>, repr: DescriptorRepr) -> Self {
        SerialDescriptor(Arc::new(DescriptorInner {
            serial_name: serial_name.into(),
            repr,
        }))
    }

    pub(crate) fn repr(&self) -> &DescriptorRepr {
        &self.0.repr
    }

    pub fn primitive(serial_name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::from_repr(serial_name, DescriptorRepr::Primitive(kind))
    }

    /// A list-like descriptor with a single element describing every item.
    pub fn list(serial_name: impl Into<String>, element: SerialDescriptor) -> Self {
        Self::from_repr(serial_name, DescriptorRepr::List { element })
    }

    /// A map-like descriptor with a key element and a value element.
    pub fn map(
        serial_name: impl Into<String>,
        key: SerialDescriptor,
        value: SerialDescriptor,
    ) -> Self {
        Self::from_repr(serial_name, DescriptorRepr::Map { key, value })
    }

    /// Wraps `original` so it also admits an absent value.
    ///
    /// Already nullable descriptors are returned unchanged.
    pub fn nullable(original: SerialDescriptor) -> Self {
        if original.is_nullable() {
            return original;
        }
        let serial_name = format!("{}?", original.serial_name());
        Self::from_repr(serial_name, DescriptorRepr::Nullable { original })
    }

    /// A descriptor without elements.
    pub fn object(serial_name: impl Into<String>) -> Self {
        Self::from_repr(
            serial_name,
            DescriptorRepr::Structural(StructuralDescriptor {
                kind: SerialKind::Object,
                elements: ElementTable::new(
                    Box::default(),
                    Box::default(),
                    Box::default(),
                    Box::default(),
                ),
                element_descriptors: Box::default(),
                type_parameters: Box::default(),
            }),
        )
    }

    /// A tuple: a record whose elements are named by position. The element descriptors
    /// double as its type parameters.
    pub fn tuple(elements: Vec<SerialDescriptor>) -> Self {
        let count = elements.len();
        let names = (0..count).map(|index| index.to_string()).collect();
        Self::from_repr(
            format!("Tuple{count}"),
            DescriptorRepr::Structural(StructuralDescriptor {
                kind: SerialKind::Class,
                elements: ElementTable::new(
                    names,
                    vec![false; count].into_boxed_slice(),
                    vec![None; count].into_boxed_slice(),
                    Box::default(),
                ),
                element_descriptors: elements.clone().into_boxed_slice(),
                type_parameters: elements.into_boxed_slice(),
            }),
        )
    }

    /// A unit-only enum. Every variant becomes an element described by an object descriptor
    /// named `serial_name.variant`.
    pub fn enumeration<S: AsRef<str>>(serial_name: impl Into<String>, variants: &[S]) -> Self {
        let serial_name = serial_name.into();
        let names: Box<[String]> = variants.iter().map(|v| v.as_ref().to_owned()).collect();
        let descriptors = names
            .iter()
            .map(|variant| Self::object(format!("{serial_name}.{variant}")))
            .collect();
        let count = names.len();
        Self::from_repr(
            serial_name,
            DescriptorRepr::Enum(EnumDescriptor {
                elements: ElementTable::new(
                    names,
                    vec![false; count].into_boxed_slice(),
                    vec![None; count].into_boxed_slice(),
                    Box::default(),
                ),
                variants: descriptors,
            }),
        )
    }

    pub fn serial_name(&self) -> &str {
        &self.0.serial_name
    }

    pub fn kind(&self) -> SerialKind {
        match self.repr() {
            DescriptorRepr::Generated(_) => SerialKind::Class,
            DescriptorRepr::Structural(structural) => structural.kind,
            DescriptorRepr::List { .. } => SerialKind::List,
            DescriptorRepr::Map { .. } => SerialKind::Map,
            DescriptorRepr::Nullable { original } => original.kind(),
            DescriptorRepr::Primitive(kind) => SerialKind::Primitive(*kind),
            DescriptorRepr::Enum(_) => SerialKind::Enum,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self.repr(), DescriptorRepr::Nullable { .. })
    }

    /// The descriptor wrapped by a nullable descriptor, or `self`.
    pub fn non_nullable(&self) -> &SerialDescriptor {
        match self.repr() {
            DescriptorRepr::Nullable { original } => original,
            _ => self,
        }
    }

    fn elements(&self) -> Option<&ElementTable> {
        match self.repr() {
            DescriptorRepr::Generated(generated) => Some(&generated.elements),
            DescriptorRepr::Structural(structural) => Some(&structural.elements),
            DescriptorRepr::Enum(enumeration) => Some(&enumeration.elements),
            DescriptorRepr::Nullable { original } => original.elements(),
            DescriptorRepr::List { .. }
            | DescriptorRepr::Map { .. }
            | DescriptorRepr::Primitive(_) => None,
        }
    }

    pub fn elements_count(&self) -> usize {
        match self.repr() {
            DescriptorRepr::List { .. } => 1,
            DescriptorRepr::Map { .. } => 2,
            DescriptorRepr::Nullable { original } => original.elements_count(),
            _ => self.elements().map_or(0, ElementTable::len),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let count = self.elements_count();
        if index < count {
            Ok(())
        } else {
            Err(SchemaError::IndexOutOfRange {
                name: self.serial_name().to_owned(),
                count,
                index,
            })
        }
    }

    /// Name of element `index`. Collections name their elements by position.
    ///
    /// # Errors
    /// Returns [`SchemaError::IndexOutOfRange`] if `index >= elements_count()`.
    pub fn element_name(&self, index: usize) -> Result<&str> {
        self.check_index(index)?;
        Ok(match self.elements() {
            Some(table) => table.names[index].as_str(),
            None => ["0", "1"][index],
        })
    }

    /// Index of the element called `name`, or [`UNKNOWN_NAME`].
    ///
    /// The reverse index is built on first use and kept for the descriptor's lifetime.
    /// If several elements share a name, the last one wins.
    pub fn element_index(&self, name: &str) -> usize {
        self.find_element(name).unwrap_or(UNKNOWN_NAME)
    }

    /// Like [`SerialDescriptor::element_index`], with `None` for unknown names.
    pub fn find_element(&self, name: &str) -> Option<usize> {
        match self.elements() {
            Some(table) => table.index_of(name),
            None => name
                .parse::<usize>()
                .ok()
                .filter(|&index| index < self.elements_count()),
        }
    }

    /// # Errors
    /// Returns [`SchemaError::IndexOutOfRange`] if `index >= elements_count()`.
    pub fn is_element_optional(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        Ok(self.elements().is_some_and(|table| table.optional[index]))
    }

    /// # Errors
    /// Returns [`SchemaError::IndexOutOfRange`] if `index >= elements_count()`.
    pub fn element_annotations(&self, index: usize) -> Result<&[Arc<dyn Annotation>]> {
        self.check_index(index)?;
        Ok(self
            .elements()
            .and_then(|table| table.annotations[index].as_deref())
            .unwrap_or(&NO_ANNOTATIONS[..]))
    }

    /// Descriptor of element `index`.
    ///
    /// Generated records ask their generator on first access, which is what lets a record
    /// contain itself. Walking such a schema is bounded by the data being walked, not by the
    /// schema.
    ///
    /// # Errors
    /// Returns [`SchemaError::IndexOutOfRange`] if `index >= elements_count()`, or if the
    /// record has no generator to resolve children from.
    pub fn element_descriptor(&self, index: usize) -> Result<SerialDescriptor> {
        self.check_index(index)?;
        let resolved = match self.repr() {
            DescriptorRepr::Generated(generated) => generated.child(index),
            DescriptorRepr::Structural(structural) => {
                structural.element_descriptors.get(index).cloned()
            }
            DescriptorRepr::Enum(enumeration) => enumeration.variants.get(index).cloned(),
            DescriptorRepr::List { element } => Some(element.clone()),
            DescriptorRepr::Map { key, value } => {
                Some(if index == 0 { key.clone() } else { value.clone() })
            }
            DescriptorRepr::Nullable { original } => return original.element_descriptor(index),
            DescriptorRepr::Primitive(_) => None,
        };
        resolved.ok_or_else(|| SchemaError::IndexOutOfRange {
            name: self.serial_name().to_owned(),
            count: self.elements_count(),
            index,
        })
    }

    /// Type-level annotations.
    pub fn annotations(&self) -> &[Arc<dyn Annotation>] {
        self.elements()
            .map_or(&NO_ANNOTATIONS[..], |table| &table.class_annotations[..])
    }

    /// First type-level annotation of type `A`.
    pub fn find_annotation<A: Any>(&self) -> Option<&A> {
        find_annotation(self.annotations())
    }

    /// First annotation of type `A` on element `index`.
    ///
    /// # Errors
    /// Returns [`SchemaError::IndexOutOfRange`] if `index >= elements_count()`.
    pub fn find_element_annotation<A: Any>(&self, index: usize) -> Result<Option<&A>> {
        Ok(find_annotation(self.element_annotations(index)?))
    }

    /// Element names in index order.
    pub fn element_names(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.elements_count()).filter_map(move |index| self.element_name(index).ok())
    }

    /// Whether both handles point at the very same descriptor.
    pub fn ptr_eq(&self, other: &SerialDescriptor) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

fn find_annotation<A: Any>(annotations: &[Arc<dyn Annotation>]) -> Option<&A> {
    annotations
        .iter()
        .find_map(|annotation| annotation.downcast_ref::<A>())
}

impl fmt::Display for SerialDescriptor {
    /// `name(element: childName, ...)`. Children are printed by name only, so recursive
    /// schemas print finitely.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.serial_name())?;
        for index in 0..self.elements_count() {
            if index > 0 {
                f.write_str(", ")?;
            }
            let name = self.element_name(index).unwrap_or("?");
            match self.element_descriptor(index) {
                Ok(child) => write!(f, "{}: {}", name, child.serial_name())?,
                Err(_) => write!(f, "{}: ?", name)?,
            }
        }
        f.write_str(")")
    }
}

impl fmt::Debug for SerialDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialDescriptor")
            .field("serial_name", &self.serial_name())
            .field("kind", &self.kind())
            .field("nullable", &self.is_nullable())
            .field("elements", &self.element_names().collect::<Vec<_>>())
            .finish()
    }
}
