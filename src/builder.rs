use std::sync::{Arc, OnceLock};

use log::{debug, trace};

use crate::descriptor::{
    Annotation, DescriptorGenerator, DescriptorRepr, ElementTable, GeneratedDescriptor,
    StructuralDescriptor,
};
use crate::{Result, SchemaError, SerialDescriptor, SerialKind};

/// Where the finished descriptor takes its children from.
enum ChildSource {
    /// Resolved on demand through the generator. Children of a descriptor without a generator
    /// cannot be resolved at all.
    Generated(Option<Arc<dyn DescriptorGenerator>>),
    /// Given up front, one per element.
    Explicit {
        kind: SerialKind,
        elements: Vec<SerialDescriptor>,
        type_parameters: Vec<SerialDescriptor>,
    },
}

/// Two-phase descriptor construction.
///
/// The element count is fixed up front. Elements are then added one at a time in index
/// order, each optionally followed by annotations for it. Class annotations may be pushed at
/// any point. Driving the builder past its declared shape fails with
/// [`SchemaError::BuilderOveruse`] instead of corrupting the element tables.
///
/// # Example
/// ```rust
/// use senax_schema::{DescriptorBuilder, FnDescriptorGenerator, Describe};
///
/// let generator = FnDescriptorGenerator::new(
///     || vec![u32::descriptor(), String::descriptor()],
///     Vec::new,
/// );
/// let mut builder = DescriptorBuilder::generated("app.User", 2, generator);
/// builder.add_element("id", false)?;
/// builder.add_element("name", true)?;
/// let descriptor = builder.build()?;
///
/// assert_eq!(descriptor.element_index("name"), 1);
/// assert_eq!(descriptor.element_descriptor(0)?.serial_name(), "u32");
/// # Ok::<(), senax_schema::SchemaError>(())
/// ```
pub struct DescriptorBuilder {
    serial_name: String,
    elements_count: usize,
    names: Vec<String>,
    optional: Vec<bool>,
    annotations: Vec<Option<Vec<Arc<dyn Annotation>>>>,
    class_annotations: Option<Vec<Arc<dyn Annotation>>>,
    children: ChildSource,
}

impl DescriptorBuilder {
    /// A record builder without a generator. The resulting descriptor knows its elements'
    /// names but cannot resolve their descriptors.
    pub fn new(serial_name: impl Into<String>, elements_count: usize) -> Self {
        Self::with_children(serial_name, elements_count, ChildSource::Generated(None))
    }

    /// A record builder whose children and type parameters come from `generator`.
    pub fn generated(
        serial_name: impl Into<String>,
        elements_count: usize,
        generator: impl DescriptorGenerator + 'static,
    ) -> Self {
        Self::with_children(
            serial_name,
            elements_count,
            ChildSource::Generated(Some(Arc::new(generator))),
        )
    }

    /// A hand-assembled descriptor of `kind`. Every element is added with
    /// [`DescriptorBuilder::add_element_descriptor`].
    pub fn structural(
        serial_name: impl Into<String>,
        kind: SerialKind,
        elements_count: usize,
    ) -> Self {
        Self::with_children(
            serial_name,
            elements_count,
            ChildSource::Explicit {
                kind,
                elements: Vec::with_capacity(elements_count),
                type_parameters: Vec::new(),
            },
        )
    }

    fn with_children(
        serial_name: impl Into<String>,
        elements_count: usize,
        children: ChildSource,
    ) -> Self {
        DescriptorBuilder {
            serial_name: serial_name.into(),
            elements_count,
            names: Vec::with_capacity(elements_count),
            optional: Vec::with_capacity(elements_count),
            annotations: Vec::with_capacity(elements_count),
            class_annotations: None,
            children,
        }
    }

    fn overuse(&self, reason: &'static str) -> SchemaError {
        debug!("Descriptor builder misuse for {}: {}", self.serial_name, reason);
        SchemaError::BuilderOveruse {
            name: self.serial_name.clone(),
            reason,
        }
    }

    fn push_element(&mut self, name: String, is_optional: bool) -> Result<()> {
        if self.names.len() >= self.elements_count {
            return Err(self.overuse("more elements added than declared"));
        }
        self.names.push(name);
        self.optional.push(is_optional);
        self.annotations.push(None);
        Ok(())
    }

    /// Appends the next element of a record built through a generator.
    ///
    /// # Errors
    /// [`SchemaError::BuilderOveruse`] if all declared elements were already added, or if this
    /// is a structural builder.
    pub fn add_element(&mut self, name: impl Into<String>, is_optional: bool) -> Result<()> {
        if matches!(self.children, ChildSource::Explicit { .. }) {
            return Err(self.overuse("structural descriptors need an element descriptor"));
        }
        self.push_element(name.into(), is_optional)
    }

    /// Appends the next element of a structural descriptor together with its descriptor.
    ///
    /// # Errors
    /// [`SchemaError::BuilderOveruse`] if all declared elements were already added, or if this
    /// builder resolves children through a generator.
    pub fn add_element_descriptor(
        &mut self,
        name: impl Into<String>,
        descriptor: SerialDescriptor,
        is_optional: bool,
    ) -> Result<()> {
        if !matches!(self.children, ChildSource::Explicit { .. }) {
            return Err(self.overuse(
                "generated descriptors resolve children through their generator",
            ));
        }
        self.push_element(name.into(), is_optional)?;
        if let ChildSource::Explicit { elements, .. } = &mut self.children {
            elements.push(descriptor);
        }
        Ok(())
    }

    /// Sets the generic arguments of a structural descriptor.
    ///
    /// # Errors
    /// [`SchemaError::BuilderOveruse`] on a generated builder; its generator owns them.
    pub fn type_parameters(&mut self, descriptors: Vec<SerialDescriptor>) -> Result<()> {
        if let ChildSource::Explicit {
            type_parameters, ..
        } = &mut self.children
        {
            *type_parameters = descriptors;
            return Ok(());
        }
        Err(self.overuse(
            "generated descriptors take type parameters from their generator",
        ))
    }

    /// Attaches `annotation` to the most recently added element.
    ///
    /// # Errors
    /// [`SchemaError::BuilderOveruse`] if no element was added yet.
    pub fn push_annotation(&mut self, annotation: impl Annotation) -> Result<()> {
        if self.annotations.is_empty() {
            return Err(self.overuse("annotation pushed before any element"));
        }
        if let Some(slot) = self.annotations.last_mut() {
            slot.get_or_insert_with(|| Vec::with_capacity(1))
                .push(Arc::new(annotation));
        }
        Ok(())
    }

    /// Attaches `annotation` to the type itself.
    pub fn push_class_annotation(&mut self, annotation: impl Annotation) {
        self.class_annotations
            .get_or_insert_with(|| Vec::with_capacity(1))
            .push(Arc::new(annotation));
    }

    /// Publishes the descriptor.
    ///
    /// # Errors
    /// [`SchemaError::IncompleteDescriptor`] if fewer elements were added than declared.
    pub fn build(self) -> Result<SerialDescriptor> {
        if self.names.len() != self.elements_count {
            return Err(SchemaError::IncompleteDescriptor {
                name: self.serial_name,
                expected: self.elements_count,
                actual: self.names.len(),
            });
        }
        let elements = ElementTable::new(
            self.names.into_boxed_slice(),
            self.optional.into_boxed_slice(),
            self.annotations
                .into_iter()
                .map(|list| list.map(Vec::into_boxed_slice))
                .collect(),
            self.class_annotations
                .map(Vec::into_boxed_slice)
                .unwrap_or_default(),
        );
        let repr = match self.children {
            ChildSource::Generated(generator) => DescriptorRepr::Generated(GeneratedDescriptor {
                elements,
                generator,
                children: OnceLock::new(),
                type_parameters: OnceLock::new(),
            }),
            ChildSource::Explicit {
                kind,
                elements: element_descriptors,
                type_parameters,
            } => DescriptorRepr::Structural(StructuralDescriptor {
                kind,
                elements,
                element_descriptors: element_descriptors.into_boxed_slice(),
                type_parameters: type_parameters.into_boxed_slice(),
            }),
        };
        trace!(
            "Built descriptor {} with {} elements",
            self.serial_name,
            self.elements_count
        );
        Ok(SerialDescriptor::from_repr(self.serial_name, repr))
    }
}
