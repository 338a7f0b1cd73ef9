use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::{OnceLock, PoisonError, RwLock};

use log::trace;

use crate::{Describe, SerialDescriptor};

/// Owns descriptors for the lifetime of the process (or of the registry).
///
/// - [`DescriptorRegistry::descriptor_of`] caches one descriptor per Rust type, so repeated
///   lookups hand out the same shared descriptor and equality hits the identity fast path.
/// - [`DescriptorRegistry::intern`] deduplicates structurally equal descriptors that were
///   built independently. Two descriptors are merged only if each equals the other, so a record
///   and a list that happen to share name and type parameters stay distinct.
///
/// Descriptors are built outside the locks, so a `Describe` impl may itself consult the
/// registry.
/// Interning key. Descriptor equality depends on which side is asked, so the key requires
/// both directions to agree.
struct InternKey(SerialDescriptor);

impl PartialEq for InternKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && other.0 == self.0
    }
}

impl Eq for InternKey {}

impl Hash for InternKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[derive(Default)]
pub struct DescriptorRegistry {
    by_type: RwLock<HashMap<TypeId, SerialDescriptor>>,
    interned: RwLock<HashSet<InternKey>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static DescriptorRegistry {
        static GLOBAL: OnceLock<DescriptorRegistry> = OnceLock::new();
        GLOBAL.get_or_init(DescriptorRegistry::new)
    }

    /// The cached descriptor of `T`, built on first request.
    ///
    /// Two threads racing on the first request may both build it; only one result is kept and
    /// both callers receive that one.
    pub fn descriptor_of<T: Describe + ?Sized + 'static>(&self) -> SerialDescriptor {
        let type_id = TypeId::of::<T>();
        if let Some(descriptor) = self
            .by_type
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
        {
            return descriptor.clone();
        }
        let built = T::descriptor();
        trace!("Caching descriptor {}", built.serial_name());
        self.by_type
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(type_id)
            .or_insert(built)
            .clone()
    }

    /// Returns the registered descriptor equal to `descriptor`, registering it if there is none.
    pub fn intern(&self, descriptor: SerialDescriptor) -> SerialDescriptor {
        let key = InternKey(descriptor);
        if let Some(existing) = self
            .interned
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            trace!("Reusing interned descriptor {}", existing.0.serial_name());
            return existing.0.clone();
        }
        let mut interned = self
            .interned
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match interned.get(&key) {
            Some(existing) => existing.0.clone(),
            None => {
                let descriptor = key.0.clone();
                interned.insert(key);
                descriptor
            }
        }
    }

    /// Number of Rust types with a cached descriptor.
    pub fn cached_types(&self) -> usize {
        self.by_type
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of distinct interned descriptors.
    pub fn interned_len(&self) -> usize {
        self.interned
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
