#![allow(dead_code)]

use std::sync::Arc;
use std::thread;

use senax_schema::{
    Describe, DescriptorBuilder, DescriptorRegistry, FnDescriptorGenerator, SerialDescriptor,
    SerialKind,
};

#[derive(Describe)]
struct Tree<T> {
    value: T,
    children: Vec<Tree<T>>,
}

#[test]
fn test_descriptor_of_caches_per_type() {
    let registry = DescriptorRegistry::new();
    let first = registry.descriptor_of::<Tree<u8>>();
    let second = registry.descriptor_of::<Tree<u8>>();
    assert!(first.ptr_eq(&second));

    let other = registry.descriptor_of::<Tree<String>>();
    assert!(!first.ptr_eq(&other));
    assert_ne!(first, other);
    assert_eq!(registry.cached_types(), 2);
}

#[test]
fn test_intern_deduplicates_equal_descriptors() {
    let registry = DescriptorRegistry::new();
    let first = registry.intern(Tree::<u8>::descriptor());
    let second = registry.intern(Tree::<u8>::descriptor());
    assert!(first.ptr_eq(&second));

    let list = registry.intern(Vec::<u8>::descriptor());
    assert!(!list.ptr_eq(&first));
    assert_eq!(registry.interned_len(), 2);
}

/// A record whose serial name and type parameters match `Vec<i32>`.
fn record_named_vec() -> SerialDescriptor {
    let generator = FnDescriptorGenerator::new(
        || vec![i32::descriptor()],
        || vec![i32::descriptor()],
    );
    let mut builder = DescriptorBuilder::generated("Vec", 1, generator);
    builder.add_element("item", false).unwrap();
    builder.build().unwrap()
}

#[test]
fn test_intern_keeps_one_sided_matches_apart() {
    // Record first, then list.
    let registry = DescriptorRegistry::new();
    let record = registry.intern(record_named_vec());
    let list = registry.intern(Vec::<i32>::descriptor());
    assert_eq!(record.kind(), SerialKind::Class);
    assert_eq!(list.kind(), SerialKind::List);
    assert_eq!(registry.interned_len(), 2);

    // List first, then record.
    let registry = DescriptorRegistry::new();
    let list = registry.intern(Vec::<i32>::descriptor());
    let record = registry.intern(record_named_vec());
    assert_eq!(list.kind(), SerialKind::List);
    assert_eq!(record.kind(), SerialKind::Class);
    assert_eq!(record.element_name(0), Ok("item"));
    assert_eq!(registry.interned_len(), 2);

    // Both still dedup against their own kind.
    assert!(registry.intern(Vec::<i32>::descriptor()).ptr_eq(&list));
    assert!(registry.intern(record_named_vec()).ptr_eq(&record));
    assert_eq!(registry.interned_len(), 2);
}

#[test]
fn test_global_registry() {
    let first = DescriptorRegistry::global().descriptor_of::<Tree<i16>>();
    let second = DescriptorRegistry::global().descriptor_of::<Tree<i16>>();
    assert!(first.ptr_eq(&second));
}

#[test]
fn test_concurrent_lookups_agree() {
    let registry = Arc::new(DescriptorRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || registry.descriptor_of::<Tree<u64>>())
        })
        .collect();
    let descriptors: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    for descriptor in &descriptors {
        assert!(descriptor.ptr_eq(&descriptors[0]));
        assert_eq!(descriptor.element_index("children"), 1);
    }
    assert_eq!(registry.cached_types(), 1);
}
