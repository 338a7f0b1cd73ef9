#![allow(dead_code)]

use std::time::Instant;

use senax_schema::proto::{ProtoIntegerType, ProtoNumber, ProtoPacked, ProtoType};
use senax_schema::{Describe, PrimitiveKind, SerialKind, UNKNOWN_NAME};

#[derive(Debug, PartialEq)]
struct Doc(&'static str);

// =============================================================================
// Field attributes
// =============================================================================

#[derive(Describe)]
#[describe(annotate = Doc("an account"))]
struct Account {
    #[describe(id = 1)]
    id: u64,
    #[describe(id = 2, rename = "display_name")]
    name: String,
    #[describe(id = 3, default)]
    score: i32,
    #[describe(id = 4)]
    nickname: Option<String>,
    #[describe(id = 5, signed)]
    balance: i64,
    #[describe(id = 6, fixed, packed)]
    samples: Vec<u32>,
    #[describe(skip)]
    last_seen: Instant,
    #[describe(annotate = Doc("free text"))]
    note: String,
}

#[test]
fn test_struct_elements() {
    let account = Account::descriptor();
    assert_eq!(account.kind(), SerialKind::Class);
    assert_eq!(account.serial_name(), format!("{}::Account", module_path!()));
    assert_eq!(
        account.element_names().collect::<Vec<_>>(),
        vec!["id", "display_name", "score", "nickname", "balance", "samples", "note"]
    );
    assert_eq!(account.element_index("name"), UNKNOWN_NAME);
    assert_eq!(account.element_index("last_seen"), UNKNOWN_NAME);
}

#[test]
fn test_optional_elements() {
    let account = Account::descriptor();
    let optional: Vec<bool> = (0..account.elements_count())
        .map(|index| account.is_element_optional(index).unwrap())
        .collect();
    assert_eq!(optional, vec![false, false, true, true, false, false, false]);
}

#[test]
fn test_element_descriptors() {
    let account = Account::descriptor();
    assert_eq!(account.element_descriptor(0).unwrap(), u64::descriptor());
    assert_eq!(
        account.element_descriptor(3).unwrap(),
        Option::<String>::descriptor()
    );
    let samples = account.element_descriptor(5).unwrap();
    assert_eq!(samples.kind(), SerialKind::List);
    assert_eq!(
        samples.element_descriptor(0).unwrap().kind(),
        SerialKind::Primitive(PrimitiveKind::U32)
    );
}

#[test]
fn test_proto_annotations() {
    let account = Account::descriptor();
    assert_eq!(
        account.find_element_annotation::<ProtoNumber>(1),
        Ok(Some(&ProtoNumber(2)))
    );
    assert_eq!(
        account.find_element_annotation::<ProtoType>(4),
        Ok(Some(&ProtoType(ProtoIntegerType::Signed)))
    );
    assert_eq!(
        account.find_element_annotation::<ProtoType>(5),
        Ok(Some(&ProtoType(ProtoIntegerType::Fixed)))
    );
    assert_eq!(
        account.find_element_annotation::<ProtoPacked>(5),
        Ok(Some(&ProtoPacked))
    );
    assert_eq!(account.find_element_annotation::<ProtoPacked>(4), Ok(None));
    // Attribute order is kept.
    let samples = account.element_annotations(5).unwrap();
    assert!(samples[0].is::<ProtoNumber>());
    assert!(samples[1].is::<ProtoType>());
    assert!(samples[2].is::<ProtoPacked>());
}

#[test]
fn test_custom_annotations() {
    let account = Account::descriptor();
    assert_eq!(account.find_annotation::<Doc>(), Some(&Doc("an account")));
    assert_eq!(
        account.find_element_annotation::<Doc>(6),
        Ok(Some(&Doc("free text")))
    );
    assert!(account.find_element_annotation::<ProtoNumber>(6).unwrap().is_none());
}

// =============================================================================
// Container attributes and shapes
// =============================================================================

#[derive(Describe)]
#[describe(rename = "app.Point")]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Describe)]
struct Meters(f64, #[describe(default)] std::option::Option<u8>);

#[derive(Describe)]
struct Marker;

mod inner {
    use senax_schema::Describe;

    #[derive(Describe)]
    pub struct Item {
        pub value: u8,
    }
}

#[test]
fn test_container_rename() {
    let point = Point::descriptor();
    assert_eq!(point.serial_name(), "app.Point");
    assert_eq!(point.to_string(), "app.Point(x: f64, y: f64)");
}

#[test]
fn test_tuple_struct() {
    let meters = Meters::descriptor();
    assert_eq!(meters.element_names().collect::<Vec<_>>(), vec!["0", "1"]);
    assert_eq!(meters.is_element_optional(0), Ok(false));
    assert_eq!(meters.is_element_optional(1), Ok(true));
    assert!(meters.element_descriptor(1).unwrap().is_nullable());
}

#[test]
fn test_unit_struct() {
    let marker = Marker::descriptor();
    assert_eq!(marker.kind(), SerialKind::Class);
    assert_eq!(marker.elements_count(), 0);
    assert!(marker.type_parameters().is_empty());
}

#[test]
fn test_serial_name_follows_module_path() {
    assert_eq!(
        inner::Item::descriptor().serial_name(),
        format!("{}::inner::Item", module_path!())
    );
}

// =============================================================================
// Generics
// =============================================================================

#[derive(Describe)]
struct Envelope<K, V> {
    key: K,
    entries: Vec<(K, V)>,
    previous: Option<Box<Envelope<K, V>>>,
}

#[test]
fn test_generic_type_parameters() {
    let envelope = Envelope::<String, u16>::descriptor();
    let parameters = envelope.type_parameters();
    assert_eq!(parameters.len(), 2);
    assert_eq!(parameters[0], String::descriptor());
    assert_eq!(parameters[1], u16::descriptor());

    let entries = envelope.element_descriptor(1).unwrap();
    let entry = entries.element_descriptor(0).unwrap();
    assert_eq!(entry.serial_name(), "Tuple2");
    assert_eq!(entry.element_descriptor(1).unwrap(), u16::descriptor());

    let previous = envelope.element_descriptor(2).unwrap();
    assert_eq!(*previous.non_nullable(), envelope);
}

// =============================================================================
// Enums
// =============================================================================

#[derive(Describe)]
enum Status {
    Active,
    #[describe(rename = "off")]
    Inactive,
    Banned,
}

#[derive(Describe)]
#[describe(rename = "app.Empty")]
enum Never {}

#[test]
fn test_unit_enum() {
    let status = Status::descriptor();
    assert_eq!(status.kind(), SerialKind::Enum);
    assert_eq!(
        status.element_names().collect::<Vec<_>>(),
        vec!["Active", "off", "Banned"]
    );
    assert_eq!(status.element_index("off"), 1);
    assert_eq!(status.element_index("Inactive"), UNKNOWN_NAME);
    assert_eq!(
        status.element_descriptor(2).unwrap().serial_name(),
        format!("{}::Status.Banned", module_path!())
    );
}

#[test]
fn test_empty_enum() {
    let never = Never::descriptor();
    assert_eq!(never.serial_name(), "app.Empty");
    assert_eq!(never.elements_count(), 0);
}
