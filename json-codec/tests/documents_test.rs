use trellis4rs_core::schema::prelude::DOCUMENT;
use trellis4rs_core::schema::{Document, ShapeId, TypeRegistry};
use trellis4rs_json_codec::{from_str, to_string};
use trellis4rs_test_utils::shapes::{Person, PersonBuilder};

fn ada() -> Person {
    Person {
        name: "Ada".to_string(),
        age: 36,
        email: None,
    }
}

#[test]
fn typed_documents_carry_a_type_field() {
    let document = Document::of_shape(&ada()).unwrap();
    let json = to_string(&DOCUMENT, &document).unwrap();
    assert_eq!(
        json,
        r#"{"__type":"test#Person","name":"Ada","age":36}"#
    );
}

#[test]
fn untyped_documents_round_trip() {
    let json = r#"{"flag":true,"count":3,"items":["a","b"],"nested":{"pi":3.5}}"#;
    let document: Document = from_str(&DOCUMENT, json).unwrap();
    assert_eq!(
        document.get_member("flag").and_then(Document::as_bool),
        Some(true)
    );
    assert_eq!(
        document.get_member("count").and_then(Document::as_integer),
        Some(3)
    );
    assert_eq!(document.get_member("items").unwrap().size(), 2);
    assert_eq!(
        document
            .get_member("nested")
            .and_then(|nested| nested.get_member("pi"))
            .and_then(Document::as_double),
        Some(3.5)
    );

    let rewritten = to_string(&DOCUMENT, &document).unwrap();
    let reparsed: Document = from_str(&DOCUMENT, &rewritten).unwrap();
    assert_eq!(reparsed, document);
}

#[test]
fn documents_deserialize_through_the_registry() {
    let registry = TypeRegistry::builder()
        .put::<Person>(ShapeId::from("test#Person"), PersonBuilder::supplier)
        .build();

    let document = Document::of_shape(&ada()).unwrap();
    let json = to_string(&DOCUMENT, &document).unwrap();
    let decoded: Document = from_str(&DOCUMENT, &json).unwrap();

    let shape = registry.deserialize(&decoded).unwrap();
    let person = shape.downcast_ref::<Person>().expect("expected a Person");
    assert_eq!(person, &ada());
}

#[test]
fn strict_registry_deserialization_requires_members() {
    let registry = TypeRegistry::builder()
        .put::<Person>(ShapeId::from("test#Person"), PersonBuilder::supplier)
        .build();

    let decoded: Document = from_str(&DOCUMENT, r#"{"__type":"test#Person","name":"Ada"}"#).unwrap();
    assert!(registry.deserialize_strict(&decoded).is_err());

    // Error correction zero-fills the missing required member instead.
    let shape = registry.deserialize(&decoded).unwrap();
    let person = shape.downcast_ref::<Person>().expect("expected a Person");
    assert_eq!(person.age, 0);
}
