use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use json_overlay::{ChangeKind, Document, ErrorKind, Value};
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

fn doc(input: &str) -> Document {
    Document::parse_str(input).expect("valid json")
}

#[rstest]
fn nested_write_is_visible_after_renavigation() {
    let doc = doc(r#"{"a":1,"b":{"c":2}}"#);
    doc.root()
        .get_property("b")
        .unwrap()
        .get_property("c")
        .unwrap()
        .set(5)
        .unwrap();

    let root = doc.root();
    let c = root.get_property("b").unwrap().get_property("c").unwrap();
    assert_eq!(c.get_i32().unwrap(), 5);
    assert_eq!(doc.to_json_string().unwrap(), r#"{"a":1,"b":{"c":5}}"#);
}

#[rstest]
fn added_property_is_enumerated_last() {
    let doc = doc(r#"{"a":1}"#);
    let root = doc.root();
    root.set_property("z", "hi").unwrap();

    let properties: Vec<(String, serde_json::Value)> = root
        .enumerate_object()
        .unwrap()
        .map(|property| {
            let (name, value) = property.into_parts();
            (name.to_string(), value.to_value().unwrap())
        })
        .collect();
    assert_eq!(
        properties,
        [("a".to_string(), json!(1)), ("z".to_string(), json!("hi"))]
    );
}

#[rstest]
fn additions_keep_first_add_order() {
    let doc = doc(r#"{"a":1,"b":2}"#);
    let root = doc.root();
    root.set_property("x", 1).unwrap();
    root.set_property("y", 2).unwrap();
    root.set_property("x", 3).unwrap();

    let names: Vec<String> = root
        .enumerate_object()
        .unwrap()
        .map(|property| property.name().to_string())
        .collect();
    assert_eq!(names, ["a", "b", "x", "y"]);
    assert_eq!(doc.to_json_string().unwrap(), r#"{"a":1,"b":2,"x":3,"y":2}"#);
}

#[rstest]
fn setting_an_existing_property_records_a_modification() {
    let doc = doc(r#"{"a":1}"#);
    doc.root().set_property("a", 2).unwrap();
    let history = doc.changes().history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind(), ChangeKind::Modification);
    assert_eq!(history[0].path(), ".a");
    assert_eq!(history[0].sequence_index(), 1);
}

#[rstest]
fn removal_hides_the_property() {
    let doc = doc(r#"{"a":1,"b":2}"#);
    let root = doc.root();
    root.remove_property("a").unwrap();

    assert!(root.try_get_property("a").unwrap().is_none());
    let names: Vec<String> = root
        .enumerate_object()
        .unwrap()
        .map(|property| property.name().to_string())
        .collect();
    assert_eq!(names, ["b"]);
    assert_eq!(doc.to_json_string().unwrap(), r#"{"b":2}"#);
}

#[rstest]
#[case::absent(r#"{"a":1}"#, "missing")]
#[case::not_an_original(r#"{"a":1}"#, "added")]
fn removal_requires_an_original_property(#[case] input: &str, #[case] name: &str) {
    let doc = doc(input);
    let root = doc.root();
    root.set_property("added", true).unwrap();
    let err = root.remove_property(name).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRemoval);
}

#[rstest]
fn removing_twice_is_rejected() {
    let doc = doc(r#"{"a":1}"#);
    let root = doc.root();
    root.remove_property("a").unwrap();
    let err = root.remove_property("a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRemoval);
    assert_eq!(err.path(), "");
}

#[rstest]
fn readded_original_keeps_its_position() {
    let doc = doc(r#"{"a":1,"b":2}"#);
    let root = doc.root();
    root.remove_property("a").unwrap();
    root.set_property("a", 3).unwrap();
    assert_eq!(doc.to_json_string().unwrap(), r#"{"a":3,"b":2}"#);
    assert_eq!(root.get_property("a").unwrap().get_i32().unwrap(), 3);
}

#[rstest]
fn explicit_null_is_kept() {
    let doc = doc(r#"{"a":1}"#);
    let a = doc.root().get_property("a").unwrap();
    a.set(Value::Null).unwrap();

    assert_eq!(a.try_get_i32().unwrap(), None);
    assert_eq!(a.get_i32().unwrap_err().kind(), ErrorKind::TypeMismatch);
    assert_eq!(doc.to_json_string().unwrap(), r#"{"a":null}"#);

    a.set(None::<i32>).unwrap();
    assert_eq!(doc.changes().len(), 2);
}

#[rstest]
fn scalar_element_can_be_written_repeatedly() {
    let doc = doc(r#"{"a":1}"#);
    let a = doc.root().get_property("a").unwrap();
    a.set(2).unwrap();
    assert_eq!(a.get_i32().unwrap(), 2);
    a.set(json!({"x": true})).unwrap();
    assert!(a.get_property("x").unwrap().get_bool().unwrap());
    a.set("done").unwrap();
    assert_eq!(a.get_string().unwrap().as_deref(), Some("done"));
}

#[rstest]
fn natives_are_written_in_json_form() {
    let doc = doc(r#"{"items":[0,0,0,0,0,0]}"#);
    let items = doc.select("items").unwrap();
    let when: DateTime<Utc> = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
        .unwrap()
        .with_timezone(&Utc);
    let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();

    items.get_index(0).unwrap().set(u64::MAX).unwrap();
    items.get_index(1).unwrap().set(-1.5f64).unwrap();
    items.get_index(2).unwrap().set(BigDecimal::from_str("10.25").unwrap()).unwrap();
    items.get_index(3).unwrap().set(when).unwrap();
    items.get_index(4).unwrap().set(id).unwrap();
    items.get_index(5).unwrap().set(f64::NAN).unwrap();

    assert_eq!(
        items.to_json_string().unwrap(),
        r#"[18446744073709551615,-1.5,10.25,"2024-01-02T03:04:05Z","67e55044-10b1-426f-9247-bb680e5fe0c8",null]"#
    );
    assert_eq!(items.get_index(3).unwrap().get_date_time().unwrap(), when);
    assert_eq!(items.get_index(4).unwrap().get_uuid().unwrap(), id);
    assert_eq!(items.get_index(0).unwrap().get_u64().unwrap(), u64::MAX);
}

#[rstest]
fn logged_native_is_read_back_through_other_widths() {
    let doc = doc(r#"{"a":0}"#);
    let a = doc.root().get_property("a").unwrap();
    a.set(300i64).unwrap();
    assert_eq!(a.get_i16().unwrap(), 300);
    assert_eq!(a.try_get_u8().unwrap(), None);
    assert_eq!(a.get_u8().unwrap_err().kind(), ErrorKind::Format);
}

#[rstest]
fn array_element_replacement() {
    let doc = doc("[1,2,3]");
    doc.root().get_index(1).unwrap().set("two").unwrap();
    let values: Vec<serde_json::Value> = doc
        .root()
        .enumerate_array()
        .unwrap()
        .map(|element| element.to_value().unwrap())
        .collect();
    assert_eq!(values, [json!(1), json!("two"), json!(3)]);
}

#[rstest]
fn set_to_same_value_keeps_content() {
    let input = r#"{"a":1,"b":[true,null]}"#;
    let doc = doc(input);
    doc.root().get_property("a").unwrap().set(1).unwrap();
    assert_eq!(doc.to_json_string().unwrap(), input);
}
