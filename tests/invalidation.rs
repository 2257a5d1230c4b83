use json_overlay::{Document, ErrorKind, HighWaterMark};
use rstest::rstest;
use serde_json::json;

fn doc(input: &str) -> Document {
    Document::parse_str(input).expect("valid json")
}

#[rstest]
fn replacing_a_container_invalidates_views_into_it() {
    let doc = doc(r#"{"a":{"b":1}}"#);
    let root = doc.root();
    let child = root.get_property("a").unwrap();
    root.get_property("a").unwrap().set(json!({"b": 2})).unwrap();

    assert_eq!(child.value_kind().unwrap_err().kind(), ErrorKind::StaleView);
    assert_eq!(child.get_property("b").unwrap_err().kind(), ErrorKind::StaleView);
    assert_eq!(child.set(3).unwrap_err().kind(), ErrorKind::StaleView);
    assert_eq!(child.to_json_string().unwrap_err().kind(), ErrorKind::StaleView);

    let fresh = doc.root().get_property("a").unwrap();
    assert_eq!(fresh.get_property("b").unwrap().get_i32().unwrap(), 2);
}

#[rstest]
fn stale_errors_carry_the_view_path() {
    let doc = doc(r#"{"a":{"b":{"c":1}}}"#);
    let c = doc.select("a.b.c").unwrap();
    doc.select("a").unwrap().set(0).unwrap();
    let err = c.get_i32().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StaleView);
    assert_eq!(err.path(), ".a.b.c");
}

#[rstest]
fn removing_an_ancestor_invalidates_descendants() {
    let doc = doc(r#"{"a":{"b":1},"z":0}"#);
    let b = doc.select("a.b").unwrap();
    doc.root().remove_property("a").unwrap();
    assert_eq!(b.get_i32().unwrap_err().kind(), ErrorKind::StaleView);
}

#[rstest]
fn removed_view_itself_is_stale() {
    let doc = doc(r#"{"a":1}"#);
    let a = doc.root().get_property("a").unwrap();
    doc.root().remove_property("a").unwrap();
    assert_eq!(a.get_i32().unwrap_err().kind(), ErrorKind::StaleView);
}

#[rstest]
fn sibling_and_descendant_writes_do_not_invalidate() {
    let doc = doc(r#"{"a":{"b":1},"x":2}"#);
    let a = doc.root().get_property("a").unwrap();
    doc.root().get_property("x").unwrap().set(3).unwrap();
    doc.select("a.b").unwrap().set(4).unwrap();
    doc.root().set_property("y", 5).unwrap();

    assert_eq!(a.get_property("b").unwrap().get_i32().unwrap(), 4);
    assert_eq!(a.to_json_string().unwrap(), r#"{"b":4}"#);
}

#[rstest]
fn views_of_a_replaced_root_are_stale() {
    let doc = doc(r#"{"a":1}"#);
    let old_root = doc.root();
    let a = old_root.get_property("a").unwrap();
    old_root.set(json!([1])).unwrap();

    assert_eq!(old_root.value_kind().unwrap_err().kind(), ErrorKind::StaleView);
    assert_eq!(a.get_i32().unwrap_err().kind(), ErrorKind::StaleView);
    assert_eq!(doc.root().get_index(0).unwrap().get_i32().unwrap(), 1);
}

#[rstest]
fn views_below_a_replacement_see_later_writes() {
    let doc = doc(r#"{"a":{"b":1}}"#);
    doc.select("a").unwrap().set(json!({"b": {"c": 1}})).unwrap();
    let c = doc.select("a.b.c").unwrap();
    c.set(2).unwrap();
    assert_eq!(c.get_i32().unwrap(), 2);
    assert_eq!(doc.to_json_string().unwrap(), r#"{"a":{"b":{"c":2}}}"#);

    doc.select("a").unwrap().set(json!({"b": {"c": 9}})).unwrap();
    assert_eq!(c.get_i32().unwrap_err().kind(), ErrorKind::StaleView);
    assert_eq!(doc.select("a.b.c").unwrap().get_i32().unwrap(), 9);
}

#[rstest]
fn pinned_views_ignore_later_changes() {
    let doc = doc(r#"{"a":{"b":1},"n":1}"#);
    let pinned = doc.root().pin();
    assert_eq!(pinned.high_water_mark(), HighWaterMark::Pinned(0));

    doc.select("n").unwrap().set(2).unwrap();
    doc.select("a").unwrap().set("gone").unwrap();
    doc.root().set_property("extra", true).unwrap();

    assert_eq!(pinned.get_property("n").unwrap().get_i32().unwrap(), 1);
    let b = pinned.select("a.b").unwrap();
    assert_eq!(b.get_i32().unwrap(), 1);
    assert_eq!(b.high_water_mark(), HighWaterMark::Pinned(0));
    assert!(pinned.try_get_property("extra").unwrap().is_none());
    assert_eq!(pinned.to_json_string().unwrap(), r#"{"a":{"b":1},"n":1}"#);
    assert_eq!(
        doc.to_json_string().unwrap(),
        r#"{"a":"gone","n":2,"extra":true}"#
    );
}

#[rstest]
fn pin_observes_changes_made_before_it() {
    let doc = doc(r#"{"n":1}"#);
    doc.select("n").unwrap().set(2).unwrap();
    let pinned = doc.root().pin();
    doc.select("n").unwrap().set(3).unwrap();
    assert_eq!(pinned.select("n").unwrap().get_i32().unwrap(), 2);
    assert_eq!(pinned.high_water_mark(), HighWaterMark::Pinned(1));
}
