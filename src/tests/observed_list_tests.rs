//! 观察列表测试

use super::{row_texts, text_rows};
use crate::binding::DataObject;
use crate::controls::{ObservedList, RowFactory, RowHook, RowOrigin, PLACEHOLDER_CLASS};
use crate::dom::{Dom, NodeId};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::rc::Rc;

fn attached(items: Vec<Value>) -> (Dom, NodeId, ObservedList) {
    let dom = Dom::new();
    let body = dom.create_element("tbody");
    dom.append_child(dom.root(), body).unwrap();
    let list = ObservedList::from_items(items);
    list.attach(&dom, body, text_rows(), None);
    (dom, body, list)
}

#[test]
fn test_append_renders_one_row_and_keeps_others() {
    let (dom, body, list) = attached(vec![json!("a"), json!("b")]);
    let before = dom.children(body);
    list.append(json!("c"));
    let after = dom.children(body);
    assert_eq!(&after[..2], &before[..]);
    assert_eq!(row_texts(&dom, body), vec!["a", "b", "c"]);
    assert_eq!(list.len(), 3);
    assert_eq!(list.rendered_rows(), 3);
}

#[test]
fn test_same_size_splice_replaces_in_place() {
    let (dom, body, list) = attached(vec![json!("a"), json!("b"), json!("c"), json!("d")]);
    let before = dom.children(body);
    let removed = list.splice_replace(1, 2, vec![json!("x"), json!("y")]);
    assert_eq!(removed, vec![json!("b"), json!("c")]);

    let after = dom.children(body);
    assert_eq!(row_texts(&dom, body), vec!["a", "x", "y", "d"]);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[3], before[3]);
    assert!(!dom.contains(before[1]));
    assert!(!dom.contains(before[2]));
}

#[test]
fn test_different_size_splice_rebuilds() {
    let (dom, body, list) = attached(vec![json!("a"), json!("b"), json!("c")]);
    list.splice_replace(1, 1, vec![]);
    assert_eq!(row_texts(&dom, body), vec!["a", "c"]);
    list.splice_replace(0, 0, vec![json!("z"), json!("w")]);
    assert_eq!(row_texts(&dom, body), vec!["z", "w", "a", "c"]);
    assert_eq!(list.to_vec(), vec![json!("z"), json!("w"), json!("a"), json!("c")]);
}

#[test]
fn test_splice_clamps_out_of_range() {
    let (dom, body, list) = attached(vec![json!("a")]);
    let removed = list.splice_replace(5, 3, vec![json!("b")]);
    assert!(removed.is_empty());
    assert_eq!(row_texts(&dom, body), vec!["a", "b"]);
}

#[test]
fn test_update_and_replace_all() {
    let (dom, body, list) = attached(vec![json!(1), json!(2)]);
    assert_eq!(list.update(1, json!(20)), Some(json!(2)));
    assert_eq!(list.update(9, json!(0)), None);
    assert_eq!(row_texts(&dom, body), vec!["1", "20"]);
    list.replace_all(vec![json!(7)]);
    assert_eq!(row_texts(&dom, body), vec!["7"]);
    assert_eq!(list.get(0), Some(json!(7)));
}

#[test]
fn test_hook_sees_initial_rows() {
    let dom = Dom::new();
    let body = dom.create_element("tbody");
    let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
    let s = seen.clone();
    let hook: RowHook = Rc::new(move |_: &Dom, _: NodeId, origin: RowOrigin, index: usize| {
        s.borrow_mut().push((origin, index));
    });
    let list = ObservedList::from_items(vec![json!("a"), json!("b")]);
    list.attach(&dom, body, text_rows(), Some(hook));
    list.append(json!("c"));
    assert_eq!(
        seen.borrow().as_slice(),
        &[(RowOrigin::Initial, 0), (RowOrigin::Initial, 1), (RowOrigin::Appended, 0)]
    );
    assert!(list.is_rendered_in(body));
}

#[test]
fn test_failed_row_factory_renders_placeholder() {
    let dom = Dom::new();
    let body = dom.create_element("tbody");
    let factory: RowFactory = Rc::new(|dom: &Dom, item: &Value, _| {
        if item.is_null() {
            return None;
        }
        Some(dom.create_element("tr"))
    });
    let list = ObservedList::from_items(vec![json!(1), Value::Null]);
    list.attach(&dom, body, factory, None);
    assert_eq!(list.rendered_rows(), 2);
    let rows = dom.children(body);
    assert!(dom.has_class(rows[1], PLACEHOLDER_CLASS));
}

#[test]
fn test_list_over_sub_path_writes_through() {
    let data = DataObject::new(json!({"a": {"items": [1]}}));
    let list = ObservedList::new(data.clone(), "a.items");
    assert!(list.is_view_of(&data, "a.items"));
    assert!(!list.is_view_of(&data, "a"));
    list.append(json!(2));
    assert_eq!(data.get("a.items"), json!([1, 2]));
    // 未挂载时不渲染
    assert_eq!(list.rendered_rows(), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Append(i64),
    Splice(usize, usize, Vec<i64>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i64>().prop_map(Op::Append),
        (0usize..8, 0usize..4, prop::collection::vec(any::<i64>(), 0..4))
            .prop_map(|(start, delete, items)| Op::Splice(start, delete, items)),
    ]
}

proptest! {
    #[test]
    fn prop_length_matches_rendered_rows(
        initial in prop::collection::vec(any::<i64>(), 0..6),
        ops in prop::collection::vec(op_strategy(), 0..20),
    ) {
        let (dom, body, list) = attached(initial.into_iter().map(Value::from).collect());
        prop_assert_eq!(list.len(), dom.child_count(body));
        for op in ops {
            match op {
                Op::Append(v) => list.append(Value::from(v)),
                Op::Splice(start, delete, items) => {
                    list.splice_replace(start, delete, items.into_iter().map(Value::from).collect());
                }
            }
            prop_assert_eq!(list.len(), dom.child_count(body));
            let expected: Vec<String> = list.to_vec().iter().map(|v| v.to_string()).collect();
            prop_assert_eq!(row_texts(&dom, body), expected);
        }
    }
}
