//! Tests for ordered child registration and address navigation

use model_tree::{Error, PathAddress, PathElement, Resource};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn fruit(name: &str) -> PathElement {
    PathElement::new("fruit", name)
}

fn basket(names: &[&str]) -> Resource {
    let mut basket = Resource::with_ordered_child_types(["fruit"]);
    for name in names {
        basket.register_child(fruit(name), Resource::new()).unwrap();
    }
    basket
}

#[rstest]
#[case::head(0, &["pear", "apple", "orange", "lemon"])]
#[case::middle(1, &["apple", "pear", "orange", "lemon"])]
#[case::tail(3, &["apple", "orange", "lemon", "pear"])]
#[case::past_end(10, &["apple", "orange", "lemon", "pear"])]
#[case::negative(-1, &["apple", "orange", "lemon", "pear"])]
fn indexed_registration(#[case] index: isize, #[case] expected: &[&str]) {
    let mut basket = basket(&["apple", "orange", "lemon"]);
    basket.register_child_at(fruit("pear"), index, Resource::new()).unwrap();
    assert_eq!(basket.child_names("fruit"), expected.to_vec());
}

#[rstest]
#[case::first("apple", &["orange", "lemon"])]
#[case::middle("orange", &["apple", "lemon"])]
#[case::last("lemon", &["apple", "orange"])]
fn removal_keeps_relative_order(#[case] removed: &str, #[case] expected: &[&str]) {
    let mut basket = basket(&["apple", "orange", "lemon"]);
    assert!(basket.remove_child(&fruit(removed)).is_some());
    assert_eq!(basket.child_names("fruit"), expected.to_vec());
}

#[test]
fn nested_ordered_collections_are_independent() {
    let mut root = Resource::with_ordered_child_types(["fruit"]);
    root.register_child(fruit("apple"), Resource::with_ordered_child_types(["seed"]))
        .unwrap();
    root.register_child(fruit("orange"), Resource::new()).unwrap();

    let apple: PathAddress = "/fruit=apple".parse().unwrap();
    for (index, name) in [(0, "b"), (0, "a"), (5, "c")] {
        root.register_child_at_address(
            &apple.append(PathElement::new("seed", name)),
            Resource::new(),
            Some(index),
        )
        .unwrap();
    }

    assert_eq!(root.child_names("fruit"), vec!["apple", "orange"]);
    assert_eq!(
        root.navigate(&apple).unwrap().child_names("seed"),
        vec!["a", "b", "c"]
    );
}

#[test]
fn remove_at_address_cascades() {
    let mut root = basket(&["apple"]);
    let seed: PathAddress = "/fruit=apple/seed=a".parse().unwrap();
    root.register_child_at_address(&seed, Resource::new(), None).unwrap();

    let removed = root
        .remove_child_at_address(&"/fruit=apple".parse().unwrap())
        .unwrap();
    assert_eq!(removed.size(), 2);
    assert!(matches!(
        root.navigate(&seed),
        Err(Error::ResourceNotFound { .. })
    ));
}

#[test]
fn require_child_reports_missing() {
    let root = basket(&["apple"]);
    assert!(root.require_child(&fruit("apple")).is_ok());
    let err = root.require_child(&fruit("kiwi")).unwrap_err();
    assert_eq!(err.to_string(), "Resource not found: /fruit=kiwi");
}

#[test]
fn attributes_write_and_undefine() {
    let mut resource = Resource::new();
    assert_eq!(resource.write_attribute("port", json!(8080)), None);
    assert_eq!(
        resource.write_attribute("port", json!(8443)),
        Some(json!(8080))
    );
    resource.merge_attributes(json!({"host": "localhost"}).as_object().unwrap());
    assert_eq!(resource.attribute("host"), Some(&json!("localhost")));
    assert_eq!(resource.undefine_attribute("port"), Some(json!(8443)));
    assert_eq!(resource.attribute("port"), None);
}

#[rstest]
#[case::slash_in_name(PathElement::new("fruit", "blood/orange"))]
#[case::equals_in_name(PathElement::new("fruit", "a=b"))]
#[case::slash_in_type(PathElement::new("dried/fruit", "fig"))]
#[case::empty_name(PathElement::new("fruit", ""))]
fn names_that_do_not_parse_back_are_rejected(#[case] element: PathElement) {
    let mut basket = basket(&["apple"]);

    let err = basket
        .register_child(element.clone(), Resource::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAddress { .. }), "{err}");

    let err = basket
        .register_child_at(element, 0, Resource::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAddress { .. }), "{err}");
    assert_eq!(basket.child_names("fruit"), vec!["apple"]);
}

#[test]
fn registered_addresses_parse_back() {
    let mut root = basket(&["apple"]);
    let seed: PathAddress = "/fruit=apple/seed=pip".parse().unwrap();
    root.register_child_at_address(&seed, Resource::new(), None).unwrap();

    let reparsed: PathAddress = seed.to_string().parse().unwrap();
    assert_eq!(reparsed, seed);
    assert!(root.navigate(&reparsed).is_ok());
}

#[rstest]
#[case::append(None)]
#[case::indexed(Some(0))]
fn root_address_cannot_be_registered(#[case] index: Option<isize>) {
    let mut root = basket(&["apple"]);
    let err = root
        .register_child_at_address(&PathAddress::root(), Resource::new(), index)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAddress { .. }), "{err}");
    assert_eq!(root, basket(&["apple"]));
}
