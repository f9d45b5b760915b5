//! Integration tests for relation and normalization behavior.

mod common;

#[test]
fn duplicate_relation_add_is_a_noop() {
    let mut annotation = common::fresh_annotation(common::image_template());
    let a = annotation.create_region(common::rect_region(1.0, "Cat"));
    let b = annotation.create_region(common::rect_region(2.0, "Dog"));

    assert!(annotation.add_relation(&a, &b, None));
    assert!(!annotation.add_relation(&a, &b, None));
    assert_eq!(annotation.relations.relations.len(), 1);
}

#[test]
fn ordered_pairs_are_distinct_links() {
    let mut annotation = common::fresh_annotation(common::image_template());
    let a = annotation.create_region(common::rect_region(1.0, "Cat"));
    let b = annotation.create_region(common::rect_region(2.0, "Dog"));

    annotation.add_relation(&a, &b, None);
    annotation.add_relation(&a, &b, None);
    annotation.add_relation(&b, &a, None);
    assert_eq!(annotation.relations.relations.len(), 2);
}

#[test]
fn deleting_a_region_cascades_both_stores() {
    let mut annotation = common::fresh_annotation(common::image_template());
    let a = annotation.create_region(common::rect_region(1.0, "Cat"));
    let b = annotation.create_region(common::rect_region(2.0, "Dog"));
    let c = annotation.create_region(common::rect_region(3.0, "Cat"));

    annotation.add_relation(&a, &b, None);
    annotation.add_normalization(&a, &c, None);

    annotation.delete_region(&a);
    assert!(annotation.relations.find_links(&a, None).is_empty());
    assert!(annotation.normalizations.find_links(&a, None).is_empty());
    // Links not touching the deleted region survive.
    annotation.add_relation(&b, &c, None);
    assert_eq!(annotation.relations.len(), 1);
}

#[test]
fn find_links_matches_either_position_or_exact_pair() {
    let mut annotation = common::fresh_annotation(common::image_template());
    let a = annotation.create_region(common::rect_region(1.0, "Cat"));
    let b = annotation.create_region(common::rect_region(2.0, "Dog"));
    let c = annotation.create_region(common::rect_region(3.0, "Cat"));

    annotation.add_relation(&a, &b, None);
    annotation.add_relation(&c, &a, None);

    assert_eq!(annotation.relations.find_links(&a, None).len(), 2);
    assert_eq!(annotation.relations.find_links(&a, Some(&b)).len(), 1);
    assert!(annotation.relations.find_links(&b, Some(&a)).is_empty());
    assert!(annotation.relations.linked(&c, &a));
    assert!(!annotation.relations.linked(&a, &c));
}

#[test]
fn normalization_mode_builds_an_equivalence_link() {
    let mut annotation = common::fresh_annotation(common::image_template());
    let a = annotation.create_region(common::rect_region(1.0, "Cat"));
    let b = annotation.create_region(common::rect_region(2.0, "Dog"));

    annotation.start_normalization_mode(&a);
    assert!(annotation.normalization_mode);
    annotation.select_region(&b);

    assert!(!annotation.normalization_mode);
    assert!(annotation.normalizations.linked(&a, &b));
    assert!(annotation.relations.is_empty());
}

#[test]
fn stopping_link_mode_creates_nothing() {
    let mut annotation = common::fresh_annotation(common::image_template());
    let a = annotation.create_region(common::rect_region(1.0, "Cat"));
    let b = annotation.create_region(common::rect_region(2.0, "Dog"));

    annotation.start_relation_mode(&a);
    annotation.stop_link_mode();
    annotation.select_region(&b);

    assert!(annotation.relations.is_empty());
    assert!(annotation.regions.get(&b).unwrap().selected);
}

#[test]
fn link_endpoints_resolve_within_one_annotation_only() {
    let mut first = common::fresh_annotation(common::image_template());
    let mut second = common::fresh_annotation(common::image_template());
    let a = first.create_region(common::rect_region(1.0, "Cat"));
    let foreign = second.create_region(common::rect_region(2.0, "Dog"));

    // The foreign region is unknown to `first`, so completing a relation
    // against it is refused.
    first.start_relation_mode(&a);
    assert!(!first.complete_relation(&foreign, None));
    assert!(first.relations.is_empty());
}
