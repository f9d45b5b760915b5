//! Integration tests for the annotation collection.

use labelstate::engine::{
    AnnotationCollection, AnnotationId, AnnotationKind, AnnotationOptions, Origin,
};

mod common;

fn collection() -> AnnotationCollection {
    AnnotationCollection::new(common::image_template())
}

#[test]
fn exactly_one_entity_is_selected_across_both_lists() {
    let mut collection = collection();
    let a1 = collection.add_annotation(AnnotationOptions::new());
    let a2 = collection.add_annotation(AnnotationOptions::new());
    let p1 = collection.add_prediction(AnnotationOptions::new());

    collection.select(a1, AnnotationKind::Annotation);
    collection.select(a2, AnnotationKind::Annotation);

    let selected_count = collection
        .annotations
        .iter()
        .chain(collection.predictions.iter())
        .filter(|entity| entity.selected)
        .count();
    assert_eq!(selected_count, 1);
    assert_eq!(collection.selected().map(|e| e.id), Some(a2));

    collection.select(p1, AnnotationKind::Prediction);
    let selected_count = collection
        .annotations
        .iter()
        .chain(collection.predictions.iter())
        .filter(|entity| entity.selected)
        .count();
    assert_eq!(selected_count, 1);
    assert_eq!(collection.selected().map(|e| e.id), Some(p1));
}

#[test]
fn selecting_an_unknown_id_changes_nothing() {
    let mut collection = collection();
    let a1 = collection.add_annotation(AnnotationOptions::new());

    assert!(!collection.select(AnnotationId(42), AnnotationKind::Annotation));
    assert_eq!(collection.selected().map(|e| e.id), Some(a1));
}

#[test]
fn annotations_carry_author_metadata() {
    let mut collection = collection();
    let id = collection.add_annotation(
        AnnotationOptions::new()
            .with_author("ana")
            .with_created_date("2024-11-02T10:00:00Z")
            .with_lead_time(12.5),
    );

    let annotation = collection.get(id, AnnotationKind::Annotation).unwrap();
    assert_eq!(annotation.created_by.as_deref(), Some("ana"));
    assert_eq!(annotation.lead_time, Some(12.5));
    assert_eq!(annotation.kind, AnnotationKind::Annotation);
}

#[test]
fn deleting_the_selected_annotation_selects_a_remaining_one() {
    let mut collection = collection();
    let a1 = collection.add_annotation(AnnotationOptions::new());
    let a2 = collection.add_annotation(AnnotationOptions::new());
    let a3 = collection.add_annotation(AnnotationOptions::new());
    assert_eq!(collection.selected().map(|e| e.id), Some(a3));

    collection.delete(a3);
    // The front-most remaining annotation takes over.
    assert_eq!(collection.selected().map(|e| e.id), Some(a2));

    collection.delete(a2);
    collection.delete(a1);
    assert!(collection.selected().is_none());
    assert!(collection.annotations.is_empty());
}

#[test]
fn converting_a_prediction_copies_its_results() {
    let mut collection = collection();
    let p1 = collection.add_prediction(AnnotationOptions::new());
    {
        let prediction = collection.get_mut(p1, AnnotationKind::Prediction).unwrap();
        let a = prediction.create_region(
            common::rect_region(10.0, "Cat").with_origin(Origin::Prediction),
        );
        let b = prediction.create_region(
            common::rect_region(40.0, "Dog").with_origin(Origin::Prediction),
        );
        prediction.add_relation(&a, &b, None);
    }

    let id = collection.create_from_prediction(p1).expect("conversion");
    let annotation = collection.get(id, AnnotationKind::Annotation).unwrap();
    assert_eq!(annotation.kind, AnnotationKind::Annotation);
    assert_eq!(annotation.regions.len(), 2);
    assert_eq!(annotation.relations.len(), 1);
    assert!(annotation.user_generate);
    // The copy starts as the undo floor: nothing to undo yet.
    assert!(!annotation.can_undo());
}

#[test]
fn stored_records_load_back_into_the_collection() {
    let mut collection = collection();
    let source = collection.add_annotation(AnnotationOptions::new().with_author("ana"));
    {
        let annotation = collection.get_mut(source, AnnotationKind::Annotation).unwrap();
        let a = annotation.create_region(common::rect_region(10.0, "Cat"));
        let b = annotation.create_region(common::rect_region(40.0, "Dog"));
        annotation.add_relation(&a, &b, None);
        annotation.pk = Some("backend-3".into());
    }
    let record = collection
        .get(source, AnnotationKind::Annotation)
        .unwrap()
        .to_record();

    let id = collection.load_annotation(&record).expect("load record");
    let loaded = collection.get(id, AnnotationKind::Annotation).unwrap();
    assert_eq!(loaded.pk.as_deref(), Some("backend-3"));
    assert_eq!(loaded.regions.len(), 2);
    assert_eq!(loaded.relations.len(), 1);
    assert!(!loaded.can_undo());
}

#[test]
fn failed_conversion_leaves_no_partial_annotation() {
    let mut collection = collection();
    let p1 = collection.add_prediction(AnnotationOptions::new());
    // A region whose control name the template does not know makes the
    // prediction's serialized output unresolvable in a fresh tree.
    collection
        .get_mut(p1, AnnotationKind::Prediction)
        .unwrap()
        .create_region(labelstate::engine::Region::new(
            "ghost",
            "rect",
            labelstate::engine::RegionShape::Rectangle {
                x: 1.0,
                y: 1.0,
                width: 2.0,
                height: 2.0,
                rotation: None,
            },
            vec!["Cat".into()],
        ));

    let annotations_before = collection.annotations.len();
    let err = collection.create_from_prediction(p1).unwrap_err();
    assert!(matches!(
        err,
        labelstate::LabelstateError::NoSourceNode { .. }
    ));
    assert_eq!(collection.annotations.len(), annotations_before);
}
