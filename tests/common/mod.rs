//! Shared helpers for integration tests.

use labelstate::engine::{
    Annotation, AnnotationId, AnnotationKind, LabelsFlavor, Node, NodeTree, Region, RegionShape,
};

/// The canonical image-labeling template: a rectangle target named
/// "rect" with a rectangle-labels control named "labels".
pub fn image_template() -> NodeTree {
    NodeTree::new(Node::view(
        "root",
        vec![
            Node::image("rect", "image"),
            Node::labels(
                "labels",
                LabelsFlavor::Rectangle,
                "rect",
                vec!["Cat".into(), "Dog".into()],
            ),
        ],
    ))
}

/// A richer template mixing modalities and annotation-level controls.
pub fn mixed_template() -> NodeTree {
    NodeTree::new(Node::view(
        "root",
        vec![
            Node::image("rect", "image"),
            Node::labels(
                "labels",
                LabelsFlavor::Rectangle,
                "rect",
                vec!["Cat".into(), "Dog".into()],
            ),
            Node::text("txt", "text"),
            Node::labels(
                "ner",
                LabelsFlavor::Text,
                "txt",
                vec!["Person".into(), "Place".into()],
            ),
            Node::choices("vetted", "rect", vec!["yes".into(), "no".into()]),
            Node::textarea("notes", "txt"),
        ],
    ))
}

pub fn fresh_annotation(tree: NodeTree) -> Annotation {
    Annotation::new(AnnotationId(1), tree, AnnotationKind::Annotation)
}

pub fn rect_region(x: f64, label: &str) -> Region {
    Region::new(
        "labels",
        "rect",
        RegionShape::Rectangle {
            x,
            y: 10.0,
            width: 20.0,
            height: 20.0,
            rotation: None,
        },
        vec![label.to_string()],
    )
}

pub fn text_region(start: usize, end: usize, label: &str) -> Region {
    Region::new(
        "ner",
        "txt",
        RegionShape::TextSpan {
            start,
            end,
            text: None,
        },
        vec![label.to_string()],
    )
}
