//! The annotation state engine.
//!
//! This module owns the in-memory object graph behind a rich-annotation
//! editor: the [`Annotation`] aggregate with its region, relation and
//! normalization stores, the snapshot-based [`History`] engine, and the
//! wire result format exchanged with a backend and with predictions.
//!
//! # Design Principles
//!
//! 1. **Instance-owned stores**: every store belongs to exactly one
//!    annotation; there are no process-wide mutable registries. Relation
//!    endpoints are always resolved against the owning annotation.
//!
//! 2. **Explicit history pipeline**: mutations flow through the aggregate,
//!    which captures a snapshot after each one. Snapshots the engine
//!    replays during undo/redo are suppressed exactly once rather than
//!    re-recorded as edits.
//!
//! 3. **Permissive wire values**: entry payloads stay raw JSON until a
//!    node parses them, so unknown fields survive round trips and
//!    validation can report issues instead of parsing panicking.
//!
//! # Example
//!
//! ```
//! use labelstate::engine::{
//!     Annotation, AnnotationId, AnnotationKind, LabelsFlavor, Node, NodeTree, Region,
//!     RegionShape,
//! };
//!
//! let tree = NodeTree::new(Node::view(
//!     "root",
//!     vec![
//!         Node::image("rect", "image"),
//!         Node::labels("labels", LabelsFlavor::Rectangle, "rect", vec!["Cat".into()]),
//!     ],
//! ));
//! let mut annotation = Annotation::new(AnnotationId(1), tree, AnnotationKind::Annotation);
//! annotation.create_region(Region::new(
//!     "labels",
//!     "rect",
//!     RegionShape::Rectangle { x: 10.0, y: 10.0, width: 20.0, height: 20.0, rotation: None },
//!     vec!["Cat".into()],
//! ));
//! assert_eq!(annotation.serialize().len(), 1);
//! assert!(annotation.undo());
//! ```

mod annotation;
mod collection;
mod history;
mod hooks;
mod ids;
mod links;
mod node;
mod region;
mod region_store;
pub mod results;

// Re-export core types for convenient access
pub use annotation::{Annotation, AnnotationKind, AnnotationOptions};
pub use collection::AnnotationCollection;
pub use history::{History, Snapshot};
pub use hooks::{Hooks, NoopHooks};
pub use ids::{AnnotationId, RegionId};
pub use links::{Normalization, NormalizationStore, Relation, RelationStore};
pub use node::{
    ChoicesNode, LabelsFlavor, LabelsNode, NameIndex, Node, NodeKind, NodePath, NodeTree,
    ObjectNode, ResultIo, TextAreaNode,
};
pub use region::{Region, RegionShape};
pub use region_store::RegionStore;
pub use results::{AnnotationRecord, Origin, RelationEntry, ResultEntry, WireEntry};
