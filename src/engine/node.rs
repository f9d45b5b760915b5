//! The instantiated tag tree an annotation operates over.
//!
//! The engine does not parse labeling-interface configurations; an external
//! template provider hands it an already-instantiated tree of typed, named
//! nodes. Object nodes (image, text, audio, hypertext) are annotation
//! targets and bind task data; control nodes (labels, choices, textarea)
//! produce values. Nodes are addressed by [`NodePath`] (child indices from
//! the root), which stays valid as long as the tree shape is unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::region::{Region, RegionShape};
use super::region_store::RegionStore;
use super::results::{parse_value, ChoicesValue, ResultEntry, TextAreaValue, WireEntry};
use crate::error::LabelstateError;

/// Address of a node inside a tree: the child index at every level below
/// the root. The root itself is the empty path.
pub type NodePath = Vec<usize>;

/// Which region shape a labels control produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelsFlavor {
    Rectangle,
    Polygon,
    KeyPoint,
    Text,
    HyperText,
    Audio,
}

impl LabelsFlavor {
    /// The wire type tag results of this flavor carry.
    pub fn result_type(&self) -> &'static str {
        match self {
            LabelsFlavor::Rectangle => "rectanglelabels",
            LabelsFlavor::Polygon => "polygonlabels",
            LabelsFlavor::KeyPoint => "keypointlabels",
            LabelsFlavor::Text => "labels",
            LabelsFlavor::HyperText => "hypertextlabels",
            LabelsFlavor::Audio => "audiolabels",
        }
    }
}

/// An object node: an annotation target bound to one task-data field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectNode {
    /// Key into the task data this node renders, e.g. "image".
    pub value_key: String,
    /// The resolved task payload (URL, text body, ...), if loaded.
    pub data: Option<String>,
}

/// A labels control: offers a label set and produces regions of one shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelsNode {
    pub flavor: LabelsFlavor,
    pub to_name: String,
    pub options: Vec<String>,
}

/// A choices control: an annotation-level classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChoicesNode {
    pub to_name: String,
    pub options: Vec<String>,
    pub selected: Vec<String>,
}

/// A textarea control: free-text rows, with an uncommitted edit buffer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextAreaNode {
    pub to_name: String,
    pub rows: Vec<String>,
    /// In-progress input, committed to `rows` by `flush_pending`.
    pub pending: Option<String>,
}

impl TextAreaNode {
    /// Moves any pending input into the committed rows.
    pub fn flush_pending(&mut self) {
        if let Some(text) = self.pending.take() {
            if !text.is_empty() {
                self.rows.push(text);
            }
        }
    }
}

/// The kind-specific payload of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Image(ObjectNode),
    Text(ObjectNode),
    Audio(ObjectNode),
    HyperText(ObjectNode),
    Labels(LabelsNode),
    Choices(ChoicesNode),
    TextArea(TextAreaNode),
    /// Pure layout container; contributes nothing to results.
    View,
}

/// One named node of the tag tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    fn object(value_key: impl Into<String>) -> ObjectNode {
        ObjectNode {
            value_key: value_key.into(),
            data: None,
        }
    }

    /// An image object node.
    pub fn image(name: impl Into<String>, value_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Image(Self::object(value_key)),
            children: Vec::new(),
        }
    }

    /// A plain-text object node.
    pub fn text(name: impl Into<String>, value_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Text(Self::object(value_key)),
            children: Vec::new(),
        }
    }

    /// An audio object node.
    pub fn audio(name: impl Into<String>, value_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Audio(Self::object(value_key)),
            children: Vec::new(),
        }
    }

    /// A rendered-HTML object node.
    pub fn hypertext(name: impl Into<String>, value_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::HyperText(Self::object(value_key)),
            children: Vec::new(),
        }
    }

    /// A labels control node targeting `to_name`.
    pub fn labels(
        name: impl Into<String>,
        flavor: LabelsFlavor,
        to_name: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Labels(LabelsNode {
                flavor,
                to_name: to_name.into(),
                options,
            }),
            children: Vec::new(),
        }
    }

    /// A choices control node targeting `to_name`.
    pub fn choices(
        name: impl Into<String>,
        to_name: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Choices(ChoicesNode {
                to_name: to_name.into(),
                options,
                selected: Vec::new(),
            }),
            children: Vec::new(),
        }
    }

    /// A textarea control node targeting `to_name`.
    pub fn textarea(name: impl Into<String>, to_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::TextArea(TextAreaNode {
                to_name: to_name.into(),
                rows: Vec::new(),
                pending: None,
            }),
            children: Vec::new(),
        }
    }

    /// A layout container with children.
    pub fn view(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::View,
            children,
        }
    }

    /// True for annotation-target (object) nodes.
    pub fn is_object(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Image(_) | NodeKind::Text(_) | NodeKind::Audio(_) | NodeKind::HyperText(_)
        )
    }

    /// The name this node targets, for control nodes.
    pub fn to_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Labels(n) => Some(&n.to_name),
            NodeKind::Choices(n) => Some(&n.to_name),
            NodeKind::TextArea(n) => Some(&n.to_name),
            _ => None,
        }
    }
}

/// Result input/output interface every node kind implements.
///
/// The engine depends only on this interface; geometry-specific behavior
/// (hit testing, rendering) lives outside the core.
pub trait ResultIo {
    /// Applies one deserialized wire entry addressed to this node.
    /// Returns a region to insert when the entry describes one.
    fn apply_result(
        &mut self,
        entry: &ResultEntry,
        source_name: &str,
    ) -> Result<Option<Region>, LabelstateError>;

    /// Produces the wire entries this node contributes.
    fn produce_results(&self, regions: &RegionStore) -> Vec<WireEntry>;
}

impl ResultIo for Node {
    fn apply_result(
        &mut self,
        entry: &ResultEntry,
        source_name: &str,
    ) -> Result<Option<Region>, LabelstateError> {
        match &mut self.kind {
            NodeKind::Image(_) | NodeKind::Text(_) | NodeKind::Audio(_) | NodeKind::HyperText(_) => {
                debug_assert_eq!(entry.from_name, source_name);
                Region::from_entry(entry, &self.name).map(Some)
            }
            NodeKind::Choices(node) => {
                let value: ChoicesValue = parse_value(entry)?;
                node.selected = value.choices;
                Ok(None)
            }
            NodeKind::TextArea(node) => {
                let value: TextAreaValue = parse_value(entry)?;
                node.rows = value.text;
                Ok(None)
            }
            NodeKind::Labels(_) | NodeKind::View => Err(LabelstateError::UnsupportedResultType(
                entry.result_type.clone(),
            )),
        }
    }

    fn produce_results(&self, regions: &RegionStore) -> Vec<WireEntry> {
        match &self.kind {
            // Object nodes emit one entry per region targeting them, in
            // store order, followed by any per-region textarea rows.
            NodeKind::Image(_) | NodeKind::Text(_) | NodeKind::Audio(_) | NodeKind::HyperText(_) => {
                let mut out = Vec::new();
                for region in regions.iter().filter(|r| r.to_name == self.name) {
                    out.push(WireEntry::Result(region.to_entry()));
                    if let Some(meta_from) = &region.meta_from {
                        if !region.meta_text.is_empty() {
                            out.push(WireEntry::Result(ResultEntry {
                                id: Some(region.persisted_id().to_string()),
                                from_name: meta_from.clone(),
                                to_name: self.name.clone(),
                                result_type: "textarea".to_string(),
                                value: serde_json::to_value(TextAreaValue {
                                    text: region.meta_text.clone(),
                                })
                                .unwrap_or(serde_json::Value::Null),
                                origin: Some(region.origin),
                                score: None,
                                parent_id: None,
                            }));
                        }
                    }
                }
                out
            }
            NodeKind::Choices(node) => {
                if node.selected.is_empty() {
                    return Vec::new();
                }
                vec![WireEntry::Result(ResultEntry {
                    id: None,
                    from_name: self.name.clone(),
                    to_name: node.to_name.clone(),
                    result_type: "choices".to_string(),
                    value: serde_json::to_value(ChoicesValue {
                        choices: node.selected.clone(),
                    })
                    .unwrap_or(serde_json::Value::Null),
                    origin: None,
                    score: None,
                    parent_id: None,
                })]
            }
            NodeKind::TextArea(node) => {
                if node.rows.is_empty() {
                    return Vec::new();
                }
                vec![WireEntry::Result(ResultEntry {
                    id: None,
                    from_name: self.name.clone(),
                    to_name: node.to_name.clone(),
                    result_type: "textarea".to_string(),
                    value: serde_json::to_value(TextAreaValue {
                        text: node.rows.clone(),
                    })
                    .unwrap_or(serde_json::Value::Null),
                    origin: None,
                    score: None,
                    parent_id: None,
                })]
            }
            NodeKind::Labels(_) | NodeKind::View => Vec::new(),
        }
    }
}

/// The instantiated tag tree of one annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeTree {
    pub root: Node,
}

impl NodeTree {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// True when the tree carries no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty() && matches!(self.root.kind, NodeKind::View)
    }

    /// Resolves a node by path.
    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        let mut current = &self.root;
        for &index in path {
            current = current.children.get(index)?;
        }
        Some(current)
    }

    /// Resolves a node by path, mutably.
    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let mut current = &mut self.root;
        for &index in path {
            current = current.children.get_mut(index)?;
        }
        Some(current)
    }

    /// Depth-first pre-order walk over every node, root included.
    pub fn traverse(&self, visitor: &mut impl FnMut(&Node)) {
        fn walk(node: &Node, visitor: &mut impl FnMut(&Node)) {
            visitor(node);
            for child in &node.children {
                walk(child, visitor);
            }
        }
        walk(&self.root, visitor);
    }

    /// Depth-first pre-order walk yielding each node with its path.
    pub fn traverse_paths(&self, visitor: &mut impl FnMut(&NodePath, &Node)) {
        fn walk(node: &Node, path: &mut NodePath, visitor: &mut impl FnMut(&NodePath, &Node)) {
            visitor(path, node);
            for (index, child) in node.children.iter().enumerate() {
                path.push(index);
                walk(child, path, visitor);
                path.pop();
            }
        }
        let mut path = NodePath::new();
        walk(&self.root, &mut path, visitor);
    }

    /// Installs task data into every object node whose value key is bound
    /// in `data`. Returns the number of nodes updated.
    pub fn set_task_data(&mut self, data: &HashMap<String, String>) -> usize {
        fn walk(node: &mut Node, data: &HashMap<String, String>, updated: &mut usize) {
            let object = match &mut node.kind {
                NodeKind::Image(o)
                | NodeKind::Text(o)
                | NodeKind::Audio(o)
                | NodeKind::HyperText(o) => Some(o),
                _ => None,
            };
            if let Some(object) = object {
                if let Some(value) = data.get(&object.value_key) {
                    object.data = Some(value.clone());
                    *updated += 1;
                }
            }
            for child in &mut node.children {
                walk(child, data, updated);
            }
        }
        let mut updated = 0;
        walk(&mut self.root, data, &mut updated);
        updated
    }
}

/// The name → node and target-name → nodes indices of one tree.
///
/// Built by a single traversal at annotation construction and rebuilt only
/// on wholesale tree replacement; never diverges from the tree's actual
/// named nodes in between.
#[derive(Clone, Debug, Default)]
pub struct NameIndex {
    names: HashMap<String, NodePath>,
    to_names: HashMap<String, Vec<NodePath>>,
}

impl NameIndex {
    /// Builds both indices with one DFS over the tree.
    pub fn build(tree: &NodeTree) -> Self {
        let mut names: HashMap<String, NodePath> = HashMap::new();
        let mut to_names: HashMap<String, Vec<NodePath>> = HashMap::new();

        tree.traverse_paths(&mut |path, node| {
            // First declaration of a name wins; templates are expected to
            // keep names unique.
            if !names.contains_key(&node.name) {
                names.insert(node.name.clone(), path.clone());
            } else {
                log::debug!("duplicate node name '{}' ignored by index", node.name);
            }
            if let Some(target) = node.to_name() {
                to_names
                    .entry(target.to_string())
                    .or_default()
                    .push(path.clone());
            }
        });

        Self { names, to_names }
    }

    /// Resolves a node name to its path.
    pub fn name(&self, name: &str) -> Option<&NodePath> {
        self.names.get(name)
    }

    /// All control nodes targeting `name`, in tree order.
    pub fn to_name(&self, name: &str) -> &[NodePath] {
        self.to_names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of uniquely-named nodes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> NodeTree {
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
                Node::choices("vetted", "rect", vec!["yes".into(), "no".into()]),
            ],
        ))
    }

    #[test]
    fn test_index_build() {
        let tree = sample_tree();
        let index = NameIndex::build(&tree);
        assert_eq!(index.len(), 4); // root + 3 children
        assert_eq!(index.name("rect"), Some(&vec![0]));
        assert_eq!(index.name("labels"), Some(&vec![1]));
        assert!(index.name("missing").is_none());
        // Both controls target "rect", in tree order.
        assert_eq!(index.to_name("rect"), &[vec![1], vec![2]]);
    }

    #[test]
    fn test_traverse_is_depth_first_preorder() {
        let tree = NodeTree::new(Node::view(
            "root",
            vec![
                Node::view("group", vec![Node::image("img", "image")]),
                Node::text("txt", "text"),
            ],
        ));
        let mut visited = Vec::new();
        tree.traverse(&mut |node| visited.push(node.name.clone()));
        assert_eq!(visited, vec!["root", "group", "img", "txt"]);
    }

    #[test]
    fn test_set_task_data_targets_bound_keys() {
        let mut tree = sample_tree();
        let mut data = HashMap::new();
        data.insert("image".to_string(), "https://host/cat.jpg".to_string());
        data.insert("unused".to_string(), "x".to_string());
        assert_eq!(tree.set_task_data(&data), 1);

        let node = tree.node(&vec![0]).unwrap();
        match &node.kind {
            NodeKind::Image(object) => {
                assert_eq!(object.data.as_deref(), Some("https://host/cat.jpg"));
            }
            other => panic!("expected image node, got {:?}", other),
        }
    }

    #[test]
    fn test_textarea_flush_pending() {
        let mut node = TextAreaNode {
            to_name: "txt".into(),
            rows: vec!["first".into()],
            pending: Some("second".into()),
        };
        node.flush_pending();
        assert_eq!(node.rows, vec!["first", "second"]);
        assert!(node.pending.is_none());
    }
}
