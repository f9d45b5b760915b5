//! The annotation aggregate.
//!
//! An annotation owns one node tree, the region/relation/normalization
//! stores over it, a history engine, and the name indices used to resolve
//! wire results back onto tree nodes. Every mutation goes through the
//! aggregate so the history engine observes it; the snapshots it replays
//! are applied through the same path and suppressed exactly once.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::history::{History, Snapshot};
use super::hooks::{Hooks, NoopHooks};
use super::ids::{AnnotationId, RegionId};
use super::links::{NormalizationStore, RelationStore};
use super::node::{NameIndex, Node, NodeKind, NodeTree, ResultIo};
use super::region::{Region, RegionShape};
use super::region_store::RegionStore;
use super::results::{
    parse_results, parse_value, results_to_string, AnnotationRecord, RelationEntry, ResultEntry,
    TextAreaValue, WireEntry,
};
use crate::error::LabelstateError;

/// Whether an entity is user-authored or machine-generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    #[serde(rename = "annotation")]
    Annotation,
    #[serde(rename = "prediction")]
    Prediction,
}

/// Construction options for a fresh annotation.
#[derive(Clone, Debug, Default)]
pub struct AnnotationOptions {
    pub pk: Option<String>,
    pub created_by: Option<String>,
    pub created_date: Option<String>,
    pub lead_time: Option<f64>,
    pub user_generate: bool,
    pub ground_truth: bool,
    pub task_data: Option<HashMap<String, String>>,
}

impl AnnotationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the persisted backend key.
    pub fn with_pk(mut self, pk: impl Into<String>) -> Self {
        self.pk = Some(pk.into());
        self
    }

    /// Sets the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.created_by = Some(author.into());
        self
    }

    /// Sets the creation timestamp.
    pub fn with_created_date(mut self, date: impl Into<String>) -> Self {
        self.created_date = Some(date.into());
        self
    }

    /// Sets the lead time in seconds.
    pub fn with_lead_time(mut self, seconds: f64) -> Self {
        self.lead_time = Some(seconds);
        self
    }

    /// Marks the annotation as a local draft not yet known to the backend.
    pub fn user_generated(mut self) -> Self {
        self.user_generate = true;
        self
    }

    /// Supplies task data to propagate into the tree at construction.
    pub fn with_task_data(mut self, data: HashMap<String, String>) -> Self {
        self.task_data = Some(data);
        self
    }
}

/// One complete labeling pass over a task.
pub struct Annotation {
    pub id: AnnotationId,
    /// Persisted backend key, if this annotation has been stored.
    pub pk: Option<String>,
    pub kind: AnnotationKind,
    pub selected: bool,

    pub created_by: Option<String>,
    pub created_date: Option<String>,
    pub lead_time: Option<f64>,

    /// Draft-vs-submitted lifecycle flags.
    pub user_generate: bool,
    pub sent_user_generate: bool,
    pub local_update: bool,

    /// Ground-truth ("honeypot") marker.
    pub ground_truth: bool,

    tree: NodeTree,
    names: NameIndex,

    pub regions: RegionStore,
    pub relations: RelationStore,
    pub normalizations: NormalizationStore,

    history: History,

    pub relation_mode: bool,
    pub normalization_mode: bool,
    /// First endpoint picked while a link mode is active.
    link_anchor: Option<RegionId>,
    /// The currently highlighted region, if any.
    pub highlighted: Option<RegionId>,

    hooks: Rc<dyn Hooks>,
}

impl std::fmt::Debug for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotation")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("selected", &self.selected)
            .field("regions", &self.regions.len())
            .field("relations", &self.relations.len())
            .finish_non_exhaustive()
    }
}

impl Annotation {
    /// Instantiates a fresh annotation over a template tree.
    ///
    /// Name indices are built once here by a full traversal; the history
    /// engine takes its construction snapshots and pins the undo floor so
    /// a partially-initialized state can never be restored.
    pub fn from_template(
        id: AnnotationId,
        tree: NodeTree,
        kind: AnnotationKind,
        options: AnnotationOptions,
        hooks: Rc<dyn Hooks>,
    ) -> Self {
        let names = NameIndex::build(&tree);
        let history = History::new(Snapshot {
            tree: tree.clone(),
            regions: Vec::new(),
            relations: Vec::new(),
            normalizations: Vec::new(),
        });

        let mut annotation = Self {
            id,
            pk: options.pk,
            kind,
            selected: false,
            created_by: options.created_by,
            created_date: options.created_date,
            lead_time: options.lead_time,
            user_generate: options.user_generate,
            sent_user_generate: false,
            local_update: false,
            ground_truth: options.ground_truth,
            tree,
            names,
            regions: RegionStore::new(),
            relations: RelationStore::new(),
            normalizations: NormalizationStore::new(),
            history,
            relation_mode: false,
            normalization_mode: false,
            link_anchor: None,
            highlighted: None,
            hooks,
        };

        if let Some(data) = options.task_data {
            annotation.tree.set_task_data(&data);
        }
        // Setup is complete: record the post-setup snapshot and pin the
        // undo floor to it.
        annotation.changed();
        annotation.history.mark_floor();
        annotation
    }

    /// Convenience constructor with no host hooks.
    pub fn new(id: AnnotationId, tree: NodeTree, kind: AnnotationKind) -> Self {
        Self::from_template(id, tree, kind, AnnotationOptions::new(), Rc::new(NoopHooks))
    }

    // ------------------------------------------------------------------
    // Tree access
    // ------------------------------------------------------------------

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn names(&self) -> &NameIndex {
        &self.names
    }

    /// Resolves a node by name through the index.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.tree.node(self.names.name(name)?)
    }

    /// Depth-first pre-order walk from the root, visiting every
    /// descendant once.
    pub fn traverse(&self, visitor: &mut impl FnMut(&Node)) {
        self.tree.traverse(visitor)
    }

    /// Mutates a named node through a closure; the edit is recorded as
    /// one history step. Returns false when the name does not resolve.
    pub fn update_node(&mut self, name: &str, f: impl FnOnce(&mut Node)) -> bool {
        let Some(path) = self.names.name(name).cloned() else {
            return false;
        };
        let Some(node) = self.tree.node_mut(&path) else {
            return false;
        };
        f(node);
        self.changed();
        true
    }

    /// Propagates freshly loaded task data into every object node bound
    /// to it; one history step when anything changed.
    pub fn set_task_data(&mut self, data: &HashMap<String, String>) -> usize {
        let updated = self.tree.set_task_data(data);
        if updated > 0 {
            self.changed();
        }
        updated
    }

    // ------------------------------------------------------------------
    // Region lifecycle
    // ------------------------------------------------------------------

    /// Inserts a region created by a rendering component.
    pub fn create_region(&mut self, region: Region) -> RegionId {
        let id = region.id.clone();
        let inserted = self.regions.add(region);
        self.hooks.region_created(inserted);
        self.changed();
        id
    }

    /// Destroys a region and cascades removal of every relation and
    /// normalization touching it.
    pub fn delete_region(&mut self, id: &RegionId) -> Option<Region> {
        let region = self.regions.remove(id)?;
        let relations = self.relations.remove_for_region(&region.id);
        let normalizations = self.normalizations.remove_for_region(&region.id);
        if relations + normalizations > 0 {
            log::debug!(
                "region {}: cascaded {} relation(s), {} normalization(s)",
                region.id,
                relations,
                normalizations
            );
        }
        if self.highlighted.as_ref() == Some(&region.id) {
            self.highlighted = None;
        }
        if self.link_anchor.as_ref() == Some(&region.id) {
            self.link_anchor = None;
        }
        self.hooks.region_deleted(&region);
        self.changed();
        Some(region)
    }

    /// Mutates a region through a closure; the edit is recorded as one
    /// history step. Returns false when the id does not resolve.
    pub fn update_region(&mut self, id: &RegionId, f: impl FnOnce(&mut Region)) -> bool {
        let Some(region) = self.regions.get_mut(id) else {
            return false;
        };
        f(region);
        self.changed();
        true
    }

    /// Marks a region selected.
    pub fn select_region(&mut self, id: &RegionId) -> bool {
        let selected = self.update_region(id, |region| region.selected = true);
        if selected {
            if let Some(anchor) = self.link_anchor.clone() {
                // Selecting a second region while a link mode is active
                // completes the pending link.
                if anchor != *id {
                    if self.relation_mode {
                        self.complete_relation(id, None);
                    } else if self.normalization_mode {
                        self.complete_normalization(id, None);
                    }
                }
            }
        }
        selected
    }

    /// Clears selection on every region and drops the highlight.
    pub fn unselect_all(&mut self) {
        self.regions.unselect_all();
        self.highlighted = None;
        self.changed();
    }

    /// Highlights one region.
    pub fn highlight_region(&mut self, id: &RegionId) -> bool {
        if self.regions.get(id).is_none() {
            return false;
        }
        self.regions.unhighlight_all();
        let updated = self.update_region(id, |region| region.highlighted = true);
        if updated {
            self.highlighted = Some(id.clone());
        }
        updated
    }

    /// Clears the highlight flag everywhere.
    pub fn unhighlight_all(&mut self) {
        self.regions.unhighlight_all();
        self.highlighted = None;
        self.changed();
    }

    // ------------------------------------------------------------------
    // Link modes
    // ------------------------------------------------------------------

    /// Enters relation mode anchored at `anchor`; the next region
    /// selected becomes the relation target.
    pub fn start_relation_mode(&mut self, anchor: &RegionId) -> bool {
        if self.regions.get(anchor).is_none() {
            return false;
        }
        self.relation_mode = true;
        self.normalization_mode = false;
        self.link_anchor = Some(anchor.clone());
        true
    }

    /// Enters normalization mode anchored at `anchor`.
    pub fn start_normalization_mode(&mut self, anchor: &RegionId) -> bool {
        if self.regions.get(anchor).is_none() {
            return false;
        }
        self.normalization_mode = true;
        self.relation_mode = false;
        self.link_anchor = Some(anchor.clone());
        true
    }

    /// Leaves any active link mode without creating a link.
    pub fn stop_link_mode(&mut self) {
        self.relation_mode = false;
        self.normalization_mode = false;
        self.link_anchor = None;
    }

    /// Completes the pending relation from the anchor to `target`, then
    /// exits relation mode and clears selection.
    pub fn complete_relation(&mut self, target: &RegionId, kind: Option<String>) -> bool {
        let Some(anchor) = self.link_anchor.take() else {
            return false;
        };
        self.relation_mode = false;
        let added = self.regions.get(target).is_some() && self.relations.add(&anchor, target, kind);
        self.regions.unselect_all();
        self.highlighted = None;
        self.changed();
        added
    }

    /// Completes the pending normalization from the anchor to `target`.
    pub fn complete_normalization(&mut self, target: &RegionId, kind: Option<String>) -> bool {
        let Some(anchor) = self.link_anchor.take() else {
            return false;
        };
        self.normalization_mode = false;
        let added =
            self.regions.get(target).is_some() && self.normalizations.add(&anchor, target, kind);
        self.regions.unselect_all();
        self.highlighted = None;
        self.changed();
        added
    }

    /// Adds a relation directly (no mode choreography).
    pub fn add_relation(&mut self, a: &RegionId, b: &RegionId, kind: Option<String>) -> bool {
        let added = self.relations.add(a, b, kind);
        if added {
            self.changed();
        }
        added
    }

    /// Adds a normalization directly.
    pub fn add_normalization(&mut self, a: &RegionId, b: &RegionId, kind: Option<String>) -> bool {
        let added = self.normalizations.add(a, b, kind);
        if added {
            self.changed();
        }
        added
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Steps one snapshot back, applying it to the tree and stores.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Steps one snapshot forward.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Jumps to an arbitrary history index.
    pub fn time_travel(&mut self, index: usize) -> bool {
        match self.history.time_travel(index) {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Jumps back to the undo floor.
    pub fn reset_history(&mut self) -> bool {
        match self.history.reset() {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Blocks undo while a multi-step gesture is in progress.
    pub fn freeze_history(&mut self) {
        self.history.freeze();
    }

    pub fn unfreeze_history(&mut self) {
        self.history.unfreeze();
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn capture(&self) -> Snapshot {
        Snapshot {
            tree: self.tree.clone(),
            regions: self.regions.to_vec(),
            relations: self.relations.relations.clone(),
            normalizations: self.normalizations.normalizations.clone(),
        }
    }

    /// Emits the change notification for a completed mutation.
    fn changed(&mut self) {
        let snapshot = self.capture();
        self.history.record(snapshot);
    }

    /// Installs a snapshot as the current document state. The tree is
    /// replaced wholesale, so the name indices are rebuilt; the change
    /// notification this emits is the one the history engine suppresses.
    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.tree = snapshot.tree;
        self.names = NameIndex::build(&self.tree);
        self.regions.restore(snapshot.regions);
        self.relations.relations = snapshot.relations;
        self.normalizations.normalizations = snapshot.normalizations;

        // Ephemeral references may now dangle; drop them rather than
        // pointing at regions from another timeline.
        if let Some(id) = &self.highlighted {
            if self.regions.get(id).is_none() {
                self.highlighted = None;
            }
        }
        if let Some(id) = &self.link_anchor {
            if self.regions.get(id).is_none() {
                self.link_anchor = None;
                self.relation_mode = false;
                self.normalization_mode = false;
            }
        }
        self.changed();
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Pre-submission hook: exits link modes, clears selection, and
    /// flushes every pending textarea buffer into its committed rows.
    pub fn before_send(&mut self) {
        self.stop_link_mode();
        self.regions.unselect_all();
        self.highlighted = None;

        fn flush(node: &mut Node) {
            if let NodeKind::TextArea(textarea) = &mut node.kind {
                textarea.flush_pending();
            }
            for child in &mut node.children {
                flush(child);
            }
        }
        flush(&mut self.tree.root);
        self.changed();
    }

    /// Flips the ground-truth flag and notifies the host.
    pub fn toggle_ground_truth(&mut self) {
        self.ground_truth = !self.ground_truth;
        self.hooks.ground_truth_toggled(self.id, self.ground_truth);
    }

    /// Records the outcome of a successful save: the first submission of
    /// a draft marks it as sent, later ones as local updates.
    pub fn mark_saved(&mut self) {
        if self.user_generate && !self.sent_user_generate {
            self.sent_user_generate = true;
        } else {
            self.local_update = true;
        }
    }

    /// Builds the backend record for this annotation.
    pub fn to_record(&self) -> AnnotationRecord {
        AnnotationRecord {
            id: self.pk.clone(),
            created_by: self.created_by.clone(),
            created_date: self.created_date.clone(),
            lead_time: self.lead_time,
            ground_truth: self.ground_truth,
            result: self.serialize(),
        }
    }

    // ------------------------------------------------------------------
    // Wire round trip
    // ------------------------------------------------------------------

    /// Serializes the annotation into wire entries.
    ///
    /// Entry order is fixed by the tree's depth-first node order, with
    /// the relation links appended last, so repeated calls on unchanged
    /// state produce identical output.
    pub fn serialize(&self) -> Vec<WireEntry> {
        let mut entries = Vec::new();
        self.tree
            .traverse(&mut |node| entries.extend(node.produce_results(&self.regions)));
        entries.extend(self.relations.serialize(&self.regions));
        entries.extend(self.normalizations.serialize(&self.regions));
        entries
    }

    /// Serializes to a wire-encoded JSON string.
    pub fn serialize_to_string(&self) -> Result<String, LabelstateError> {
        results_to_string(&self.serialize())
    }

    /// Reconstructs state from parsed wire entries.
    ///
    /// Resolution failures abort the load; partial application is not
    /// attempted — the caller must discard the annotation on error.
    /// On success the history is reinitialized over the post-load state,
    /// so undo cannot cross the load boundary.
    pub fn deserialize(&mut self, entries: &[WireEntry]) -> Result<(), LabelstateError> {
        for entry in entries {
            match entry {
                WireEntry::Result(result) => self.apply_entry(result)?,
                WireEntry::Relation(relation) => self.apply_relation(relation)?,
            }
        }
        self.reinit_history();
        Ok(())
    }

    /// Parses a wire-encoded string, then reconstructs state from it.
    pub fn deserialize_str(&mut self, payload: &str) -> Result<(), LabelstateError> {
        let entries = parse_results(payload)?;
        self.deserialize(&entries)
    }

    fn apply_entry(&mut self, entry: &ResultEntry) -> Result<(), LabelstateError> {
        // Textarea rows carrying a region id attach to that region rather
        // than to a node.
        if entry.result_type == "textarea" && entry.id.is_some() {
            return self.apply_region_meta(entry);
        }

        if self.names.name(&entry.from_name).is_none() {
            return Err(LabelstateError::NoSourceNode {
                name: entry.from_name.clone(),
            });
        }

        // An entry may address several targets at once ("a,b"); every
        // named target must resolve before anything is applied.
        let mut target_paths = Vec::new();
        for to_name in entry.to_name.split(',') {
            let to_name = to_name.trim();
            let path = self
                .names
                .name(to_name)
                .ok_or_else(|| LabelstateError::NoTargetNode {
                    name: to_name.to_string(),
                })?
                .clone();
            target_paths.push((to_name.to_string(), path));
        }

        if RegionShape::is_region_type(&entry.result_type) {
            for (to_name, path) in target_paths {
                let node =
                    self.tree
                        .node_mut(&path)
                        .ok_or_else(|| LabelstateError::NoTargetNode {
                            name: to_name.clone(),
                        })?;
                if let Some(region) = node.apply_result(entry, &entry.from_name)? {
                    let inserted = self.regions.add(region);
                    self.hooks.region_created(inserted);
                }
            }
        } else {
            // Annotation-level values apply to the control node that
            // produced them.
            let path = self
                .names
                .name(&entry.from_name)
                .cloned()
                .unwrap_or_default();
            let node = self
                .tree
                .node_mut(&path)
                .ok_or_else(|| LabelstateError::NoSourceNode {
                    name: entry.from_name.clone(),
                })?;
            node.apply_result(entry, &entry.from_name)?;
        }
        Ok(())
    }

    fn apply_region_meta(&mut self, entry: &ResultEntry) -> Result<(), LabelstateError> {
        let pid = entry.id.as_deref().unwrap_or_default();
        let value: TextAreaValue = parse_value(entry)?;
        let region = self.regions.find_by_persisted_id_mut(pid).ok_or_else(|| {
            LabelstateError::UnknownRegionRef {
                id: pid.to_string(),
            }
        })?;
        region.meta_text = value.text;
        region.meta_from = Some(entry.from_name.clone());
        Ok(())
    }

    fn apply_relation(&mut self, entry: &RelationEntry) -> Result<(), LabelstateError> {
        let from = self
            .regions
            .find_by_persisted_id(&entry.from_id)
            .cloned()
            .ok_or_else(|| LabelstateError::UnknownRegionRef {
                id: entry.from_id.clone(),
            })?;
        let to = self
            .regions
            .find_by_persisted_id(&entry.to_id)
            .cloned()
            .ok_or_else(|| LabelstateError::UnknownRegionRef {
                id: entry.to_id.clone(),
            })?;
        if entry.is_normalization() {
            self.normalizations
                .deserialize_link(&from, &to, entry.kind.clone());
        } else {
            self.relations.deserialize_link(&from, &to, entry.kind.clone());
        }
        Ok(())
    }

    /// Recreates the history over the current state: the first snapshot
    /// of the new engine is the post-load tree, which becomes the undo
    /// floor.
    fn reinit_history(&mut self) {
        self.history = History::new(self.capture());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::node::LabelsFlavor;

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
            ],
        ))
    }

    fn rect_region(x: f64) -> Region {
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
            vec!["Cat".into()],
        )
    }

    fn fresh() -> Annotation {
        Annotation::new(AnnotationId(1), sample_tree(), AnnotationKind::Annotation)
    }

    #[test]
    fn test_name_index_built_at_construction() {
        let annotation = fresh();
        assert!(annotation.node("rect").is_some());
        assert!(annotation.node("labels").is_some());
        assert!(annotation.node("absent").is_none());
    }

    #[test]
    fn test_create_and_delete_region_cascades_links() {
        let mut annotation = fresh();
        let a = annotation.create_region(rect_region(1.0));
        let b = annotation.create_region(rect_region(2.0));
        annotation.add_relation(&a, &b, None);
        annotation.add_normalization(&a, &b, None);

        annotation.delete_region(&a);
        assert_eq!(annotation.regions.len(), 1);
        assert!(annotation.relations.find_links(&a, None).is_empty());
        assert!(annotation.normalizations.find_links(&a, None).is_empty());
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut annotation = fresh();
        let a = annotation.create_region(rect_region(1.0));
        annotation.create_region(rect_region(2.0));
        annotation.delete_region(&a);
        assert_eq!(annotation.regions.len(), 1);

        // Three edits back to the construction floor.
        assert!(annotation.undo());
        assert!(annotation.undo());
        assert!(annotation.undo());
        assert_eq!(annotation.regions.len(), 0);
        assert!(!annotation.can_undo());

        assert!(annotation.redo());
        assert!(annotation.redo());
        assert!(annotation.redo());
        assert_eq!(annotation.regions.len(), 1);
        assert!(!annotation.can_redo());
    }

    #[test]
    fn test_new_edit_discards_redo_branch() {
        let mut annotation = fresh();
        annotation.create_region(rect_region(1.0));
        annotation.undo();
        assert!(annotation.can_redo());

        annotation.create_region(rect_region(3.0));
        assert!(!annotation.can_redo());
    }

    #[test]
    fn test_unselect_all_clears_highlight() {
        let mut annotation = fresh();
        let a = annotation.create_region(rect_region(1.0));
        annotation.select_region(&a);
        annotation.highlight_region(&a);
        assert_eq!(annotation.highlighted, Some(a.clone()));

        annotation.unselect_all();
        assert!(annotation.highlighted.is_none());
        assert_eq!(annotation.regions.selected().count(), 0);
    }

    #[test]
    fn test_relation_mode_completes_on_second_selection() {
        let mut annotation = fresh();
        let a = annotation.create_region(rect_region(1.0));
        let b = annotation.create_region(rect_region(2.0));

        annotation.start_relation_mode(&a);
        assert!(annotation.relation_mode);
        annotation.select_region(&b);

        assert!(!annotation.relation_mode);
        assert!(annotation.relations.linked(&a, &b));
        assert_eq!(annotation.regions.selected().count(), 0);
    }

    #[test]
    fn test_before_send_flushes_textarea() {
        let tree = NodeTree::new(Node::view(
            "root",
            vec![
                Node::text("txt", "text"),
                Node::textarea("notes", "txt"),
            ],
        ));
        let mut annotation = Annotation::new(AnnotationId(1), tree, AnnotationKind::Annotation);
        annotation.update_node("notes", |node| {
            if let NodeKind::TextArea(textarea) = &mut node.kind {
                textarea.pending = Some("looks fine".into());
            }
        });

        annotation.before_send();
        let entries = annotation.serialize();
        assert_eq!(entries.len(), 1);
        let entry = entries[0].as_result().unwrap();
        assert_eq!(entry.result_type, "textarea");
        assert_eq!(entry.value["text"], serde_json::json!(["looks fine"]));
    }

    #[test]
    fn test_deserialize_unknown_target_fails_whole_load() {
        let mut annotation = fresh();
        let payload = r#"[{
            "from_name": "labels",
            "to_name": "nope",
            "type": "rectanglelabels",
            "value": {"x": 1.0, "y": 1.0, "width": 2.0, "height": 2.0, "labels": ["Cat"]}
        }]"#;
        let err = annotation.deserialize_str(payload).unwrap_err();
        assert!(matches!(err, LabelstateError::NoTargetNode { .. }));
    }

    #[test]
    fn test_deserialize_unknown_source_fails_whole_load() {
        let mut annotation = fresh();
        let payload = r#"[{
            "from_name": "ghost",
            "to_name": "rect",
            "type": "rectanglelabels",
            "value": {"x": 1.0, "y": 1.0, "width": 2.0, "height": 2.0, "labels": ["Cat"]}
        }]"#;
        let err = annotation.deserialize_str(payload).unwrap_err();
        assert!(matches!(err, LabelstateError::NoSourceNode { .. }));
    }

    #[test]
    fn test_mark_saved_tracks_draft_lifecycle() {
        let mut annotation = Annotation::from_template(
            AnnotationId(1),
            sample_tree(),
            AnnotationKind::Annotation,
            AnnotationOptions::new().user_generated(),
            Rc::new(NoopHooks),
        );
        assert!(annotation.user_generate);
        assert!(!annotation.sent_user_generate);

        annotation.mark_saved();
        assert!(annotation.sent_user_generate);
        assert!(!annotation.local_update);

        annotation.mark_saved();
        assert!(annotation.local_update);
    }

    #[test]
    fn test_record_carries_metadata_and_results() {
        let mut annotation = Annotation::from_template(
            AnnotationId(1),
            sample_tree(),
            AnnotationKind::Annotation,
            AnnotationOptions::new()
                .with_pk("backend-7")
                .with_author("ana")
                .with_lead_time(42.0),
            Rc::new(NoopHooks),
        );
        annotation.create_region(rect_region(1.0));
        annotation.toggle_ground_truth();

        let record = annotation.to_record();
        assert_eq!(record.id.as_deref(), Some("backend-7"));
        assert_eq!(record.created_by.as_deref(), Some("ana"));
        assert!(record.ground_truth);
        assert_eq!(record.result.len(), 1);
    }

    #[test]
    fn test_load_boundary_is_undo_floor() {
        let mut annotation = fresh();
        let payload = r#"[{
            "id": "r1",
            "from_name": "labels",
            "to_name": "rect",
            "type": "rectanglelabels",
            "value": {"x": 1.0, "y": 1.0, "width": 2.0, "height": 2.0, "labels": ["Cat"]}
        }]"#;
        annotation.deserialize_str(payload).expect("load");
        assert_eq!(annotation.regions.len(), 1);
        assert!(!annotation.can_undo(), "undo must not cross the load");

        annotation.create_region(rect_region(5.0));
        assert!(annotation.can_undo());
        annotation.undo();
        assert_eq!(annotation.regions.len(), 1);
    }
}
