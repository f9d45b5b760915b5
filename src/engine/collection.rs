//! Ownership of all annotations and predictions for one task.

use std::rc::Rc;

use super::annotation::{Annotation, AnnotationKind, AnnotationOptions};
use super::hooks::{Hooks, NoopHooks};
use super::ids::AnnotationId;
use super::node::NodeTree;
use super::results::AnnotationRecord;
use crate::error::LabelstateError;

/// The set of annotations (submitted + drafts) and predictions over one
/// task, with at most one selected entity across both lists.
pub struct AnnotationCollection {
    /// Template tree cloned into every new entity. Produced by the
    /// external tag-tree provider.
    template: NodeTree,
    pub annotations: Vec<Annotation>,
    pub predictions: Vec<Annotation>,
    hooks: Rc<dyn Hooks>,
    next_id: u64,
}

impl AnnotationCollection {
    pub fn new(template: NodeTree) -> Self {
        Self::with_hooks(template, Rc::new(NoopHooks))
    }

    pub fn with_hooks(template: NodeTree, hooks: Rc<dyn Hooks>) -> Self {
        Self {
            template,
            annotations: Vec::new(),
            predictions: Vec::new(),
            hooks,
            next_id: 1,
        }
    }

    fn alloc_id(&mut self) -> AnnotationId {
        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Instantiates a fresh annotation from the template, inserts it at
    /// the front, and selects it.
    pub fn add_annotation(&mut self, options: AnnotationOptions) -> AnnotationId {
        let id = self.alloc_id();
        let annotation = Annotation::from_template(
            id,
            self.template.clone(),
            AnnotationKind::Annotation,
            options,
            Rc::clone(&self.hooks),
        );
        self.annotations.insert(0, annotation);
        self.select(id, AnnotationKind::Annotation);
        log::debug!("annotation {} added", id);
        id
    }

    /// Instantiates a fresh prediction from the template and inserts it
    /// at the front of the prediction list. Predictions are not
    /// auto-selected.
    pub fn add_prediction(&mut self, options: AnnotationOptions) -> AnnotationId {
        let id = self.alloc_id();
        let prediction = Annotation::from_template(
            id,
            self.template.clone(),
            AnnotationKind::Prediction,
            options,
            Rc::clone(&self.hooks),
        );
        self.predictions.insert(0, prediction);
        log::debug!("prediction {} added", id);
        id
    }

    /// Selects one entity, deselecting whichever entity (of either kind)
    /// was selected before. Returns false when the id does not resolve.
    pub fn select(&mut self, id: AnnotationId, kind: AnnotationKind) -> bool {
        let exists = self.get(id, kind).is_some();
        if !exists {
            return false;
        }
        for entity in self.annotations.iter_mut().chain(self.predictions.iter_mut()) {
            entity.selected = entity.id == id && entity.kind == kind;
        }
        true
    }

    /// The currently selected entity, if any.
    pub fn selected(&self) -> Option<&Annotation> {
        self.annotations
            .iter()
            .chain(self.predictions.iter())
            .find(|entity| entity.selected)
    }

    /// The currently selected entity, mutably.
    pub fn selected_mut(&mut self) -> Option<&mut Annotation> {
        self.annotations
            .iter_mut()
            .chain(self.predictions.iter_mut())
            .find(|entity| entity.selected)
    }

    pub fn get(&self, id: AnnotationId, kind: AnnotationKind) -> Option<&Annotation> {
        let list = match kind {
            AnnotationKind::Annotation => &self.annotations,
            AnnotationKind::Prediction => &self.predictions,
        };
        list.iter().find(|entity| entity.id == id)
    }

    pub fn get_mut(&mut self, id: AnnotationId, kind: AnnotationKind) -> Option<&mut Annotation> {
        let list = match kind {
            AnnotationKind::Annotation => &mut self.annotations,
            AnnotationKind::Prediction => &mut self.predictions,
        };
        list.iter_mut().find(|entity| entity.id == id)
    }

    /// Destroys an annotation. If it was selected, another remaining
    /// annotation (when any exist) becomes selected — there is no
    /// "nothing selected" state while annotations are present.
    pub fn delete(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        let removed = self.annotations.remove(index);
        log::debug!("annotation {} deleted", id);
        if removed.selected {
            if let Some(first) = self.annotations.first().map(|a| a.id) {
                self.select(first, AnnotationKind::Annotation);
            }
        }
        Some(removed)
    }

    /// Reconstructs a stored annotation from its backend record.
    pub fn load_annotation(
        &mut self,
        record: &AnnotationRecord,
    ) -> Result<AnnotationId, LabelstateError> {
        let mut options = AnnotationOptions::new();
        options.pk = record.id.clone();
        options.created_by = record.created_by.clone();
        options.created_date = record.created_date.clone();
        options.lead_time = record.lead_time;
        options.ground_truth = record.ground_truth;

        let id = self.add_annotation(options);
        let annotation = self
            .get_mut(id, AnnotationKind::Annotation)
            .expect("annotation just added");
        match annotation.deserialize(&record.result) {
            Ok(()) => Ok(id),
            Err(err) => {
                self.delete(id);
                Err(err)
            }
        }
    }

    /// Turns a prediction into an editable annotation by copying its
    /// serialized results through the deserialize protocol.
    pub fn create_from_prediction(
        &mut self,
        prediction_id: AnnotationId,
    ) -> Result<AnnotationId, LabelstateError> {
        let entries = self
            .get(prediction_id, AnnotationKind::Prediction)
            .ok_or(LabelstateError::UnknownAnnotation(prediction_id.as_u64()))?
            .serialize();

        let id = self.add_annotation(AnnotationOptions::new().user_generated());
        let annotation = self
            .get_mut(id, AnnotationKind::Annotation)
            .expect("annotation just added");
        match annotation.deserialize(&entries) {
            Ok(()) => Ok(id),
            Err(err) => {
                // The load failed; a partially reconstructed annotation
                // must not be kept around.
                self.delete(id);
                Err(err)
            }
        }
    }

    pub fn template(&self) -> &NodeTree {
        &self.template
    }
}
