//! Host-environment callbacks.
//!
//! The hosting editor supplies an implementation to observe region
//! lifecycle and ground-truth toggles (comment threads, validation panes
//! and similar collaborators hang off these). The core never depends on
//! what the host does with a callback.

use super::ids::AnnotationId;
use super::region::Region;

/// Callbacks invoked by the core on externally visible events.
///
/// Every method has a no-op default, so hosts implement only what they
/// observe.
pub trait Hooks {
    /// A region was created (by a gesture or by deserialization).
    fn region_created(&self, region: &Region) {
        let _ = region;
    }

    /// A region was destroyed, after its links were cascaded away.
    fn region_deleted(&self, region: &Region) {
        let _ = region;
    }

    /// An annotation's ground-truth flag flipped.
    fn ground_truth_toggled(&self, annotation: AnnotationId, ground_truth: bool) {
        let _ = (annotation, ground_truth);
    }
}

/// The default host: observes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl Hooks for NoopHooks {}
