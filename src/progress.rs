//! Progress-callback trait for per-item run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events as
//! the dispatcher works through input items. Callbacks are the least-invasive
//! integration point: the host can forward events to a channel, a UI, or a
//! terminal spinner without the library knowing how the host communicates.
//!
//! Items are processed strictly sequentially, so events for different items
//! never interleave; the trait is still `Send + Sync` so one callback can be
//! shared across runs.

use std::sync::Arc;

/// Called by the dispatcher as it processes each input item.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. For aggregate operations (merge, archive) the whole
/// run is one unit: `on_item_start`/`on_item_complete` still fire once per
/// item around its upload.
pub trait RunProgressCallback: Send + Sync {
    /// Called once before any item is processed.
    fn on_run_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called when an item's job cycle (or upload, for aggregate runs) begins.
    fn on_item_start(&self, item: usize, total_items: usize) {
        let _ = (item, total_items);
    }

    /// Called when an item finished and its outputs were emitted.
    ///
    /// `outputs` is the number of output items this input produced — one
    /// input can fan out into several (e.g. one PNG per PDF page). In an
    /// aggregate run this fires after the item's upload and `outputs` is
    /// always `0`; the combined result only exists once the whole job
    /// finishes and is reported via [`RunProgressCallback::on_run_complete`].
    fn on_item_complete(&self, item: usize, total_items: usize, outputs: usize) {
        let _ = (item, total_items, outputs);
    }

    /// Called when an item's processing failed. The run stops after this.
    fn on_item_error(&self, item: usize, total_items: usize, error: &str) {
        let _ = (item, total_items, error);
    }

    /// Called once after the run ends, whether or not a failure occurred.
    fn on_run_complete(&self, total_items: usize, emitted_outputs: usize) {
        let _ = (total_items, emitted_outputs);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl RunProgressCallback for TrackingCallback {
        fn on_item_start(&self, _item: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_item_complete(&self, _item: usize, _total: usize, _outputs: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
        fn on_item_error(&self, _item: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(3);
        cb.on_item_start(0, 3);
        cb.on_item_complete(0, 3, 1);
        cb.on_item_error(1, 3, "some error");
        cb.on_run_complete(3, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        };

        tracker.on_item_start(0, 2);
        tracker.on_item_complete(0, 2, 2);
        tracker.on_item_start(1, 2);
        tracker.on_item_error(1, 2, "job failed");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn RunProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_run_start(1);
        cb.on_item_start(0, 1);
    }
}
