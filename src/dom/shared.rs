//! The widget tree shared between the script thread and the renderer.
//!
//! Only the script thread mutates. After each mutation (or at the end of a
//! batch) the writer captures a [`TreeSnapshot`] and swaps it in as the
//! published one; readers just clone the `Arc`. A `watch` channel carries the
//! published revision so a renderer can wait for changes.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::snapshot::TreeSnapshot;
use super::tree::WidgetTree;
use crate::logging::targets;

struct State {
    tree: WidgetTree,
    batch_depth: usize,
}

struct Inner {
    state: Mutex<State>,
    published: Arc<Mutex<Arc<TreeSnapshot>>>,
    notify: watch::Sender<u64>,
}

/// Writer handle to the live tree. Cheap to clone.
#[derive(Clone)]
pub struct SharedTree {
    inner: Arc<Inner>,
}

impl SharedTree {
    pub fn new(tree: WidgetTree) -> Self {
        let snapshot = Arc::new(tree.snapshot());
        let (notify, _) = watch::channel(snapshot.revision);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State { tree, batch_depth: 0 }),
                published: Arc::new(Mutex::new(snapshot)),
                notify,
            }),
        }
    }

    /// Run `f` against the live tree, publishing afterwards unless a batch is
    /// open.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut WidgetTree) -> R) -> R {
        let mut state = self.inner.state.lock();
        let result = f(&mut state.tree);
        if state.batch_depth == 0 {
            self.publish_locked(&state);
        }
        result
    }

    /// Read the live tree without publishing.
    pub fn read<R>(&self, f: impl FnOnce(&WidgetTree) -> R) -> R {
        f(&self.inner.state.lock().tree)
    }

    /// Defer publication until the returned guard (and every enclosing one)
    /// is dropped.
    pub fn batch(&self) -> BatchGuard {
        self.inner.state.lock().batch_depth += 1;
        BatchGuard { shared: self.clone() }
    }

    fn end_batch(&self) {
        let mut state = self.inner.state.lock();
        state.batch_depth = state.batch_depth.saturating_sub(1);
        if state.batch_depth == 0 {
            self.publish_locked(&state);
        }
    }

    fn publish_locked(&self, state: &State) {
        let revision = state.tree.revision();
        if self.inner.published.lock().revision == revision {
            return;
        }
        let snapshot = Arc::new(state.tree.snapshot());
        *self.inner.published.lock() = snapshot;
        self.inner.notify.send_replace(revision);
        tracing::trace!(target: targets::DOM, revision, "snapshot published");
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<TreeSnapshot> {
        self.inner.published.lock().clone()
    }

    /// A read-only handle for the rendering context.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            published: Arc::clone(&self.inner.published),
            changes: self.inner.notify.subscribe(),
        }
    }
}

/// Ends a publication batch on drop.
#[must_use = "the batch ends when the guard is dropped"]
pub struct BatchGuard {
    shared: SharedTree,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.shared.end_batch();
    }
}

/// Read side of the shared tree. Never blocks the writer for longer than an
/// `Arc` clone.
#[derive(Clone)]
pub struct SnapshotReader {
    published: Arc<Mutex<Arc<TreeSnapshot>>>,
    changes: watch::Receiver<u64>,
}

impl SnapshotReader {
    pub fn latest(&self) -> Arc<TreeSnapshot> {
        self.published.lock().clone()
    }

    /// Revision of the latest publication.
    pub fn revision(&self) -> u64 {
        *self.changes.borrow()
    }

    /// True if a snapshot was published since the last [`changed`](Self::changed).
    pub fn has_changed(&self) -> bool {
        self.changes.has_changed().unwrap_or(false)
    }

    /// Wait for the next publication. Returns `None` once the writer is gone.
    pub async fn changed(&mut self) -> Option<Arc<TreeSnapshot>> {
        self.changes.changed().await.ok()?;
        self.changes.borrow_and_update();
        Some(self.latest())
    }
}
