//! Primary and secondary capture queues.
//!
//! The primary queue holds the current problem and is capped at
//! [`PRIMARY_CAPACITY`]; the oldest capture is evicted when a new one
//! arrives in `queue` view. The secondary queue collects debug context and
//! grows without bound. A path lives in at most one queue.
//!
//! A running pipeline holds the captures it snapshotted. Deleting a held
//! capture drops it from its queue at once, but the file stays on disk
//! until every run holding it has released it.

use super::{Capture, CaptureStore, QueueKind};
use crate::error::StorageError;
use crate::pipeline::ViewState;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PRIMARY_CAPACITY: usize = 2;

/// What `enqueue` did with a capture.
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueOutcome {
    Added(QueueKind),
    /// The primary queue was full; `evicted` was dropped to make room.
    AddedWithEviction { evicted: Capture },
    /// The path was already queued; nothing changed.
    Duplicate,
}

pub struct CaptureQueue {
    primary: VecDeque<Capture>,
    secondary: Vec<Capture>,
    store: Arc<dyn CaptureStore>,
    /// Run id → paths that run is still reading.
    held: HashMap<u64, Vec<PathBuf>>,
    /// Files whose delete waits on a hold.
    deferred: Vec<PathBuf>,
}

impl CaptureQueue {
    pub fn new(store: Arc<dyn CaptureStore>) -> Self {
        Self {
            primary: VecDeque::with_capacity(PRIMARY_CAPACITY),
            secondary: Vec::new(),
            store,
            held: HashMap::new(),
            deferred: Vec::new(),
        }
    }

    /// Route a capture by the current view.
    pub fn enqueue(&mut self, capture: Capture, view: ViewState) -> EnqueueOutcome {
        if self.contains(&capture.path) {
            log::info!(
                "[QUEUE] Ignoring duplicate capture: {}",
                capture.path.display()
            );
            return EnqueueOutcome::Duplicate;
        }

        let kind = view.capture_target();
        match kind {
            QueueKind::Primary => {
                let mut evicted = None;
                if self.primary.len() >= PRIMARY_CAPACITY {
                    if let Some(oldest) = self.primary.pop_front() {
                        log::info!("[QUEUE] Primary full, evicting {}", oldest.path.display());
                        if let Err(e) = self.delete_or_defer(&oldest.path) {
                            log::warn!("[QUEUE] Failed to delete evicted capture: {}", e);
                        }
                        evicted = Some(oldest);
                    }
                }
                log::info!("[QUEUE] + primary: {}", capture.path.display());
                self.primary.push_back(capture);
                match evicted {
                    Some(evicted) => EnqueueOutcome::AddedWithEviction { evicted },
                    None => EnqueueOutcome::Added(kind),
                }
            }
            QueueKind::Secondary => {
                log::info!("[QUEUE] + secondary: {}", capture.path.display());
                self.secondary.push(capture);
                EnqueueOutcome::Added(kind)
            }
        }
    }

    /// Delete a capture's file, then drop it from its queue.
    ///
    /// If the delete fails the capture stays queued and the error is returned.
    pub fn remove(&mut self, path: &Path) -> Result<Capture, StorageError> {
        let location = if let Some(i) = self.primary.iter().position(|c| c.path == path) {
            (QueueKind::Primary, i)
        } else if let Some(i) = self.secondary.iter().position(|c| c.path == path) {
            (QueueKind::Secondary, i)
        } else {
            return Err(StorageError::NotQueued(path.to_path_buf()));
        };

        self.delete_or_defer(path)?;

        let removed = match location {
            (QueueKind::Primary, i) => self.primary.remove(i),
            (QueueKind::Secondary, i) => Some(self.secondary.remove(i)),
        };
        log::info!("[QUEUE] - {}: {}", location.0, path.display());
        removed.ok_or_else(|| StorageError::NotQueued(path.to_path_buf()))
    }

    /// Empty one queue. File deletes are best-effort.
    pub fn clear(&mut self, kind: QueueKind) {
        let drained: Vec<Capture> = match kind {
            QueueKind::Primary => self.primary.drain(..).collect(),
            QueueKind::Secondary => self.secondary.drain(..).collect(),
        };
        let mut failures = 0;
        for capture in &drained {
            if let Err(e) = self.delete_or_defer(&capture.path) {
                failures += 1;
                log::warn!("[QUEUE] Failed to delete {}: {}", capture.path.display(), e);
            }
        }
        log::info!(
            "[QUEUE] Cleared {} queue ({} captures, {} delete failures)",
            kind,
            drained.len(),
            failures
        );
    }

    pub fn clear_all(&mut self) {
        self.clear(QueueKind::Primary);
        self.clear(QueueKind::Secondary);
    }

    /// Snapshot of a queue in insertion order.
    pub fn list(&self, kind: QueueKind) -> Vec<Capture> {
        match kind {
            QueueKind::Primary => self.primary.iter().cloned().collect(),
            QueueKind::Secondary => self.secondary.clone(),
        }
    }

    pub fn len(&self, kind: QueueKind) -> usize {
        match kind {
            QueueKind::Primary => self.primary.len(),
            QueueKind::Secondary => self.secondary.len(),
        }
    }

    pub fn is_empty(&self, kind: QueueKind) -> bool {
        self.len(kind) == 0
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.primary.iter().any(|c| c.path == path) || self.secondary.iter().any(|c| c.path == path)
    }

    /// Keep the files of `captures` on disk until `release(run_id)`.
    pub fn hold(&mut self, run_id: u64, captures: &[Capture]) {
        self.held
            .insert(run_id, captures.iter().map(|c| c.path.clone()).collect());
    }

    /// Drop a run's hold and delete any deferred files nobody holds now.
    pub fn release(&mut self, run_id: u64) {
        if self.held.remove(&run_id).is_none() {
            return;
        }
        let pending = std::mem::take(&mut self.deferred);
        for path in pending {
            if self.is_held(&path) {
                self.deferred.push(path);
            } else if self.contains(&path) {
                // Re-queued since; the file is live again.
                continue;
            } else if let Err(e) = self.store.delete_file(&path) {
                log::warn!("[QUEUE] Failed to delete released capture: {}", e);
            } else {
                log::info!("[QUEUE] Deleted released capture {}", path.display());
            }
        }
    }

    fn is_held(&self, path: &Path) -> bool {
        self.held.values().flatten().any(|p| p == path)
    }

    fn delete_or_defer(&mut self, path: &Path) -> Result<(), StorageError> {
        if self.is_held(path) {
            log::info!("[QUEUE] {} in use by a run, delete deferred", path.display());
            if !self.deferred.iter().any(|p| p == path) {
                self.deferred.push(path.to_path_buf());
            }
            return Ok(());
        }
        self.store.delete_file(path)
    }
}
