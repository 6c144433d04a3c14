//! Expands the ancestors of persisted selections so they are visible on load.
//!
//! Each queued selection is turned into an anchor path: its vocabulary
//! first, then its stored ancestor chain walked from the root down to the
//! immediate parent. The pass resolves the current anchor of the queue head
//! in the loaded tree, expands it (which may fetch its children) and moves
//! on to the next anchor. A selection leaves the queue exactly once: when
//! its whole path is open, or as soon as one of its anchors cannot be
//! resolved or loaded.
//!
//! Every step either advances a cursor or dequeues an entry, so a pass
//! takes at most one step per anchor plus one per entry.

use crate::config::PersistedSelection;
use crate::controller::TreeController;
use crate::source::NodeSource;
use derive_more::Display;
use log::{debug, info, trace, warn};
use std::collections::VecDeque;

/// One node to expand on the way to a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// The vocabulary node. Optional when only implied by `vid`, since trees
    /// that list root terms directly have no vocabulary node.
    Container { vid: String, required: bool },
    /// An ancestor term
    Term(String),
}

impl Anchor {
    pub fn key(&self) -> &str {
        match self {
            Anchor::Container { vid, .. } => vid,
            Anchor::Term(tid) => tid,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            Anchor::Container { required, .. } => *required,
            Anchor::Term(_) => true,
        }
    }
}

/// Progress of the queue head through one anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StepState {
    Unresolved,
    Located,
    Expanding,
    Expanded,
    Dequeued,
}

/// A selection waiting for its ancestors to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionEntry {
    pub target_id: String,
    path: Vec<Anchor>,
    cursor: usize,
}

impl ExpansionEntry {
    pub fn new(selection: &PersistedSelection, root_sentinel: &str) -> Self {
        let anchored = selection
            .parents
            .iter()
            .any(|parent| parent.target_id == root_sentinel);

        let mut path = Vec::with_capacity(selection.parents.len() + 1);
        if anchored || !selection.vid.is_empty() {
            path.push(Anchor::Container {
                vid: selection.vid.clone(),
                required: anchored,
            });
        }
        path.extend(
            selection
                .parents
                .iter()
                .rev()
                .filter(|parent| parent.target_id != root_sentinel)
                .map(|parent| Anchor::Term(parent.target_id.clone())),
        );

        Self {
            target_id: selection.target_id.clone(),
            path,
            cursor: 0,
        }
    }

    /// Anchors from the vocabulary down to the immediate parent
    pub fn path(&self) -> &[Anchor] {
        &self.path
    }

    /// The anchor to process next, `None` once the path is open
    pub fn current(&self) -> Option<&Anchor> {
        self.path.get(self.cursor)
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }
}

/// Selections whose ancestors still have to be expanded, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionQueue {
    entries: VecDeque<ExpansionEntry>,
}

impl ExpansionQueue {
    pub fn new<'a>(
        selections: impl IntoIterator<Item = &'a PersistedSelection>,
        root_sentinel: &str,
    ) -> Self {
        Self {
            entries: selections
                .into_iter()
                .map(|selection| ExpansionEntry::new(selection, root_sentinel))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn front(&self) -> Option<&ExpansionEntry> {
        self.entries.front()
    }

    /// Total number of anchors left to process
    pub fn remaining_anchors(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.path.len() - entry.cursor)
            .sum()
    }

    fn advance_front(&mut self) {
        if let Some(entry) = self.entries.front_mut() {
            entry.advance();
        }
    }

    fn dequeue(&mut self) -> Option<ExpansionEntry> {
        let entry = self.entries.pop_front()?;
        trace!("{}: {}", entry.target_id, StepState::Dequeued);
        Some(entry)
    }
}

/// Why a selection left the queue without its path being opened
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum AbandonReason {
    #[display(fmt = "ancestor {} is not in the loaded tree", _0)]
    UnresolvableAncestor(String),
    #[display(fmt = "loading children of {} failed: {}", key, message)]
    FetchFailure { key: String, message: String },
}

/// A selection dropped from the queue
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "{}: {}", target_id, reason)]
pub struct Abandoned {
    pub target_id: String,
    pub reason: AbandonReason,
}

/// Outcome of one expansion pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    /// Targets whose whole ancestor path was opened
    pub revealed: Vec<String>,
    pub abandoned: Vec<Abandoned>,
    /// Set when the tree was torn down before the queue drained
    pub cancelled: bool,
    /// Number of steps the pass took
    pub steps: usize,
}

/// Run one expansion pass over `queue`
///
/// Entries are processed strictly one after another: the next anchor is only
/// looked at after the previous expand has settled. Node ids are re-resolved
/// by key at every step. The pass stops early if the controller is torn down.
pub async fn expand_all<S: NodeSource>(
    controller: &mut TreeController<S>,
    mut queue: ExpansionQueue,
) -> ExpansionReport {
    let mut report = ExpansionReport::default();
    debug!(
        "Expanding {} selection(s) in {}, {} anchor(s)",
        queue.len(),
        controller.id(),
        queue.remaining_anchors()
    );

    while let Some(entry) = queue.front() {
        if !controller.is_active() {
            debug!(
                "{} torn down with {} selection(s) left to expand",
                controller.id(),
                queue.len()
            );
            report.cancelled = true;
            return report;
        }
        report.steps += 1;

        let target_id = entry.target_id.clone();
        let Some(anchor) = entry.current().cloned() else {
            trace!("{target_id}: path open");
            queue.dequeue();
            report.revealed.push(target_id);
            continue;
        };
        trace!("{target_id}: {} {}", anchor.key(), StepState::Unresolved);

        let Some(node) = controller.tree().node_by_key(anchor.key()) else {
            if anchor.is_required() {
                abandon(
                    &mut queue,
                    &mut report,
                    target_id,
                    AbandonReason::UnresolvableAncestor(anchor.key().to_string()),
                );
            } else {
                trace!("{target_id}: no vocabulary node {}, skipping", anchor.key());
                queue.advance_front();
            }
            continue;
        };
        trace!("{target_id}: {} {} as {node}", anchor.key(), StepState::Located);

        trace!("{target_id}: {} {}", anchor.key(), StepState::Expanding);
        match controller.expand(node).await {
            Ok(()) => {
                trace!("{target_id}: {} {}", anchor.key(), StepState::Expanded);
                queue.advance_front();
            }
            Err(_) if !controller.is_active() => {
                report.cancelled = true;
                return report;
            }
            Err(e) => abandon(
                &mut queue,
                &mut report,
                target_id,
                AbandonReason::FetchFailure {
                    key: anchor.key().to_string(),
                    message: format!("{e:#}"),
                },
            ),
        }
    }

    info!(
        "Expansion of {} done: {} revealed, {} abandoned in {} step(s)",
        controller.id(),
        report.revealed.len(),
        report.abandoned.len(),
        report.steps
    );
    report
}

fn abandon(
    queue: &mut ExpansionQueue,
    report: &mut ExpansionReport,
    target_id: String,
    reason: AbandonReason,
) {
    let abandoned = Abandoned { target_id, reason };
    warn!("Not expanding towards {abandoned}");
    queue.dequeue();
    report.abandoned.push(abandoned);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_path_is_root_first() {
        let selection = PersistedSelection::new("7", ["5", "3"], "2");
        let entry = ExpansionEntry::new(&selection, "0");

        assert_eq!(
            entry.path(),
            &[
                Anchor::Container {
                    vid: "2".to_string(),
                    required: false
                },
                Anchor::Term("3".to_string()),
                Anchor::Term("5".to_string()),
            ]
        );
        assert_eq!(entry.current().map(Anchor::key), Some("2"));
    }

    #[test]
    fn test_sentinel_anchors_to_vocabulary() {
        let selection = PersistedSelection::new("3", ["0"], "tags");
        let entry = ExpansionEntry::new(&selection, "0");

        assert_eq!(
            entry.path(),
            &[Anchor::Container {
                vid: "tags".to_string(),
                required: true
            }]
        );
        assert!(entry.current().unwrap().is_required());
    }

    #[test]
    fn test_queue_counts() {
        let selections = vec![
            PersistedSelection::new("7", ["3"], "2"),
            PersistedSelection::new("9", Vec::<String>::new(), ""),
        ];
        let mut queue = ExpansionQueue::new(&selections, "0");

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.remaining_anchors(), 2);

        queue.advance_front();
        assert_eq!(queue.remaining_anchors(), 1);
        assert_eq!(queue.dequeue().unwrap().target_id, "7");
        assert_eq!(queue.front().unwrap().path(), &[] as &[Anchor]);
    }

    #[test]
    fn test_reason_display() {
        let abandoned = Abandoned {
            target_id: "7".to_string(),
            reason: AbandonReason::UnresolvableAncestor("3".to_string()),
        };
        assert_eq!(abandoned.to_string(), "7: ancestor 3 is not in the loaded tree");

        let reason = AbandonReason::FetchFailure {
            key: "3".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(reason.to_string(), "loading children of 3 failed: timeout");
    }
}
