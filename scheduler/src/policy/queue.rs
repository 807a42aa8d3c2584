//! Priority Queue Entries
//!
//! Max-heap ordering for the per-slot UE ranking. Entries hold UE indices
//! (stable handles into the history table), never references; the queue is
//! rebuilt from scratch every slot.

use common::types::UeIndex;
use std::cmp::Ordering;

/// One UE's ranking for the current slot
#[derive(Debug, Clone, Copy)]
pub struct QueueEntry {
    /// Priority score computed this slot
    pub prio: f64,
    /// Pending Scheduling Request flag; takes absolute precedence over
    /// the numeric priority in the UL queue comparator
    pub sr: bool,
    /// Handle into the UE history table
    pub ue_index: UeIndex,
    /// Position of the UE in the slice candidate's UE vector this slot
    pub slice_pos: usize,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sr
            .cmp(&other.sr)
            .then(self.prio.total_cmp(&other.prio))
            // Deterministic tie-break for exact reproducibility
            .then(other.ue_index.cmp(&self.ue_index))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}
