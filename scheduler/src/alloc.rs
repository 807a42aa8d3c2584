//! Allocator Interface
//!
//! The policies do not touch the resource grid directly; they submit typed
//! grant requests through these traits and act on the returned status. All
//! recoverable outcomes travel as status values, never as errors: this is a
//! real-time hot path.

use common::types::{CellIndex, HarqId, Lcid, UeIndex};

/// Outcome of one allocation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocStatus {
    /// The grant was placed in the grid
    Success,
    /// Nothing to allocate for this UE this attempt; continue with the next UE
    SkipUe,
    /// The grid has no capacity left this slot; stop all work this direction.
    /// Not a fault: the condition clears naturally next slot.
    SkipSlot,
    /// A precondition was violated; skip this UE this slot, do not retry
    InvalidParams,
}

/// New-transmission or retransmission PDSCH grant request
#[derive(Debug, Clone, Copy)]
pub struct DlGrantRequest {
    /// Target UE
    pub ue_index: UeIndex,
    /// Target cell
    pub cell_index: CellIndex,
    /// HARQ process for a retransmission; `None` requests a new transmission
    pub harq_id: Option<HarqId>,
    /// Bytes the scheduler would like the transport block to carry
    pub recommended_bytes: u32,
    /// Upper bound on PRBs the allocator may use
    pub max_rbs: u16,
}

/// New-transmission or retransmission PUSCH grant request
#[derive(Debug, Clone, Copy)]
pub struct UlGrantRequest {
    /// Target UE
    pub ue_index: UeIndex,
    /// Target cell
    pub cell_index: CellIndex,
    /// HARQ process for a retransmission; `None` requests a new transmission
    pub harq_id: Option<HarqId>,
    /// Bytes the scheduler would like the transport block to carry
    pub recommended_bytes: u32,
    /// Upper bound on PRBs the allocator may use
    pub max_rbs: u16,
}

/// Per-logical-channel composition of a built transport block
#[derive(Debug, Clone, Default)]
pub struct TbInfo {
    /// Scheduled bytes per logical channel
    pub lc_bytes: Vec<(Lcid, u32)>,
}

impl TbInfo {
    /// Bytes scheduled for a given logical channel (0 if absent from the TB)
    pub fn bytes_for(&self, lcid: Lcid) -> u32 {
        self.lc_bytes
            .iter()
            .find(|(id, _)| *id == lcid)
            .map(|(_, bytes)| *bytes)
            .unwrap_or(0)
    }
}

/// Result of one allocation attempt
#[derive(Debug, Clone)]
pub struct AllocResult {
    /// Attempt outcome
    pub status: AllocStatus,
    /// Bytes actually allocated (0 unless `Success`)
    pub alloc_bytes: u32,
    /// PRBs actually used (0 unless `Success`)
    pub nof_prbs_used: u16,
    /// Per-LC breakdown of the built transport block
    pub tb: TbInfo,
}

impl AllocResult {
    /// Convenience constructor for non-success outcomes
    pub fn status_only(status: AllocStatus) -> Self {
        Self { status, alloc_bytes: 0, nof_prbs_used: 0, tb: TbInfo::default() }
    }
}

/// PDSCH grant allocator, owned by the calling real-time thread for the slot
pub trait PdschAllocator {
    /// Attempt to place a DL grant in the resource grid
    fn alloc_dl_grant(&mut self, req: DlGrantRequest) -> AllocResult;
}

/// PUSCH grant allocator, owned by the calling real-time thread for the slot
pub trait PuschAllocator {
    /// Attempt to place a UL grant in the resource grid
    fn alloc_ul_grant(&mut self, req: UlGrantRequest) -> AllocResult;
}
