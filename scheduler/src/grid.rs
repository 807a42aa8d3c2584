//! Resource Grid View and Pending Retransmissions
//!
//! Immutable per-slot view of the cell resource grid, plus the pending HARQ
//! retransmission list the policies consume destructively.

use crate::mcs_tables::McsIndex;
use common::types::{CellIndex, HarqId, UeIndex};

/// Read-only per-slot queries against the cell resource grid
///
/// Implemented by the cell scheduler that owns the grid; the policies only
/// ever read through this trait within one slot.
pub trait ResourceGridView {
    /// Whether DL transmission is enabled in this slot for the cell
    fn is_dl_enabled(&self, cell: CellIndex) -> bool;

    /// Whether UL transmission is enabled in this slot for the cell
    fn is_ul_enabled(&self, cell: CellIndex) -> bool;

    /// Whether a PDCCH candidate is still available for this UE
    fn pdcch_schedulable(&self, cell: CellIndex, ue: UeIndex) -> bool;

    /// Number of PDSCH symbols available this slot
    fn dl_symbols(&self, cell: CellIndex) -> u8;

    /// Number of PUSCH symbols available this slot
    fn ul_symbols(&self, cell: CellIndex) -> u8;

    /// Whether this is a partial (shortened) slot
    fn is_partial_slot(&self, cell: CellIndex) -> bool;
}

/// Grant parameters recorded at a HARQ process's first transmission
///
/// A retransmission must reuse these verbatim; see TS 38.214 constraints on
/// non-adaptive retransmissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrevTxParams {
    /// MCS of the initial transmission
    pub mcs: McsIndex,
    /// PRBs used by the initial transmission
    pub nof_prbs: u16,
    /// OFDM symbols used by the initial transmission
    pub nof_symbols: u8,
    /// Transport block size of the initial transmission in bytes
    pub tbs_bytes: u32,
}

/// One pending HARQ retransmission
///
/// The retransmission list is ordered oldest-first; older processes are
/// closer to their retransmission-timer expiry.
#[derive(Debug, Clone, Copy)]
pub struct PendingRetx {
    /// UE owning the HARQ process
    pub ue_index: UeIndex,
    /// Cell the process lives on
    pub cell_index: CellIndex,
    /// Whether that cell is the UE's PCell
    pub is_pcell: bool,
    /// HARQ process id
    pub harq_id: HarqId,
    /// Parameters of the initial transmission
    pub prev: PrevTxParams,
}
