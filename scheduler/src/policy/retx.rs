//! Retransmission Pass
//!
//! Walks the pending HARQ retransmission list before any new transmission is
//! considered. The list is oldest-first; within one UE the PCell entry is
//! attempted before SCell entries. A single `SkipSlot` from the allocator
//! truncates the pass and the caller's entire slot.

use crate::alloc::{
    AllocResult, AllocStatus, DlGrantRequest, PdschAllocator, PuschAllocator, UlGrantRequest,
};
use crate::grant::compute_retx_params;
use crate::grid::{PendingRetx, ResourceGridView};
use crate::ue::SliceCandidate;
use common::types::RbLimits;
use tracing::trace;

/// Outcome of a retransmission pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetxPassOutcome {
    /// The whole list was walked; new transmissions may proceed
    Completed,
    /// The grid is out of capacity; abort all work for this direction
    SkipSlot,
}

/// Restore the walk order invariant: FIFO by each UE's oldest entry, PCell
/// before SCells within a UE
fn order_retx_list(list: &mut [PendingRetx]) {
    let first_pos: Vec<usize> = list
        .iter()
        .map(|e| list.iter().position(|o| o.ue_index == e.ue_index).unwrap_or(0))
        .collect();
    let mut order: Vec<usize> = (0..list.len()).collect();
    order.sort_by_key(|&i| (first_pos[i], !list[i].is_pcell));
    // Apply the permutation (lists are short; a copy is acceptable here as
    // this runs outside the drain loop's per-UE work)
    let reordered: Vec<PendingRetx> = order.iter().map(|&i| list[i]).collect();
    list.copy_from_slice(&reordered);
}

fn run_retx_pass<A>(
    list: &mut Vec<PendingRetx>,
    slice: &SliceCandidate,
    remaining_rbs: &mut u16,
    nof_symbols: impl Fn(&PendingRetx) -> u8,
    mut attempt: A,
) -> RetxPassOutcome
where
    A: FnMut(&PendingRetx, u32, u16) -> AllocResult,
{
    order_retx_list(list);

    // The allocator may shrink the list (a freed HARQ disappears); advance
    // the cursor before acting on the result and re-check existence per step.
    let mut i = 0;
    while i < list.len() {
        let entry = list[i];
        // Only retransmissions of UEs still in this slice's set
        let Some(ue) = slice.ue(entry.ue_index) else {
            i += 1;
            continue;
        };
        if ue.cell_index != entry.cell_index {
            i += 1;
            continue;
        }

        let Some(lims) = RbLimits::new(1, *remaining_rbs) else {
            // No RBs left for retransmissions; the HARQs stay pending
            i += 1;
            continue;
        };
        let Some(grant) = compute_retx_params(&entry.prev, lims, nof_symbols(&entry)) else {
            // Symbol count or RB fit changed since the initial transmission;
            // the HARQ stays pending for a later slot
            i += 1;
            continue;
        };

        let result = attempt(&entry, grant.tbs_bytes, grant.nof_prbs);
        match result.status {
            AllocStatus::Success => {
                *remaining_rbs = remaining_rbs.saturating_sub(result.nof_prbs_used);
                list.remove(i);
            }
            AllocStatus::SkipSlot => {
                trace!("retx pass truncated: grid reports skip_slot");
                return RetxPassOutcome::SkipSlot;
            }
            AllocStatus::SkipUe | AllocStatus::InvalidParams => {
                i += 1;
            }
        }
    }
    RetxPassOutcome::Completed
}

/// Process all pending DL retransmissions for this slice
pub fn schedule_dl_retxs(
    list: &mut Vec<PendingRetx>,
    slice: &SliceCandidate,
    grid: &dyn ResourceGridView,
    alloc: &mut dyn PdschAllocator,
    remaining_rbs: &mut u16,
) -> RetxPassOutcome {
    run_retx_pass(
        list,
        slice,
        remaining_rbs,
        |e| grid.dl_symbols(e.cell_index),
        |e, bytes, max_rbs| {
            alloc.alloc_dl_grant(DlGrantRequest {
                ue_index: e.ue_index,
                cell_index: e.cell_index,
                harq_id: Some(e.harq_id),
                recommended_bytes: bytes,
                max_rbs,
            })
        },
    )
}

/// Process all pending UL retransmissions for this slice
pub fn schedule_ul_retxs(
    list: &mut Vec<PendingRetx>,
    slice: &SliceCandidate,
    grid: &dyn ResourceGridView,
    alloc: &mut dyn PuschAllocator,
    remaining_rbs: &mut u16,
) -> RetxPassOutcome {
    run_retx_pass(
        list,
        slice,
        remaining_rbs,
        |e| grid.ul_symbols(e.cell_index),
        |e, bytes, max_rbs| {
            alloc.alloc_ul_grant(UlGrantRequest {
                ue_index: e.ue_index,
                cell_index: e.cell_index,
                harq_id: Some(e.harq_id),
                recommended_bytes: bytes,
                max_rbs,
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PrevTxParams;
    use crate::mcs_tables::McsIndex;
    use crate::policy::test_support::{make_slice, make_ue, FakeAllocator, FakeGrid};
    use common::types::{CellIndex, HarqId, UeIndex};

    fn retx(ue: u16, cell: u8, pcell: bool, harq: u8) -> PendingRetx {
        PendingRetx {
            ue_index: UeIndex(ue),
            cell_index: CellIndex(cell),
            is_pcell: pcell,
            harq_id: HarqId(harq),
            prev: PrevTxParams {
                mcs: McsIndex(10),
                nof_prbs: 4,
                nof_symbols: 12,
                tbs_bytes: 400,
            },
        }
    }

    #[test]
    fn test_pcell_before_scell_within_ue() {
        let mut list = vec![retx(1, 1, false, 0), retx(2, 0, true, 0), retx(1, 0, true, 1)];
        order_retx_list(&mut list);
        // UE 1 appeared first so keeps its slot, but its PCell entry leads
        assert_eq!((list[0].ue_index, list[0].is_pcell), (UeIndex(1), true));
        assert_eq!((list[1].ue_index, list[1].is_pcell), (UeIndex(1), false));
        assert_eq!(list[2].ue_index, UeIndex(2));
    }

    #[test]
    fn test_successful_retx_removed_from_list() {
        let slice = make_slice(vec![make_ue(1, 100)], 52);
        let grid = FakeGrid::default();
        let mut alloc = FakeAllocator::default();
        let mut remaining = 52u16;
        let mut list = vec![retx(1, 0, true, 0)];

        let outcome = schedule_dl_retxs(&mut list, &slice, &grid, &mut alloc, &mut remaining);
        assert_eq!(outcome, RetxPassOutcome::Completed);
        assert!(list.is_empty());
        assert_eq!(alloc.dl_requests.len(), 1);
        assert_eq!(alloc.dl_requests[0].harq_id, Some(HarqId(0)));
        assert_eq!(alloc.dl_requests[0].max_rbs, 4);
        assert_eq!(remaining, 48);
    }

    #[test]
    fn test_unknown_ue_left_pending() {
        let slice = make_slice(vec![make_ue(1, 100)], 52);
        let grid = FakeGrid::default();
        let mut alloc = FakeAllocator::default();
        let mut remaining = 52u16;
        let mut list = vec![retx(9, 0, true, 0)];

        schedule_dl_retxs(&mut list, &slice, &grid, &mut alloc, &mut remaining);
        assert_eq!(list.len(), 1);
        assert!(alloc.dl_requests.is_empty());
    }

    #[test]
    fn test_symbol_mismatch_leaves_harq_pending() {
        let slice = make_slice(vec![make_ue(1, 100)], 52);
        let grid = FakeGrid { dl_symbols: 10, ..FakeGrid::default() };
        let mut alloc = FakeAllocator::default();
        let mut remaining = 52u16;
        let mut list = vec![retx(1, 0, true, 0)];

        let outcome = schedule_dl_retxs(&mut list, &slice, &grid, &mut alloc, &mut remaining);
        assert_eq!(outcome, RetxPassOutcome::Completed);
        assert_eq!(list.len(), 1, "mismatched retx must stay pending");
        assert!(alloc.dl_requests.is_empty());
    }

    #[test]
    fn test_skip_slot_truncates_pass() {
        let slice = make_slice(vec![make_ue(1, 100), make_ue(2, 100)], 52);
        let grid = FakeGrid::default();
        let mut alloc = FakeAllocator::default();
        alloc.scripted.push_back(AllocStatus::SkipSlot);
        let mut remaining = 52u16;
        let mut list = vec![retx(1, 0, true, 0), retx(2, 0, true, 0)];

        let outcome = schedule_dl_retxs(&mut list, &slice, &grid, &mut alloc, &mut remaining);
        assert_eq!(outcome, RetxPassOutcome::SkipSlot);
        // First attempt hit skip_slot; the second UE was never tried
        assert_eq!(alloc.dl_requests.len(), 1);
        assert_eq!(list.len(), 2);
    }
}
