//! Scheduling Policies
//!
//! QoS-aware and proportional-fair time-domain scheduling policies. A policy
//! instance serves one cell and is driven once per slot from the cell's
//! real-time scheduling thread; there is no cross-cell shared state and no
//! locking anywhere in this module.

pub mod queue;
pub mod retx;
pub mod time_pf;
pub mod time_qos;

#[cfg(test)]
pub(crate) mod test_support;

use crate::alloc::{PdschAllocator, PuschAllocator};
use crate::grant::{ChannelParams, UlChannelParams};
use crate::grid::{PendingRetx, ResourceGridView};
use crate::history::UeHistory;
use crate::ue::{SchedUe, SliceCandidate};
use common::types::{CellIndex, UeIndex};
use common::utils::time::bps_to_bytes_per_slot;
use common::SubcarrierSpacing;
use std::collections::HashMap;

/// DMRS REs per PRB assumed for grant sizing (type A, one full DMRS symbol)
pub(crate) const NOF_DMRS_RE_PRB: u16 = 12;

/// Bytes granted to a UE whose only pending work is a Scheduling Request
pub(crate) const SR_GRANT_BYTES: u32 = 512;

/// Time-domain scheduling policy driven once per slot per direction
///
/// All inputs must be fully materialized before a call is entered; the
/// policies never block and never allocate beyond pre-reserved capacity in
/// the hot path. The pending-retransmission list is consumed destructively:
/// successfully allocated entries are removed.
pub trait SchedulerPolicy {
    /// Schedule downlink for one slot
    fn dl_sched(
        &mut self,
        alloc: &mut dyn PdschAllocator,
        grid: &dyn ResourceGridView,
        slice: &SliceCandidate,
        pending_retx: &mut Vec<PendingRetx>,
    );

    /// Schedule uplink for one slot
    fn ul_sched(
        &mut self,
        alloc: &mut dyn PuschAllocator,
        grid: &dyn ResourceGridView,
        slice: &SliceCandidate,
        pending_retx: &mut Vec<PendingRetx>,
    );
}

/// Reconcile the UE history table against the live slice UE set
///
/// Erases entries for UEs that left the slice and default-initializes entries
/// for new arrivals. Called once per `dl_sched`/`ul_sched` invocation.
pub(crate) fn reconcile_history(
    history: &mut HashMap<UeIndex, UeHistory>,
    slice: &SliceCandidate,
    alpha: f64,
) {
    history.retain(|idx, _| slice.contains(*idx));
    for ue in &slice.ues {
        history
            .entry(ue.ue_index)
            .or_insert_with(|| UeHistory::new(ue.ue_index, ue.cell_index, alpha));
    }
}

/// Proportional-fair weight: `estimated_rate / avg_rate^fairness_coeff`
///
/// A UE that never received bytes but could carry some now gets the maximum
/// representable weight so it is scheduled ahead of any served UE.
pub(crate) fn pf_weight(estimated_rate: f64, avg_rate: f64, fairness_coeff: f64) -> f64 {
    if avg_rate == 0.0 {
        return if estimated_rate > 0.0 { f64::MAX } else { 0.0 };
    }
    estimated_rate / avg_rate.powf(fairness_coeff)
}

/// GBR rate weight: sum of each GBR channel's target rate over its tracked
/// average, 1.0 when the UE carries no GBR flows or all GBR averages are zero
pub(crate) fn gbr_rate_weight(ue: &SchedUe, hist: &UeHistory, scs: SubcarrierSpacing) -> f64 {
    let mut weight = 0.0;
    let mut contributed = false;
    for ch in &ue.channels {
        let Some(gbr) = &ch.qos.gbr else { continue };
        let avg = hist.lc_avg_rate(ch.lcid);
        if avg > 0.0 {
            weight += bps_to_bytes_per_slot(gbr.dl_bps, scs) / avg;
            contributed = true;
        }
    }
    if contributed {
        weight
    } else {
        1.0
    }
}

/// Build PDSCH sizing parameters for a UE on a cell in the current slot
pub(crate) fn dl_channel_params(
    mcs_table: crate::mcs_tables::McsTable,
    grid: &dyn ResourceGridView,
    cell: CellIndex,
    nof_layers: u8,
) -> ChannelParams {
    ChannelParams {
        mcs_table,
        nof_symbols: grid.dl_symbols(cell),
        nof_dmrs_prb: NOF_DMRS_RE_PRB,
        nof_oh_prb: 0,
        nof_layers,
        is_partial_slot: grid.is_partial_slot(cell),
        ul: None,
    }
}

/// Build PUSCH sizing parameters for a UE on a cell in the current slot
pub(crate) fn ul_channel_params(
    mcs_table: crate::mcs_tables::McsTable,
    grid: &dyn ResourceGridView,
    cell: CellIndex,
    ue: &SchedUe,
    transform_precoding: bool,
    max_code_rate: f32,
) -> ChannelParams {
    ChannelParams {
        mcs_table,
        nof_symbols: grid.ul_symbols(cell),
        nof_dmrs_prb: NOF_DMRS_RE_PRB,
        nof_oh_prb: 0,
        nof_layers: ue.link.nof_layers,
        is_partial_slot: grid.is_partial_slot(cell),
        ul: Some(UlChannelParams {
            transform_precoding,
            uci_bits: ue.pending_uci_bits,
            max_code_rate,
        }),
    }
}
