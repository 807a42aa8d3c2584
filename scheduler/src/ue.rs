//! Per-Slot UE Snapshot
//!
//! Read-only view of each slice UE handed to the scheduling policies at the
//! start of a slot. All fields are sampled by the orchestrator before
//! `dl_sched`/`ul_sched` is entered; the policies never block waiting for them.

use crate::mcs_tables::McsIndex;
use crate::qos::LogicalChannelQos;
use common::types::{CellIndex, Lcid, UeIndex};

/// Pending data and QoS state of one logical channel
#[derive(Debug, Clone)]
pub struct LogicalChannelState {
    /// Logical channel id
    pub lcid: Lcid,
    /// Bytes pending for a new transmission on this channel
    pub pending_bytes: u32,
    /// Age of the head-of-line packet in ms
    pub hol_delay_ms: u16,
    /// QoS configuration of the channel
    pub qos: LogicalChannelQos,
}

/// Link-adaptation state of the UE on its serving cell
#[derive(Debug, Clone, Copy)]
pub struct LinkState {
    /// Current DL MCS from CQI reports; `None` when CQI 0 (no usable MCS)
    pub dl_mcs: Option<McsIndex>,
    /// Current UL MCS from SRS/PUSCH measurements; `None` when unusable
    pub ul_mcs: Option<McsIndex>,
    /// Number of PRBs of the active DL BWP
    pub dl_bwp_prbs: u16,
    /// Number of PRBs of the active UL BWP
    pub ul_bwp_prbs: u16,
    /// Recommended number of transmission layers
    pub nof_layers: u8,
}

/// Per-slot scheduling snapshot of one UE
#[derive(Debug, Clone)]
pub struct SchedUe {
    /// UE index within the DU
    pub ue_index: UeIndex,
    /// Serving cell of this snapshot
    pub cell_index: CellIndex,
    /// Whether `cell_index` is the UE's PCell
    pub is_pcell: bool,
    /// Whether the cell is active for this UE (not deactivated SCell)
    pub active: bool,
    /// Whether the UE is in fallback mode (served by the fallback scheduler,
    /// must never reach a policy)
    pub in_fallback: bool,
    /// Whether at least one DL HARQ process is free
    pub has_empty_dl_harq: bool,
    /// Whether at least one UL HARQ process is free
    pub has_empty_ul_harq: bool,
    /// Whether a Scheduling Request is pending
    pub sr_pending: bool,
    /// Aggregate DL bytes pending for new transmission
    pub dl_pending_bytes: u32,
    /// Aggregate UL bytes pending for new transmission (from BSRs)
    pub ul_pending_bytes: u32,
    /// UCI bits to be multiplexed on a PUSCH grant this slot
    pub pending_uci_bits: u16,
    /// Link-adaptation state
    pub link: LinkState,
    /// Logical channels with their pending data and QoS
    pub channels: Vec<LogicalChannelState>,
}

/// The slice's UE set for one slot plus its remaining RB budget
#[derive(Debug)]
pub struct SliceCandidate {
    /// UEs eligible for scheduling in this slice this slot
    pub ues: Vec<SchedUe>,
    /// RBs the slice may still use in the direction being scheduled
    pub remaining_rbs: u16,
}

impl SliceCandidate {
    /// Look up a UE snapshot by index
    pub fn ue(&self, ue_index: UeIndex) -> Option<&SchedUe> {
        self.ues.iter().find(|u| u.ue_index == ue_index)
    }

    /// Whether the slice contains a UE
    pub fn contains(&self, ue_index: UeIndex) -> bool {
        self.ue(ue_index).is_some()
    }
}
