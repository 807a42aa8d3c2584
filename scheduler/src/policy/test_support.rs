//! Test Fakes for the Scheduling Policies
//!
//! A scriptable allocator and a fixed-answer resource grid, shared by the
//! policy unit tests.

use crate::alloc::{
    AllocResult, AllocStatus, DlGrantRequest, PdschAllocator, PuschAllocator, TbInfo,
    UlGrantRequest,
};
use crate::grid::ResourceGridView;
use crate::mcs_tables::McsIndex;
use crate::qos::LogicalChannelQos;
use crate::ue::{LinkState, LogicalChannelState, SchedUe, SliceCandidate};
use common::types::{CellIndex, Lcid, UeIndex};
use std::collections::VecDeque;

/// Resource grid whose answers are plain fields
pub struct FakeGrid {
    pub dl_enabled: bool,
    pub ul_enabled: bool,
    pub pdcch_ok: bool,
    pub dl_symbols: u8,
    pub ul_symbols: u8,
    pub partial_slot: bool,
}

impl Default for FakeGrid {
    fn default() -> Self {
        Self {
            dl_enabled: true,
            ul_enabled: true,
            pdcch_ok: true,
            dl_symbols: 12,
            ul_symbols: 12,
            partial_slot: false,
        }
    }
}

impl ResourceGridView for FakeGrid {
    fn is_dl_enabled(&self, _cell: CellIndex) -> bool {
        self.dl_enabled
    }
    fn is_ul_enabled(&self, _cell: CellIndex) -> bool {
        self.ul_enabled
    }
    fn pdcch_schedulable(&self, _cell: CellIndex, _ue: UeIndex) -> bool {
        self.pdcch_ok
    }
    fn dl_symbols(&self, _cell: CellIndex) -> u8 {
        self.dl_symbols
    }
    fn ul_symbols(&self, _cell: CellIndex) -> u8 {
        self.ul_symbols
    }
    fn is_partial_slot(&self, _cell: CellIndex) -> bool {
        self.partial_slot
    }
}

/// Allocator that records every request and replays scripted statuses
///
/// When the script is empty every attempt succeeds, allocating the requested
/// bytes over the requested RBs with the whole TB on LCID 4.
#[derive(Default)]
pub struct FakeAllocator {
    pub scripted: VecDeque<AllocStatus>,
    pub dl_requests: Vec<DlGrantRequest>,
    pub ul_requests: Vec<UlGrantRequest>,
}

impl FakeAllocator {
    fn result(&mut self, bytes: u32, rbs: u16) -> AllocResult {
        match self.scripted.pop_front() {
            Some(AllocStatus::Success) | None => AllocResult {
                status: AllocStatus::Success,
                alloc_bytes: bytes,
                nof_prbs_used: rbs,
                tb: TbInfo { lc_bytes: vec![(Lcid(4), bytes)] },
            },
            Some(status) => AllocResult::status_only(status),
        }
    }
}

impl PdschAllocator for FakeAllocator {
    fn alloc_dl_grant(&mut self, req: DlGrantRequest) -> AllocResult {
        self.dl_requests.push(req);
        self.result(req.recommended_bytes, req.max_rbs)
    }
}

impl PuschAllocator for FakeAllocator {
    fn alloc_ul_grant(&mut self, req: UlGrantRequest) -> AllocResult {
        self.ul_requests.push(req);
        self.result(req.recommended_bytes, req.max_rbs)
    }
}

/// UE snapshot with sane defaults: active, PCell 0, free HARQs, MCS 10
pub fn make_ue(index: u16, pending_bytes: u32) -> SchedUe {
    SchedUe {
        ue_index: UeIndex(index),
        cell_index: CellIndex(0),
        is_pcell: true,
        active: true,
        in_fallback: false,
        has_empty_dl_harq: true,
        has_empty_ul_harq: true,
        sr_pending: false,
        dl_pending_bytes: pending_bytes,
        ul_pending_bytes: pending_bytes,
        pending_uci_bits: 0,
        link: LinkState {
            dl_mcs: Some(McsIndex(10)),
            ul_mcs: Some(McsIndex(10)),
            dl_bwp_prbs: 52,
            ul_bwp_prbs: 52,
            nof_layers: 1,
        },
        channels: vec![LogicalChannelState {
            lcid: Lcid(4),
            pending_bytes,
            hol_delay_ms: 0,
            qos: LogicalChannelQos::default(),
        }],
    }
}

/// Slice candidate over the given UEs with an RB budget
pub fn make_slice(ues: Vec<SchedUe>, remaining_rbs: u16) -> SliceCandidate {
    SliceCandidate { ues, remaining_rbs }
}
