//! Proportional-Fair Time-Domain Policy
//!
//! Ranks UEs by `estimated_rate / avg_rate^fairness_coeff`, scaled by the
//! GBR-deficit rate weight, and drains the ranking against the allocator
//! until RBs or candidates run out.

use crate::alloc::{AllocStatus, DlGrantRequest, PdschAllocator, PuschAllocator, TbInfo, UlGrantRequest};
use crate::config::PolicyConfig;
use crate::grant::{compute_newtx_required_mcs_and_prbs, estimate_rate_bytes_per_slot};
use crate::grid::{PendingRetx, ResourceGridView};
use crate::history::UeHistory;
use crate::policy::queue::QueueEntry;
use crate::policy::retx::{schedule_dl_retxs, schedule_ul_retxs, RetxPassOutcome};
use crate::policy::{
    dl_channel_params, gbr_rate_weight, pf_weight, reconcile_history, ul_channel_params,
    SchedulerPolicy, SR_GRANT_BYTES,
};
use crate::ue::{SchedUe, SliceCandidate};
use crate::SchedError;
use common::types::{RbLimits, UeIndex};
use std::collections::{BinaryHeap, HashMap};
use tracing::{info, trace};

/// Proportional-fair scheduling policy for one cell
pub struct SchedulerTimePf {
    cfg: PolicyConfig,
    history: HashMap<UeIndex, UeHistory>,
    queue: BinaryHeap<QueueEntry>,
}

impl SchedulerTimePf {
    /// Create a new policy instance with a validated configuration
    pub fn new(cfg: PolicyConfig) -> Result<Self, SchedError> {
        let cfg = cfg.validated()?;
        info!(
            "Created time_pf policy: fairness_coeff={}, exp_avg_alpha={}",
            cfg.fairness_coeff, cfg.exp_avg_alpha
        );
        Ok(Self { cfg, history: HashMap::new(), queue: BinaryHeap::new() })
    }

    /// Scheduling history of a UE, if the UE is currently tracked
    pub fn ue_history(&self, ue_index: UeIndex) -> Option<&UeHistory> {
        self.history.get(&ue_index)
    }

    /// DL priority of one UE for the current slot
    ///
    /// `None` means the UE is skipped outright (inactive or not schedulable
    /// this slot); `Some(0.0)` means present but not eligible for a newTx.
    fn compute_dl_prio(
        cfg: &PolicyConfig,
        hist: &UeHistory,
        ue: &SchedUe,
        grid: &dyn ResourceGridView,
    ) -> Option<f64> {
        if !ue.active
            || !grid.is_dl_enabled(ue.cell_index)
            || !grid.pdcch_schedulable(ue.cell_index, ue.ue_index)
        {
            return None;
        }
        assert!(
            !ue.in_fallback,
            "fallback-mode UE {} must not reach the scheduling policy",
            ue.ue_index.0
        );
        if !ue.has_empty_dl_harq || ue.dl_pending_bytes == 0 {
            return Some(0.0);
        }
        let params = dl_channel_params(cfg.mcs_table, grid, ue.cell_index, ue.link.nof_layers);
        let estimated = estimate_rate_bytes_per_slot(&params, ue.link.dl_mcs, ue.link.dl_bwp_prbs);
        let pf = pf_weight(estimated, hist.dl_avg_rate(), cfg.fairness_coeff);
        Some(gbr_rate_weight(ue, hist, cfg.scs) * pf)
    }

    /// UL priority and SR flag of one UE for the current slot
    fn compute_ul_prio(
        cfg: &PolicyConfig,
        hist: &UeHistory,
        ue: &SchedUe,
        grid: &dyn ResourceGridView,
    ) -> Option<(f64, bool)> {
        if !ue.active
            || !grid.is_ul_enabled(ue.cell_index)
            || !grid.pdcch_schedulable(ue.cell_index, ue.ue_index)
        {
            return None;
        }
        assert!(
            !ue.in_fallback,
            "fallback-mode UE {} must not reach the scheduling policy",
            ue.ue_index.0
        );
        if !ue.has_empty_ul_harq {
            return Some((0.0, false));
        }
        // A pending SR bypasses the PF computation entirely
        if ue.sr_pending {
            return Some((f64::MAX, true));
        }
        if ue.ul_pending_bytes == 0 {
            return Some((0.0, false));
        }
        let params = ul_channel_params(
            cfg.mcs_table,
            grid,
            ue.cell_index,
            ue,
            cfg.transform_precoding,
            cfg.ul_max_code_rate,
        );
        let estimated = estimate_rate_bytes_per_slot(&params, ue.link.ul_mcs, ue.link.ul_bwp_prbs);
        Some((pf_weight(estimated, hist.ul_avg_rate(), cfg.fairness_coeff), false))
    }
}

impl SchedulerPolicy for SchedulerTimePf {
    fn dl_sched(
        &mut self,
        alloc: &mut dyn PdschAllocator,
        grid: &dyn ResourceGridView,
        slice: &SliceCandidate,
        pending_retx: &mut Vec<PendingRetx>,
    ) {
        reconcile_history(&mut self.history, slice, self.cfg.exp_avg_alpha);

        let mut remaining = slice.remaining_rbs;
        if schedule_dl_retxs(pending_retx, slice, grid, alloc, &mut remaining)
            == RetxPassOutcome::SkipSlot
        {
            trace!("dl_sched: slot truncated during retx pass");
            return;
        }

        self.queue.clear();
        self.queue.reserve(slice.ues.len());
        for (pos, ue) in slice.ues.iter().enumerate() {
            let hist = &self.history[&ue.ue_index];
            let Some(prio) = Self::compute_dl_prio(&self.cfg, hist, ue, grid) else { continue };
            if let Some(h) = self.history.get_mut(&ue.ue_index) {
                h.dl_prio = prio;
            }
            self.queue.push(QueueEntry { prio, sr: false, ue_index: ue.ue_index, slice_pos: pos });
        }

        while let Some(entry) = self.queue.pop() {
            let ue = &slice.ues[entry.slice_pos];
            let hist = self.history.get_mut(&ue.ue_index).expect("history reconciled this slot");
            if entry.prio <= 0.0 || remaining == 0 {
                hist.save_dl_alloc(0, &TbInfo::default(), ue);
                continue;
            }
            let params =
                dl_channel_params(self.cfg.mcs_table, grid, ue.cell_index, ue.link.nof_layers);
            let lims = RbLimits::new(1, remaining).expect("remaining > 0");
            let Some(grant) = compute_newtx_required_mcs_and_prbs(
                &params,
                ue.link.dl_mcs,
                ue.dl_pending_bytes,
                lims,
            ) else {
                hist.save_dl_alloc(0, &TbInfo::default(), ue);
                continue;
            };
            let result = alloc.alloc_dl_grant(DlGrantRequest {
                ue_index: ue.ue_index,
                cell_index: ue.cell_index,
                harq_id: None,
                recommended_bytes: ue.dl_pending_bytes.min(grant.tbs_bytes),
                max_rbs: grant.nof_prbs,
            });
            match result.status {
                AllocStatus::Success => {
                    remaining = remaining.saturating_sub(result.nof_prbs_used);
                    hist.save_dl_alloc(result.alloc_bytes, &result.tb, ue);
                }
                AllocStatus::SkipSlot => {
                    trace!("dl_sched: slot truncated during newTx drain");
                    return;
                }
                AllocStatus::SkipUe | AllocStatus::InvalidParams => {
                    hist.save_dl_alloc(0, &TbInfo::default(), ue);
                }
            }
        }
    }

    fn ul_sched(
        &mut self,
        alloc: &mut dyn PuschAllocator,
        grid: &dyn ResourceGridView,
        slice: &SliceCandidate,
        pending_retx: &mut Vec<PendingRetx>,
    ) {
        reconcile_history(&mut self.history, slice, self.cfg.exp_avg_alpha);

        let mut remaining = slice.remaining_rbs;
        if schedule_ul_retxs(pending_retx, slice, grid, alloc, &mut remaining)
            == RetxPassOutcome::SkipSlot
        {
            trace!("ul_sched: slot truncated during retx pass");
            return;
        }

        self.queue.clear();
        self.queue.reserve(slice.ues.len());
        for (pos, ue) in slice.ues.iter().enumerate() {
            let hist = &self.history[&ue.ue_index];
            let Some((prio, sr)) = Self::compute_ul_prio(&self.cfg, hist, ue, grid) else {
                continue;
            };
            if let Some(h) = self.history.get_mut(&ue.ue_index) {
                h.ul_prio = prio;
            }
            self.queue.push(QueueEntry { prio, sr, ue_index: ue.ue_index, slice_pos: pos });
        }

        while let Some(entry) = self.queue.pop() {
            let ue = &slice.ues[entry.slice_pos];
            let hist = self.history.get_mut(&ue.ue_index).expect("history reconciled this slot");
            if (entry.prio <= 0.0 && !entry.sr) || remaining == 0 {
                hist.save_ul_alloc(0);
                continue;
            }
            // An SR without BSR data still receives a minimal grant
            let pending = if ue.ul_pending_bytes > 0 { ue.ul_pending_bytes } else { SR_GRANT_BYTES };
            let params = ul_channel_params(
                self.cfg.mcs_table,
                grid,
                ue.cell_index,
                ue,
                self.cfg.transform_precoding,
                self.cfg.ul_max_code_rate,
            );
            let lims = RbLimits::new(1, remaining).expect("remaining > 0");
            let Some(grant) =
                compute_newtx_required_mcs_and_prbs(&params, ue.link.ul_mcs, pending, lims)
            else {
                hist.save_ul_alloc(0);
                continue;
            };
            let result = alloc.alloc_ul_grant(UlGrantRequest {
                ue_index: ue.ue_index,
                cell_index: ue.cell_index,
                harq_id: None,
                recommended_bytes: pending.min(grant.tbs_bytes),
                max_rbs: grant.nof_prbs,
            });
            match result.status {
                AllocStatus::Success => {
                    remaining = remaining.saturating_sub(result.nof_prbs_used);
                    hist.save_ul_alloc(result.alloc_bytes);
                }
                AllocStatus::SkipSlot => {
                    trace!("ul_sched: slot truncated during newTx drain");
                    return;
                }
                AllocStatus::SkipUe | AllocStatus::InvalidParams => {
                    hist.save_ul_alloc(0);
                }
            }
        }
    }
}
