//! QoS-Aware Time-Domain Policy
//!
//! Extends the proportional-fair ranking with GBR-deficit, 5QI/ARP priority
//! and packet-delay-budget weights:
//! `dl_prio = gbr_weight * pf_weight * priority_weight * delay_weight`.

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
use crate::qos::LogicalChannelQos;
use crate::ue::{SchedUe, SliceCandidate};
use crate::SchedError;
use common::types::{RbLimits, UeIndex};
use std::collections::{BinaryHeap, HashMap};
use tracing::{info, trace};

/// QoS-aware scheduling policy for one cell
pub struct SchedulerTimeQos {
    cfg: PolicyConfig,
    history: HashMap<UeIndex, UeHistory>,
    queue: BinaryHeap<QueueEntry>,
}

/// Weight from the most important (lowest) combined 5QI/ARP level among the
/// channels with pending data; 1.0 when nothing is pending
fn priority_weight(ue: &SchedUe) -> f64 {
    ue.channels
        .iter()
        .filter(|ch| ch.pending_bytes > 0)
        .map(|ch| ch.qos.combined_priority())
        .min()
        .map(|combined| {
            LogicalChannelQos::MAX_COMBINED_PRIORITY as f64 / combined.max(1) as f64
        })
        .unwrap_or(1.0)
}

/// Sum of head-of-line delay over packet delay budget across pending
/// channels; 1.0 when disabled for every channel or nothing has aged
fn delay_weight(ue: &SchedUe) -> f64 {
    let sum: f64 = ue
        .channels
        .iter()
        .filter(|ch| ch.pending_bytes > 0)
        .filter_map(|ch| {
            let pdb = ch.qos.pdb_ms?;
            (pdb > 0).then(|| ch.hol_delay_ms as f64 / pdb as f64)
        })
        .sum();
    if sum > 0.0 {
        sum
    } else {
        1.0
    }
}

impl SchedulerTimeQos {
    /// Create a new policy instance with a validated configuration
    pub fn new(cfg: PolicyConfig) -> Result<Self, SchedError> {
        let cfg = cfg.validated()?;
        info!(
            "Created time_qos policy: fairness_coeff={}, gbr_prioritization={}, \
             priority_weighting={}, pdb_weighting={}",
            cfg.fairness_coeff, cfg.gbr_prioritization, cfg.priority_weighting, cfg.pdb_weighting
        );
        Ok(Self { cfg, history: HashMap::new(), queue: BinaryHeap::new() })
    }

    /// Scheduling history of a UE, if the UE is currently tracked
    pub fn ue_history(&self, ue_index: UeIndex) -> Option<&UeHistory> {
        self.history.get(&ue_index)
    }

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
        let gbr_w = gbr_rate_weight(ue, hist, cfg.scs);
        let mut pf = pf_weight(estimated, hist.dl_avg_rate(), cfg.fairness_coeff);
        // GBR-prioritized mode: an unmet GBR target must not be diluted by
        // a sub-unity PF weight
        if cfg.gbr_prioritization && gbr_w > 1.0 {
            pf = pf.max(1.0);
        }
        let prio_w = if cfg.priority_weighting { priority_weight(ue) } else { 1.0 };
        let delay_w = if cfg.pdb_weighting { delay_weight(ue) } else { 1.0 };
        Some(gbr_w * pf * prio_w * delay_w)
    }

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
        // A pending SR bypasses the QoS computation entirely
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
        let pf = pf_weight(estimated, hist.ul_avg_rate(), cfg.fairness_coeff);
        let prio_w = if cfg.priority_weighting { priority_weight(ue) } else { 1.0 };
        let delay_w = if cfg.pdb_weighting { delay_weight(ue) } else { 1.0 };
        Some((pf * prio_w * delay_w, false))
    }
}

impl SchedulerPolicy for SchedulerTimeQos {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::{make_slice, make_ue, FakeAllocator, FakeGrid};
    use crate::qos::GbrInfo;
    use common::types::{CellIndex, Lcid, SubcarrierSpacing};

    fn qos_policy() -> SchedulerTimeQos {
        SchedulerTimeQos::new(PolicyConfig {
            fairness_coeff: 1.0,
            scs: SubcarrierSpacing::Scs15,
            ..PolicyConfig::default()
        })
        .unwrap()
    }

    fn with_channel_prio(mut ue: crate::ue::SchedUe, five_qi_priority: u8) -> crate::ue::SchedUe {
        ue.channels[0].qos.five_qi_priority = five_qi_priority;
        ue
    }

    #[test]
    fn test_priority_weight_prefers_low_level() {
        let important = with_channel_prio(make_ue(1, 100), 10);
        let background = with_channel_prio(make_ue(2, 100), 90);
        assert!(priority_weight(&important) > priority_weight(&background));
        // A UE with nothing pending contributes a neutral weight
        let idle = make_ue(3, 0);
        assert_eq!(priority_weight(&idle), 1.0);
    }

    #[test]
    fn test_delay_weight_grows_with_hol_age() {
        let mut young = make_ue(1, 100);
        young.channels[0].qos.pdb_ms = Some(100);
        young.channels[0].hol_delay_ms = 10;
        let mut old = make_ue(2, 100);
        old.channels[0].qos.pdb_ms = Some(100);
        old.channels[0].hol_delay_ms = 90;
        assert!(delay_weight(&old) > delay_weight(&young));
        // No PDB configured: neutral
        assert_eq!(delay_weight(&make_ue(3, 100)), 1.0);
    }

    #[test]
    fn test_higher_qos_priority_scheduled_first() {
        let mut policy = qos_policy();
        let grid = FakeGrid::default();

        // Warm-up slot equalizes the averages so PF cannot decide the order
        let slice = make_slice(
            vec![
                with_channel_prio(make_ue(1, 100), 90),
                with_channel_prio(make_ue(2, 100), 10),
            ],
            52,
        );
        let mut alloc = FakeAllocator::default();
        policy.dl_sched(&mut alloc, &grid, &slice, &mut Vec::new());

        let slice = make_slice(
            vec![
                with_channel_prio(make_ue(1, 500), 90),
                with_channel_prio(make_ue(2, 500), 10),
            ],
            52,
        );
        let mut alloc = FakeAllocator::default();
        policy.dl_sched(&mut alloc, &grid, &slice, &mut Vec::new());
        assert_eq!(alloc.dl_requests[0].ue_index, UeIndex(2));
    }

    #[test]
    fn test_gbr_floor_applies_in_prioritized_mode() {
        let mut ue = make_ue(1, 1000);
        ue.channels[0].qos.gbr = Some(GbrInfo { dl_bps: 8_000_000, ul_bps: 0 });
        let grid = FakeGrid::default();

        // Track a tiny GBR average so the target is far from met
        let mut hist = UeHistory::new(UeIndex(1), CellIndex(0), 0.5);
        let tb = crate::alloc::TbInfo { lc_bytes: vec![(Lcid(4), 10)] };
        hist.save_dl_alloc(4000, &tb, &ue);

        // Large aggregate average pushes the raw PF weight below 1.0
        let cfg_floor = PolicyConfig {
            fairness_coeff: 1.0,
            scs: SubcarrierSpacing::Scs15,
            priority_weighting: false,
            pdb_weighting: false,
            ..PolicyConfig::default()
        };
        let cfg_no_floor = PolicyConfig { gbr_prioritization: false, ..cfg_floor.clone() };

        let with_floor =
            SchedulerTimeQos::compute_dl_prio(&cfg_floor.validated().unwrap(), &hist, &ue, &grid)
                .unwrap();
        let without_floor = SchedulerTimeQos::compute_dl_prio(
            &cfg_no_floor.validated().unwrap(),
            &hist,
            &ue,
            &grid,
        )
        .unwrap();
        assert!(with_floor > without_floor, "floored PF must raise the priority");
    }

    #[test]
    fn test_ul_sr_precedence() {
        let mut policy = qos_policy();
        let grid = FakeGrid::default();
        let mut sr_ue = make_ue(9, 0);
        sr_ue.sr_pending = true;
        let slice = make_slice(vec![make_ue(1, 9000), sr_ue], 52);

        let mut alloc = FakeAllocator::default();
        policy.ul_sched(&mut alloc, &grid, &slice, &mut Vec::new());
        assert_eq!(alloc.ul_requests[0].ue_index, UeIndex(9));
    }

    #[test]
    fn test_skip_slot_during_drain_stops_work() {
        let mut policy = qos_policy();
        let grid = FakeGrid::default();
        let slice = make_slice(vec![make_ue(1, 1000), make_ue(2, 1000)], 52);

        let mut alloc = FakeAllocator::default();
        alloc.scripted.push_back(AllocStatus::SkipSlot);
        policy.dl_sched(&mut alloc, &grid, &slice, &mut Vec::new());
        // Only the first attempt happened; the second UE saw no decision
        assert_eq!(alloc.dl_requests.len(), 1);
        let sampled: u64 = [UeIndex(1), UeIndex(2)]
            .iter()
            .map(|idx| policy.ue_history(*idx).unwrap().nof_dl_samples())
            .sum();
        assert_eq!(sampled, 0);
    }
}
