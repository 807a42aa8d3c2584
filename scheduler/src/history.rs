//! UE Rate History
//!
//! Per-UE exponentially-weighted moving averages of allocated bytes per slot,
//! tracked in aggregate for PF weighting and per GBR logical channel for
//! GBR-deficit tracking.

use crate::alloc::TbInfo;
use crate::ue::SchedUe;
use common::types::{CellIndex, Lcid, UeIndex};
use std::collections::HashMap;

/// Exponential moving average with a fast-start window
///
/// Until `1/alpha` samples have been observed the accumulator is a plain
/// cumulative mean; a pure EWMA started from zero would bias a newly created
/// UE toward zero for its first `O(1/alpha)` slots.
#[derive(Debug, Clone)]
pub struct ExpAvg {
    avg: f64,
    alpha: f64,
    nof_samples: u64,
}

impl ExpAvg {
    /// Create a zeroed accumulator with the given smoothing factor
    pub fn new(alpha: f64) -> Self {
        debug_assert!(alpha > 0.0 && alpha <= 1.0);
        Self { avg: 0.0, alpha, nof_samples: 0 }
    }

    /// Feed one sample; zero-byte samples count like any other
    pub fn push(&mut self, sample: f64) {
        if (self.nof_samples as f64) < 1.0 / self.alpha {
            self.avg += (sample - self.avg) / (self.nof_samples as f64 + 1.0);
        } else {
            self.avg = (1.0 - self.alpha) * self.avg + self.alpha * sample;
        }
        self.nof_samples += 1;
    }

    /// Current average
    pub fn value(&self) -> f64 {
        self.avg
    }

    /// Number of samples observed so far
    pub fn nof_samples(&self) -> u64 {
        self.nof_samples
    }
}

/// Scheduling history of one UE within a policy instance
///
/// The rate accumulators are mutated only through `save_dl_alloc` /
/// `save_ul_alloc`, called exactly once per slot per UE that was offered a
/// grant decision. This keeps the sample count tracking wall-clock slots
/// rather than allocation attempts.
#[derive(Debug)]
pub struct UeHistory {
    /// UE index this history belongs to
    pub ue_index: UeIndex,
    /// Serving cell recorded at creation
    pub cell_index: CellIndex,
    /// Aggregate DL bytes/slot average
    dl_avg: ExpAvg,
    /// Aggregate UL bytes/slot average
    ul_avg: ExpAvg,
    /// Per-GBR-logical-channel DL bytes/slot averages
    lc_avgs: HashMap<Lcid, ExpAvg>,
    /// DL priority of the current slot; recomputed every slot, never persisted
    pub dl_prio: f64,
    /// UL priority of the current slot; recomputed every slot, never persisted
    pub ul_prio: f64,
    alpha: f64,
}

impl UeHistory {
    /// Create a fresh history for a UE that just appeared in the slice set
    pub fn new(ue_index: UeIndex, cell_index: CellIndex, alpha: f64) -> Self {
        Self {
            ue_index,
            cell_index,
            dl_avg: ExpAvg::new(alpha),
            ul_avg: ExpAvg::new(alpha),
            lc_avgs: HashMap::new(),
            dl_prio: 0.0,
            ul_prio: 0.0,
            alpha,
        }
    }

    /// Record the DL allocation outcome of this slot
    ///
    /// For every GBR logical channel of the UE, the channel's EWMA is fed the
    /// bytes the transport block actually carries for it (0 if absent); the
    /// aggregate EWMA is fed `total_bytes`. A failed or skipped attempt is a
    /// zero-byte sample, which this method must still receive.
    pub fn save_dl_alloc(&mut self, total_bytes: u32, tb: &TbInfo, ue: &SchedUe) {
        for ch in &ue.channels {
            if ch.qos.gbr.is_none() {
                continue;
            }
            let alpha = self.alpha;
            let avg = self.lc_avgs.entry(ch.lcid).or_insert_with(|| ExpAvg::new(alpha));
            avg.push(tb.bytes_for(ch.lcid) as f64);
        }
        self.dl_avg.push(total_bytes as f64);
    }

    /// Record the UL allocation outcome of this slot (aggregate only)
    pub fn save_ul_alloc(&mut self, total_bytes: u32) {
        self.ul_avg.push(total_bytes as f64);
    }

    /// Aggregate DL average in bytes/slot
    pub fn dl_avg_rate(&self) -> f64 {
        self.dl_avg.value()
    }

    /// Aggregate UL average in bytes/slot
    pub fn ul_avg_rate(&self) -> f64 {
        self.ul_avg.value()
    }

    /// DL average of one GBR logical channel in bytes/slot
    pub fn lc_avg_rate(&self, lcid: Lcid) -> f64 {
        self.lc_avgs.get(&lcid).map(|a| a.value()).unwrap_or(0.0)
    }

    /// Number of DL slot samples recorded
    pub fn nof_dl_samples(&self) -> u64 {
        self.dl_avg.nof_samples()
    }
}
