//! Grant Parameter Selection
//!
//! Turns a UE's pending byte count and link-adaptation state into a concrete
//! MCS and PRB count for a PDSCH/PUSCH grant, following the TBS procedure of
//! 3GPP TS 38.214 Section 5.1.3.2. Pure functions, no side effects.

use crate::grid::PrevTxParams;
use crate::mcs_tables::{mcs_description, McsDescription, McsIndex, McsTable};
use crate::tbs::{tbs_bytes, TbsParams};
use common::types::RbLimits;
use tracing::trace;

/// Single-PRB grants observed to fail decoding at very low code rates are
/// widened to this many PRBs. Empirically tuned, not from TS 38.214.
const MIN_PRBS_SINGLE_PRB_BUMP: u16 = 2;

/// MCS index for which a 1-PRB grant shows high decode-failure probability.
/// Empirically tuned, not from TS 38.214.
const SINGLE_PRB_HIGH_BLER_MCS: u8 = 5;

/// UL-only grant sizing parameters
#[derive(Debug, Clone, Copy)]
pub struct UlChannelParams {
    /// Whether DFT-s-OFDM (transform precoding) is enabled
    pub transform_precoding: bool,
    /// UCI bits multiplexed on the PUSCH grant this slot
    pub uci_bits: u16,
    /// Maximum allowed effective code rate
    pub max_code_rate: f32,
}

/// Channel configuration the grant selector sizes against
#[derive(Debug, Clone, Copy)]
pub struct ChannelParams {
    /// MCS table in use for this UE
    pub mcs_table: McsTable,
    /// Shared-channel OFDM symbols available this slot
    pub nof_symbols: u8,
    /// DMRS REs per PRB over the allocation
    pub nof_dmrs_prb: u16,
    /// Configured xOverhead REs per PRB
    pub nof_oh_prb: u16,
    /// Number of transmission layers
    pub nof_layers: u8,
    /// Whether this is a partial (shortened) slot
    pub is_partial_slot: bool,
    /// Present for PUSCH sizing, absent for PDSCH
    pub ul: Option<UlChannelParams>,
}

/// Selected grant parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantParams {
    /// Selected MCS
    pub mcs: McsIndex,
    /// Selected PRB count
    pub nof_prbs: u16,
    /// Transport block size the selection yields, in bytes
    pub tbs_bytes: u32,
}

fn tbs_params(params: &ChannelParams, mcs: McsDescription, n_prb: u16) -> TbsParams {
    TbsParams {
        nof_symb_sh: params.nof_symbols,
        nof_dmrs_prb: params.nof_dmrs_prb,
        nof_oh_prb: params.nof_oh_prb,
        mcs,
        nof_layers: params.nof_layers,
        tb_scaling_field: 0,
        n_prb,
    }
}

/// Whether a PRB count satisfies the DFT precoding length constraint
/// (a product of the primes 2, 3 and 5 only)
pub fn is_valid_dft_size(nof_prbs: u16) -> bool {
    if nof_prbs == 0 {
        return false;
    }
    let mut n = nof_prbs;
    for p in [2u16, 3, 5] {
        while n % p == 0 {
            n /= p;
        }
    }
    n == 1
}

/// Largest valid DFT size not exceeding `nof_prbs` (0 if none)
fn round_down_dft_size(nof_prbs: u16) -> u16 {
    let mut n = nof_prbs;
    while n > 0 && !is_valid_dft_size(n) {
        n -= 1;
    }
    n
}

/// Smallest valid DFT size not below `nof_prbs`
fn round_up_dft_size(nof_prbs: u16) -> u16 {
    let mut n = nof_prbs.max(1);
    while !is_valid_dft_size(n) {
        n += 1;
    }
    n
}

/// Effective code rate of a candidate grant, accounting for multiplexed UCI
/// bits and worst-case DC-subcarrier overlap (one RE lost per symbol)
fn effective_code_rate(
    params: &ChannelParams,
    mcs: McsDescription,
    nof_prbs: u16,
    uci_bits: u16,
) -> f32 {
    let re_per_prb = (12 * params.nof_symbols as u32)
        .saturating_sub(params.nof_dmrs_prb as u32)
        .saturating_sub(params.nof_oh_prb as u32);
    let data_res = (re_per_prb * nof_prbs as u32).saturating_sub(params.nof_symbols as u32);
    if data_res == 0 {
        return f32::INFINITY;
    }
    let tbs_bits = tbs_bytes(&tbs_params(params, mcs, nof_prbs)) * 8;
    (tbs_bits + uci_bits as u32) as f32 / (data_res * mcs.modulation_order as u32) as f32
}

/// Compute the MCS and minimum PRB count whose TBS covers `pending_bytes`
///
/// Returns `None` when link adaptation reports no usable MCS (CQI 0), the MCS
/// lies outside the selectable range, or no PRB count within `rb_lims`
/// satisfies the UL effective-code-rate bound. The caller must then skip this
/// UE for the current slot; the condition is re-evaluated next slot.
pub fn compute_newtx_required_mcs_and_prbs(
    params: &ChannelParams,
    link_mcs: Option<McsIndex>,
    pending_bytes: u32,
    rb_lims: RbLimits,
) -> Option<GrantParams> {
    debug_assert!(pending_bytes > 0, "grant sizing requires pending data");
    let mcs = link_mcs?;
    if mcs.0 > McsIndex::MAX_SELECTABLE {
        return None;
    }
    let desc = mcs_description(params.mcs_table, mcs)?;

    // Smallest PRB count in [min, max] whose TBS covers the pending bytes.
    // TBS is monotone in the PRB count, so binary search applies.
    let (mut lo, mut hi) = (rb_lims.min, rb_lims.max);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if tbs_bytes(&tbs_params(params, desc, mid)) >= pending_bytes {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    let mut nof_prbs = lo;

    // [Implementation-defined] single-PRB grants decode poorly on partial
    // slots and at this MCS; widen to two PRBs when the limits allow.
    if nof_prbs == 1
        && (params.is_partial_slot || mcs.0 == SINGLE_PRB_HIGH_BLER_MCS)
        && rb_lims.max >= MIN_PRBS_SINGLE_PRB_BUMP
    {
        nof_prbs = MIN_PRBS_SINGLE_PRB_BUMP;
    }

    if let Some(ul) = &params.ul {
        if ul.transform_precoding {
            let rounded = round_down_dft_size(nof_prbs);
            nof_prbs = if rounded >= rb_lims.min {
                rounded
            } else {
                // Rounding down left the limits; take the next valid size up
                round_up_dft_size(rb_lims.min)
            };
            if nof_prbs > rb_lims.max {
                return None;
            }
        }

        // Grow the grant until the UCI-inclusive code rate fits. Bounded by
        // the RB-limit range width.
        while effective_code_rate(params, desc, nof_prbs, ul.uci_bits) > ul.max_code_rate {
            let next = if ul.transform_precoding {
                round_up_dft_size(nof_prbs + 1)
            } else {
                nof_prbs + 1
            };
            if next > rb_lims.max {
                trace!(
                    "no PRB count within [{}, {}] satisfies code rate {}",
                    rb_lims.min,
                    rb_lims.max,
                    ul.max_code_rate
                );
                return None;
            }
            nof_prbs = next;
        }
    }

    let tbs = tbs_bytes(&tbs_params(params, desc, nof_prbs));
    Some(GrantParams { mcs, nof_prbs, tbs_bytes: tbs })
}

/// Validate grant parameters for a HARQ retransmission
///
/// A retransmission never recomputes MCS or PRBs: it must reuse the initial
/// transmission's values. It fails (and the HARQ stays pending) if the RB
/// count no longer fits the slot's limits or the symbol count changed.
pub fn compute_retx_params(
    prev: &PrevTxParams,
    rb_lims: RbLimits,
    nof_symbols: u8,
) -> Option<GrantParams> {
    if nof_symbols != prev.nof_symbols {
        trace!(
            "retx deferred: slot has {} symbols, initial tx used {}",
            nof_symbols,
            prev.nof_symbols
        );
        return None;
    }
    if !rb_lims.contains(prev.nof_prbs) {
        return None;
    }
    Some(GrantParams { mcs: prev.mcs, nof_prbs: prev.nof_prbs, tbs_bytes: prev.tbs_bytes })
}

/// Achievable rate in bytes/slot at the current MCS over the full active BWP
///
/// Feeds the proportional-fair numerator of the scheduling policies.
pub fn estimate_rate_bytes_per_slot(
    params: &ChannelParams,
    link_mcs: Option<McsIndex>,
    bwp_prbs: u16,
) -> f64 {
    let Some(mcs) = link_mcs else { return 0.0 };
    let Some(desc) = mcs_description(params.mcs_table, mcs) else { return 0.0 };
    if bwp_prbs == 0 {
        return 0.0;
    }
    tbs_bytes(&tbs_params(params, desc, bwp_prbs)) as f64
}
