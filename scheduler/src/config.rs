//! Scheduling Policy Configuration
//!
//! Immutable configuration handed to a policy at construction. No ambient
//! globals: every tunable travels through this struct.

use crate::mcs_tables::McsTable;
use crate::SchedError;
use common::types::SubcarrierSpacing;
use serde::{Deserialize, Serialize};

/// Upper clamp for the PF fairness coefficient; larger exponents underflow
/// `avg_rate.powf` for small averages
pub const MAX_FAIRNESS_COEFF: f64 = 10.0;

/// Configuration shared by the time-domain scheduling policies
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// PF fairness exponent; 0 disables fairness, clamped at `MAX_FAIRNESS_COEFF`
    #[serde(default = "default_fairness_coeff")]
    pub fairness_coeff: f64,
    /// EWMA smoothing factor for the rate histories, in (0, 1]
    #[serde(default = "default_exp_avg_alpha")]
    pub exp_avg_alpha: f64,
    /// Floor the PF weight at 1.0 while any GBR target is unmet
    #[serde(default = "default_true")]
    pub gbr_prioritization: bool,
    /// Weight priorities by the 5QI/ARP level of the pending channels
    #[serde(default = "default_true")]
    pub priority_weighting: bool,
    /// Weight priorities by head-of-line delay against the packet delay budget
    #[serde(default = "default_true")]
    pub pdb_weighting: bool,
    /// MCS table in use for the cell
    #[serde(default = "default_mcs_table")]
    pub mcs_table: McsTable,
    /// Subcarrier spacing of the cell (sets the slot duration)
    #[serde(default = "default_scs")]
    pub scs: SubcarrierSpacing,
    /// DFT-s-OFDM on PUSCH
    #[serde(default)]
    pub transform_precoding: bool,
    /// Maximum effective UL code rate after UCI multiplexing
    #[serde(default = "default_ul_max_code_rate")]
    pub ul_max_code_rate: f32,
}

fn default_fairness_coeff() -> f64 {
    2.0
}

fn default_exp_avg_alpha() -> f64 {
    0.01
}

fn default_true() -> bool {
    true
}

fn default_mcs_table() -> McsTable {
    McsTable::Qam64
}

fn default_scs() -> SubcarrierSpacing {
    SubcarrierSpacing::Scs30
}

fn default_ul_max_code_rate() -> f32 {
    0.95
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            fairness_coeff: default_fairness_coeff(),
            exp_avg_alpha: default_exp_avg_alpha(),
            gbr_prioritization: true,
            priority_weighting: true,
            pdb_weighting: true,
            mcs_table: default_mcs_table(),
            scs: default_scs(),
            transform_precoding: false,
            ul_max_code_rate: default_ul_max_code_rate(),
        }
    }
}

impl PolicyConfig {
    /// Validate the configuration, clamping the fairness coefficient
    pub fn validated(mut self) -> Result<Self, SchedError> {
        if !(self.exp_avg_alpha > 0.0 && self.exp_avg_alpha <= 1.0) {
            return Err(SchedError::InvalidConfiguration(format!(
                "exp_avg_alpha must lie in (0, 1], got {}",
                self.exp_avg_alpha
            )));
        }
        if self.fairness_coeff < 0.0 {
            return Err(SchedError::InvalidConfiguration(format!(
                "fairness_coeff must be non-negative, got {}",
                self.fairness_coeff
            )));
        }
        if !(self.ul_max_code_rate > 0.0 && self.ul_max_code_rate < 1.0) {
            return Err(SchedError::InvalidConfiguration(format!(
                "ul_max_code_rate must lie in (0, 1), got {}",
                self.ul_max_code_rate
            )));
        }
        self.fairness_coeff = self.fairness_coeff.min(MAX_FAIRNESS_COEFF);
        Ok(self)
    }
}
