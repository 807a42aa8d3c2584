//! MAC Scheduler Resource-Allocation Core
//!
//! Implements the per-slot resource-allocation engine of the 5G NR MAC
//! scheduler according to 3GPP TS 38.214: QoS-aware and proportional-fair
//! time-domain policies, grant parameter selection (MCS/PRB sizing against
//! the TBS procedure) and HARQ retransmission ordering.
//!
//! The engine is single-threaded and synchronous. It is driven once per slot
//! per direction from the cell's real-time scheduling thread; all inputs are
//! materialized before entry and all recoverable outcomes travel as status
//! values rather than errors.

pub mod alloc;
pub mod config;
pub mod grant;
pub mod grid;
pub mod history;
pub mod mcs_tables;
pub mod policy;
pub mod qos;
pub mod tbs;
pub mod ue;

use thiserror::Error;

pub use alloc::{AllocResult, AllocStatus, DlGrantRequest, PdschAllocator, PuschAllocator, TbInfo, UlGrantRequest};
pub use config::PolicyConfig;
pub use grant::{ChannelParams, GrantParams, UlChannelParams};
pub use grid::{PendingRetx, PrevTxParams, ResourceGridView};
pub use history::{ExpAvg, UeHistory};
pub use mcs_tables::{McsIndex, McsTable};
pub use policy::time_pf::SchedulerTimePf;
pub use policy::time_qos::SchedulerTimeQos;
pub use policy::SchedulerPolicy;
pub use qos::{GbrInfo, LogicalChannelQos};
pub use ue::{LinkState, LogicalChannelState, SchedUe, SliceCandidate};

/// Errors of the scheduler core
///
/// Only construction-time conditions surface here; per-slot allocation
/// outcomes are [`AllocStatus`] values, and contract violations are fatal.
#[derive(Error, Debug)]
pub enum SchedError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
