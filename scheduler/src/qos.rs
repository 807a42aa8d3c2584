//! QoS Metadata
//!
//! Per-logical-channel QoS configuration consumed by the scheduling policies,
//! per 3GPP TS 23.501 (5QI, ARP, GBR, packet delay budget)

use common::types::{ArpPriority, FiveQi};
use serde::{Deserialize, Serialize};

/// Guaranteed bit rates of a GBR flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GbrInfo {
    /// Guaranteed downlink bit rate in bits/s
    pub dl_bps: u64,
    /// Guaranteed uplink bit rate in bits/s
    pub ul_bps: u64,
}

/// QoS configuration of one logical channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalChannelQos {
    /// 5QI of the flow mapped onto this channel
    pub five_qi: FiveQi,
    /// 5QI default priority level (1 highest .. 127 lowest)
    pub five_qi_priority: u8,
    /// Allocation and Retention Priority
    pub arp: ArpPriority,
    /// Guaranteed bit rates, present only for GBR flows
    pub gbr: Option<GbrInfo>,
    /// Packet delay budget in ms, when delay-aware scheduling applies
    pub pdb_ms: Option<u16>,
}

impl LogicalChannelQos {
    /// Combined priority level (5QI priority x ARP), lower is more important
    pub fn combined_priority(&self) -> u16 {
        self.five_qi_priority as u16 * self.arp.0 as u16
    }

    /// Highest (least important) combined priority level
    pub const MAX_COMBINED_PRIORITY: u16 = 127 * ArpPriority::MAX as u16;
}

impl Default for LogicalChannelQos {
    fn default() -> Self {
        // Non-GBR default bearer (5QI 9)
        Self {
            five_qi: FiveQi::DEFAULT,
            five_qi_priority: 90,
            arp: ArpPriority(15),
            gbr: None,
            pdb_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_priority() {
        let qos = LogicalChannelQos {
            five_qi: FiveQi::VOICE,
            five_qi_priority: 20,
            arp: ArpPriority(2),
            gbr: Some(GbrInfo { dl_bps: 64_000, ul_bps: 64_000 }),
            pdb_ms: Some(100),
        };
        assert_eq!(qos.combined_priority(), 40);
        assert!(qos.combined_priority() < LogicalChannelQos::MAX_COMBINED_PRIORITY);
    }

    #[test]
    fn test_default_is_non_gbr() {
        let qos = LogicalChannelQos::default();
        assert!(qos.gbr.is_none());
        assert_eq!(qos.combined_priority(), 90 * 15);
    }
}
