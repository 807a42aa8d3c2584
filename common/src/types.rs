//! Common Types for 5G GNodeB
//!
//! Defines fundamental types used throughout the MAC scheduler and protocol stack

use serde::{Deserialize, Serialize};
use num_derive::{FromPrimitive, ToPrimitive};

/// Radio Network Temporary Identifier (RNTI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rnti(pub u16);

impl Rnti {
    /// Create a new RNTI
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the RNTI value
    pub fn value(&self) -> u16 {
        self.0
    }
}

/// UE index within the DU (stable across a UE's lifetime)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UeIndex(pub u16);

impl UeIndex {
    /// Maximum number of UEs a cell scheduler can track
    pub const MAX_UES: u16 = 1024;

    /// Create a new UE index with validation
    pub fn new(value: u16) -> Option<Self> {
        if value < Self::MAX_UES {
            Some(Self(value))
        } else {
            None
        }
    }
}

/// DU cell index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellIndex(pub u8);

/// HARQ process identifier (0-15 for NR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HarqId(pub u8);

impl HarqId {
    /// Maximum valid HARQ process id
    pub const MAX: u8 = 15;

    /// Create a new HARQ id with validation
    pub fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }
}

/// Logical Channel Identifier (LCID) per 3GPP TS 38.321
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Lcid(pub u8);

impl Lcid {
    /// SRB0 (CCCH)
    pub const SRB0: Self = Self(0);
    /// SRB1
    pub const SRB1: Self = Self(1);
    /// First DRB LCID
    pub const DRB_MIN: Self = Self(4);
    /// Last valid LCID carrying an SDU
    pub const MAX: Self = Self(32);
}

/// 5G QoS Identifier per 3GPP TS 23.501
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiveQi(pub u16);

impl FiveQi {
    /// Conversational voice
    pub const VOICE: Self = Self(1);
    /// Live video streaming
    pub const VIDEO: Self = Self(2);
    /// Default non-GBR bearer
    pub const DEFAULT: Self = Self(9);
}

/// Allocation and Retention Priority level (1 highest .. 15 lowest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArpPriority(pub u8);

impl ArpPriority {
    /// Lowest (least important) ARP level
    pub const MAX: u8 = 15;

    /// Create a new ARP priority with validation
    pub fn new(value: u8) -> Option<Self> {
        if (1..=Self::MAX).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }
}

/// Subcarrier spacing values in kHz
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive, Serialize, Deserialize)]
pub enum SubcarrierSpacing {
    /// 15 kHz
    Scs15 = 15,
    /// 30 kHz
    Scs30 = 30,
    /// 60 kHz
    Scs60 = 60,
    /// 120 kHz
    Scs120 = 120,
    /// 240 kHz
    Scs240 = 240,
}

/// Half-open PRB interval [start, stop) within a BWP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbInterval {
    /// First PRB of the interval
    pub start: u16,
    /// One past the last PRB of the interval
    pub stop: u16,
}

impl RbInterval {
    /// Create a new interval; `start` must not exceed `stop`
    pub fn new(start: u16, stop: u16) -> Option<Self> {
        if start <= stop {
            Some(Self { start, stop })
        } else {
            None
        }
    }

    /// Number of PRBs in the interval
    pub fn length(&self) -> u16 {
        self.stop - self.start
    }

    /// Whether the interval is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    /// Whether the interval contains a given PRB
    pub fn contains(&self, prb: u16) -> bool {
        prb >= self.start && prb < self.stop
    }

    /// Intersection with another interval (empty interval if disjoint)
    pub fn intersect(&self, other: &RbInterval) -> RbInterval {
        let start = self.start.max(other.start);
        let stop = self.stop.min(other.stop);
        if start <= stop {
            RbInterval { start, stop }
        } else {
            RbInterval { start, stop: start }
        }
    }
}

/// Closed RB-count interval [min, max] used by grant sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbLimits {
    /// Minimum number of RBs a grant may use
    pub min: u16,
    /// Maximum number of RBs a grant may use
    pub max: u16,
}

impl RbLimits {
    /// Create new limits; `min` must be positive and not exceed `max`
    pub fn new(min: u16, max: u16) -> Option<Self> {
        if min >= 1 && min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Clamp an RB count into the limits
    pub fn clamp(&self, nof_rbs: u16) -> u16 {
        nof_rbs.clamp(self.min, self.max)
    }

    /// Whether an RB count lies within the limits
    pub fn contains(&self, nof_rbs: u16) -> bool {
        nof_rbs >= self.min && nof_rbs <= self.max
    }
}
