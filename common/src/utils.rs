//! Common Utilities
//!
//! Provides utility functions used across the GNodeB implementation

/// Time utilities for slot/frame calculations
pub mod time {
    use crate::types::SubcarrierSpacing;

    /// Slot duration in microseconds for different SCS
    pub fn slot_duration_us(scs: SubcarrierSpacing) -> u32 {
        match scs {
            SubcarrierSpacing::Scs15 => 1000, // 1 ms
            SubcarrierSpacing::Scs30 => 500,  // 0.5 ms
            SubcarrierSpacing::Scs60 => 250,  // 0.25 ms
            SubcarrierSpacing::Scs120 => 125, // 0.125 ms
            SubcarrierSpacing::Scs240 => 62,  // 0.0625 ms (approximated)
        }
    }

    /// Number of slots per frame (10ms)
    pub fn slots_per_frame(scs: SubcarrierSpacing) -> u16 {
        match scs {
            SubcarrierSpacing::Scs15 => 10,
            SubcarrierSpacing::Scs30 => 20,
            SubcarrierSpacing::Scs60 => 40,
            SubcarrierSpacing::Scs120 => 80,
            SubcarrierSpacing::Scs240 => 160,
        }
    }

    /// Number of slots per second for a given SCS
    pub fn slots_per_second(scs: SubcarrierSpacing) -> u32 {
        slots_per_frame(scs) as u32 * 100
    }

    /// Convert a bit rate in bits/s into the scheduler's bytes/slot unit
    pub fn bps_to_bytes_per_slot(bps: u64, scs: SubcarrierSpacing) -> f64 {
        (bps as f64 / 8.0) / slots_per_second(scs) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubcarrierSpacing;

    #[test]
    fn test_slot_duration() {
        assert_eq!(time::slot_duration_us(SubcarrierSpacing::Scs15), 1000);
        assert_eq!(time::slot_duration_us(SubcarrierSpacing::Scs30), 500);
        assert_eq!(time::slot_duration_us(SubcarrierSpacing::Scs120), 125);
    }

    #[test]
    fn test_slots_per_second() {
        assert_eq!(time::slots_per_second(SubcarrierSpacing::Scs15), 1000);
        assert_eq!(time::slots_per_second(SubcarrierSpacing::Scs30), 2000);
    }

    #[test]
    fn test_bps_conversion() {
        // 8 Mbit/s at 15 kHz SCS: 1000 slots/s -> 1000 bytes/slot
        let bytes = time::bps_to_bytes_per_slot(8_000_000, SubcarrierSpacing::Scs15);
        assert!((bytes - 1000.0).abs() < 1e-9);

        // Same rate at 30 kHz SCS halves the per-slot quota
        let bytes = time::bps_to_bytes_per_slot(8_000_000, SubcarrierSpacing::Scs30);
        assert!((bytes - 500.0).abs() < 1e-9);
    }
}
