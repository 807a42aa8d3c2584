//! MCS Tables
//!
//! Modulation and coding scheme tables per 3GPP TS 38.214 Tables 5.1.3.1-1/2

use serde::{Deserialize, Serialize};

/// MCS index (0-28 on the 64QAM table, 0-27 on the 256QAM table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct McsIndex(pub u8);

impl McsIndex {
    /// Highest MCS index usable for grant sizing
    pub const MAX_SELECTABLE: u8 = 27;
}

/// MCS table selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum McsTable {
    /// Table 5.1.3.1-1 (up to 64QAM)
    Qam64,
    /// Table 5.1.3.1-2 (up to 256QAM)
    Qam256,
}

/// Modulation order and target code rate for one MCS index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McsDescription {
    /// Modulation order Q_m (bits per symbol)
    pub modulation_order: u8,
    /// Target code rate x 1024
    pub target_code_rate: f32,
}

impl McsDescription {
    /// Target code rate as a fraction in (0, 1)
    pub fn code_rate(&self) -> f32 {
        self.target_code_rate / 1024.0
    }
}

const fn mcs(modulation_order: u8, target_code_rate: f32) -> McsDescription {
    McsDescription { modulation_order, target_code_rate }
}

/// TS 38.214 Table 5.1.3.1-1: MCS index table 1 for PDSCH (up to 64QAM)
const MCS_TABLE_QAM64: [McsDescription; 29] = [
    mcs(2, 120.0),
    mcs(2, 157.0),
    mcs(2, 193.0),
    mcs(2, 251.0),
    mcs(2, 308.0),
    mcs(2, 379.0),
    mcs(2, 449.0),
    mcs(2, 526.0),
    mcs(2, 602.0),
    mcs(2, 679.0),
    mcs(4, 340.0),
    mcs(4, 378.0),
    mcs(4, 434.0),
    mcs(4, 490.0),
    mcs(4, 553.0),
    mcs(4, 616.0),
    mcs(4, 658.0),
    mcs(6, 438.0),
    mcs(6, 466.0),
    mcs(6, 517.0),
    mcs(6, 567.0),
    mcs(6, 616.0),
    mcs(6, 666.0),
    mcs(6, 719.0),
    mcs(6, 772.0),
    mcs(6, 822.0),
    mcs(6, 873.0),
    mcs(6, 910.0),
    mcs(6, 948.0),
];

/// TS 38.214 Table 5.1.3.1-2: MCS index table 2 for PDSCH (up to 256QAM)
const MCS_TABLE_QAM256: [McsDescription; 28] = [
    mcs(2, 120.0),
    mcs(2, 193.0),
    mcs(2, 308.0),
    mcs(2, 449.0),
    mcs(2, 602.0),
    mcs(4, 378.0),
    mcs(4, 434.0),
    mcs(4, 490.0),
    mcs(4, 553.0),
    mcs(4, 616.0),
    mcs(4, 658.0),
    mcs(6, 466.0),
    mcs(6, 517.0),
    mcs(6, 567.0),
    mcs(6, 616.0),
    mcs(6, 666.0),
    mcs(6, 719.0),
    mcs(6, 772.0),
    mcs(6, 822.0),
    mcs(6, 873.0),
    mcs(8, 682.5),
    mcs(8, 711.0),
    mcs(8, 754.0),
    mcs(8, 797.0),
    mcs(8, 841.0),
    mcs(8, 885.0),
    mcs(8, 916.5),
    mcs(8, 948.0),
];

/// Look up modulation order and code rate for an MCS index
///
/// Returns `None` for indices outside the table (reserved entries included).
pub fn mcs_description(table: McsTable, index: McsIndex) -> Option<McsDescription> {
    match table {
        McsTable::Qam64 => MCS_TABLE_QAM64.get(index.0 as usize).copied(),
        McsTable::Qam256 => MCS_TABLE_QAM256.get(index.0 as usize).copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table1_spot_checks() {
        // Values from TS 38.214 Table 5.1.3.1-1
        let m = mcs_description(McsTable::Qam64, McsIndex(0)).unwrap();
        assert_eq!(m.modulation_order, 2);
        assert_eq!(m.target_code_rate, 120.0);

        let m = mcs_description(McsTable::Qam64, McsIndex(17)).unwrap();
        assert_eq!(m.modulation_order, 6);
        assert_eq!(m.target_code_rate, 438.0);

        let m = mcs_description(McsTable::Qam64, McsIndex(28)).unwrap();
        assert_eq!(m.modulation_order, 6);
        assert_eq!(m.target_code_rate, 948.0);

        assert!(mcs_description(McsTable::Qam64, McsIndex(29)).is_none());
    }

    #[test]
    fn test_table2_spot_checks() {
        // Values from TS 38.214 Table 5.1.3.1-2
        let m = mcs_description(McsTable::Qam256, McsIndex(20)).unwrap();
        assert_eq!(m.modulation_order, 8);
        assert_eq!(m.target_code_rate, 682.5);

        let m = mcs_description(McsTable::Qam256, McsIndex(27)).unwrap();
        assert_eq!(m.modulation_order, 8);
        assert_eq!(m.target_code_rate, 948.0);

        assert!(mcs_description(McsTable::Qam256, McsIndex(28)).is_none());
    }

    #[test]
    fn test_code_rate_fraction() {
        let m = mcs_description(McsTable::Qam64, McsIndex(28)).unwrap();
        assert!((m.code_rate() - 948.0 / 1024.0).abs() < 1e-6);
    }
}
