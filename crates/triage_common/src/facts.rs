//! Typed diagnostic facts and their default thresholds

use serde::{Deserialize, Serialize};

use crate::classifier::{Direction, Thresholds};
use crate::reading::{bytes_to_gb, percent, percent_of};

pub const CPU_WARNING_PERCENT: f64 = 80.0;
pub const CPU_CRITICAL_PERCENT: f64 = 90.0;

pub const MEMORY_WARNING_PERCENT: f64 = 80.0;
pub const MEMORY_CRITICAL_PERCENT: f64 = 90.0;

pub const DISK_FREE_WARNING_PERCENT: f64 = 20.0;
pub const DISK_FREE_CRITICAL_PERCENT: f64 = 10.0;

/// Overall CPU load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuLoadFact {
    pub percent: f64,
}

impl CpuLoadFact {
    /// Clamped into 0..=100; `None` for non-finite readings
    pub fn new(raw_percent: f64) -> Option<Self> {
        percent(raw_percent).map(|percent| Self { percent })
    }

    pub fn default_thresholds() -> Thresholds {
        Thresholds::new(CPU_CRITICAL_PERCENT, CPU_WARNING_PERCENT, Direction::HigherIsWorse)
            .with_unit("%")
    }
}

/// Physical memory usage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryFact {
    pub total_gb: f64,
    pub free_gb: f64,
    pub percent_used: f64,
}

impl MemoryFact {
    /// `None` when total is zero or available exceeds total
    pub fn from_bytes(total: u64, available: u64) -> Option<Self> {
        if total == 0 || available > total {
            return None;
        }
        let percent_used = percent_of((total - available) as f64, total as f64)?;
        Some(Self {
            total_gb: bytes_to_gb(total),
            free_gb: bytes_to_gb(available),
            percent_used,
        })
    }

    pub fn default_thresholds() -> Thresholds {
        Thresholds::new(
            MEMORY_CRITICAL_PERCENT,
            MEMORY_WARNING_PERCENT,
            Direction::HigherIsWorse,
        )
        .with_unit("%")
    }
}

/// Free space on one volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskFact {
    pub drive: String,
    pub total_gb: f64,
    pub free_gb: f64,
    pub percent_free: f64,
}

impl DiskFact {
    /// `None` for zero-sized volumes (pseudo filesystems report 0)
    pub fn from_bytes(drive: impl Into<String>, total: u64, free: u64) -> Option<Self> {
        let percent_free = percent_of(free.min(total) as f64, total as f64)?;
        Some(Self {
            drive: drive.into(),
            total_gb: bytes_to_gb(total),
            free_gb: bytes_to_gb(free.min(total)),
            percent_free,
        })
    }

    pub fn default_thresholds() -> Thresholds {
        Thresholds::new(
            DISK_FREE_CRITICAL_PERCENT,
            DISK_FREE_WARNING_PERCENT,
            Direction::LowerIsWorse,
        )
        .with_unit("%")
    }
}

/// Default IPv4 gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayFact {
    pub address: String,
    pub interface: Option<String>,
}

/// Host firewall state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallFact {
    pub enabled: bool,
    pub provider: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Tier;

    const GB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_cpu_fact_clamps() {
        assert_eq!(CpuLoadFact::new(-3.0).unwrap().percent, 0.0);
        assert_eq!(CpuLoadFact::new(130.0).unwrap().percent, 100.0);
        assert_eq!(CpuLoadFact::new(0.0).unwrap().percent, 0.0);
        assert!(CpuLoadFact::new(f64::NAN).is_none());
    }

    #[test]
    fn test_memory_fact() {
        let fact = MemoryFact::from_bytes(16 * GB, 4 * GB).unwrap();
        assert_eq!(fact.total_gb, 16.0);
        assert_eq!(fact.free_gb, 4.0);
        assert_eq!(fact.percent_used, 75.0);
        assert!(MemoryFact::from_bytes(0, 0).is_none());
        assert!(MemoryFact::from_bytes(4 * GB, 8 * GB).is_none());
    }

    #[test]
    fn test_disk_fact() {
        let fact = DiskFact::from_bytes("/", 100 * GB, 7 * GB).unwrap();
        assert_eq!(fact.percent_free, 7.0);
        assert!(DiskFact::from_bytes("/proc", 0, 0).is_none());
    }

    #[test]
    fn test_disk_exactly_at_warning_is_good() {
        let fact = DiskFact::from_bytes("/", 100, 29).unwrap();
        assert_eq!(fact.percent_free, 29.0);
        let thresholds = Thresholds::new(10.0, 29.0, Direction::LowerIsWorse);
        assert_eq!(thresholds.tier_for(fact.percent_free), Some(Tier::Good));

        let fact = DiskFact::from_bytes("D:", 100 * GB, 20 * GB).unwrap();
        assert_eq!(DiskFact::default_thresholds().tier_for(fact.percent_free), Some(Tier::Good));
    }

    #[test]
    fn test_memory_exactly_at_warning_is_good() {
        // 80% used: 20 of 100 available
        let fact = MemoryFact::from_bytes(100 * GB, 20 * GB).unwrap();
        assert_eq!(fact.percent_used, 80.0);
        assert_eq!(MemoryFact::default_thresholds().tier_for(fact.percent_used), Some(Tier::Good));
    }

    #[test]
    fn test_default_thresholds() {
        assert_eq!(DiskFact::default_thresholds().tier_for(7.0), Some(Tier::Critical));
        assert_eq!(CpuLoadFact::default_thresholds().tier_for(85.0), Some(Tier::Warning));
        assert_eq!(MemoryFact::default_thresholds().tier_for(50.0), Some(Tier::Good));
    }
}
