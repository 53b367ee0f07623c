//! Resource-snapshot collaborator.
//!
//! Supplies the raw numbers behind a monitoring emission: cumulative process
//! CPU time (user/system split), the process memory breakdown, and total and
//! free system memory. Snapshots are taken synchronously and never fail;
//! anything the platform cannot report comes back as zero.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::System;

/// Cumulative CPU time consumed by the process since start, split into user
/// and system time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuTimes {
    pub user_micros: u64,
    pub system_micros: u64,
}

/// Process memory breakdown in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryBreakdown {
    /// Resident set size
    pub resident_set: u64,
    /// Virtual address space size
    pub virtual_size: u64,
}

/// Raw numbers gathered for one monitoring tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub cpu: CpuTimes,
    pub memory: MemoryBreakdown,
    /// Total system memory in bytes
    pub total_memory: u64,
    /// Free system memory in bytes
    pub free_memory: u64,
}

impl ResourceSnapshot {
    /// Fold the snapshot into the payload emitted on the logging path.
    ///
    /// The used-memory percentage is `(total - free) / total * 100`, or zero
    /// when the total is unknown. A snapshot reporting more free than total
    /// memory clamps to zero used rather than underflowing.
    pub fn into_usage(self, timestamp: DateTime<Utc>) -> ResourceUsage {
        let memory_usage_percentage = if self.total_memory > 0 {
            self.total_memory.saturating_sub(self.free_memory) as f64
                / self.total_memory as f64
                * 100.0
        } else {
            0.0
        };
        ResourceUsage {
            timestamp,
            cpu_usage: self.cpu,
            memory_usage: self.memory,
            memory_usage_percentage,
        }
    }
}

/// The structured record emitted at `info` level on every sampler tick.
///
/// Serialized with camelCase field names, so a rendered payload carries the
/// `cpuUsage`, `memoryUsage` and `memoryUsagePercentage` markers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: CpuTimes,
    pub memory_usage: MemoryBreakdown,
    pub memory_usage_percentage: f64,
}

/// Synchronous, infallible supplier of resource snapshots.
pub trait ResourceProbe: Send + Sync {
    fn snapshot(&self) -> ResourceSnapshot;
}

/// Default probe reading memory figures from `sysinfo` and CPU times from
/// `getrusage` (zero on non-unix platforms).
pub struct SystemProbe {
    system: Mutex<System>,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SystemProbe {
    fn snapshot(&self) -> ResourceSnapshot {
        let mut system = self.system.lock();
        system.refresh_memory();

        let memory = match sysinfo::get_current_pid() {
            Ok(pid) => {
                system.refresh_process(pid);
                system
                    .process(pid)
                    .map(|process| MemoryBreakdown {
                        resident_set: process.memory(),
                        virtual_size: process.virtual_memory(),
                    })
                    .unwrap_or_default()
            }
            Err(_) => MemoryBreakdown::default(),
        };

        ResourceSnapshot {
            cpu: cpu_times(),
            memory,
            total_memory: system.total_memory(),
            free_memory: system.free_memory(),
        }
    }
}

#[cfg(unix)]
fn cpu_times() -> CpuTimes {
    use nix::sys::resource::{getrusage, UsageWho};

    match getrusage(UsageWho::RUSAGE_SELF) {
        Ok(usage) => {
            let user = usage.user_time();
            let system = usage.system_time();
            CpuTimes {
                user_micros: user.tv_sec() as u64 * 1_000_000 + user.tv_usec() as u64,
                system_micros: system.tv_sec() as u64 * 1_000_000 + system.tv_usec() as u64,
            }
        }
        Err(_) => CpuTimes::default(),
    }
}

#[cfg(not(unix))]
fn cpu_times() -> CpuTimes {
    CpuTimes::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_probe_reports_memory() {
        let probe = SystemProbe::new();
        let snapshot = probe.snapshot();

        assert!(snapshot.total_memory > 0);
        assert!(snapshot.free_memory <= snapshot.total_memory);
    }

    #[test]
    fn test_usage_percentage_calculation() {
        let snapshot = ResourceSnapshot {
            total_memory: 100,
            free_memory: 25,
            ..Default::default()
        };
        let usage = snapshot.into_usage(Utc::now());
        assert!((usage.memory_usage_percentage - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_usage_percentage_clamps_when_free_exceeds_total() {
        // An injected probe may report inconsistent figures; the fold must
        // not underflow.
        let snapshot = ResourceSnapshot {
            total_memory: 100,
            free_memory: 150,
            ..Default::default()
        };
        let usage = snapshot.into_usage(Utc::now());
        assert_eq!(usage.memory_usage_percentage, 0.0);
    }

    #[test]
    fn test_usage_percentage_with_unknown_total() {
        let snapshot = ResourceSnapshot::default();
        let usage = snapshot.into_usage(Utc::now());
        assert_eq!(usage.memory_usage_percentage, 0.0);
    }

    #[test]
    fn test_usage_serializes_with_camel_case_markers() {
        let usage = ResourceSnapshot::default().into_usage(Utc::now());
        let rendered = serde_json::to_string(&usage).unwrap();

        assert!(rendered.contains("\"cpuUsage\""));
        assert!(rendered.contains("\"memoryUsage\""));
        assert!(rendered.contains("\"memoryUsagePercentage\""));
        assert!(rendered.contains("\"userMicros\""));
        assert!(rendered.contains("\"residentSet\""));
    }
}
