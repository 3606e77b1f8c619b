//! Process-level metrics for the monitoring API.
//!
//! Requires the `process-stats` feature flag for memory and CPU figures.
//! Without it those fields report zero.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetrics {
    pub memory: MemoryUsage,
    /// Percentage of one core since the previous sample
    pub cpu_percent: f32,
    /// Seconds since the sampler was created
    pub uptime: f64,
    pub pid: u32,
    pub versions: BTreeMap<&'static str, &'static str>,
}

pub struct ProcessSampler {
    started: Instant,
    #[cfg(feature = "process-stats")]
    system: std::sync::Mutex<sysinfo::System>,
}

impl Default for ProcessSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSampler {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            #[cfg(feature = "process-stats")]
            system: std::sync::Mutex::new(sysinfo::System::new()),
        }
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn sample(&self) -> ProcessMetrics {
        let mut versions = BTreeMap::new();
        versions.insert("subforge", env!("CARGO_PKG_VERSION"));

        let (memory, cpu_percent) = self.usage();
        ProcessMetrics {
            memory,
            cpu_percent,
            uptime: self.uptime_secs(),
            pid: std::process::id(),
            versions,
        }
    }

    #[cfg(feature = "process-stats")]
    fn usage(&self) -> (MemoryUsage, f32) {
        let empty = MemoryUsage {
            rss_bytes: 0,
            virtual_bytes: 0,
        };
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(_) => return (empty, 0.0),
        };
        let mut system = match self.system.lock() {
            Ok(s) => s,
            Err(_) => return (empty, 0.0),
        };
        system.refresh_process(pid);
        match system.process(pid) {
            Some(p) => (
                MemoryUsage {
                    rss_bytes: p.memory(),
                    virtual_bytes: p.virtual_memory(),
                },
                p.cpu_usage(),
            ),
            None => (empty, 0.0),
        }
    }

    #[cfg(not(feature = "process-stats"))]
    fn usage(&self) -> (MemoryUsage, f32) {
        (
            MemoryUsage {
                rss_bytes: 0,
                virtual_bytes: 0,
            },
            0.0,
        )
    }
}
