//! Health, readiness and liveness checks.
//!
//! Responses follow the indicator layout used by the services' clients:
//! `{"status", "info", "error", "details"}`, where each indicator entry carries
//! `"status": "up" | "down"` plus its own measurements.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use sysinfo::{Disks, ProcessesToUpdate, System};

use meridian_infra::config::HealthThresholds;

/// Usage of one filesystem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskUsage {
    pub total: u64,
    pub available: u64,
}

impl DiskUsage {
    pub fn used_fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        1.0 - self.available as f64 / self.total as f64
    }
}

/// Source of host measurements.
pub trait SystemProbe: Send + Sync {
    /// Resident set size of this process, in bytes.
    fn process_memory_bytes(&self) -> Option<u64>;
    fn disk_usage(&self, mount_point: &Path) -> Option<DiskUsage>;
}

/// Probe backed by `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoProbe;

impl SystemProbe for SysinfoProbe {
    fn process_memory_bytes(&self) -> Option<u64> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        sys.process(pid).map(|p| p.memory())
    }

    fn disk_usage(&self, mount_point: &Path) -> Option<DiskUsage> {
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .find(|d| d.mount_point() == mount_point)
            .map(|d| DiskUsage {
                total: d.total_space(),
                available: d.available_space(),
            })
    }
}

struct Indicator {
    key: &'static str,
    up: bool,
    data: Map<String, Value>,
}

impl Indicator {
    fn new(key: &'static str, up: bool, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { key, up, data }
    }

    fn entry(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("status".to_string(), json!(if self.up { "up" } else { "down" }));
        entry.extend(self.data.clone());
        Value::Object(entry)
    }
}

/// Outcome of a set of checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub info: Map<String, Value>,
    pub error: Map<String, Value>,
    pub details: Map<String, Value>,
}

impl HealthReport {
    fn from_indicators(indicators: Vec<Indicator>) -> Self {
        let mut report = Self {
            status: "ok",
            info: Map::new(),
            error: Map::new(),
            details: Map::new(),
        };
        for indicator in indicators {
            let entry = indicator.entry();
            if indicator.up {
                report.info.insert(indicator.key.to_string(), entry.clone());
            } else {
                report.status = "error";
                report.error.insert(indicator.key.to_string(), entry.clone());
            }
            report.details.insert(indicator.key.to_string(), entry);
        }
        report
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}

/// Runs the health checks of one service.
#[derive(Clone)]
pub struct HealthChecker {
    thresholds: HealthThresholds,
    version: String,
    started: Instant,
    probe: Arc<dyn SystemProbe>,
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthChecker")
            .field("thresholds", &self.thresholds)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl HealthChecker {
    pub fn new(thresholds: HealthThresholds, version: impl Into<String>) -> Self {
        Self::with_probe(thresholds, version, Arc::new(SysinfoProbe))
    }

    pub fn with_probe(
        thresholds: HealthThresholds,
        version: impl Into<String>,
        probe: Arc<dyn SystemProbe>,
    ) -> Self {
        Self {
            thresholds,
            version: version.into(),
            started: Instant::now(),
            probe,
        }
    }

    /// Memory, storage and application checks.
    pub fn health(&self) -> HealthReport {
        HealthReport::from_indicators(vec![
            self.memory_rss(self.thresholds.memory_limit_bytes),
            self.storage(),
            self.application(),
        ])
    }

    /// Memory against the readiness limit, plus the application check.
    pub fn readiness(&self) -> HealthReport {
        HealthReport::from_indicators(vec![
            self.memory_rss(self.thresholds.readiness_memory_limit_bytes),
            self.application(),
        ])
    }

    pub fn liveness(&self) -> HealthReport {
        HealthReport::from_indicators(Vec::new())
    }

    fn memory_rss(&self, limit: u64) -> Indicator {
        match self.probe.process_memory_bytes() {
            Some(rss) => Indicator::new(
                "memory_rss",
                rss <= limit,
                json!({ "rss": rss, "limit": limit }),
            ),
            None => Indicator::new(
                "memory_rss",
                false,
                json!({ "message": "process memory unavailable" }),
            ),
        }
    }

    fn storage(&self) -> Indicator {
        let threshold = self.thresholds.disk_threshold;
        match self.probe.disk_usage(Path::new("/")) {
            Some(usage) => {
                let used = usage.used_fraction();
                Indicator::new(
                    "storage",
                    used <= threshold,
                    json!({ "usedPercent": used * 100.0, "thresholdPercent": threshold * 100.0 }),
                )
            }
            None => Indicator::new(
                "storage",
                false,
                json!({ "message": "root filesystem not found" }),
            ),
        }
    }

    fn application(&self) -> Indicator {
        Indicator::new(
            "app",
            true,
            json!({
                "uptime": self.started.elapsed().as_secs_f64(),
                "version": self.version,
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
        )
    }
}
