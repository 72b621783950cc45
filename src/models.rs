// VPS usage models and human-unit conversion

use serde::{Deserialize, Serialize};

/// One metered resource as reported by the control plane, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl ResourceUsage {
    pub fn free_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.used_bytes)
    }

    /// Used share in percent; 0.0 when the total is zero (unmetered resources).
    pub fn usage_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.total_bytes as f64 * 100.0
        }
    }
}

/// Snapshot of one VPS produced by a single upstream fetch. Immutable; a new
/// fetch produces a new value, never mutates one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpsStats {
    pub hostname: String,
    pub ip: String,
    pub disk: ResourceUsage,
    pub bandwidth: ResourceUsage,
    pub memory: ResourceUsage,
    /// Unix seconds at fetch time.
    pub fetched_at: i64,
}

/// Decimal display units: GB = 1e9 bytes, TB = 1e12 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    #[serde(rename = "GB")]
    Gigabytes,
    #[serde(rename = "TB")]
    Terabytes,
}

impl std::fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeUnit::Gigabytes => write!(f, "GB"),
            SizeUnit::Terabytes => write!(f, "TB"),
        }
    }
}

pub const BYTES_PER_GB: f64 = 1e9;
pub const BYTES_PER_TB: f64 = 1e12;
/// Totals at or above this many GB are shown in TB.
const TB_THRESHOLD_GB: f64 = 1000.0;

/// Convert a byte count to GB, or TB once it reaches 1000 GB.
pub fn human_size(bytes: u64) -> (f64, SizeUnit) {
    let gb = bytes as f64 / BYTES_PER_GB;
    if gb >= TB_THRESHOLD_GB {
        (bytes as f64 / BYTES_PER_TB, SizeUnit::Terabytes)
    } else {
        (gb, SizeUnit::Gigabytes)
    }
}

/// One resource converted for display. All three values share the unit picked
/// from the resource's total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDisplay {
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub usage: f64,
    pub unit: SizeUnit,
}

impl From<&ResourceUsage> for ResourceDisplay {
    fn from(r: &ResourceUsage) -> Self {
        let (total, unit) = human_size(r.total_bytes);
        let divisor = match unit {
            SizeUnit::Gigabytes => BYTES_PER_GB,
            SizeUnit::Terabytes => BYTES_PER_TB,
        };
        Self {
            total,
            used: r.used_bytes as f64 / divisor,
            free: r.free_bytes() as f64 / divisor,
            usage: r.usage_percent(),
            unit,
        }
    }
}

/// Widget-friendly snapshot served by GET /status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpsStatsDisplay {
    pub hostname: String,
    pub ip: String,
    pub last_update: i64,
    pub storage: ResourceDisplay,
    pub bandwidth: ResourceDisplay,
    pub memory: ResourceDisplay,
}

impl From<&VpsStats> for VpsStatsDisplay {
    fn from(s: &VpsStats) -> Self {
        Self {
            hostname: s.hostname.clone(),
            ip: s.ip.clone(),
            last_update: s.fetched_at,
            storage: (&s.disk).into(),
            bandwidth: (&s.bandwidth).into(),
            memory: (&s.memory).into(),
        }
    }
}
