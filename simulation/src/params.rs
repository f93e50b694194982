//! Run parameters
//!
//! Parameters come from environment variables, a JSON file, or both (the
//! environment wins). They are fixed for the lifetime of a run.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ============================================================================
// Report policy
// ============================================================================

/// When the control loop emits the periodic alive-cell count.
///
/// Textual form, used by `LIFE_REPORT` and the JSON config:
/// `2s` / `500ms` for a wall-clock interval, `100t` for every 100 turns,
/// `off` to disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReportPolicy {
    Interval(Duration),
    EveryTurns(u64),
    Never,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self::Interval(Duration::from_secs(2))
    }
}

impl ReportPolicy {
    /// A zero period would report on every iteration and never advance.
    fn has_zero_period(&self) -> bool {
        match self {
            Self::Interval(period) => period.is_zero(),
            Self::EveryTurns(n) => *n == 0,
            Self::Never => false,
        }
    }
}

impl FromStr for ReportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("off") || s.eq_ignore_ascii_case("never") {
            return Ok(Self::Never);
        }

        let (number, unit) = s
            .find(|c: char| !c.is_ascii_digit())
            .map(|i| s.split_at(i))
            .ok_or_else(|| format!("missing unit in {s:?} (expected ms, s or t)"))?;
        let value: u64 = number
            .parse()
            .map_err(|e| format!("bad number in {s:?}: {e}"))?;
        if value == 0 {
            return Err(format!("report period must be positive, got {s:?}"));
        }

        match unit {
            "ms" => Ok(Self::Interval(Duration::from_millis(value))),
            "s" => Ok(Self::Interval(Duration::from_secs(value))),
            "t" => Ok(Self::EveryTurns(value)),
            other => Err(format!("unknown unit {other:?} (expected ms, s or t)")),
        }
    }
}

impl TryFrom<String> for ReportPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReportPolicy> for String {
    fn from(policy: ReportPolicy) -> Self {
        match policy {
            ReportPolicy::Interval(d) if d.subsec_millis() == 0 => format!("{}s", d.as_secs()),
            ReportPolicy::Interval(d) => format!("{}ms", d.as_millis()),
            ReportPolicy::EveryTurns(n) => format!("{n}t"),
            ReportPolicy::Never => "off".to_string(),
        }
    }
}

// ============================================================================
// Run parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Worker threads used per generation
    pub workers: usize,
    /// Target number of generations
    pub turns: u64,
    pub report: ReportPolicy,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            workers: 8,
            turns: 10_000,
            report: ReportPolicy::default(),
        }
    }
}

impl RunParams {
    pub fn new(width: usize, height: usize, workers: usize, turns: u64) -> Self {
        Self {
            width,
            height,
            workers,
            turns,
            report: ReportPolicy::default(),
        }
    }

    pub fn with_report(mut self, report: ReportPolicy) -> Self {
        self.report = report;
        self
    }

    /// Reject parameters no run can start with.
    ///
    /// A height that doesn't divide evenly by the worker count is fine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("width", self.width == 0),
            ("height", self.height == 0),
            ("workers", self.workers == 0),
            ("turns", self.turns == 0),
            ("report", self.report.has_zero_period()),
        ];
        for (field, is_zero) in checks {
            if is_zero {
                return Err(ConfigError::NotPositive { field });
            }
        }
        if self.width.checked_mul(self.height).is_none() {
            return Err(ConfigError::GridTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Load from environment variables on top of the defaults.
    ///
    /// Optional variables:
    /// - `LIFE_WIDTH`, `LIFE_HEIGHT` -- grid size (default 512x512)
    /// - `LIFE_WORKERS` -- worker threads (default 8)
    /// - `LIFE_TURNS` -- generations to run (default 10000)
    /// - `LIFE_REPORT` -- alive-count cadence (default `2s`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace any field whose `LIFE_*` variable is set.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(width) = env_parse::<usize>("LIFE_WIDTH")? {
            self.width = width;
        }
        if let Some(height) = env_parse::<usize>("LIFE_HEIGHT")? {
            self.height = height;
        }
        if let Some(workers) = env_parse::<usize>("LIFE_WORKERS")? {
            self.workers = workers;
        }
        if let Some(turns) = env_parse::<u64>("LIFE_TURNS")? {
            self.turns = turns;
        }
        if let Some(report) = env_parse::<ReportPolicy>("LIFE_REPORT")? {
            self.report = report;
        }
        Ok(self)
    }
}

fn env_parse<T>(var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}
