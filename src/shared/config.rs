use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub payroll: PayrollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
    pub remote_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayrollConfig {
    /// Shift start as `HH:MM`.
    pub shift_start: String,
    pub grace_minutes: u32,
    pub standard_shift_hours: f64,
    pub overtime_multiplier: f64,
    pub salaried_month_days: u32,
    pub salaried_monthly_hours: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://data/ledger.db?mode=rwc".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 300, // 5 minutes
                remote_timeout_ms: 15_000,
            },
            payroll: PayrollConfig::default(),
        }
    }
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            shift_start: "08:00".to_string(),
            grace_minutes: 15,
            standard_shift_hours: 8.0,
            overtime_multiplier: 1.5,
            salaried_month_days: 30,
            salaried_monthly_hours: 220,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("LEDGER_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v.trim().to_string();
            }
        }
        if let Some(value) = env_parsed::<u32>("LEDGER_DB_MAX_CONNECTIONS") {
            cfg.database.max_connections = value;
        }

        if let Ok(v) = std::env::var("LEDGER_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_parsed::<u64>("LEDGER_SYNC_INTERVAL") {
            cfg.sync.sync_interval = value.max(1);
        }
        if let Some(value) = env_parsed::<u64>("LEDGER_REMOTE_TIMEOUT_MS") {
            cfg.sync.remote_timeout_ms = value;
        }

        if let Ok(v) = std::env::var("LEDGER_SHIFT_START") {
            if parse_clock(&v).is_some() {
                cfg.payroll.shift_start = v.trim().to_string();
            }
        }
        if let Some(value) = env_parsed::<u32>("LEDGER_GRACE_MINUTES") {
            cfg.payroll.grace_minutes = value;
        }
        if let Some(value) = env_parsed::<f64>("LEDGER_STANDARD_SHIFT_HOURS") {
            cfg.payroll.standard_shift_hours = value;
        }
        if let Some(value) = env_parsed::<f64>("LEDGER_OVERTIME_MULTIPLIER") {
            cfg.payroll.overtime_multiplier = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.sync.remote_timeout_ms == 0 {
            return Err("Sync remote_timeout_ms must be greater than 0".to_string());
        }
        if self.sync.auto_sync && self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        if parse_clock(&self.payroll.shift_start).is_none() {
            return Err(format!(
                "Payroll shift_start must be HH:MM, got {}",
                self.payroll.shift_start
            ));
        }
        if self.payroll.standard_shift_hours <= 0.0 {
            return Err("Payroll standard_shift_hours must be positive".to_string());
        }
        if self.payroll.overtime_multiplier < 1.0 {
            return Err("Payroll overtime_multiplier must be at least 1.0".to_string());
        }
        if self.payroll.salaried_month_days == 0 || self.payroll.salaried_monthly_hours == 0 {
            return Err("Payroll salaried divisors must be greater than 0".to_string());
        }
        Ok(())
    }
}

pub(crate) fn parse_clock(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok()
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
