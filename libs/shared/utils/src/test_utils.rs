use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use shared_config::DashboardConfig;

use crate::clock::FixedClock;

pub struct TestConfig {
    pub utc_offset_minutes: i32,
    pub refresh_interval_seconds: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            refresh_interval_seconds: 60,
        }
    }
}

impl TestConfig {
    pub fn to_dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            utc_offset_minutes: self.utc_offset_minutes,
            refresh_interval_seconds: self.refresh_interval_seconds,
            ..DashboardConfig::default()
        }
    }
}

/// UTC instant on the given day, for terse fixtures.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .unwrap_or_else(|| panic!("invalid test instant {year}-{month}-{day} {hour}:{minute}:{second}"))
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid test date {year}-{month}-{day}"))
}

pub fn fixed_clock_at(now: DateTime<Utc>) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;

    #[test]
    fn test_config_overrides() {
        let config = TestConfig {
            utc_offset_minutes: 120,
            ..TestConfig::default()
        }
        .to_dashboard_config();
        assert_eq!(config.utc_offset_minutes, 120);
        assert!(config.is_valid());
    }

    #[test]
    fn test_fixture_helpers() {
        let now = utc(2024, 6, 15, 12, 0, 0);
        assert_eq!(now.date_naive(), date(2024, 6, 15));
        assert_eq!(fixed_clock_at(now).now(), now);
    }
}
