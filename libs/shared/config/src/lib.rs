use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub utc_offset_minutes: i32,
    pub refresh_interval_seconds: u64,
    pub timeline_start_hour: u32,
    pub timeline_end_hour: u32,
    pub min_gap_minutes: i64,
    pub appointments_file: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            refresh_interval_seconds: 60,
            timeline_start_hour: 8,
            timeline_end_hour: 20,
            min_gap_minutes: 180,
            appointments_file: "appointments.json".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut config = Self {
            utc_offset_minutes: parse_var("HARMONIA_UTC_OFFSET_MINUTES", defaults.utc_offset_minutes),
            refresh_interval_seconds: parse_var(
                "HARMONIA_REFRESH_INTERVAL_SECONDS",
                defaults.refresh_interval_seconds,
            ),
            timeline_start_hour: parse_var("HARMONIA_TIMELINE_START_HOUR", defaults.timeline_start_hour),
            timeline_end_hour: parse_var("HARMONIA_TIMELINE_END_HOUR", defaults.timeline_end_hour),
            min_gap_minutes: parse_var("HARMONIA_MIN_GAP_MINUTES", defaults.min_gap_minutes),
            appointments_file: env::var("HARMONIA_APPOINTMENTS_FILE")
                .unwrap_or_else(|_| {
                    warn!("HARMONIA_APPOINTMENTS_FILE not set, using default");
                    defaults.appointments_file.clone()
                }),
        };

        if config.refresh_interval_seconds == 0 {
            warn!("HARMONIA_REFRESH_INTERVAL_SECONDS must be positive, using default");
            config.refresh_interval_seconds = defaults.refresh_interval_seconds;
        }

        if !config.is_valid() {
            warn!(
                "Timeline window {}..{} is invalid, falling back to {}..{}",
                config.timeline_start_hour,
                config.timeline_end_hour,
                defaults.timeline_start_hour,
                defaults.timeline_end_hour
            );
            config.timeline_start_hour = defaults.timeline_start_hour;
            config.timeline_end_hour = defaults.timeline_end_hour;
        }

        config
    }

    /// The timeline must open before it closes and stay within one day.
    pub fn is_valid(&self) -> bool {
        self.timeline_start_hour < self.timeline_end_hour
            && self.timeline_end_hour <= 24
            && self.refresh_interval_seconds > 0
    }
}

fn parse_var<T: FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DashboardConfig::default();
        assert!(config.is_valid());
        assert_eq!(config.refresh_interval_seconds, 60);
        assert_eq!(config.min_gap_minutes, 180);
    }

    #[test]
    fn test_inverted_timeline_is_invalid() {
        let config = DashboardConfig {
            timeline_start_hour: 18,
            timeline_end_hour: 9,
            ..DashboardConfig::default()
        };
        assert!(!config.is_valid());
    }

    #[test]
    fn test_zero_refresh_interval_is_invalid() {
        let config = DashboardConfig {
            refresh_interval_seconds: 0,
            ..DashboardConfig::default()
        };
        assert!(!config.is_valid());
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        env::set_var("HARMONIA_TEST_PARSE_GARBAGE", "not-a-number");
        assert_eq!(parse_var("HARMONIA_TEST_PARSE_GARBAGE", 42u64), 42);
        env::remove_var("HARMONIA_TEST_PARSE_GARBAGE");
    }

    #[test]
    fn test_parse_var_reads_value() {
        env::set_var("HARMONIA_TEST_PARSE_VALUE", " -120 ");
        assert_eq!(parse_var("HARMONIA_TEST_PARSE_VALUE", 0i32), -120);
        env::remove_var("HARMONIA_TEST_PARSE_VALUE");
    }
}
