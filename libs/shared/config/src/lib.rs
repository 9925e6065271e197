use std::env;
use std::str::FromStr;
use tracing::warn;

const DEFAULT_SLOT_DURATION_MINUTES: u32 = 30;
const DEFAULT_NEXT_SLOT_LOOKAHEAD_DAYS: u32 = 7;
const DEFAULT_CANCELLED_RETENTION_DAYS: u32 = 90;
const DEFAULT_API_HOST: &str = "0.0.0.0";
const DEFAULT_API_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slot_duration_minutes: u32,
    pub next_slot_lookahead_days: u32,
    pub cancelled_retention_days: u32,
    pub api_host: String,
    pub api_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            next_slot_lookahead_days: DEFAULT_NEXT_SLOT_LOOKAHEAD_DAYS,
            cancelled_retention_days: DEFAULT_CANCELLED_RETENTION_DAYS,
            api_host: DEFAULT_API_HOST.to_string(),
            api_port: DEFAULT_API_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            slot_duration_minutes: parse_var("SLOT_DURATION_MINUTES", DEFAULT_SLOT_DURATION_MINUTES),
            next_slot_lookahead_days: parse_var("NEXT_SLOT_LOOKAHEAD_DAYS", DEFAULT_NEXT_SLOT_LOOKAHEAD_DAYS),
            cancelled_retention_days: parse_var("CANCELLED_RETENTION_DAYS", DEFAULT_CANCELLED_RETENTION_DAYS),
            api_host: env::var("API_HOST")
                .unwrap_or_else(|_| {
                    warn!("API_HOST not set, using default");
                    DEFAULT_API_HOST.to_string()
                }),
            api_port: parse_var("API_PORT", DEFAULT_API_PORT),
        };

        if !config.is_valid() {
            warn!("Slot duration must divide a day evenly, falling back to {} minutes", DEFAULT_SLOT_DURATION_MINUTES);
            return Self {
                slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
                ..config
            };
        }

        config
    }

    /// Slot boundaries are measured from midnight, so the duration has to
    /// tile a day exactly.
    pub fn is_valid(&self) -> bool {
        self.slot_duration_minutes > 0 && (24 * 60) % self.slot_duration_minutes == 0
    }

    pub fn with_slot_duration(mut self, minutes: u32) -> Self {
        self.slot_duration_minutes = minutes;
        self
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {}", name, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_half_hour_slots() {
        let config = AppConfig::default();
        assert_eq!(config.slot_duration_minutes, 30);
        assert_eq!(config.next_slot_lookahead_days, 7);
        assert!(config.is_valid());
    }

    #[test]
    fn durations_that_do_not_tile_a_day_are_invalid() {
        assert!(!AppConfig::default().with_slot_duration(0).is_valid());
        assert!(!AppConfig::default().with_slot_duration(7).is_valid());
        assert!(AppConfig::default().with_slot_duration(15).is_valid());
        assert!(AppConfig::default().with_slot_duration(60).is_valid());
    }
}
