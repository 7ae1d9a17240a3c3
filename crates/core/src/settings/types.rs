use std::fmt;

use serde::{Deserialize, Serialize};

/// Worker pacing hint, passed through as `--speed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Speed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speed::Slow => "slow",
            Speed::Normal => "normal",
            Speed::Fast => "fast",
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options the operator sets for automation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationSettings {
    /// `false` runs the worker with `--headless`.
    #[serde(default = "default_show_browser")]
    pub show_browser: bool,
    #[serde(default)]
    pub speed: Speed,
    /// Pause between one job's terminal status and the next claim.
    #[serde(default = "default_post_delay", alias = "postDelay")]
    pub post_delay_seconds: u64,
    /// Passed as `--manual-wait` when greater than zero.
    #[serde(default, alias = "manualWait")]
    pub manual_wait_seconds: u64,
}

fn default_show_browser() -> bool {
    true
}

fn default_post_delay() -> u64 {
    5
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            show_browser: default_show_browser(),
            speed: Speed::default(),
            post_delay_seconds: default_post_delay(),
            manual_wait_seconds: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AutomationSettings::default();
        assert!(settings.show_browser);
        assert_eq!(settings.speed, Speed::Normal);
        assert_eq!(settings.post_delay_seconds, 5);
        assert_eq!(settings.manual_wait_seconds, 0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: AutomationSettings =
            serde_json::from_str(r#"{"showBrowser": false, "speed": "fast"}"#).unwrap();
        assert!(!settings.show_browser);
        assert_eq!(settings.speed, Speed::Fast);
        assert_eq!(settings.post_delay_seconds, 5);
    }

    #[test]
    fn test_short_field_aliases() {
        let settings: AutomationSettings =
            serde_json::from_str(r#"{"postDelay": 12, "manualWait": 30}"#).unwrap();
        assert_eq!(settings.post_delay_seconds, 12);
        assert_eq!(settings.manual_wait_seconds, 30);

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["postDelaySeconds"], 12);
        assert_eq!(json["manualWaitSeconds"], 30);
    }

    #[test]
    fn test_unknown_speed_rejected() {
        let result: Result<AutomationSettings, _> =
            serde_json::from_str(r#"{"speed": "ludicrous"}"#);
        assert!(result.is_err());
    }
}
