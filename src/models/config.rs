use serde::{Deserialize, Serialize};

/// Hub configuration from `Notify Hub.yaml`
///
/// Contains logging setup and dispatch settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(rename = "Notify_Hub", default)]
    pub settings: HubSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSettings {
    #[serde(rename = "Log Dir", default = "default_log_dir")]
    pub log_dir: String,

    #[serde(rename = "Log Prefix", default = "default_log_prefix")]
    pub log_prefix: String,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,

    #[serde(rename = "Console Output", default = "default_true")]
    pub console_output: bool,

    /// Buffered cancel requests per subscriber before lagging ones skip ahead
    #[serde(
        rename = "Cancel Channel Capacity",
        default = "default_cancel_channel_capacity"
    )]
    pub cancel_channel_capacity: usize,

    #[serde(rename = "Log Metrics On Exit", default = "default_true")]
    pub log_metrics_on_exit: bool,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            debug_mode: false,
            console_output: true,
            cancel_channel_capacity: default_cancel_channel_capacity(),
            log_metrics_on_exit: true,
        }
    }
}

/// Largest cancel channel the hub will allocate; the ring is allocated up front
pub const MAX_CANCEL_CHANNEL_CAPACITY: usize = 4096;

impl HubSettings {
    /// Cancel channel capacity, clamped to `1..=MAX_CANCEL_CHANNEL_CAPACITY`.
    pub fn cancel_capacity(&self) -> usize {
        let capacity = self
            .cancel_channel_capacity
            .clamp(1, MAX_CANCEL_CHANNEL_CAPACITY);
        if capacity != self.cancel_channel_capacity {
            tracing::warn!(
                configured = self.cancel_channel_capacity,
                used = capacity,
                "Cancel Channel Capacity out of range, clamping"
            );
        }
        capacity
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "notify-hub".to_string()
}

fn default_cancel_channel_capacity() -> usize {
    16
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "Notify_Hub:\n  Debug Mode: true\n";
        let config: HubConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert!(config.settings.debug_mode);
        assert_eq!(config.settings.log_dir, "logs");
        assert_eq!(config.settings.cancel_channel_capacity, 16);
        assert!(config.settings.console_output);
    }

    #[test]
    fn test_cancel_capacity_is_clamped() {
        let yaml = "Notify_Hub:\n  Cancel Channel Capacity: 18446744073709551615\n";
        let config: HubConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.settings.cancel_capacity(), MAX_CANCEL_CHANNEL_CAPACITY);

        let yaml = "Notify_Hub:\n  Cancel Channel Capacity: 0\n";
        let config: HubConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.settings.cancel_capacity(), 1);

        assert_eq!(HubSettings::default().cancel_capacity(), 16);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: HubConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config.settings.log_prefix, "notify-hub");
        assert!(config.settings.log_metrics_on_exit);
    }
}
