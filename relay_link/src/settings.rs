use crate::messages::control::llap::{CHANNEL_TAG_LEN, DEVICE_ID_LEN};
use serde::{Deserialize, Serialize};
use std::{
    ffi::OsStr,
    fs::OpenOptions,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Errors raised while loading, validating or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate the config file {0:?}")]
    NotFound(PathBuf),
    #[error("failed to read config: {0}")]
    Read(#[from] ::config::ConfigError),
    #[error("failed to write config: {0}")]
    Write(#[from] serde_yaml::Error),
    #[error("failed to open config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("device id {0:?} must be exactly two ascii characters")]
    DeviceId(String),
    #[error("channel tag {0:?} must be exactly three ascii characters")]
    ChannelTag(String),
    #[error("channels a and b must use distinct {0}")]
    Duplicate(&'static str),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Serial link settings. Baud rate and device path are fixed for a
/// session, nothing is negotiated at runtime.
#[derive(Deserialize, Serialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct LinkConfig {
    /// Device path of the serial port, i.e. /dev/ttyAMA0.
    pub path: String,
    pub baud_rate: u32,
    /// When false the link is never opened and the panel runs in
    /// manual control only.
    pub enabled: bool,
    /// How long a read may wait for the rest of a frame before the
    /// partial frame is abandoned.
    pub read_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            path: String::from("/dev/ttyAMA0"),
            baud_rate: 9600,
            enabled: true,
            read_timeout_ms: 1000,
        }
    }
}

impl LinkConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// One relay channel: the gpio it drives and the payload tag
/// that addresses it.
#[derive(Deserialize, Serialize, PartialEq, Eq, Debug, Clone)]
pub struct ChannelConfig {
    pub pin: u8,
    pub tag: String,
}

/// Both relay channels of the board.
#[derive(Deserialize, Serialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct ChannelsConfig {
    pub a: ChannelConfig,
    pub b: ChannelConfig,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            a: ChannelConfig {
                pin: 24,
                tag: String::from("D02"),
            },
            b: ChannelConfig {
                pin: 25,
                tag: String::from("D03"),
            },
        }
    }
}

/// Configuration for the relay panel, read from yaml at startup.
#[derive(Deserialize, Serialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct RelayPanelConfig {
    /// The single device id frames must be addressed to.
    pub device_id: String,
    pub link: LinkConfig,
    pub channels: ChannelsConfig,
    /// Period of the dispatcher inside the panel event loop.
    pub dispatch_interval_ms: u64,
    /// Sleep of the reader thread when no bytes are waiting, also
    /// bounds how long shutdown waits for the reader to notice.
    pub idle_poll_ms: u64,
    /// Log output levels instead of writing to gpio.
    pub disable_gpio: bool,
}

impl Default for RelayPanelConfig {
    fn default() -> Self {
        Self {
            device_id: String::from("AB"),
            link: LinkConfig::default(),
            channels: ChannelsConfig::default(),
            dispatch_interval_ms: 100,
            idle_poll_ms: 10,
            disable_gpio: false,
        }
    }
}

impl RelayPanelConfig {
    /// Build the config by reading a yaml file. Missing keys take
    /// their default, the result is validated before it is returned.
    ///
    /// * `filepath`: path to config.
    pub fn from_file<F: AsRef<OsStr>>(filepath: F) -> Result<Self, ConfigError> {
        let file = Path::new(&filepath);
        if !file.is_file() {
            return Err(ConfigError::NotFound(file.to_path_buf()));
        }

        let config = ::config::Config::builder()
            .add_source(::config::File::new(
                &file.to_string_lossy(),
                ::config::FileFormat::Yaml,
            ))
            .build()?
            .try_deserialize::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config out as yaml, replacing any existing file.
    ///
    /// * `filepath`: path to write to.
    pub fn to_file<F: AsRef<Path>>(&self, filepath: F) -> Result<(), ConfigError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(filepath)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }

    /// Check the protocol widths and that the two channels can be
    /// told apart.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.len() != DEVICE_ID_LEN || !self.device_id.is_ascii() {
            return Err(ConfigError::DeviceId(self.device_id.clone()));
        }
        for channel in [&self.channels.a, &self.channels.b] {
            if channel.tag.len() != CHANNEL_TAG_LEN || !channel.tag.is_ascii() {
                return Err(ConfigError::ChannelTag(channel.tag.clone()));
            }
        }
        if self.channels.a.tag == self.channels.b.tag {
            return Err(ConfigError::Duplicate("tags"));
        }
        if self.channels.a.pin == self.channels.b.pin {
            return Err(ConfigError::Duplicate("pins"));
        }
        if self.dispatch_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("dispatch_interval_ms"));
        }
        if self.idle_poll_ms == 0 {
            return Err(ConfigError::ZeroInterval("idle_poll_ms"));
        }
        if self.link.read_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval("link.read_timeout_ms"));
        }
        Ok(())
    }

    /// Address frames must carry to be acted on.
    ///
    /// * `device_id`: two character device id.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn with_channel_tags(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.channels.a.tag = a.into();
        self.channels.b.tag = b.into();
        self
    }

    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_interval_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_file_path;
    use rstest::rstest;
    use serial_test::serial;

    #[test]
    fn test_read_fixture_config_file() {
        let config = RelayPanelConfig::from_file(test_file_path!("/config/relay_panel.yaml"))
            .expect("fixture config should load");

        assert_eq!(config.device_id, "AB");
        assert_eq!(config.channels.a, ChannelConfig { pin: 24, tag: "D02".into() });
        assert_eq!(config.channels.b, ChannelConfig { pin: 25, tag: "D03".into() });
        assert_eq!(config.link.path, "/dev/ttyAMA0");
        assert_eq!(config.link.baud_rate, 9600);
        assert_eq!(config.dispatch_interval(), Duration::from_millis(100));
        assert_eq!(config.idle_poll(), Duration::from_millis(10));
    }

    #[test]
    #[serial]
    fn test_read_write_config_file() {
        let path = std::env::temp_dir().join("relay_link_read_write_config.yaml");
        let write_config = RelayPanelConfig::default()
            .with_device_id("XY")
            .with_channel_tags("R01", "R02");

        write_config.to_file(&path).expect("Failed to write yaml");
        let read_config = RelayPanelConfig::from_file(&path).expect("Failed to read yaml");

        assert_eq!(write_config, read_config, "Failed to be created equally");
    }

    #[test]
    #[serial]
    fn test_partial_config_file_takes_defaults() {
        let path = std::env::temp_dir().join("relay_link_partial_config.yaml");
        std::fs::write(&path, "device_id: QQ\nlink:\n  enabled: false\n").unwrap();

        let config = RelayPanelConfig::from_file(&path).unwrap();

        assert_eq!(config.device_id, "QQ");
        assert!(!config.link.enabled);
        assert_eq!(config.link.baud_rate, 9600);
        assert_eq!(config.channels, ChannelsConfig::default());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = RelayPanelConfig::from_file("/nonexistent/relay_panel.yaml");

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[rstest]
    #[case(RelayPanelConfig::default().with_device_id("ABC"))]
    #[case(RelayPanelConfig::default().with_device_id(""))]
    #[case(RelayPanelConfig::default().with_channel_tags("D2", "D03"))]
    #[case(RelayPanelConfig::default().with_channel_tags("D02", "D02"))]
    #[case(RelayPanelConfig { dispatch_interval_ms: 0, ..RelayPanelConfig::default() })]
    #[case(RelayPanelConfig { idle_poll_ms: 0, ..RelayPanelConfig::default() })]
    fn test_invalid_configs_are_rejected(#[case] config: RelayPanelConfig) {
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_pins_are_rejected() {
        let mut config = RelayPanelConfig::default();
        config.channels.b.pin = config.channels.a.pin;

        assert!(matches!(config.validate(), Err(ConfigError::Duplicate("pins"))));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RelayPanelConfig::default().validate().is_ok());
    }
}
