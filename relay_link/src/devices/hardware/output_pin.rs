use std::{fs, io, path::PathBuf};
use strum_macros::Display;
use thiserror::Error;
use tracing::debug;

/// Root of the linux sysfs gpio interface.
const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Logic level of a binary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Level {
    #[strum(serialize = "low")]
    Low,
    #[strum(serialize = "high")]
    High,
}

/// Raised when an output could not be set up or driven.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to configure gpio {pin_id} as an output: {source}")]
    Configure {
        pin_id: u8,
        #[source]
        source: io::Error,
    },
    #[error("failed to drive gpio {pin_id} {level}: {source}")]
    Drive {
        pin_id: u8,
        level: Level,
        #[source]
        source: io::Error,
    },
}

impl OutputError {
    pub fn pin_id(&self) -> u8 {
        match self {
            Self::Configure { pin_id, .. } | Self::Drive { pin_id, .. } => *pin_id,
        }
    }
}

/// A single level driven output. The relay coils are level driven,
/// so setting the level it already has is harmless.
pub trait OutputPin {
    /// Pin identifier, the BCM gpio number on a Raspberry Pi.
    fn pin_id(&self) -> u8;

    /// Prepare the pin for output. Called once before the first level.
    fn configure(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    /// Drive the output to `level`.
    fn set_level(&mut self, level: Level) -> Result<(), OutputError>;
}

/// Output written through sysfs. [`OutputPin::configure`] exports the
/// pin when its node is missing and sets the direction to `out`.
#[derive(Debug)]
pub struct SysfsPin {
    pin_id: u8,
    root: PathBuf,
}

impl SysfsPin {
    pub fn new(pin_id: u8) -> Self {
        Self {
            pin_id,
            root: PathBuf::from(SYSFS_GPIO_ROOT),
        }
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin_id))
    }
}

impl OutputPin for SysfsPin {
    fn pin_id(&self) -> u8 {
        self.pin_id
    }

    fn configure(&mut self) -> Result<(), OutputError> {
        let configure_err = |source| OutputError::Configure {
            pin_id: self.pin_id,
            source,
        };
        let pin_dir = self.pin_dir();
        if !pin_dir.is_dir() {
            debug!(pin = self.pin_id, "exporting gpio");
            fs::write(self.root.join("export"), self.pin_id.to_string())
                .map_err(configure_err)?;
        }
        fs::write(pin_dir.join("direction"), "out")
            .map_err(configure_err)
    }

    fn set_level(&mut self, level: Level) -> Result<(), OutputError> {
        let value = match level {
            Level::High => "1",
            Level::Low => "0",
        };
        fs::write(self.pin_dir().join("value"), value)
            .map_err(|source| OutputError::Drive {
                pin_id: self.pin_id,
                level,
                source,
            })
    }
}

/// Stand in for a gpio when hardware access is disabled, the level
/// is only logged.
#[derive(Debug)]
pub struct DisabledPin {
    pin_id: u8,
}

impl DisabledPin {
    pub fn new(pin_id: u8) -> Self {
        Self { pin_id }
    }
}

impl OutputPin for DisabledPin {
    fn pin_id(&self) -> u8 {
        self.pin_id
    }

    fn set_level(&mut self, level: Level) -> Result<(), OutputError> {
        debug!(pin = self.pin_id, %level, "gpio disabled, not driving output");
        Ok(())
    }
}

/// Build the output for `pin_id`, honouring the disable gpio setting.
pub fn output_for(pin_id: u8, disable_gpio: bool) -> Box<dyn OutputPin> {
    if disable_gpio {
        Box::new(DisabledPin::new(pin_id))
    } else {
        Box::new(SysfsPin::new(pin_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fresh directory standing in for /sys/class/gpio.
    fn fake_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("relay_link_gpio_{name}"));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn test_sysfs_pin_paths() {
        let pin = SysfsPin::new(24);

        assert_eq!(pin.pin_dir(), PathBuf::from("/sys/class/gpio/gpio24"));
    }

    #[test]
    fn test_configure_exports_missing_pin() {
        let root = fake_root("export");
        let mut pin = SysfsPin {
            pin_id: 24,
            root: root.clone(),
        };

        // No kernel behind the fake root, so the gpio24 node never appears.
        let err = pin.configure().unwrap_err();

        assert_eq!(fs::read_to_string(root.join("export")).unwrap(), "24");
        assert!(matches!(err, OutputError::Configure { pin_id: 24, .. }));
    }

    #[test]
    fn test_configure_sets_direction_of_exported_pin() {
        let root = fake_root("direction");
        fs::create_dir_all(root.join("gpio25")).unwrap();
        let mut pin = SysfsPin {
            pin_id: 25,
            root: root.clone(),
        };

        pin.configure().unwrap();

        assert_eq!(fs::read_to_string(root.join("gpio25/direction")).unwrap(), "out");
        assert!(!root.join("export").exists(), "exported pins are not exported again");
    }

    #[test]
    fn test_sysfs_write_failure_reports_pin() {
        let mut pin = SysfsPin {
            pin_id: 7,
            root: PathBuf::from("/nonexistent"),
        };

        let err = pin.set_level(Level::High).unwrap_err();

        assert_eq!(err.pin_id(), 7);
        assert!(matches!(err, OutputError::Drive { level: Level::High, .. }));
    }

    #[test]
    fn test_sysfs_writes_level() {
        let root = fake_root("value");
        fs::create_dir_all(root.join("gpio25")).unwrap();
        let mut pin = SysfsPin {
            pin_id: 25,
            root: root.clone(),
        };

        pin.set_level(Level::High).unwrap();
        assert_eq!(fs::read_to_string(root.join("gpio25/value")).unwrap(), "1");
        pin.set_level(Level::Low).unwrap();
        assert_eq!(fs::read_to_string(root.join("gpio25/value")).unwrap(), "0");
    }

    #[test]
    fn test_disabled_pin_never_fails() {
        let mut pin = output_for(24, true);

        assert_eq!(pin.pin_id(), 24);
        assert!(pin.configure().is_ok());
        assert!(pin.set_level(Level::High).is_ok());
    }
}
