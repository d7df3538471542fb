use crate::settings::LinkConfig;
use serialport::SerialPort;
use std::io::{self, Read};
use thiserror::Error;
use tracing::info;

/// Failures of the serial link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The port could not be opened at startup.
    #[error("serial link {path} unavailable: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: serialport::Error,
    },
    /// Serial input is switched off in the configuration.
    #[error("serial link disabled by configuration")]
    Disabled,
    /// A read did not complete within the port timeout.
    #[error("serial link read timed out")]
    TimedOut,
    #[error("serial port failure: {0}")]
    Port(#[from] serialport::Error),
    #[error("serial link i/o failure: {0}")]
    Io(io::Error),
}

impl From<io::Error> for LinkError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => Self::TimedOut,
            _ => Self::Io(err),
        }
    }
}

/// A byte oriented link owned by the frame reader while it runs.
pub trait Link: Send {
    /// Number of bytes that can be read without waiting, zero when
    /// nothing has arrived.
    fn bytes_available(&mut self) -> Result<usize, LinkError>;

    /// Fill `buf` completely. Returns [`LinkError::TimedOut`] if the
    /// bytes do not arrive in time, in which case `buf` holds an
    /// unspecified prefix of them.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), LinkError>;

    /// Release the underlying connection.
    fn close(self)
    where
        Self: Sized;
}

/// Link backed by a serial port.
pub struct SerialLink {
    path: String,
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open the port named in the config. There is no retry, a port
    /// that fails to open disables serial input for the session.
    ///
    /// * `config`: serial link settings.
    pub fn open(config: &LinkConfig) -> Result<Self, LinkError> {
        if !config.enabled {
            return Err(LinkError::Disabled);
        }

        let port = serialport::new(&config.path, config.baud_rate)
            .timeout(config.read_timeout())
            .open()
            .map_err(|source| LinkError::Unavailable {
                path: config.path.clone(),
                source,
            })?;
        info!(path = %config.path, baud = config.baud_rate, "serial link open");

        Ok(Self {
            path: config.path.clone(),
            port,
        })
    }
}

impl Link for SerialLink {
    fn bytes_available(&mut self) -> Result<usize, LinkError> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), LinkError> {
        Read::read_exact(&mut self.port, buf)?;
        Ok(())
    }

    fn close(self) {
        info!(path = %self.path, "serial link closed");
    }
}
