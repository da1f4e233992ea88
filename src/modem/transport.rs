//! Byte-level access to the modem's serial line.
//!
//! [`Transport`] is the seam the rest of the crate talks through; the
//! production implementation is [`SerialTransport`], tests substitute a
//! scripted fake. No retries happen at this layer.

#[cfg(feature = "serial")]
use log::debug;
use log::{info, trace};
#[cfg(feature = "serial")]
use serialport::SerialPort;
#[cfg(feature = "serial")]
use std::io::{Read, Write};
use std::time::Duration;

use crate::logutil::escape_bytes;

/// Upper bound on a single `read_all`; a full SIM listing is far below this.
#[cfg(feature = "serial")]
const MAX_READ_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to open serial port {port}: {reason}")]
    Open { port: String, reason: String },

    #[error("serial io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("modem connection is closed")]
    Closed,

    #[error("{0}")]
    Unsupported(String),
}

impl TransportError {
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::Closed)
    }
}

/// Raw command/response primitives over an exclusively owned link.
pub trait Transport {
    /// Write bytes exactly as given; callers add line terminators.
    fn write_command(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Return whatever has arrived, waiting at most one read timeout for more.
    /// An empty vector is a normal result.
    fn read_all(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Release the link. Safe to call more than once.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Serial-port transport for a USB/UART attached modem.
pub struct SerialTransport {
    port_name: String,
    #[cfg(feature = "serial")]
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open `port_name` at 8N1 without flow control.
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        info!("Opening modem on {} at {} baud", port_name, baud_rate);

        #[cfg(feature = "serial")]
        {
            let port = serialport::new(port_name, baud_rate)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .flow_control(serialport::FlowControl::None)
                .timeout(timeout)
                .open()
                .map_err(|e| TransportError::Open {
                    port: port_name.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(SerialTransport {
                port_name: port_name.to_string(),
                port: Some(port),
            })
        }

        #[cfg(not(feature = "serial"))]
        {
            let _ = timeout;
            Err(TransportError::Unsupported(format!(
                "cannot open {}: serial support not compiled in",
                port_name
            )))
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Transport for SerialTransport {
    fn write_command(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        #[cfg(feature = "serial")]
        {
            let port = self.port.as_mut().ok_or(TransportError::Closed)?;
            trace!("TX {}", escape_bytes(bytes));
            port.write_all(bytes)?;
            port.flush()?;
            Ok(())
        }

        #[cfg(not(feature = "serial"))]
        {
            trace!("TX (no serial) {}", escape_bytes(bytes));
            Err(TransportError::Closed)
        }
    }

    fn read_all(&mut self) -> Result<Vec<u8>, TransportError> {
        #[cfg(feature = "serial")]
        {
            let port = self.port.as_mut().ok_or(TransportError::Closed)?;
            let mut collected = Vec::new();
            let mut chunk = [0u8; 512];
            while collected.len() < MAX_READ_BYTES {
                match port.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => collected.extend_from_slice(&chunk[..n]),
                    Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                    Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {
                        debug!("Serial read interrupted (EINTR), retrying");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            trace!("RX {} bytes: {}", collected.len(), escape_bytes(&collected));
            Ok(collected)
        }

        #[cfg(not(feature = "serial"))]
        {
            Err(TransportError::Closed)
        }
    }

    fn close(&mut self) {
        #[cfg(feature = "serial")]
        {
            if self.port.take().is_some() {
                debug!("Closed serial port {}", self.port_name);
            }
        }
    }

    fn is_open(&self) -> bool {
        #[cfg(feature = "serial")]
        {
            self.port.is_some()
        }

        #[cfg(not(feature = "serial"))]
        {
            false
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}
