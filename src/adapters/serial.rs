//! Serial port adapter.
//!
//! Implements [`SerialChannel`] on top of the `serialport` crate.  The
//! port is opened with the configured baud rate and read timeout, and both
//! buffers are flushed so stale bytes from a previous run are not taken
//! as telemetry.

use std::io::{Read, Write};
use std::time::Duration;

use log::info;
use serialport::{ClearBuffer, SerialPort};

use crate::app::ports::SerialChannel;
use crate::error::SerialError;

pub struct SerialPortChannel {
    port: Box<dyn SerialPort>,
}

impl SerialPortChannel {
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, SerialError> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| SerialError::Open(format!("{}: {}", path, e)))?;
        port.clear(ClearBuffer::All)
            .map_err(|e| SerialError::Open(format!("{}: flush failed: {}", path, e)))?;
        info!("Serial: opened {} at {} baud", path, baud_rate);
        Ok(Self { port })
    }
}

impl SerialChannel for SerialPortChannel {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        let n = self.port.write(bytes)?;
        self.port.flush()?;
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}
