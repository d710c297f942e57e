//! Serial port transport.

use super::{ReadOutcome, Transport};
use crate::error::TransportError;
use serde::Serialize;
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Symbol rate the notifier firmware listens at.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// How long a read waits before reporting [`ReadOutcome::Idle`].
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A serial port opened 8N1 without flow control.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    name: String,
}

impl SerialTransport {
    /// Opens `port_name` at `baud_rate`.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(POLL_INTERVAL)
            .open()
            .map_err(|e| TransportError::OpenFailed {
                port: port_name.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(port = port_name, baud_rate, "serial port opened");
        Ok(Self {
            port: Some(port),
            name: port_name.to_string(),
        })
    }
}

impl Transport for SerialTransport {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        let Some(port) = self.port.as_mut() else {
            return Ok(ReadOutcome::End);
        };
        match port.read(buf) {
            Ok(0) => Ok(ReadOutcome::End),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                Ok(ReadOutcome::Idle)
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(ReadOutcome::Idle),
            Err(e) => Err(TransportError::ReadFailed(e.to_string())),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotConnected)?;
        port.write_all(bytes)
            .and_then(|()| port.flush())
            .map_err(|e| TransportError::WriteFailed(e.to_string()))
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::info!(port = %self.name, "serial port closed");
        }
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// A serial port found on this machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortSummary {
    /// OS device name (`/dev/ttyUSB0`, `COM3`).
    pub name: String,
    /// Port kind (`usb`, `pci`, `bluetooth`, `unknown`).
    pub kind: String,
    /// USB product string, when known.
    pub product: Option<String>,
}

/// Lists serial ports available on this machine.
pub fn list_ports() -> Result<Vec<PortSummary>, TransportError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|info| {
            let (kind, product) = match info.port_type {
                SerialPortType::UsbPort(usb) => ("usb", usb.product),
                SerialPortType::PciPort => ("pci", None),
                SerialPortType::BluetoothPort => ("bluetooth", None),
                SerialPortType::Unknown => ("unknown", None),
            };
            PortSummary {
                name: info.port_name,
                kind: kind.to_string(),
                product,
            }
        })
        .collect())
}
