use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use crate::consts::SERIAL_TERMINATOR;
use crate::error::Result;

/// Byte-level link to the camera's serial port.
pub trait SerialTransport: Send {
    /// Send command text as-is (the caller appends the terminator).
    fn write(&mut self, text: &str) -> Result<()>;

    /// Read up to `max_bytes`, waiting at most `timeout`. An empty string
    /// means no data arrived.
    fn read(&mut self, max_bytes: usize, timeout: Duration) -> Result<String>;
}

/// In-memory transport that behaves like the camera's command interpreter.
///
/// `<REG>?\r` queues a `<REG> <value>\r` reply when the register is known,
/// `<REG> <int>\r` stores the value and echoes it back. Everything written
/// is recorded for inspection.
#[derive(Debug, Default)]
pub struct MockSerial {
    registers: BTreeMap<String, i64>,
    written: Vec<String>,
    inbound: VecDeque<char>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(mut self, name: &str, value: i64) -> Self {
        self.registers.insert(name.to_string(), value);
        self
    }

    /// Commands written so far, in order.
    pub fn written(&self) -> &[String] {
        &self.written
    }

    pub fn register(&self, name: &str) -> Option<i64> {
        self.registers.get(name).copied()
    }

    /// Queue raw text as if the device had sent it unprompted.
    pub fn push_inbound(&mut self, text: &str) {
        self.inbound.extend(text.chars());
    }

    fn interpret(&mut self, command: &str) {
        let command = command.trim_end_matches(SERIAL_TERMINATOR);
        if let Some(name) = command.strip_suffix('?') {
            if let Some(value) = self.registers.get(name) {
                let reply = format!("{name} {value}{SERIAL_TERMINATOR}");
                self.inbound.extend(reply.chars());
            }
            return;
        }

        if let Some((name, value)) = command.split_once(' ') {
            if let Ok(value) = value.trim().parse::<i64>() {
                self.registers.insert(name.to_string(), value);
                let reply = format!("{name} {value}{SERIAL_TERMINATOR}");
                self.inbound.extend(reply.chars());
            }
        }
    }
}

impl SerialTransport for MockSerial {
    fn write(&mut self, text: &str) -> Result<()> {
        self.written.push(text.to_string());
        for command in text.split_inclusive(SERIAL_TERMINATOR) {
            self.interpret(command);
        }
        Ok(())
    }

    fn read(&mut self, max_bytes: usize, _timeout: Duration) -> Result<String> {
        let mut out = String::new();
        while let Some(&c) = self.inbound.front() {
            if out.len() + c.len_utf8() > max_bytes {
                break;
            }
            out.push(c);
            self.inbound.pop_front();
        }
        Ok(out)
    }
}

#[cfg(feature = "serial")]
pub use port::PortTransport;

#[cfg(feature = "serial")]
mod port {
    use std::io::{Read, Write};
    use std::time::Duration;

    use serialport::SerialPort;
    use tracing::debug;

    use super::SerialTransport;
    use crate::error::Result;

    /// Transport backed by a host serial port.
    pub struct PortTransport {
        port: Box<dyn SerialPort>,
    }

    impl PortTransport {
        pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
            let port = serialport::new(path, baud_rate)
                .timeout(Duration::from_millis(100))
                .open()
                .map_err(std::io::Error::from)?;
            debug!(path, baud_rate, "Serial port opened");
            Ok(Self { port })
        }
    }

    impl SerialTransport for PortTransport {
        fn write(&mut self, text: &str) -> Result<()> {
            self.port.write_all(text.as_bytes())?;
            Ok(())
        }

        fn read(&mut self, max_bytes: usize, timeout: Duration) -> Result<String> {
            self.port
                .set_timeout(timeout)
                .map_err(std::io::Error::from)?;
            let mut buf = vec![0u8; max_bytes];
            match self.port.read(&mut buf) {
                Ok(n) => Ok(String::from_utf8_lossy(&buf[..n]).into_owned()),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(String::new()),
                Err(e) => Err(e.into()),
            }
        }
    }
}
