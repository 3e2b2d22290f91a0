use tracing::{debug, info};

use crate::consts::{PIXCLK_MAX, SERIAL_READ_CHUNK, SERIAL_READ_TIMEOUT, SERIAL_TERMINATOR};
use crate::error::{BeamviewError, Result};

use super::registers::RegisterMap;
use super::serial::SerialLineAssembler;
use super::transport::SerialTransport;

/// Commands that switch off gain control and image enhancement, which
/// would otherwise break any power calibration of the ADC counts.
const DISABLE_AUTOGAIN_COMMANDS: [&str; 2] = ["ENH:ENABLE OFF", "AGC:ENABLE OFF"];

/// Serial-side state of a connected camera: the transport, the reply line
/// assembler, and the register cache the replies feed.
pub struct CameraControl<T: SerialTransport> {
    transport: T,
    assembler: SerialLineAssembler,
    registers: RegisterMap,
}

impl<T: SerialTransport> CameraControl<T> {
    pub fn new(transport: T, registers: RegisterMap) -> Self {
        Self {
            transport,
            assembler: SerialLineAssembler::new(),
            registers,
        }
    }

    /// Camera control with the SUI register set.
    pub fn sui_camera(transport: T) -> Result<Self> {
        Ok(Self::new(transport, RegisterMap::sui_camera()?))
    }

    pub fn registers(&self) -> &RegisterMap {
        &self.registers
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Bring a freshly connected camera into a known state and request the
    /// current value of every tracked register.
    pub fn on_connected(&mut self) -> Result<()> {
        self.registers.clear();
        self.assembler.clear();
        self.disable_autogain()?;
        self.readout_registers()?;
        info!(registers = self.registers.len(), "Camera configured");
        Ok(())
    }

    pub fn disable_autogain(&mut self) -> Result<()> {
        for command in DISABLE_AUTOGAIN_COMMANDS {
            self.send(command)?;
        }
        Ok(())
    }

    /// Query every tracked register. Replies arrive through [`poll`](Self::poll).
    pub fn readout_registers(&mut self) -> Result<()> {
        let names: Vec<String> = self.registers.names().map(str::to_string).collect();
        for name in names {
            self.send(&format!("{name}?"))?;
        }
        Ok(())
    }

    /// Write a display value to a register, converted through its calibration.
    pub fn set_register(&mut self, name: &str, display_value: f64) -> Result<()> {
        let raw = self.registers.to_device(name, display_value)?;
        self.set_register_raw(name, raw.round() as i64)
    }

    pub fn set_register_raw(&mut self, name: &str, raw_value: i64) -> Result<()> {
        self.send(&format!("{name} {raw_value}"))
    }

    /// Send a free-form command line.
    pub fn send(&mut self, command: &str) -> Result<()> {
        debug!(command, "Serial write");
        self.transport
            .write(&format!("{command}{SERIAL_TERMINATOR}"))
    }

    /// Read whatever the device has sent and apply complete reply lines to
    /// the register cache. Returns true if any register was updated.
    pub fn poll(&mut self) -> Result<bool> {
        let chunk = self.transport.read(SERIAL_READ_CHUNK, SERIAL_READ_TIMEOUT)?;
        if chunk.is_empty() {
            return Ok(false);
        }
        Ok(self.ingest(&chunk))
    }

    /// Apply raw inbound text (already read from the transport).
    pub fn ingest(&mut self, chunk: &str) -> bool {
        let mut updated = false;
        for line in self.assembler.feed(chunk) {
            debug!(line = %line.escape_default(), "Serial reply");
            updated |= self.registers.update(&line);
        }
        updated
    }

    /// Exposure as `(counts, seconds)`.
    pub fn exposure(&self) -> Result<(f64, f64)> {
        let counts = self.registers.to_display("EXP")?;
        Ok((counts, counts_to_seconds(counts)))
    }

    /// Frame period as `(counts, seconds)`.
    pub fn frame_period(&self) -> Result<(f64, f64)> {
        let counts = self.registers.to_display("FRAME:PERIOD")?;
        Ok((counts, counts_to_seconds(counts)))
    }

    /// Set the exposure from adjusted counts.
    pub fn set_exposure(&mut self, counts: f64) -> Result<()> {
        self.set_register("EXP", counts)
    }

    /// Frames per second implied by the frame period.
    pub fn frame_rate(&self) -> Result<f64> {
        let (_, seconds) = self.frame_period()?;
        if seconds <= 0.0 {
            return Err(BeamviewError::Device(format!(
                "non-positive frame period {seconds} s"
            )));
        }
        Ok(1.0 / seconds)
    }
}

/// Convert adjusted exposure counts to seconds.
pub fn counts_to_seconds(counts: f64) -> f64 {
    counts / PIXCLK_MAX
}
