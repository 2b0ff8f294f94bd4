// SenseHub - LIS3DH Accelerometer Driver
//
// Register-level driver over the shared I2C bus. Callers hold the bus arbiter
// for the whole of `sample()` so the configuration, axis and click-status reads
// of one cycle are never split by another task.

use std::time::Duration;

use bitflags::bitflags;

use crate::config::*;
use crate::drivers::bus::{BusTransport, DeviceDescriptor};
use crate::error::{BusError, SensorError};
use crate::events::{AccelReading, AccelSample, ClickEvent};

/// Setting the MSB of the sub-address makes the device walk consecutive registers.
const AUTO_INCREMENT: u8 = 0x80;

/// Divisor for the left-justified 16-bit output in normal (10-bit) mode.
pub const NORMAL_RES_DIVISOR: f32 = 32_000.0;
/// High-resolution (12-bit) mode scales four times finer than normal mode.
pub const HIGH_RES_DIVISOR: f32 = NORMAL_RES_DIVISOR * 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    CtrlReg1 = 0x20,
    CtrlReg2 = 0x21,
    CtrlReg4 = 0x23,
    OutXL = 0x28,
    ClickCfg = 0x38,
    ClickSrc = 0x39,
    ClickThs = 0x3A,
    TimeLimit = 0x3B,
    TimeLatency = 0x3C,
    TimeWindow = 0x3D,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::CtrlReg1    => "CTRL_REG1",
            Self::CtrlReg2    => "CTRL_REG2",
            Self::CtrlReg4    => "CTRL_REG4",
            Self::OutXL       => "OUT_X_L",
            Self::ClickCfg    => "CLICK_CFG",
            Self::ClickSrc    => "CLICK_SRC",
            Self::ClickThs    => "CLICK_THS",
            Self::TimeLimit   => "TIME_LIMIT",
            Self::TimeLatency => "TIME_LATENCY",
            Self::TimeWindow  => "TIME_WINDOW",
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CtrlReg1: u8 {
        const X_ENABLE = 1 << 0;
        const Y_ENABLE = 1 << 1;
        const Z_ENABLE = 1 << 2;
        const LOW_POWER = 1 << 3;
        const ODR0 = 1 << 4;
        const ODR1 = 1 << 5;
        const ODR2 = 1 << 6;
        const ODR3 = 1 << 7;
        const ODR_100HZ = Self::ODR2.bits() | Self::ODR0.bits();
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CtrlReg2: u8 {
        /// High-pass filter on the click detection path.
        const HP_CLICK = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClickCfg: u8 {
        const X_SINGLE = 1 << 0;
        const X_DOUBLE = 1 << 1;
        const Y_SINGLE = 1 << 2;
        const Y_DOUBLE = 1 << 3;
        const Z_SINGLE = 1 << 4;
        const Z_DOUBLE = 1 << 5;
    }
}

bitflags! {
    /// CLICK_SRC contents. Latched when `LIR_CLICK` is set, cleared by reading.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClickSrc: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
        const SIGN = 1 << 3;
        const SINGLE_CLICK = 1 << 4;
        const DOUBLE_CLICK = 1 << 5;
        const INTERRUPT_ACTIVE = 1 << 6;
    }
}

/// CLICK_THS bit 7: keep CLICK_SRC latched until it is read.
pub const CLICK_THS_LIR_CLICK: u8 = 1 << 7;

impl From<ClickSrc> for ClickEvent {
    /// Double-click wins when both flags are latched in the same cycle.
    fn from(src: ClickSrc) -> Self {
        if src.contains(ClickSrc::DOUBLE_CLICK) {
            ClickEvent::Double
        } else if src.contains(ClickSrc::SINGLE_CLICK) {
            ClickEvent::Single
        } else {
            ClickEvent::None
        }
    }
}

// ---------------------------------------------------------------------------
// Calibration (CTRL_REG4)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullScale {
    G2,
    G4,
    G8,
    G16,
}

impl FullScale {
    /// Decode the FS1:FS0 field. Only the two low bits are looked at, so every
    /// input maps to a real range.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::G2,
            1 => Self::G4,
            2 => Self::G8,
            _ => Self::G16,
        }
    }

    pub const fn g(self) -> f32 {
        match self {
            Self::G2  => 2.0,
            Self::G4  => 4.0,
            Self::G8  => 8.0,
            Self::G16 => 16.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 10-bit output.
    Normal,
    /// 12-bit output (HR bit set).
    High,
}

impl Resolution {
    pub const fn bits(self) -> u8 {
        match self {
            Self::Normal => 10,
            Self::High   => 12,
        }
    }

    pub const fn divisor(self) -> f32 {
        match self {
            Self::Normal => NORMAL_RES_DIVISOR,
            Self::High   => HIGH_RES_DIVISOR,
        }
    }
}

/// Scaling in effect for one sample, read from CTRL_REG4 every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub full_scale: FullScale,
    pub resolution: Resolution,
}

impl Calibration {
    const FS_SHIFT: u8 = 4;
    const HR: u8 = 1 << 3;

    pub const fn from_ctrl4(ctrl4: u8) -> Self {
        Self {
            full_scale: FullScale::from_bits(ctrl4 >> Self::FS_SHIFT),
            resolution: if ctrl4 & Self::HR != 0 {
                Resolution::High
            } else {
                Resolution::Normal
            },
        }
    }

    /// Convert one raw axis count to g.
    pub fn convert(&self, raw: i16) -> f32 {
        raw as f32 * self.full_scale.g() / self.resolution.divisor()
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------
pub struct Lis3dh {
    device: DeviceDescriptor,
    timeout: Duration,
}

impl Lis3dh {
    pub fn new(device: DeviceDescriptor) -> Self {
        Self {
            device,
            timeout: I2C_TRANSACTION_TIMEOUT,
        }
    }

    fn read_registers<T: BusTransport>(
        &self,
        bus: &mut T,
        start: Register,
        buffer: &mut [u8],
    ) -> Result<(), BusError> {
        bus.write_read(
            self.device.address,
            &[start.addr() | AUTO_INCREMENT],
            buffer,
            self.timeout,
        )
    }

    fn write_register<T: BusTransport>(
        &self,
        bus: &mut T,
        register: Register,
        value: u8,
    ) -> Result<(), SensorError> {
        bus.write(self.device.address, &[register.addr(), value], self.timeout)
            .map_err(|e| SensorError::transport(self.device.name, register.name(), e))
    }

    /// Power on at 100 Hz with all axes and arm Z-axis double-click detection.
    pub fn init<T: BusTransport>(&self, bus: &mut T) -> Result<(), SensorError> {
        let ctrl1 = CtrlReg1::ODR_100HZ | CtrlReg1::X_ENABLE | CtrlReg1::Y_ENABLE | CtrlReg1::Z_ENABLE;
        self.write_register(bus, Register::CtrlReg1, ctrl1.bits())?;
        self.write_register(bus, Register::CtrlReg2, CtrlReg2::HP_CLICK.bits())?;
        self.write_register(bus, Register::ClickCfg, ClickCfg::Z_DOUBLE.bits())?;
        self.write_register(bus, Register::ClickThs, CLICK_THRESHOLD | CLICK_THS_LIR_CLICK)?;
        self.write_register(bus, Register::TimeLimit, CLICK_TIME_LIMIT)?;
        self.write_register(bus, Register::TimeLatency, CLICK_TIME_LATENCY)?;
        self.write_register(bus, Register::TimeWindow, CLICK_TIME_WINDOW)?;

        log::info!("LIS3DH initialised (100Hz, XYZ, Z double-click)");
        Ok(())
    }

    pub fn read_calibration<T: BusTransport>(&self, bus: &mut T) -> Result<Calibration, SensorError> {
        let mut ctrl4 = [0u8; 1];
        self.read_registers(bus, Register::CtrlReg4, &mut ctrl4)
            .map_err(|source| SensorError::ConfigurationRead {
                device: self.device.name,
                source,
            })?;
        Ok(Calibration::from_ctrl4(ctrl4[0]))
    }

    /// Burst-read all three axes in one auto-increment transaction.
    pub fn read_axes<T: BusTransport>(
        &self,
        bus: &mut T,
        calibration: Calibration,
    ) -> Result<AccelReading, SensorError> {
        let mut raw = [0u8; 6];
        self.read_registers(bus, Register::OutXL, &mut raw)
            .map_err(|e| SensorError::transport(self.device.name, Register::OutXL.name(), e))?;

        Ok(AccelReading {
            x_g: calibration.convert(i16::from_le_bytes([raw[0], raw[1]])),
            y_g: calibration.convert(i16::from_le_bytes([raw[2], raw[3]])),
            z_g: calibration.convert(i16::from_le_bytes([raw[4], raw[5]])),
        })
    }

    /// Read (and thereby clear) the latched click status.
    pub fn read_click<T: BusTransport>(&self, bus: &mut T) -> Result<ClickEvent, SensorError> {
        let mut src = [0u8; 1];
        self.read_registers(bus, Register::ClickSrc, &mut src)
            .map_err(|e| SensorError::transport(self.device.name, Register::ClickSrc.name(), e))?;
        Ok(ClickSrc::from_bits_truncate(src[0]).into())
    }

    /// One full cycle: calibration, axes, then the click status exactly once.
    pub fn sample<T: BusTransport>(&self, bus: &mut T) -> Result<AccelSample, SensorError> {
        let calibration = self.read_calibration(bus)?;
        log::trace!(
            "range ±{}g, {}-bit",
            calibration.full_scale.g(),
            calibration.resolution.bits()
        );
        let reading = self.read_axes(bus, calibration)?;
        let click = self.read_click(bus)?;
        Ok(AccelSample { reading, click })
    }
}
