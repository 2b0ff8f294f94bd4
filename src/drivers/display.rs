// SenseHub - SSD1306 OLED Display Driver
//
// 128x32 panel on the shared I2C bus. Drawing happens in an in-memory frame
// buffer through embedded-graphics; only `flush()` touches the bus, and it
// takes the arbiter itself so callers render outside their sensor section.

use std::convert::Infallible;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use embedded_graphics::mono_font::ascii::FONT_8X13_BOLD;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

use crate::config::*;
use crate::drivers::bus::{BusArbiter, BusTransport, DeviceDescriptor, DISPLAY};
use crate::error::SensorError;

/// Control byte: the rest of the transfer is a command stream.
const CONTROL_COMMAND: u8 = 0x00;
/// Control byte: the rest of the transfer is display RAM data.
const CONTROL_DATA: u8 = 0x40;

const PAGE_COUNT: u8 = (SCREEN_HEIGHT / 8) as u8;
const LINE_BASELINES: [i32; 2] = [15, 30];

const CMD_DISPLAY_ON: u8 = 0xAF;

/// Power-on sequence for a 128x32 module with the internal charge pump.
const INIT_SEQUENCE: &[u8] = &[
    0xAE,       // display off
    0xD5, 0x80, // clock divide / oscillator
    0xA8, 0x1F, // multiplex ratio: 32 rows
    0xD3, 0x00, // display offset
    0x40,       // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1,       // segment remap
    0xC8,       // COM scan descending
    0xDA, 0x02, // COM pins for 128x32
    0x81, 0x8F, // contrast
    0xD9, 0xF1, // pre-charge
    0xDB, 0x40, // VCOMH deselect
    0xA4,       // follow RAM
    0xA6,       // normal (not inverted)
];

/// Consumer of the two values shown on screen. Fire-and-forget.
pub trait DisplaySink {
    fn render_two_values(&mut self, label_a: &str, value_a: f32, label_b: &str, value_b: f32);
}

// ---------------------------------------------------------------------------
// Frame buffer
// ---------------------------------------------------------------------------

/// 1 bit per pixel in SSD1306 page order: byte `x + page * width`, bit `y % 8`.
pub struct Framebuffer {
    buffer: [u8; DISPLAY_BUFFER_SIZE],
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    pub const fn new() -> Self {
        Self {
            buffer: [0; DISPLAY_BUFFER_SIZE],
        }
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    fn index(x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return None;
        }
        Some(((x + (y / 8) * SCREEN_WIDTH) as usize, 1 << (y % 8)))
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if let Some((i, mask)) = Self::index(x, y) {
            if on {
                self.buffer[i] |= mask;
            } else {
                self.buffer[i] &= !mask;
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        Self::index(x, y).is_some_and(|(i, mask)| self.buffer[i] & mask != 0)
    }

    /// One slice per 8-row page, in transfer order.
    pub fn pages(&self) -> impl Iterator<Item = &[u8]> {
        self.buffer.chunks(SCREEN_WIDTH as usize)
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------
pub struct OledDisplay<T> {
    bus: Arc<BusArbiter<T>>,
    device: DeviceDescriptor,
    frame: Framebuffer,
    timeout: Duration,
}

impl<T: BusTransport> OledDisplay<T> {
    pub fn new(bus: Arc<BusArbiter<T>>) -> Self {
        Self {
            bus,
            device: DISPLAY,
            frame: Framebuffer::new(),
            timeout: I2C_DISPLAY_TIMEOUT,
        }
    }

    pub fn frame(&self) -> &Framebuffer {
        &self.frame
    }

    fn command(&self, bus: &mut T, commands: &[u8]) -> Result<(), SensorError> {
        let mut packet = Vec::with_capacity(commands.len() + 1);
        packet.push(CONTROL_COMMAND);
        packet.extend_from_slice(commands);
        bus.write(self.device.address, &packet, self.timeout)
            .map_err(|e| SensorError::transport(self.device.name, "command", e))
    }

    /// Send the power-on sequence, wake the panel and show a splash line.
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.bus
            .transaction(|bus| self.command(bus, INIT_SEQUENCE))?;
        thread::sleep(DISPLAY_POWER_UP_DELAY);
        self.bus
            .transaction(|bus| self.command(bus, &[CMD_DISPLAY_ON]))?;

        self.show_lines(&["Hello World!"])?;
        log::info!("SSD1306 initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    /// Clear the frame, draw up to two text lines and push it to the panel.
    pub fn show_lines(&mut self, lines: &[&str]) -> Result<(), SensorError> {
        self.frame.clear();
        let style = MonoTextStyle::new(&FONT_8X13_BOLD, BinaryColor::On);
        for (line, baseline) in lines.iter().zip(LINE_BASELINES) {
            // Drawing into the frame buffer is infallible.
            let _ = Text::new(line, Point::new(0, baseline), style).draw(&mut self.frame);
        }
        self.flush()
    }

    /// Transfer the whole frame buffer, one page per write.
    pub fn flush(&mut self) -> Result<(), SensorError> {
        let mut bus = self.bus.acquire()?;
        self.command(
            &mut bus,
            &[0x21, 0, (SCREEN_WIDTH - 1) as u8, 0x22, 0, PAGE_COUNT - 1],
        )?;

        let mut packet = [0u8; SCREEN_WIDTH as usize + 1];
        packet[0] = CONTROL_DATA;
        for page in self.frame.pages() {
            packet[1..].copy_from_slice(page);
            bus.write(self.device.address, &packet, self.timeout)
                .map_err(|e| SensorError::transport(self.device.name, "frame data", e))?;
        }
        Ok(())
    }
}

impl<T: BusTransport> DisplaySink for OledDisplay<T> {
    fn render_two_values(&mut self, label_a: &str, value_a: f32, label_b: &str, value_b: f32) {
        let first = format!("{} {:.1}", label_a, value_a);
        let second = format!("{} {:.1}", label_b, value_b);
        if let Err(e) = self.show_lines(&[&first, &second]) {
            log::error!("Display update failed: {}", e);
        }
    }
}
