// SenseHub - Readings & Events

// ---------------------------------------------------------------------------
// Accelerometer (3-axis, in g)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccelReading {
    pub x_g: f32,
    pub y_g: f32,
    pub z_g: f32,
}

// ---------------------------------------------------------------------------
// Temperature / humidity sensor
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

// ---------------------------------------------------------------------------
// Tap detection, decoded from the accelerometer click status register
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClickEvent {
    #[default]
    None,
    Single,
    Double,
}

impl ClickEvent {
    pub fn is_click(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None   => "none",
            Self::Single => "SINGLE click",
            Self::Double => "DOUBLE click",
        }
    }
}

/// One complete accelerometer cycle: the converted axes and the tap latched
/// since the previous cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccelSample {
    pub reading: AccelReading,
    pub click: ClickEvent,
}
