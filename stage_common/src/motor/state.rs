//! State enums for the stage motor controller.
//!
//! All enums use `#[repr(u8)]` so their codes can be written straight into
//! protocol status registers.

use core::fmt;

use serde::{Deserialize, Serialize};

// ─── Execution Mode ─────────────────────────────────────────────────

/// High-level operating workflow that owns the motors for a tick.
///
/// Exactly one is active at any time. Codes are the protocol Mode-register byte 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ExecMode {
    /// Safe park state; long-press gateway into Calibration.
    #[default]
    Disable = 0,
    /// Manual jogging for trimmer adjustment.
    Calibration = 1,
    /// Host-commanded closed-loop positioning.
    Command = 2,
    /// Automatic test cycle.
    Service = 3,
}

impl ExecMode {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disable),
            1 => Some(Self::Calibration),
            2 => Some(Self::Command),
            3 => Some(Self::Service),
            _ => None,
        }
    }

    /// Protocol code of this mode.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disable => "Disable",
            Self::Calibration => "Calibration",
            Self::Command => "Command",
            Self::Service => "Service",
        };
        f.write_str(name)
    }
}

// ─── Axes ───────────────────────────────────────────────────────────

/// One of the three stage axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// All axes in sampling order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Array index of this axis.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Motion direction along an axis.
///
/// `Plus` means increasing sensor value. X plus is "out" (`XLeft`),
/// Y plus is "field" (`YField`), Z plus is "down" (`ZDown`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Minus = 0,
    Plus = 1,
}

impl Direction {
    /// Direction that reduces a signed distance-to-target.
    ///
    /// Returns `None` for zero distance.
    #[inline]
    pub const fn toward(distance: i32) -> Option<Self> {
        if distance > 0 {
            Some(Self::Plus)
        } else if distance < 0 {
            Some(Self::Minus)
        } else {
            None
        }
    }
}

// ─── Activation Mode ────────────────────────────────────────────────

/// Discrete driver-output configuration. Exactly one is active at a time.
///
/// `*Short` modes brake the axis by grounding both motor terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ActivationMode {
    #[default]
    Disabled = 0,
    XLeft = 1,
    XRight = 2,
    XShort = 3,
    YHome = 4,
    YField = 5,
    YShort = 6,
    ZUp = 7,
    ZDown = 8,
    ZShort = 9,
}

impl ActivationMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::XLeft),
            2 => Some(Self::XRight),
            3 => Some(Self::XShort),
            4 => Some(Self::YHome),
            5 => Some(Self::YField),
            6 => Some(Self::YShort),
            7 => Some(Self::ZUp),
            8 => Some(Self::ZDown),
            9 => Some(Self::ZShort),
            _ => None,
        }
    }

    /// Mode that drives `axis` in `direction`.
    #[inline]
    pub const fn drive(axis: Axis, direction: Direction) -> Self {
        match (axis, direction) {
            (Axis::X, Direction::Plus) => Self::XLeft,
            (Axis::X, Direction::Minus) => Self::XRight,
            (Axis::Y, Direction::Plus) => Self::YField,
            (Axis::Y, Direction::Minus) => Self::YHome,
            (Axis::Z, Direction::Plus) => Self::ZDown,
            (Axis::Z, Direction::Minus) => Self::ZUp,
        }
    }

    /// Brake mode of `axis`.
    #[inline]
    pub const fn short(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::XShort,
            Axis::Y => Self::YShort,
            Axis::Z => Self::ZShort,
        }
    }

    /// Axis selected by this mode (`None` when disabled).
    #[inline]
    pub const fn axis(self) -> Option<Axis> {
        match self {
            Self::Disabled => None,
            Self::XLeft | Self::XRight | Self::XShort => Some(Axis::X),
            Self::YHome | Self::YField | Self::YShort => Some(Axis::Y),
            Self::ZUp | Self::ZDown | Self::ZShort => Some(Axis::Z),
        }
    }

    /// Driving direction (`None` for disabled and brake modes).
    #[inline]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::XLeft | Self::YField | Self::ZDown => Some(Direction::Plus),
            Self::XRight | Self::YHome | Self::ZUp => Some(Direction::Minus),
            _ => None,
        }
    }

    /// True for the three brake modes.
    #[inline]
    pub const fn is_short(self) -> bool {
        matches!(self, Self::XShort | Self::YShort | Self::ZShort)
    }

    /// True when an axis is being driven (not disabled, not braking).
    #[inline]
    pub const fn is_moving(self) -> bool {
        self.direction().is_some()
    }
}

// ─── Keyboard ───────────────────────────────────────────────────────

/// One of the six jog buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Button {
    XPlus = 0,
    XMinus = 1,
    YPlus = 2,
    YMinus = 3,
    ZPlus = 4,
    ZMinus = 5,
}

impl Button {
    pub const ALL: [Button; 6] = [
        Button::XPlus,
        Button::XMinus,
        Button::YPlus,
        Button::YMinus,
        Button::ZPlus,
        Button::ZMinus,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Axis jogged by this button.
    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Self::XPlus | Self::XMinus => Axis::X,
            Self::YPlus | Self::YMinus => Axis::Y,
            Self::ZPlus | Self::ZMinus => Axis::Z,
        }
    }

    /// Direction jogged by this button.
    ///
    /// Z+ lifts the carriage (`ZUp`), which moves toward sensor zero.
    #[inline]
    pub const fn direction(self) -> Direction {
        match self {
            Self::XPlus | Self::YPlus | Self::ZMinus => Direction::Plus,
            Self::XMinus | Self::YMinus | Self::ZPlus => Direction::Minus,
        }
    }
}

// ─── Service ────────────────────────────────────────────────────────

/// Service workflow command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ServiceCommand {
    #[default]
    NoCommand = 0,
    CycleTest = 1,
}

// ─── Tests ──────────────────────────────────────────────────────────
