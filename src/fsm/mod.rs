//! Snub state model and wire codec.
//!
//! Every controller state maps to exactly one single-byte command on the
//! serial link.  Water cooling is an orthogonal modifier on top of the dry
//! accelerate → brake → cool-down cycle:
//!
//! ```text
//!           next            next            next
//!  Accelerate ───▶ Brake ───▶ CoolDown ───▶ Accelerate
//!      │  ▲          │  ▲        │  ▲
//!  on  ▼  │ off  on  ▼  │ off on ▼  │ off          (water_on / water_off)
//!  AccelerateWater ─▶ BrakeWater ─▶ CoolDownWater ─▶ AccelerateWater
//! ```
//!
//! `AccelerateBrake` and `AccelerateBrakeWater` exist on the wire but no
//! table produces or consumes them.

pub mod register;

use core::fmt;

/// Byte that asks the device for one telemetry line.
pub const TELEMETRY_REQUEST: u8 = b'"';

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Controller states.  The discriminant is the wire command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    CoolDown = b'$',
    Accelerate = b'%',
    Brake = b'&',
    AccelerateBrake = b'\'',
    CoolDownWater = b'(',
    AccelerateWater = b')',
    BrakeWater = b'*',
    AccelerateBrakeWater = b'+',
}

impl State {
    /// Every state, in wire-byte order.
    pub const ALL: [State; 8] = [
        Self::CoolDown,
        Self::Accelerate,
        Self::Brake,
        Self::AccelerateBrake,
        Self::CoolDownWater,
        Self::AccelerateWater,
        Self::BrakeWater,
        Self::AccelerateBrakeWater,
    ];

    /// Single-byte command that puts the device into this state.
    pub const fn wire_command(self) -> u8 {
        match self {
            Self::CoolDown => b'$',
            Self::Accelerate => b'%',
            Self::Brake => b'&',
            Self::AccelerateBrake => b'\'',
            Self::CoolDownWater => b'(',
            Self::AccelerateWater => b')',
            Self::BrakeWater => b'*',
            Self::AccelerateBrakeWater => b'+',
        }
    }

    /// Decode a command byte.  Returns `None` for bytes outside `$`..=`+`.
    pub const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            b'$' => Some(Self::CoolDown),
            b'%' => Some(Self::Accelerate),
            b'&' => Some(Self::Brake),
            b'\'' => Some(Self::AccelerateBrake),
            b'(' => Some(Self::CoolDownWater),
            b')' => Some(Self::AccelerateWater),
            b'*' => Some(Self::BrakeWater),
            b'+' => Some(Self::AccelerateBrakeWater),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::CoolDown => "CoolDown",
            Self::Accelerate => "Accelerate",
            Self::Brake => "Brake",
            Self::AccelerateBrake => "AccelerateBrake",
            Self::CoolDownWater => "CoolDownWater",
            Self::AccelerateWater => "AccelerateWater",
            Self::BrakeWater => "BrakeWater",
            Self::AccelerateBrakeWater => "AccelerateBrakeWater",
        }
    }

    /// True for the water-augmented variants.
    pub const fn is_water(self) -> bool {
        matches!(
            self,
            Self::CoolDownWater
                | Self::AccelerateWater
                | Self::BrakeWater
                | Self::AccelerateBrakeWater
        )
    }

    /// True for Accelerate / AccelerateWater.
    pub const fn is_accelerating(self) -> bool {
        matches!(self, Self::Accelerate | Self::AccelerateWater)
    }

    /// True for Brake / BrakeWater.
    pub const fn is_braking(self) -> bool {
        matches!(self, Self::Brake | Self::BrakeWater)
    }

    /// True for the three dry cycle states that may start a water cycle.
    pub const fn is_dry_cycle(self) -> bool {
        matches!(self, Self::Accelerate | Self::Brake | Self::CoolDown)
    }

    /// Next step of the snub cycle, keeping the water modifier.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Accelerate => Some(Self::Brake),
            Self::Brake => Some(Self::CoolDown),
            Self::CoolDown => Some(Self::Accelerate),
            Self::AccelerateWater => Some(Self::BrakeWater),
            Self::BrakeWater => Some(Self::CoolDownWater),
            Self::CoolDownWater => Some(Self::AccelerateWater),
            Self::AccelerateBrake | Self::AccelerateBrakeWater => None,
        }
    }

    /// Water-suffixed counterpart.  Water states map to themselves.
    pub const fn water_on(self) -> Option<Self> {
        match self {
            Self::Accelerate | Self::AccelerateWater => Some(Self::AccelerateWater),
            Self::Brake | Self::BrakeWater => Some(Self::BrakeWater),
            Self::CoolDown | Self::CoolDownWater => Some(Self::CoolDownWater),
            Self::AccelerateBrake | Self::AccelerateBrakeWater => None,
        }
    }

    /// Dry counterpart.  Dry states map to themselves.
    pub const fn water_off(self) -> Option<Self> {
        match self {
            Self::Accelerate | Self::AccelerateWater => Some(Self::Accelerate),
            Self::Brake | Self::BrakeWater => Some(Self::Brake),
            Self::CoolDown | Self::CoolDownWater => Some(Self::CoolDown),
            Self::AccelerateBrake | Self::AccelerateBrakeWater => None,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Transition tables
// ---------------------------------------------------------------------------

/// The three transition tables, as a value the register can dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Next,
    WaterOn,
    WaterOff,
}

impl Table {
    /// Look `state` up in this table.
    pub const fn apply(self, state: State) -> Option<State> {
        match self {
            Self::Next => state.next(),
            Self::WaterOn => state.water_on(),
            Self::WaterOff => state.water_off(),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::WaterOn => "water-on",
            Self::WaterOff => "water-off",
        }
    }
}
