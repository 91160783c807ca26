use fixed::types::{I16F16, I32F32};
use serde::{Deserialize, Serialize};

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Q16.16 fixed-point for compact storage.
pub type Fixed32 = I16F16;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display/FFI, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

// ---------------------------------------------------------------------------
// Vec3
// ---------------------------------------------------------------------------

/// A deterministic 3-vector. Carries contact points and normals through the
/// collision phase and position data through reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: Fixed64,
    pub y: Fixed64,
    pub z: Fixed64,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: Fixed64::ZERO,
        y: Fixed64::ZERO,
        z: Fixed64::ZERO,
    };

    pub fn new(x: Fixed64, y: Fixed64, z: Fixed64) -> Self {
        Self { x, y, z }
    }

    /// Construct from f64 components. Use only for initialization.
    pub fn from_f64(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Fixed64::from_num(x),
            y: Fixed64::from_num(y),
            z: Fixed64::from_num(z),
        }
    }

    /// Component-wise saturating scale.
    pub fn scale(self, s: Fixed64) -> Self {
        Self {
            x: self.x.saturating_mul(s),
            y: self.y.saturating_mul(s),
            z: self.z.saturating_mul(s),
        }
    }

    /// Dot product (saturating).
    pub fn dot(self, rhs: Self) -> Fixed64 {
        self.x
            .saturating_mul(rhs.x)
            .saturating_add(self.y.saturating_mul(rhs.y))
            .saturating_add(self.z.saturating_mul(rhs.z))
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
            z: self.z.saturating_add(rhs.z),
        }
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
            z: self.z.saturating_sub(rhs.z),
        }
    }
}
