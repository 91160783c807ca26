//! Simulation time: tick ordinals and saturating durations.
//!
//! A [`Ticks`] value is the quantum of simulation time, a signed 32-bit
//! ordinal advanced by the pipeline. A [`TickDuration`] is a non-negative
//! span of ticks with a distinguished [`TickDuration::INFINITE`] used for
//! open-ended actions (channeled abilities, looping idles). All arithmetic
//! is saturating so timers never wrap mid-simulation.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Ticks are the atomic unit of simulation time.
pub type Ticks = i32;

// ---------------------------------------------------------------------------
// TickDuration
// ---------------------------------------------------------------------------

/// A non-negative span of simulation time.
///
/// `INFINITE` is represented as `i32::MAX` and absorbs addition and
/// multiplication: adding anything to an infinite duration stays infinite,
/// and any overflow saturates to infinite. Subtraction clamps at zero;
/// subtracting a finite duration from an infinite one stays infinite.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TickDuration(i32);

impl TickDuration {
    /// The zero-length duration.
    pub const ZERO: Self = Self(0);

    /// The distinguished open-ended duration. Compares greater than every
    /// finite duration.
    pub const INFINITE: Self = Self(i32::MAX);

    /// Create a duration from a tick count. Negative counts clamp to zero.
    pub fn from_ticks(ticks: i32) -> Self {
        Self(ticks.max(0))
    }

    /// The tick count. `INFINITE` reports `i32::MAX`.
    pub fn ticks(self) -> i32 {
        self.0
    }

    /// Whether this is the distinguished infinite duration.
    pub fn is_infinite(self) -> bool {
        self.0 == i32::MAX
    }

    /// Whether this duration is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition. Infinite if either operand is infinite or the
    /// sum overflows.
    pub fn saturating_add(self, rhs: Self) -> Self {
        if self.is_infinite() || rhs.is_infinite() {
            return Self::INFINITE;
        }
        Self(self.0.saturating_add(rhs.0).min(i32::MAX))
    }

    /// Clamping subtraction. Never goes below zero; an infinite duration
    /// minus a finite one stays infinite.
    pub fn saturating_sub(self, rhs: Self) -> Self {
        if self.is_infinite() {
            return if rhs.is_infinite() {
                Self::ZERO
            } else {
                Self::INFINITE
            };
        }
        Self(self.0.saturating_sub(rhs.0).max(0))
    }

    /// Scalar multiplication. Non-positive scalars yield zero; positive
    /// scalars saturate to infinite on overflow.
    pub fn saturating_mul(self, scalar: i32) -> Self {
        if scalar <= 0 {
            return Self::ZERO;
        }
        if self.is_infinite() {
            return Self::INFINITE;
        }
        match self.0.checked_mul(scalar) {
            Some(v) => Self(v),
            None => Self::INFINITE,
        }
    }
}

impl Add for TickDuration {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl AddAssign for TickDuration {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Sub for TickDuration {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl SubAssign for TickDuration {
    fn sub_assign(&mut self, rhs: Self) {
        *self = self.saturating_sub(rhs);
    }
}

impl Mul<i32> for TickDuration {
    type Output = Self;
    fn mul(self, scalar: i32) -> Self {
        self.saturating_mul(scalar)
    }
}

impl std::fmt::Display for TickDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{}t", self.0)
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_ticks_clamps_negative() {
        assert_eq!(TickDuration::from_ticks(-5), TickDuration::ZERO);
        assert_eq!(TickDuration::from_ticks(0), TickDuration::ZERO);
        assert_eq!(TickDuration::from_ticks(7).ticks(), 7);
    }

    #[test]
    fn add_saturates_to_infinite_on_overflow() {
        let big = TickDuration::from_ticks(i32::MAX - 1);
        let sum = big + TickDuration::from_ticks(10);
        assert!(sum.is_infinite());
    }

    #[test]
    fn add_absorbs_infinite() {
        let inf = TickDuration::INFINITE;
        let one = TickDuration::from_ticks(1);
        assert!((inf + one).is_infinite());
        assert!((one + inf).is_infinite());
        assert!((inf + inf).is_infinite());
    }

    #[test]
    fn sub_clamps_at_zero() {
        let a = TickDuration::from_ticks(3);
        let b = TickDuration::from_ticks(10);
        assert_eq!(a - b, TickDuration::ZERO);
        assert_eq!(b - a, TickDuration::from_ticks(7));
    }

    #[test]
    fn infinite_minus_finite_stays_infinite() {
        let inf = TickDuration::INFINITE;
        assert!((inf - TickDuration::from_ticks(100)).is_infinite());
        assert_eq!(inf - inf, TickDuration::ZERO);
    }

    #[test]
    fn mul_by_non_positive_is_zero() {
        let d = TickDuration::from_ticks(100);
        assert_eq!(d * 0, TickDuration::ZERO);
        assert_eq!(d * -3, TickDuration::ZERO);
        assert_eq!(TickDuration::INFINITE * -1, TickDuration::ZERO);
    }

    #[test]
    fn mul_saturates() {
        let d = TickDuration::from_ticks(i32::MAX / 2);
        assert!((d * 3).is_infinite());
        assert_eq!(TickDuration::from_ticks(4) * 3, TickDuration::from_ticks(12));
        assert!((TickDuration::INFINITE * 2).is_infinite());
    }

    #[test]
    fn infinite_compares_greater_than_all_finite() {
        let inf = TickDuration::INFINITE;
        assert!(inf > TickDuration::from_ticks(i32::MAX - 1));
        assert!(inf > TickDuration::ZERO);
        assert_eq!(inf, TickDuration::INFINITE);
    }

    #[test]
    fn ordering_is_by_value() {
        assert!(TickDuration::from_ticks(1) < TickDuration::from_ticks(2));
        assert_eq!(TickDuration::from_ticks(5), TickDuration::from_ticks(5));
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", TickDuration::from_ticks(12)), "12t");
        assert_eq!(format!("{}", TickDuration::INFINITE), "inf");
    }
}
