use std::{
    fmt::{self, Display},
    num::ParseIntError,
    ops::{Add, Sub},
    str::FromStr,
};

/// a count of kernel clock ticks.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct UserHz(u64);

/// the number of clock ticks the kernel counts in a second.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TickRate(u64);

// === impl UserHz ===

impl UserHz {
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> u64 {
        let Self(ticks) = self;
        ticks
    }
}

impl FromStr for UserHz {
    type Err = ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl Add for UserHz {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        let (Self(lhs), Self(rhs)) = (self, rhs);
        Self(lhs.wrapping_add(rhs))
    }
}

impl Sub for UserHz {
    type Output = i64;
    /// the difference between two counters, which may be negative.
    fn sub(self, rhs: Self) -> Self::Output {
        let (Self(lhs), Self(rhs)) = (self, rhs);
        lhs.wrapping_sub(rhs) as i64
    }
}

// === impl TickRate ===

impl TickRate {
    const MICROS_PER_SEC: u64 = 1_000_000;

    /// returns the tick rate, if a microsecond spans no more than one tick.
    pub fn new(hz: u64) -> Option<Self> {
        (1..=Self::MICROS_PER_SEC).contains(&hz).then_some(Self(hz))
    }

    /// queries the kernel's tick rate.
    ///
    /// this is the value reported by `getconf(1)` as `CLK_TCK`. it is usually 100Hz.
    pub fn from_sysconf() -> Option<Self> {
        // SAFETY: `sysconf` is thread-safe for this query and has no side effects.
        let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        u64::try_from(hz).ok().and_then(Self::new)
    }

    pub fn per_second(self) -> u64 {
        let Self(hz) = self;
        hz
    }

    /// the number of microseconds in a single tick, truncated. never zero.
    pub fn micros_per_tick(self) -> u64 {
        let Self(hz) = self;
        Self::MICROS_PER_SEC / hz
    }
}

impl Display for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(hz) = self;
        Display::fmt(hz, f)
    }
}
