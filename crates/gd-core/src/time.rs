//! Simulation time model.
//!
//! # Design
//!
//! Time is an absolute count of simulated **seconds** since day 0, 00:00.
//! Integer seconds keep all schedule arithmetic exact (no floating-point
//! drift); progress fractions are the only place time becomes `f64`.
//!
//! A tick is a fixed number of seconds held by `SimClock`.  Durations are
//! plain `i64` seconds; the `MINUTE`/`HOUR`/`DAY` constants keep call sites
//! readable (`SimTime::ZERO + 6 * HOUR`).

use std::fmt;

pub const MINUTE: i64 = 60;
pub const HOUR: i64 = 3_600;
pub const DAY: i64 = 86_400;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulated instant in seconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub i64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Build from day index, hour and minute.
    pub const fn from_dhm(day: u32, hour: u32, minute: u32) -> Self {
        SimTime(day as i64 * DAY + hour as i64 * HOUR + minute as i64 * MINUTE)
    }

    #[inline]
    pub fn secs(self) -> i64 {
        self.0
    }

    /// Zero-based day index.  Negative times clamp to day 0.
    #[inline]
    pub fn day(self) -> u32 {
        (self.0.max(0) / DAY) as u32
    }

    /// Seconds elapsed since the start of the current day.
    #[inline]
    pub fn secs_of_day(self) -> i64 {
        self.0.rem_euclid(DAY)
    }

    #[inline]
    pub fn start_of_day(self) -> SimTime {
        SimTime(self.0 - self.secs_of_day())
    }

    /// The first midnight strictly after `self`.
    #[inline]
    pub fn next_midnight(self) -> SimTime {
        SimTime(self.start_of_day().0 + DAY)
    }

    /// Seconds from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: SimTime) -> i64 {
        self.0 - earlier.0
    }

    #[inline]
    pub fn shift(self) -> Shift {
        Shift::of(self)
    }
}

impl std::ops::Add<i64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: i64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::AddAssign<i64> for SimTime {
    #[inline]
    fn add_assign(&mut self, rhs: i64) {
        self.0 += rhs;
    }
}

impl std::ops::Sub for SimTime {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: SimTime) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sod = self.secs_of_day();
        write!(
            f,
            "d{} {:02}:{:02}:{:02}",
            self.day(),
            sod / HOUR,
            (sod % HOUR) / MINUTE,
            sod % MINUTE
        )
    }
}

// ── Shift ─────────────────────────────────────────────────────────────────────

/// Eight-hour work shift.  T1 00–08, T2 08–16, T3 16–24.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shift {
    T1,
    T2,
    T3,
}

impl Shift {
    pub const LENGTH_SECS: i64 = 8 * HOUR;

    pub fn of(t: SimTime) -> Shift {
        match t.secs_of_day() / Self::LENGTH_SECS {
            0 => Shift::T1,
            1 => Shift::T2,
            _ => Shift::T3,
        }
    }

    /// Start of this shift on the day containing `t`.
    pub fn start_on_day_of(self, t: SimTime) -> SimTime {
        let offset = match self {
            Shift::T1 => 0,
            Shift::T2 => Self::LENGTH_SECS,
            Shift::T3 => 2 * Self::LENGTH_SECS,
        };
        t.start_of_day() + offset
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The orchestrator's clock: current instant plus the fixed tick length.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    pub now: SimTime,
    pub tick_secs: i64,
}

impl SimClock {
    pub fn new(start: SimTime, tick_secs: i64) -> Self {
        Self { now: start, tick_secs }
    }

    /// The instant the current tick ends at.
    #[inline]
    pub fn next_tick(&self) -> SimTime {
        self.now + self.tick_secs
    }

    /// Move to the end of the current tick and return the new instant.
    #[inline]
    pub fn advance(&mut self) -> SimTime {
        self.now = self.next_tick();
        self.now
    }

    /// How many ticks span `secs` seconds (rounds up).
    #[inline]
    pub fn ticks_for_secs(&self, secs: i64) -> u64 {
        (secs.max(0) as u64).div_ceil(self.tick_secs.max(1) as u64)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (tick {}s)", self.now, self.tick_secs)
    }
}
