use {
    crate::{sentinel::Sample, stat::TickRate},
    std::fmt::{self, Display},
    tracing::debug,
};

/// converts the work done between two [`Sample`]s into a share of the cpus' capacity.
#[derive(Clone, Copy, Debug)]
pub struct Calculator {
    /// the number of logical cpus.
    cpus: i64,
    /// the number of microseconds in a clock tick.
    micros_per_tick: i64,
}

/// the cpu usage over the window between two samples.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Usage {
    /// the work done, as a percentage of capacity.
    ///
    /// this is truncated, and is not clamped: measurement skew can push it past 100.
    pub percentage: i64,
    /// the work done, quantized into ten blocks, `0..=9`. not clamped.
    pub level: i64,
}

// === impl Calculator ===

impl Calculator {
    pub fn new(cpus: usize, rate: TickRate) -> Self {
        Self {
            cpus: cpus.try_into().unwrap_or(i64::MAX),
            micros_per_tick: rate.micros_per_tick().try_into().unwrap_or(i64::MAX),
        }
    }

    /// computes the [`Usage`] between the `previous` and `current` samples.
    ///
    /// returns `None` if the window is too short to hold a single clock tick.
    pub fn compute(&self, previous: Sample, current: Sample) -> Option<Usage> {
        let Self {
            cpus,
            micros_per_tick,
        } = *self;

        let work = current.work - previous.work;
        let elapsed = current.timestamp - previous.timestamp;
        // the ticks that all of the cpus could have spent working in this window.
        let capacity = (elapsed / micros_per_tick) * cpus;

        if capacity == 0 {
            debug!(%work, %elapsed, "no time measured, skipping tick");
            return None;
        }

        let usage = Usage {
            percentage: (work * 100) / capacity,
            level: (work * 9) / capacity,
        };
        debug!(%work, %elapsed, %capacity, ?usage, "computed usage");

        Some(usage)
    }
}

// === impl Usage ===

impl Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { percentage, .. } = self;
        Display::fmt(percentage, f)
    }
}
