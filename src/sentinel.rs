use {
    crate::{
        Error,
        source::{Clock, Micros, ProcStat, StatsSource, SystemClock},
        stat::UserHz,
    },
    tracing::trace,
};

/// observes kernel statistics.
///
/// each tick records the host's cumulative cpu work into a [`SampleBuffer`].
pub struct Sentinel<C = SystemClock, S = ProcStat> {
    /// the clock being used to measure time.
    clock: C,
    /// the underlying source of kernel statistics.
    source: S,
    /// the two most recent samples.
    samples: SampleBuffer,
}

/// the cumulative work the cpus had done at a moment in time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Sample {
    pub timestamp: Micros,
    pub work: UserHz,
}

/// a double buffer of [`Sample`]s.
///
/// each write lands in the slot that was not written last, so the other slot always holds the
/// sample before it.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    slots: [Option<Sample>; 2],
    /// the index of the slot written most recently.
    latest: usize,
}

// === impl Sentinel ===

impl<C, S> Sentinel<C, S>
where
    C: Clock,
    S: StatsSource,
{
    /// creates a new [`Sentinel`], with both sample slots empty.
    pub fn new(clock: C, source: S) -> Self {
        Self {
            clock,
            source,
            samples: SampleBuffer::default(),
        }
    }

    /// records a [`Sample`] of the cpus' work so far.
    pub fn record_tick(&mut self) -> Result<Sample, Error> {
        let Self {
            clock,
            source,
            samples,
        } = self;

        let timestamp = clock.now()?;
        let time = source.read_aggregate()?;
        let sample = Sample {
            timestamp,
            work: time.work(),
        };
        trace!(?time, ?sample, "recorded sample");

        samples.record(sample);
        Ok(sample)
    }

    /// returns the two most recent samples.
    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }
}

// === impl SampleBuffer ===

impl SampleBuffer {
    /// writes a sample into the slot opposite the most recent one.
    pub fn record(&mut self, sample: Sample) {
        let Self { slots, latest } = self;

        *latest ^= 1;
        slots[*latest] = Some(sample);
    }

    /// the sample written most recently.
    pub fn current(&self) -> Option<Sample> {
        self.slots[self.latest]
    }

    /// the sample written before the current one.
    pub fn previous(&self) -> Option<Sample> {
        self.slots[self.latest ^ 1]
    }

    /// returns the `(previous, current)` samples, once both slots have been written.
    pub fn pair(&self) -> Option<(Sample, Sample)> {
        self.previous().zip(self.current())
    }
}
