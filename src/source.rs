use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt::{self, Display},
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
    time::{SystemTime, SystemTimeError, UNIX_EPOCH},
};

pub use self::{clock::*, stats::*};

mod clock {
    use super::*;

    /// a wall-clock instant, in microseconds since the unix epoch.
    #[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
    pub struct Micros(pub i64);

    /// the wall clock could not be read.
    #[derive(Debug)]
    pub enum ClockError {
        /// the clock reads earlier than the unix epoch.
        BeforeEpoch(SystemTimeError),
        /// the clock reads too far past the epoch to count in microseconds.
        OutOfRange,
    }

    pub trait Clock {
        fn now(&self) -> Result<Micros, ClockError>;
    }

    #[derive(Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> Result<Micros, ClockError> {
            let since = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(ClockError::BeforeEpoch)?;

            i64::try_from(since.as_micros())
                .map(Micros)
                .map_err(|_| ClockError::OutOfRange)
        }
    }

    /// a mock clock.
    #[derive(Default)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockClock {
        times: RefCell<VecDeque<Micros>>,
    }

    impl Clock for MockClock {
        fn now(&self) -> Result<Micros, ClockError> {
            let MockClock { times } = self;

            times
                .borrow_mut()
                .pop_front()
                .map(Ok)
                .expect("mock times should not be empty")
        }
    }

    #[allow(dead_code, reason = "this is a testing utility.")]
    impl MockClock {
        pub fn new(times: impl IntoIterator<Item = i64>) -> Self {
            Self {
                times: RefCell::new(times.into_iter().map(Micros).collect()),
            }
        }
    }

    // === impl Micros ===

    impl std::ops::Sub for Micros {
        type Output = i64;
        fn sub(self, rhs: Self) -> Self::Output {
            let (Self(lhs), Self(rhs)) = (self, rhs);
            lhs - rhs
        }
    }

    // === impl ClockError ===

    impl Display for ClockError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::BeforeEpoch(error) => {
                    f.write_fmt(format_args!("clock is before the unix epoch: {error}"))
                }
                Self::OutOfRange => f.write_str("clock is out of range"),
            }
        }
    }

    impl std::error::Error for ClockError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Self::BeforeEpoch(error) => Some(error),
                Self::OutOfRange => None,
            }
        }
    }
}

/// abstracts over providers of statistics.
mod stats {
    use {
        super::*,
        crate::stat::{self, CpuTime, StatReadError},
    };

    /// a source of kernel statistics.
    pub trait StatsSource {
        /// rewinds the feed and returns its full contents.
        fn read(&mut self) -> io::Result<&str>;

        /// counts the logical cpus listed in the feed.
        fn count_cpus(&mut self) -> Result<usize, StatReadError> {
            self.read().map(stat::count_cpus).map_err(StatReadError::Io)
        }

        /// reads the aggregate cpu times.
        fn read_aggregate(&mut self) -> Result<CpuTime, StatReadError> {
            let stats = self.read()?;
            stat::parse_aggregate(stats).map_err(StatReadError::Entry)
        }
    }

    /// stats backed by a long-lived handle to `/proc/stat`.
    ///
    /// the handle is opened once, and rewound rather than reopened before every read.
    pub struct ProcStat<R = File> {
        reader: R,
        buf: String,
    }

    /// a mock stat source.
    #[derive(Default)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockStatFile {
        stats: VecDeque<String>,
        last: String,
    }

    // === impl ProcStat ===

    impl ProcStat {
        const STAT: &str = "/proc/stat";

        /// opens `/proc/stat`.
        pub fn open() -> io::Result<Self> {
            Self::open_path(Self::STAT)
        }

        pub fn open_path(path: impl AsRef<Path>) -> io::Result<Self> {
            File::open(path).map(Self::new)
        }
    }

    impl<R> ProcStat<R> {
        pub fn new(reader: R) -> Self {
            Self {
                reader,
                buf: String::new(),
            }
        }
    }

    impl<R: Read + Seek> StatsSource for ProcStat<R> {
        fn read(&mut self) -> io::Result<&str> {
            let Self { reader, buf } = self;

            buf.clear();
            reader.seek(SeekFrom::Start(0))?;
            reader.read_to_string(buf)?;

            Ok(buf)
        }
    }

    // === impl MockStatFile ===

    impl StatsSource for MockStatFile {
        fn read(&mut self) -> io::Result<&str> {
            let Self { stats, last } = self;

            *last = stats
                .pop_front()
                .expect("mock stats should not be empty");

            Ok(last)
        }
    }

    #[allow(dead_code, reason = "this is a testing utility.")]
    impl MockStatFile {
        pub fn new<S: Into<String>>(stats: impl IntoIterator<Item = S>) -> Self {
            Self {
                stats: stats.into_iter().map(Into::into).collect(),
                last: String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::stat::{StatReadError, UserHz},
        std::io::{Cursor, Write},
    };

    #[test]
    fn proc_stat_rewinds_between_reads() {
        let mut source = ProcStat::new(Cursor::new("cpu 1 2 3 4 5 6 7\ncpu0 1 2 3\n"));
        assert_eq!(source.count_cpus().unwrap(), 1);
        assert_eq!(source.read_aggregate().unwrap().user, UserHz::new(1));
        assert_eq!(source.read_aggregate().unwrap().softirq, UserHz::new(7));
    }

    #[test]
    fn proc_stat_sees_new_contents_without_reopening() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"cpu 1 1 1 1 1 1 1\n").unwrap();
        let mut source = ProcStat::new(file.try_clone().unwrap());
        assert_eq!(source.read_aggregate().unwrap().work(), UserHz::new(5));

        file.seek(SeekFrom::Start(0)).unwrap();
        file.write_all(b"cpu 2 2 2 2 2 2 2\n").unwrap();
        assert_eq!(source.read_aggregate().unwrap().work(), UserHz::new(10));
    }

    #[test]
    fn malformed_feed() {
        let mut source = MockStatFile::new(["cpu 1 2 3"]);
        let err = source.read_aggregate().unwrap_err();
        assert!(matches!(err, StatReadError::Entry(_)));
    }

    #[test]
    fn missing_feed() {
        let err = ProcStat::open_path("/nonexistent/stat").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn system_clock() {
        let (a, b) = (SystemClock.now().unwrap(), SystemClock.now().unwrap());
        assert!(b >= a);
        assert!(a > Micros(0));
    }

    #[test]
    fn mock_clock() {
        let clock = MockClock::new([5, 1_000_005]);
        let (a, b) = (clock.now().unwrap(), clock.now().unwrap());
        assert_eq!(b - a, 1_000_000);
    }
}
