//! a scrolling cpu usage graph for status bars.
//!
//! on every tick, the host's aggregate cpu work is sampled from `/proc/stat`, compared against
//! the previous sample, and rendered as a block glyph at the end of a scrolling graph. the graph
//! and the latest percentage are written to two small files for status bars to pick up.

use {
    self::{
        display::Terminal,
        graph::{Glyph, ScrollBuffer},
        sentinel::Sentinel,
        sink::{SinkError, Sinks},
        source::{Clock, ClockError, ProcStat, StatsSource, SystemClock},
        stat::{StatReadError, TickRate},
        usage::{Calculator, Usage},
    },
    std::{
        fmt::{self, Display},
        io::{self, Stdout, Write},
        process::ExitCode,
        time::Duration,
    },
    tracing::{debug, info},
};

pub use self::config::{Cli, Config};

pub mod config;
pub mod daemon;
pub mod display;
pub mod graph;
/// observes kernel statistics.
pub mod sentinel;
pub mod sink;
pub mod source;
/// kernel statistics facilities.
///
/// this file provides tools to interact with `/proc/stat`.
pub mod stat;
pub mod usage;

/// samples cpu usage, and writes it out on every tick.
pub struct App<C = SystemClock, S = ProcStat, W = Stdout> {
    sentinel: Sentinel<C, S>,
    calculator: Calculator,
    /// the recent history of cpu usage.
    graph: ScrollBuffer,
    /// the graph and spot files. these are opened and emptied at startup in every mode.
    sinks: Sinks,
    /// an interactive display, for running in the foreground. the sinks are left empty then.
    terminal: Option<Terminal<W>>,
    /// the pause before each tick.
    interval: Duration,
    cpus: usize,
    rate: TickRate,
}

#[derive(Debug)]
pub enum Error {
    Stat(StatReadError),
    Clock(ClockError),
    Sink(SinkError),
    Display(io::Error),
    Detach(daemon::DetachError),
    /// no per-cpu lines were found in the kernel statistics.
    NoCpus,
    /// the kernel's clock tick rate could not be used.
    TickRate,
}

// === impl App ===

impl App {
    /// initializes a new application.
    ///
    /// this opens `/proc/stat`, and opens and empties the output files.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let rate = TickRate::from_sysconf().ok_or(Error::TickRate)?;
        let source = ProcStat::open().map_err(StatReadError::Io)?;

        info!(
            graph = %config.graph_path.display(),
            spot = %config.spot_path.display(),
            "opening output files"
        );
        let sinks = Sinks::open(&config.graph_path, &config.spot_path)?;
        let terminal = (!config.background).then(|| Terminal::stdout(config.length));

        Self::from_parts(SystemClock, source, rate, sinks, terminal, config)
    }
}

impl<C, S, W> App<C, S, W>
where
    C: Clock,
    S: StatsSource,
    W: Write,
{
    /// initializes an application from its parts, counting the cpus listed by `source`.
    ///
    /// glyphs are printed to `terminal` if one is given, and written to `sinks` otherwise.
    pub fn from_parts(
        clock: C,
        mut source: S,
        rate: TickRate,
        sinks: Sinks,
        terminal: Option<Terminal<W>>,
        config: &Config,
    ) -> Result<Self, Error> {
        let cpus = source.count_cpus()?;
        if cpus == 0 {
            return Err(Error::NoCpus);
        }
        info!(%cpus, %rate, "counted cpus");

        Ok(Self {
            sentinel: Sentinel::new(clock, source),
            calculator: Calculator::new(cpus, rate),
            graph: ScrollBuffer::new(config.length),
            sinks,
            terminal,
            interval: config.interval,
            cpus,
            rate,
        })
    }

    /// runs the application.
    ///
    /// this only returns if a tick fails.
    pub fn run(mut self) -> Result<(), Error> {
        info!(interval = ?self.interval, length = self.graph.len(), "running");

        loop {
            std::thread::sleep(self.interval);
            self.tick()?;
        }
    }

    /// samples the cpus, and writes out the usage since the previous tick.
    ///
    /// returns `None`, writing nothing, if there is no usage to report yet.
    pub fn tick(&mut self) -> Result<Option<Usage>, Error> {
        let Self {
            sentinel,
            calculator,
            graph,
            sinks,
            terminal,
            ..
        } = self;

        sentinel.record_tick()?;
        let Some((previous, current)) = sentinel.samples().pair() else {
            debug!("awaiting a second sample");
            return Ok(None);
        };
        let Some(usage) = calculator.compute(previous, current) else {
            return Ok(None);
        };

        let glyph = Glyph::from_level(usage.level);
        graph.push(glyph);
        debug!(%usage, %glyph, %graph, "pushed glyph");

        match terminal {
            Some(terminal) => terminal.print(glyph).map_err(Error::Display)?,
            None => sinks.write(graph, usage.percentage)?,
        }

        Ok(Some(usage))
    }

    /// writes the startup diagnostics requested by `config` to `out`.
    ///
    /// these must be written before detaching, while standard output is still open.
    pub fn print_diagnostics(&self, config: &Config, mut out: impl Write) -> Result<(), Error> {
        if config.show_cpu_count {
            writeln!(out, "cpu_count={}", self.cpus).map_err(Error::Display)?;
        }
        if config.show_tick_rate {
            writeln!(out, "clk_tck={}", self.rate).map_err(Error::Display)?;
        }
        out.flush().map_err(Error::Display)
    }

    /// returns the number of logical cpus.
    pub fn cpus(&self) -> usize {
        self.cpus
    }

    pub fn graph(&self) -> &ScrollBuffer {
        &self.graph
    }
}

// === impl Error ===

impl Error {
    /// the exit status for a generic failure, `-1`.
    pub const FAILURE: u8 = 255;
    /// the exit status for a failure to read the clock, `-2`.
    pub const CLOCK_FAILURE: u8 = 254;

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Clock(_) => ExitCode::from(Self::CLOCK_FAILURE),
            _ => ExitCode::from(Self::FAILURE),
        }
    }

    /// the exit status for a command line that could not be parsed.
    ///
    /// requests for help or the version are not failures.
    pub fn usage_exit_code(error: &clap::Error) -> ExitCode {
        match error.exit_code() {
            0 => ExitCode::SUCCESS,
            _ => ExitCode::from(Self::FAILURE),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stat(error) => Some(error),
            Self::Clock(error) => Some(error),
            Self::Sink(error) => Some(error),
            Self::Display(error) => Some(error),
            Self::Detach(error) => Some(error),
            Self::NoCpus | Self::TickRate => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stat(error) => Display::fmt(error, f),
            Self::Clock(error) => f.write_fmt(format_args!("get time: {error}")),
            Self::Sink(error) => Display::fmt(error, f),
            Self::Display(error) => f.write_fmt(format_args!("could not write to standard output: {error}")),
            Self::Detach(error) => f.write_fmt(format_args!("could not detach: {error}")),
            Self::NoCpus => f.write_str("failed to count cpus"),
            Self::TickRate => f.write_str("invalid clock tick rate"),
        }
    }
}

impl From<StatReadError> for Error {
    fn from(error: StatReadError) -> Self {
        Self::Stat(error)
    }
}

impl From<ClockError> for Error {
    fn from(error: ClockError) -> Self {
        Self::Clock(error)
    }
}

impl From<SinkError> for Error {
    fn from(error: SinkError) -> Self {
        Self::Sink(error)
    }
}

impl From<daemon::DetachError> for Error {
    fn from(error: daemon::DetachError) -> Self {
        Self::Detach(error)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        clap::Parser,
        crate::{
            sink::{GraphSink, Sink, SpotSink},
            source::{MockClock, MockStatFile},
        },
        std::{
            fs::{self, File},
            path::Path,
        },
        tempfile::TempDir,
    };

    const PER_CPU: &str = "cpu0 0 0 0 0 0 0 0\ncpu1 0 0 0 0 0 0 0\ncpu2 0 0 0 0 0 0 0\ncpu3 0 0 0 0 0 0 0";

    fn config(dir: &Path, length: usize, background: bool) -> Config {
        Config {
            interval: Duration::ZERO,
            length,
            background,
            show_cpu_count: false,
            show_tick_rate: false,
            graph_path: dir.join(".cpu-usage"),
            spot_path: dir.join(".cpu-usage.spot"),
        }
    }

    /// a temporary home directory, and a configuration writing into it.
    fn home(length: usize, background: bool) -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), length, background);
        (dir, config)
    }

    fn sinks(config: &Config) -> Sinks {
        Sinks::open(&config.graph_path, &config.spot_path).unwrap()
    }

    /// stats for four cpus that have done `work` ticks of work in all.
    fn stats(work: u64) -> String {
        format!("cpu {work} 0 0 1000 0 0 0\n{PER_CPU}")
    }

    fn app<W: Write>(
        times: impl IntoIterator<Item = i64>,
        work: impl IntoIterator<Item = u64>,
        sinks: Sinks,
        terminal: Option<Terminal<W>>,
        config: &Config,
    ) -> App<MockClock, MockStatFile, W> {
        // the first read is used to count the cpus.
        let feed = std::iter::once(stats(0)).chain(work.into_iter().map(stats));
        let rate = TickRate::new(100).unwrap();
        App::from_parts(
            MockClock::new(times),
            MockStatFile::new(feed),
            rate,
            sinks,
            terminal,
            config,
        )
        .unwrap()
    }

    #[test]
    fn writes_files() {
        let (_dir, config) = home(3, true);
        let mut app = app::<Stdout>(
            [0, 100_000, 200_000, 300_000],
            [1000, 1016, 1056, 1056],
            sinks(&config),
            None,
            &config,
        );
        assert_eq!(app.cpus(), 4);

        // the first tick has nothing to compare against.
        assert_eq!(app.tick().unwrap(), None);
        assert_eq!(fs::read(&config.graph_path).unwrap(), b"");

        let usage = app.tick().unwrap().unwrap();
        assert_eq!(usage.percentage, 40);
        assert_eq!(fs::read_to_string(&config.spot_path).unwrap(), "40");
        assert_eq!(app.graph().to_string(), "  ▃");

        let usage = app.tick().unwrap().unwrap();
        assert_eq!(usage.percentage, 100);
        assert_eq!(fs::read_to_string(&config.spot_path).unwrap(), "100");

        let usage = app.tick().unwrap().unwrap();
        assert_eq!(usage.percentage, 0);
        assert_eq!(fs::read_to_string(&config.spot_path).unwrap(), "0");
        assert_eq!(
            fs::read(&config.graph_path).unwrap(),
            [0xe2, 0x96, 0x83, 0xe2, 0x96, 0x93, 0x00, 0x00, 0x5f]
        );
    }

    #[test]
    fn skips_ticks_without_elapsed_time() {
        let (_dir, config) = home(2, true);
        let mut app = app::<Stdout>(
            [0, 0, 100_000],
            [1000, 1016, 1032],
            sinks(&config),
            None,
            &config,
        );

        assert_eq!(app.tick().unwrap(), None);
        assert_eq!(app.tick().unwrap(), None);
        assert_eq!(fs::read(&config.spot_path).unwrap(), b"");
        assert_eq!(app.graph().to_string(), "  ");

        let usage = app.tick().unwrap().unwrap();
        assert_eq!(usage.percentage, 40);
        assert_eq!(app.graph().to_string(), " ▃");
    }

    #[test]
    fn prints_in_the_foreground() {
        let (_dir, config) = home(2, false);
        fs::write(&config.graph_path, b"stale graph").unwrap();
        fs::write(&config.spot_path, b"99").unwrap();

        let terminal = Terminal::new(Vec::new(), config.length);
        let mut app = app(
            [0, 100_000, 200_000, 300_000],
            [1000, 1016, 1056, 1056],
            sinks(&config),
            Some(terminal),
            &config,
        );

        for _ in 0..4 {
            app.tick().unwrap();
        }

        let terminal = app.terminal.take().unwrap();
        assert_eq!(String::from_utf8(terminal.into_inner()).unwrap(), "▃▓\n_");

        // the files are emptied at startup, and left empty.
        assert_eq!(fs::read(&config.graph_path).unwrap(), b"");
        assert_eq!(fs::read(&config.spot_path).unwrap(), b"");
    }

    #[test]
    fn write_errors_stop_the_tick() {
        let (_dir, config) = home(2, true);
        fs::write(&config.graph_path, b"").unwrap();
        fs::write(&config.spot_path, b"").unwrap();

        // files opened for reading alone reject writes.
        let sinks = Sinks::new(
            GraphSink::new(File::open(&config.graph_path).unwrap()),
            SpotSink::new(File::open(&config.spot_path).unwrap()),
        );
        let mut app = app::<Stdout>([0, 100_000], [1000, 1016], sinks, None, &config);

        assert_eq!(app.tick().unwrap(), None);
        let err = app.tick().unwrap_err();
        assert!(matches!(
            err,
            Error::Sink(SinkError::Write {
                sink: Sink::Graph,
                ..
            })
        ));
        assert_eq!(err.exit_code(), ExitCode::from(Error::FAILURE));
    }

    #[test]
    fn diagnostics() {
        let (_dir, mut config) = home(2, true);
        let app = app::<Stdout>([0], [1000], sinks(&config), None, &config);

        let mut out = Vec::new();
        app.print_diagnostics(&config, &mut out).unwrap();
        assert_eq!(out, b"");

        config.show_cpu_count = true;
        config.show_tick_rate = true;
        app.print_diagnostics(&config, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "cpu_count=4\nclk_tck=100\n");
    }

    #[test]
    fn no_cpus() {
        let (_dir, config) = home(2, false);
        let source = MockStatFile::new(["cpu 1 2 3 4 5 6 7"]);
        let terminal = Some(Terminal::new(Vec::new(), 2));
        let rate = TickRate::new(100).unwrap();
        let err =
            App::from_parts(MockClock::default(), source, rate, sinks(&config), terminal, &config)
                .err()
                .unwrap();
        assert!(matches!(err, Error::NoCpus));
        assert_eq!(err.exit_code(), ExitCode::from(Error::FAILURE));
    }

    #[test]
    fn parse_errors_stop_the_tick() {
        let (_dir, config) = home(2, false);
        let source = MockStatFile::new([stats(0), String::from("cpu 1 2")]);
        let terminal = Some(Terminal::new(Vec::new(), 2));
        let rate = TickRate::new(100).unwrap();
        let mut app =
            App::from_parts(MockClock::new([0]), source, rate, sinks(&config), terminal, &config)
                .unwrap();

        let err = app.tick().unwrap_err();
        assert!(matches!(err, Error::Stat(StatReadError::Entry(_))));
    }

    #[test]
    fn clock_errors_exit_with_their_own_code() {
        let err = Error::Clock(ClockError::OutOfRange);
        assert_eq!(err.exit_code(), ExitCode::from(Error::CLOCK_FAILURE));
        assert_eq!(err.to_string(), "get time: clock is out of range");
    }

    #[test]
    fn usage_exit_codes() {
        let parse = |args: &[&str]| {
            let args = ["cpu-usage", "--home", "/home/kate"].iter().chain(args).copied();
            Cli::try_parse_from(args).unwrap_err()
        };

        let help = parse(&["--help"]);
        assert_eq!(Error::usage_exit_code(&help), ExitCode::SUCCESS);
        let version = parse(&["--version"]);
        assert_eq!(Error::usage_exit_code(&version), ExitCode::SUCCESS);
        let bad = parse(&["soon"]);
        assert_eq!(Error::usage_exit_code(&bad), ExitCode::from(Error::FAILURE));
    }
}
