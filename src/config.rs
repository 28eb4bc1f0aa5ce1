use {
    clap::Parser,
    std::{path::PathBuf, time::Duration},
};

/// a scrolling cpu usage graph for status bars.
///
/// writes a graph of recent cpu usage to `~/.cpu-usage`, and the latest percentage to
/// `~/.cpu-usage.spot`.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// milliseconds between samples.
    #[arg(default_value_t = 1050)]
    pub interval: u64,

    /// glyphs in the graph.
    #[arg(default_value_t = 20)]
    pub length: usize,

    /// single letter flags: `f` stays in the foreground, printing the graph as it goes, `c`
    /// prints the number of cpus and `t` prints the clock tick rate. others are ignored.
    #[arg(allow_hyphen_values = true)]
    pub flags: Vec<String>,

    /// the directory the output files are written to.
    #[arg(long, env = "HOME", hide_env_values = true)]
    pub home: PathBuf,

    /// the log filter to use if `RUST_LOG` is not set.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// the resolved configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// the pause between samples.
    pub interval: Duration,
    /// the number of glyphs in the graph. at least one.
    pub length: usize,
    /// whether to detach, and write to the output files.
    pub background: bool,
    pub show_cpu_count: bool,
    pub show_tick_rate: bool,
    /// the graph file.
    pub graph_path: PathBuf,
    /// the spot file.
    pub spot_path: PathBuf,
}

// === impl Cli ===

impl Cli {
    const GRAPH_FILE: &str = ".cpu-usage";
    const SPOT_FILE: &str = ".cpu-usage.spot";

    pub fn config(&self) -> Config {
        let Self {
            interval,
            length,
            flags,
            home,
            log_level: _,
        } = self;

        let flags = flags
            .iter()
            .filter_map(|flag| flag.chars().next())
            .collect::<Vec<_>>();

        Config {
            interval: Duration::from_millis(*interval),
            length: (*length).max(1),
            background: !flags.contains(&'f'),
            show_cpu_count: flags.contains(&'c'),
            show_tick_rate: flags.contains(&'t'),
            graph_path: home.join(Self::GRAPH_FILE),
            spot_path: home.join(Self::SPOT_FILE),
        }
    }
}
