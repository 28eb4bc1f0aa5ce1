use std::{
    fmt::{self, Display},
    io,
    num::ParseIntError,
};

pub use self::{
    cpu_time::CpuTime,
    user_hz::{TickRate, UserHz},
};

mod cpu_time;
mod user_hz;


/// the header of the aggregate line, summing every cpu on the host.
const AGGREGATE: &str = "cpu";

#[derive(Debug, Eq, PartialEq)]
pub enum EntryParseError {
    /// no line began with the aggregate `cpu` header.
    MissingAggregate,
    /// a time field was not a decimal integer.
    UserHzParse(ParseIntError),
    /// the aggregate line held too few time fields.
    CpuTime { found: usize },
}

#[derive(Debug)]
pub enum StatReadError {
    Io(io::Error),
    Entry(EntryParseError),
}

/// counts the logical cpus listed in the `/proc/stat` text.
///
/// each occurrence of `cpu` immediately followed by a digit is a per-cpu header (`cpu0`, `cpu1`,
/// ...). the aggregate `cpu ` header is not counted. returns zero if there are no per-cpu lines.
pub fn count_cpus(stats: &str) -> usize {
    let bytes = stats.as_bytes();

    stats
        .match_indices(AGGREGATE)
        .filter(|(at, header)| {
            bytes
                .get(at + header.len())
                .is_some_and(u8::is_ascii_digit)
        })
        .count()
}

/// parses the aggregate cpu times out of the `/proc/stat` text.
///
/// the aggregate line is the one whose first token is exactly `cpu`. the first seven fields that
/// follow it are parsed as a unit; any later fields are ignored.
pub fn parse_aggregate(stats: &str) -> Result<CpuTime, EntryParseError> {
    let fields = stats
        .lines()
        .find_map(|line| {
            let line = line.trim_start();
            let (kind, fields) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            (kind == AGGREGATE).then_some(fields)
        })
        .ok_or(EntryParseError::MissingAggregate)?;

    fields.parse::<CpuTime>()
}

// === impl StatReadError ===

impl std::error::Error for StatReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(io) => Some(io),
            Self::Entry(entry) => Some(entry),
        }
    }
}

impl Display for StatReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(io) => f.write_fmt(format_args!("could not read cpu statistics: {io}")),
            Self::Entry(entry) => f.write_fmt(format_args!("could not parse cpu statistics: {entry}")),
        }
    }
}

impl From<EntryParseError> for StatReadError {
    fn from(entry: EntryParseError) -> Self {
        Self::Entry(entry)
    }
}

impl From<io::Error> for StatReadError {
    fn from(io: io::Error) -> Self {
        Self::Io(io)
    }
}

// === impl EntryParseError ===

impl Display for EntryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAggregate => f.write_str("no aggregate cpu line"),
            Self::UserHzParse(error) => f.write_fmt(format_args!("invalid time value: {error}")),
            Self::CpuTime { found } => f.write_fmt(format_args!(
                "expected {} time values, found {found}",
                CpuTime::FIELDS
            )),
        }
    }
}

impl std::error::Error for EntryParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UserHzParse(error) => Some(error),
            Self::MissingAggregate | Self::CpuTime { found: _ } => None,
        }
    }
}
