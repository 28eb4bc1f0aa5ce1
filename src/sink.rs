use {
    crate::graph::ScrollBuffer,
    std::{
        fmt::{self, Display},
        fs::{File, OpenOptions},
        io::{self, Seek, SeekFrom, Write},
        os::unix::fs::OpenOptionsExt,
        path::{Path, PathBuf},
    },
    tracing::trace,
};

/// the graph and spot files, overwritten on every tick.
pub struct Sinks {
    graph: GraphSink,
    spot: SpotSink,
}

/// the file holding the serialized graph.
pub struct GraphSink {
    file: File,
    /// scratch space for the serialized graph.
    buf: Vec<u8>,
}

/// the file holding the latest percentage, as decimal text.
pub struct SpotSink {
    file: File,
}

/// identifies one of the [`Sinks`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sink {
    Graph,
    Spot,
}

#[derive(Debug)]
pub enum SinkError {
    Open { path: PathBuf, error: io::Error },
    Truncate { sink: Sink, error: io::Error },
    Seek { sink: Sink, error: io::Error },
    Write { sink: Sink, error: io::Error },
}

// === impl Sinks ===

impl Sinks {
    pub fn new(graph: GraphSink, spot: SpotSink) -> Self {
        Self { graph, spot }
    }

    /// opens both sinks, creating them if needed, and empties them.
    pub fn open(graph: impl AsRef<Path>, spot: impl AsRef<Path>) -> Result<Self, SinkError> {
        Ok(Self::new(
            GraphSink::new(open(Sink::Graph, graph.as_ref())?),
            SpotSink::new(open(Sink::Spot, spot.as_ref())?),
        ))
    }

    /// overwrites both sinks.
    ///
    /// each sink is rewritten in full, but the pair is not updated atomically.
    pub fn write(&mut self, graph: &ScrollBuffer, percentage: i64) -> Result<(), SinkError> {
        let Self {
            graph: graph_sink,
            spot,
        } = self;

        graph_sink.write(graph)?;
        spot.write(percentage)
    }
}

/// opens a sink, readable and writable by its owner alone, and truncates it.
fn open(sink: Sink, path: &Path) -> Result<File, SinkError> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .mode(0o600)
        .open(path)
        .map_err(|error| SinkError::Open {
            path: path.to_owned(),
            error,
        })?;

    file.set_len(0)
        .map_err(|error| SinkError::Truncate { sink, error })?;

    Ok(file)
}

// === impl GraphSink ===

impl GraphSink {
    pub fn new(file: File) -> Self {
        Self {
            file,
            buf: Vec::new(),
        }
    }

    /// writes the serialized graph over the start of the file.
    ///
    /// the serialized graph is the same length on every tick, so the file is not truncated.
    pub fn write(&mut self, graph: &ScrollBuffer) -> Result<(), SinkError> {
        const SINK: Sink = Sink::Graph;
        let Self { file, buf } = self;

        graph.encode(buf);
        file.seek(SeekFrom::Start(0))
            .map_err(|error| SinkError::Seek { sink: SINK, error })?;
        file.write_all(buf)
            .map_err(|error| SinkError::Write { sink: SINK, error })?;

        trace!(bytes = buf.len(), "wrote graph");
        Ok(())
    }
}

// === impl SpotSink ===

impl SpotSink {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// replaces the file's contents with `percentage`, in decimal.
    pub fn write(&mut self, percentage: i64) -> Result<(), SinkError> {
        const SINK: Sink = Sink::Spot;
        let Self { file } = self;

        // truncate first, so that no digits from a longer value linger past the end.
        let spot = percentage.to_string();
        file.set_len(spot.len() as u64)
            .map_err(|error| SinkError::Truncate { sink: SINK, error })?;
        file.seek(SeekFrom::Start(0))
            .map_err(|error| SinkError::Seek { sink: SINK, error })?;
        file.write_all(spot.as_bytes())
            .map_err(|error| SinkError::Write { sink: SINK, error })?;

        trace!(%spot, "wrote spot");
        Ok(())
    }
}

// === impl Sink ===

impl Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Graph => "graph",
            Self::Spot => "spot",
        })
    }
}

// === impl SinkError ===

impl Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, error } => {
                f.write_fmt(format_args!("could not open {}: {error}", path.display()))
            }
            Self::Truncate { sink, error } => {
                f.write_fmt(format_args!("{sink} truncate failed: {error}"))
            }
            Self::Seek { sink, error } => f.write_fmt(format_args!("{sink} seek failed: {error}")),
            Self::Write { sink, error } => f.write_fmt(format_args!("{sink} write failed: {error}")),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { error, .. }
            | Self::Truncate { error, .. }
            | Self::Seek { error, .. }
            | Self::Write { error, .. } => Some(error),
        }
    }
}
