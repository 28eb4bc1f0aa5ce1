use {
    crate::graph::Glyph,
    crossterm::{QueueableCommand, style::Print},
    std::io::{self, Stdout, Write},
};

/// prints glyphs to an interactive display, as they are produced.
///
/// a line break follows every `width` glyphs.
pub struct Terminal<W = Stdout> {
    out: W,
    width: usize,
    /// glyphs printed on the current line.
    count: usize,
}

// === impl Terminal ===

impl Terminal {
    pub fn stdout(width: usize) -> Self {
        Self::new(io::stdout(), width)
    }
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width: width.max(1),
            count: 0,
        }
    }

    /// prints a glyph, and flushes it to the display immediately.
    pub fn print(&mut self, glyph: Glyph) -> io::Result<()> {
        let Self { out, width, count } = self;

        *count = (*count + 1) % *width;
        out.queue(Print(glyph))?;
        if *count == 0 {
            out.queue(Print('\n'))?;
        }

        out.flush()
    }

    /// returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}
