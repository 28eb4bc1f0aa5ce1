use std::{
    fmt::{self, Display, Write},
    iter,
};

/// a single unit of the graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Glyph {
    /// a standard ascii character, one byte wide.
    Ascii(u8),
    /// a block-drawing character, three bytes wide.
    Block(char),
}

/// a fixed-capacity, scrolling history of [`Glyph`]s.
///
/// new glyphs are appended at the tail, evicting the oldest glyph at the head.
#[derive(Clone, Debug)]
pub struct ScrollBuffer {
    glyphs: Box<[Glyph]>,
    /// the index of the oldest glyph, which the next push overwrites.
    head: usize,
}

// === impl Glyph ===

impl Glyph {
    /// the width of a glyph's slot in the serialized graph, in bytes.
    pub const SLOT: usize = 3;

    /// an empty position, before any usage has been recorded.
    pub const BLANK: Self = Self::Ascii(b' ');
    /// no measurable work.
    pub const IDLE: Self = Self::Ascii(b'_');
    /// the cpus are saturated.
    pub const SATURATED: Self = Self::Block('▓');

    /// partial blocks, filled in eighths.
    const EIGHTHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    /// returns the glyph for a block level. levels outside of `0..=9` are clamped.
    pub fn from_level(level: i64) -> Self {
        match level {
            ..=0 => Self::IDLE,
            1..=8 => Self::Block(Self::EIGHTHS[(level - 1) as usize]),
            9.. => Self::SATURATED,
        }
    }

    /// returns the number of bytes this glyph occupies at its natural width.
    pub fn width(self) -> usize {
        match self {
            Self::Ascii(_) => 1,
            Self::Block(c) => c.len_utf8(),
        }
    }

    /// encodes this glyph into a fixed-width slot.
    ///
    /// narrower glyphs are right-aligned, with the leading bytes left as `NUL` placeholders.
    pub fn encode_slot(self) -> [u8; Self::SLOT] {
        let mut slot = [0; Self::SLOT];
        let start = Self::SLOT - self.width();

        match self {
            Self::Ascii(byte) => slot[start] = byte,
            Self::Block(c) => {
                c.encode_utf8(&mut slot[start..]);
            }
        }

        slot
    }
}

impl Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Ascii(byte) => f.write_char(byte.into()),
            Self::Block(c) => f.write_char(c),
        }
    }
}

// === impl ScrollBuffer ===

impl ScrollBuffer {
    /// returns a buffer of `len` blank glyphs. the length is at least one.
    pub fn new(len: usize) -> Self {
        Self {
            glyphs: iter::repeat_n(Glyph::BLANK, len.max(1)).collect(),
            head: 0,
        }
    }

    /// appends a glyph, evicting the oldest.
    pub fn push(&mut self, glyph: Glyph) {
        let Self { glyphs, head } = self;

        glyphs[*head] = glyph;
        *head = (*head + 1) % glyphs.len();
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// iterates over the glyphs, from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Glyph> + '_ {
        let (newer, older) = self.glyphs.split_at(self.head);
        older.iter().chain(newer).copied()
    }

    /// the number of bytes in the serialized graph.
    pub fn encoded_len(&self) -> usize {
        self.len() * Glyph::SLOT
    }

    /// serializes the graph into `buf`, replacing its contents.
    ///
    /// every glyph takes up a [`Glyph::SLOT`], so the output is always [`Self::encoded_len`]
    /// bytes long.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.clear();
        buf.extend(self.iter().flat_map(Glyph::encode_slot));
    }
}

/// renders the graph at each glyph's natural width.
impl Display for ScrollBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|glyph| Display::fmt(&glyph, f))
    }
}
