use std::fmt;

/// Named streams of the tile-multiply engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Left operand tiles, host to device.
    A,
    /// Right operand tiles, host to device.
    B,
    /// Partial product tiles, device to host.
    C,
}

impl Stream {
    /// Stream name as it appears in the engine's build description.
    pub fn name(&self) -> &'static str {
        match self {
            Stream::A => "A",
            Stream::B => "B",
            Stream::C => "C",
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Stream::A | Stream::B)
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
