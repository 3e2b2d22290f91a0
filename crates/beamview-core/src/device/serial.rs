use crate::consts::SERIAL_TERMINATOR;

/// Splits inbound serial text into terminator-delimited reply lines.
///
/// Incomplete trailing data is kept until the terminator arrives. There is
/// no bound on the retained data: a device that never sends the terminator
/// grows the buffer indefinitely. Callers can watch [`pending`](Self::pending).
#[derive(Clone, Debug)]
pub struct SerialLineAssembler {
    buffer: String,
    terminator: char,
}

impl SerialLineAssembler {
    pub fn new() -> Self {
        Self::with_terminator(SERIAL_TERMINATOR)
    }

    pub fn with_terminator(terminator: char) -> Self {
        Self {
            buffer: String::new(),
            terminator,
        }
    }

    /// Append a chunk and yield every line it completes, in order. Each
    /// line includes its terminator.
    pub fn feed<'a>(&'a mut self, chunk: &str) -> impl Iterator<Item = String> + 'a {
        self.buffer.push_str(chunk);
        CompleteLines { assembler: self }
    }

    /// Number of bytes buffered without a terminator yet.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for SerialLineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

struct CompleteLines<'a> {
    assembler: &'a mut SerialLineAssembler,
}

impl Iterator for CompleteLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let terminator = self.assembler.terminator;
        let buffer = &mut self.assembler.buffer;
        let pos = buffer.find(terminator)?;
        let end = pos + terminator.len_utf8();
        let rest = buffer.split_off(end);
        Some(std::mem::replace(buffer, rest))
    }
}
