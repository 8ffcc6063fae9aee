//! Splits a connection byte stream into newline-terminated request units.

/// Item produced while feeding bytes to a [`LineFramer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete, non-blank unit with the terminator and trailing
    /// whitespace removed.
    Unit(Vec<u8>),
    /// The unframed buffer exceeded its cap and was discarded.
    Overflow {
        /// Configured cap on unframed bytes.
        limit: usize,
    },
}

/// Per-connection receive buffer.
///
/// The buffer only ever holds bytes received after the last terminator, so a
/// unit is released as soon as its `\n` arrives. When the unterminated tail
/// grows past `limit` the framer drops it, reports a single
/// [`FrameEvent::Overflow`], and ignores input until the next terminator.
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    limit: usize,
    discarding: bool,
}

impl LineFramer {
    /// Creates a framer that buffers at most `limit` unframed bytes.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
            discarding: false,
        }
    }

    /// Number of unframed bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds freshly read bytes and returns the units they complete, in
    /// arrival order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        let mut rest = bytes;
        while let Some(position) = rest.iter().position(|byte| *byte == b'\n') {
            let (line, tail) = rest.split_at(position);
            rest = tail.get(1..).unwrap_or_default();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            self.buffer.extend_from_slice(line);
            let unit = std::mem::take(&mut self.buffer);
            if unit.len() > self.limit {
                events.push(FrameEvent::Overflow { limit: self.limit });
                continue;
            }
            if let Some(trimmed) = trim_unit(unit) {
                events.push(FrameEvent::Unit(trimmed));
            }
        }

        if !rest.is_empty() && !self.discarding {
            self.buffer.extend_from_slice(rest);
            if self.buffer.len() > self.limit {
                self.buffer = Vec::new();
                self.discarding = true;
                events.push(FrameEvent::Overflow { limit: self.limit });
            }
        }
        events
    }
}

fn trim_unit(mut unit: Vec<u8>) -> Option<Vec<u8>> {
    while unit.last().is_some_and(u8::is_ascii_whitespace) {
        unit.pop();
    }
    if unit.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(unit)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn framer() -> LineFramer {
        LineFramer::new(64)
    }

    fn units(events: Vec<FrameEvent>) -> Vec<String> {
        events
            .into_iter()
            .map(|event| match event {
                FrameEvent::Unit(bytes) => String::from_utf8(bytes).expect("utf8 unit"),
                FrameEvent::Overflow { limit } => format!("<overflow {limit}>"),
            })
            .collect()
    }

    #[rstest]
    fn splits_documents_in_one_read(mut framer: LineFramer) {
        let events = framer.push(b"{\"a\":1}\n{\"b\":2}\n");
        assert_eq!(units(events), vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(framer.buffered(), 0);
    }

    #[rstest]
    fn buffers_until_terminator(mut framer: LineFramer) {
        assert!(framer.push(b"{\"method\":").is_empty());
        assert_eq!(framer.buffered(), 10);
        let events = framer.push(b"\"x\"}\n");
        assert_eq!(units(events), vec!["{\"method\":\"x\"}"]);
        assert_eq!(framer.buffered(), 0);
    }

    #[rstest]
    fn keeps_tail_after_complete_unit(mut framer: LineFramer) {
        let events = framer.push(b"one\ntw");
        assert_eq!(units(events), vec!["one"]);
        assert_eq!(framer.buffered(), 2);
    }

    #[rstest]
    #[case::blank_lines(b"\n\n  \n".as_slice())]
    #[case::only_carriage_return(b"\r\n".as_slice())]
    fn skips_blank_units(mut framer: LineFramer, #[case] input: &[u8]) {
        assert!(framer.push(input).is_empty());
    }

    #[rstest]
    fn tolerates_crlf(mut framer: LineFramer) {
        let events = framer.push(b"{}\r\n");
        assert_eq!(units(events), vec!["{}"]);
    }

    #[test]
    fn overflow_discards_until_next_terminator() {
        let mut framer = LineFramer::new(8);
        let events = framer.push(b"0123456789");
        assert_eq!(units(events), vec!["<overflow 8>"]);
        assert_eq!(framer.buffered(), 0);

        assert!(framer.push(b"still the same request").is_empty());
        let events = framer.push(b"tail\n{}\n");
        assert_eq!(units(events), vec!["{}"]);
    }

    #[test]
    fn complete_unit_over_limit_overflows() {
        let mut framer = LineFramer::new(4);
        let events = framer.push(b"0123456789\nok\n");
        assert_eq!(units(events), vec!["<overflow 4>", "ok"]);
    }
}
