use std::io::{self, BufRead};

/// Line cursor over a buffered reader with 1-based line numbers for error
/// reporting.
pub(crate) struct Lines<R> {
    reader: R,
    line_no: usize,
}

impl<R: BufRead> Lines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
        }
    }

    pub(crate) fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if self.reader.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        self.line_no += 1;
        Ok(Some(buf))
    }

    pub(crate) fn line_no(&self) -> usize {
        self.line_no
    }
}

/// Fixed-column field, tolerant of short lines.
pub(crate) fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("").trim()
}
