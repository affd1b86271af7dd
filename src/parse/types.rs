use std::ops::Range;

//===========================================================================//

/// A span of byte offsets within a line of debugger input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SrcSpan {
    start: usize,
    end: usize,
}

impl SrcSpan {
    /// Constructs a span from the given the byte range.
    pub fn from_byte_range(range: Range<usize>) -> SrcSpan {
        assert!(range.start <= range.end);
        SrcSpan { start: range.start, end: range.end }
    }

    /// Returns the byte range represented by this span.
    pub fn byte_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Merges two spans, returning the smallest span that covers both.
    pub fn merged_with(&self, other: SrcSpan) -> SrcSpan {
        SrcSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shifts this span right by `offset` bytes.
    pub fn shifted(&self, offset: usize) -> SrcSpan {
        SrcSpan { start: self.start + offset, end: self.end + offset }
    }

    pub(crate) fn end_span(&self) -> SrcSpan {
        SrcSpan { start: self.end, end: self.end }
    }
}

//===========================================================================//

/// A specialized `Result` type for parsing operations.
pub type ParseResult<V> = Result<V, Vec<ParseError>>;

//===========================================================================//

/// An error encountered while parsing or typechecking debugger input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    /// The primary location in the input where the error occurred.
    pub span: SrcSpan,
    /// The error message to report to the user.
    pub message: String,
    /// Any additional label annotations for this error.
    pub labels: Vec<ParseErrorLabel>,
}

impl ParseError {
    /// Constructs a parse error with the given span and message, and other
    /// fields initially empty.
    pub fn new(span: SrcSpan, message: String) -> ParseError {
        ParseError { span, message, labels: Vec::new() }
    }

    /// Adds an additional label to the error.
    pub fn with_label(mut self, span: SrcSpan, message: String) -> ParseError {
        self.labels.push(ParseErrorLabel { span, message });
        self
    }

    /// Shifts this error (and its labels) right by `offset` bytes, for
    /// errors found in a suffix of a longer line.
    pub fn shifted(mut self, offset: usize) -> ParseError {
        self.span = self.span.shifted(offset);
        for label in &mut self.labels {
            label.span = label.span.shifted(offset);
        }
        self
    }

    /// Formats this error for display beneath the line of input it refers
    /// to, underlining the offending span and each label.
    pub fn render(&self, source: &str) -> String {
        let mut text = format!("error: {}\n  {source}\n", self.message);
        text.push_str(&underline(self.span, '^'));
        for label in &self.labels {
            text.push('\n');
            text.push_str(&underline(label.span, '-'));
            text.push(' ');
            text.push_str(&label.message);
        }
        text
    }
}

fn underline(span: SrcSpan, mark: char) -> String {
    let width = (span.end - span.start).max(1);
    format!(
        "  {}{}",
        " ".repeat(span.start),
        mark.to_string().repeat(width)
    )
}

//===========================================================================//

/// An additional label annotation for a [`ParseError`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseErrorLabel {
    /// The location in the input to which the label applies.
    pub span: SrcSpan,
    /// The message to attach to the label.
    pub message: String,
}

//===========================================================================//


//===========================================================================//
