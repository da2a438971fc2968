//! Incremental JSON document writer
//!
//! Structure is written through serde_json's `Formatter`, so compact and
//! indented output share one code path. Scalars go through
//! `serde_json::to_writer`, which handles escaping and number formatting.

use crate::types::FieldValue;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::Value;
use std::io::{self, Write};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Map a field value onto its JSON representation.
///
/// Dates become ISO-8601 strings, binary data becomes base64, and floats
/// JSON cannot express (NaN, infinities) become `null`.
pub fn to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Int(i) => Value::from(*i),
        FieldValue::Float(f) => Value::from(*f),
        FieldValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
        FieldValue::Binary(bytes) => Value::String(BASE64.encode(bytes)),
    }
}

enum Style {
    Compact(CompactFormatter),
    Pretty(PrettyFormatter<'static>),
}

// Dispatch to whichever formatter is active; Formatter has generic methods
// and cannot be boxed.
macro_rules! with_formatter {
    ($self:ident, $f:ident => $body:expr) => {
        match &mut $self.style {
            Style::Compact($f) => $body,
            Style::Pretty($f) => $body,
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    Object { first: bool, key_pending: bool },
    Array { first: bool },
}

/// Writes one JSON document, tracking open objects and arrays
pub struct DocumentEmitter<W: Write> {
    writer: W,
    style: Style,
    stack: Vec<Frame>,
    root_written: bool,
}

impl<W: Write> DocumentEmitter<W> {
    /// Emitter without insignificant whitespace
    pub fn compact(writer: W) -> Self {
        Self::with_style(writer, Style::Compact(CompactFormatter))
    }

    /// Emitter indenting two spaces per nesting level
    pub fn pretty(writer: W) -> Self {
        Self::with_style(writer, Style::Pretty(PrettyFormatter::with_indent(b"  ")))
    }

    pub fn new(writer: W, pretty: bool) -> Self {
        if pretty {
            Self::pretty(writer)
        } else {
            Self::compact(writer)
        }
    }

    fn with_style(writer: W, style: Style) -> Self {
        DocumentEmitter {
            writer,
            style,
            stack: Vec::new(),
            root_written: false,
        }
    }

    /// Number of currently open objects and arrays
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn begin_object(&mut self) -> io::Result<()> {
        self.before_value()?;
        with_formatter!(self, f => f.begin_object(&mut self.writer))?;
        self.stack.push(Frame::Object { first: true, key_pending: false });
        Ok(())
    }

    pub fn end_object(&mut self) -> io::Result<()> {
        match self.stack.last() {
            Some(Frame::Object { key_pending: false, .. }) => {}
            Some(Frame::Object { key_pending: true, .. }) => {
                return Err(misuse("object closed after a key without a value"))
            }
            _ => return Err(misuse("end_object without an open object")),
        }
        self.stack.pop();
        with_formatter!(self, f => f.end_object(&mut self.writer))?;
        self.after_value()
    }

    pub fn begin_array(&mut self) -> io::Result<()> {
        self.before_value()?;
        with_formatter!(self, f => f.begin_array(&mut self.writer))?;
        self.stack.push(Frame::Array { first: true });
        Ok(())
    }

    pub fn end_array(&mut self) -> io::Result<()> {
        if !matches!(self.stack.last(), Some(Frame::Array { .. })) {
            return Err(misuse("end_array without an open array"));
        }
        self.stack.pop();
        with_formatter!(self, f => f.end_array(&mut self.writer))?;
        self.after_value()
    }

    /// Write a property name inside the innermost object
    pub fn write_key(&mut self, key: &str) -> io::Result<()> {
        let first = match self.stack.last_mut() {
            Some(Frame::Object { first, key_pending }) if !*key_pending => {
                *key_pending = true;
                *first
            }
            _ => return Err(misuse("write_key outside an object or after a dangling key")),
        };

        with_formatter!(self, f => f.begin_object_key(&mut self.writer, first))?;
        serde_json::to_writer(&mut self.writer, key).map_err(io::Error::from)?;
        with_formatter!(self, f => f.end_object_key(&mut self.writer))?;
        with_formatter!(self, f => f.begin_object_value(&mut self.writer))
    }

    pub fn write_value(&mut self, value: &FieldValue) -> io::Result<()> {
        self.before_value()?;
        serde_json::to_writer(&mut self.writer, &to_json(value)).map_err(io::Error::from)?;
        self.after_value()
    }

    /// Close every open structure, innermost first.
    ///
    /// A key still waiting for its value gets `null` so the output stays
    /// well-formed. Used to wind down after a failure mid-document.
    pub fn close_open(&mut self) -> io::Result<()> {
        while let Some(frame) = self.stack.last().copied() {
            match frame {
                Frame::Object { key_pending: true, .. } => self.write_value(&FieldValue::Null)?,
                Frame::Object { .. } => self.end_object()?,
                Frame::Array { .. } => self.end_array()?,
            }
        }
        Ok(())
    }

    /// Finish the document with a newline and hand back the writer
    pub fn finish(mut self) -> io::Result<W> {
        if !self.stack.is_empty() {
            return Err(misuse("document finished with open structures"));
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn before_value(&mut self) -> io::Result<()> {
        match self.stack.last_mut() {
            None if self.root_written => Err(misuse("document already has a root value")),
            None => Ok(()),
            Some(Frame::Array { first }) => {
                let was_first = *first;
                *first = false;
                with_formatter!(self, f => f.begin_array_value(&mut self.writer, was_first))
            }
            Some(Frame::Object { key_pending: true, .. }) => Ok(()),
            Some(Frame::Object { .. }) => Err(misuse("object value written without a key")),
        }
    }

    fn after_value(&mut self) -> io::Result<()> {
        match self.stack.last_mut() {
            None => {
                self.root_written = true;
                Ok(())
            }
            Some(Frame::Array { .. }) => with_formatter!(self, f => f.end_array_value(&mut self.writer)),
            Some(Frame::Object { first, key_pending }) => {
                *first = false;
                *key_pending = false;
                with_formatter!(self, f => f.end_object_value(&mut self.writer))
            }
        }
    }
}

fn misuse(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.to_string())
}
