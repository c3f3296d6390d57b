use std::io;

use crate::Value;

/// Loop control requested by `break` and `continue`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signal {
    pub broke: bool,
    pub continued: bool,
}

impl Signal {
    pub fn is_set(&self) -> bool {
        self.broke || self.continued
    }
}

/// The sink rendered output is written to.
pub trait Emitter: Send {
    /// Writes a value using its template string form.
    fn write(&mut self, value: &Value);

    fn write_str(&mut self, s: &str) {
        self.write(&Value::from(s));
    }

    fn signal(&mut self) -> &mut Signal;
}

/// Accumulates output in a string.
#[derive(Debug, Default)]
pub struct StringEmitter {
    buf: String,
    signal: Signal,
}

impl StringEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            buf: String::with_capacity(n),
            signal: Signal::default(),
        }
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

impl Emitter for StringEmitter {
    fn write(&mut self, value: &Value) {
        use std::fmt::Write;
        let _ = write!(self.buf, "{}", value);
    }

    fn write_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn signal(&mut self) -> &mut Signal {
        &mut self.signal
    }
}

/// Keeps a lone non-string value as is, so a template consisting of only
/// `{{ port }}` produces a number. Anything written after that value turns
/// the output into a string.
#[derive(Debug)]
pub struct KeepTypeEmitter {
    buf: Value,
    signal: Signal,
}

impl KeepTypeEmitter {
    pub fn new() -> Self {
        Self {
            buf: Value::String(String::new()),
            signal: Signal::default(),
        }
    }

    pub fn into_value(self) -> Value {
        self.buf
    }
}

impl Default for KeepTypeEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter for KeepTypeEmitter {
    fn write(&mut self, value: &Value) {
        let value = value.to_primitive();
        let empty = matches!(&self.buf, Value::String(s) if s.is_empty());
        if empty && !matches!(value, Value::String(_)) {
            self.buf = value;
        } else {
            self.buf = Value::String(format!("{}{}", self.buf, value));
        }
    }

    fn signal(&mut self) -> &mut Signal {
        &mut self.signal
    }
}

/// Writes output straight to an [`io::Write`].
///
/// The first I/O error is kept and later writes are dropped.
pub struct WriterEmitter<W> {
    writer: W,
    err: Option<io::Error>,
    signal: Signal,
}

impl<W> WriterEmitter<W>
where
    W: io::Write + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            err: None,
            signal: Signal::default(),
        }
    }

    pub fn take_err(&mut self) -> Option<io::Error> {
        self.err.take()
    }
}

impl<W> Emitter for WriterEmitter<W>
where
    W: io::Write + Send,
{
    fn write(&mut self, value: &Value) {
        if self.err.is_none() {
            if let Err(err) = write!(self.writer, "{}", value) {
                self.err = Some(err);
            }
        }
    }

    fn write_str(&mut self, s: &str) {
        if self.err.is_none() {
            if let Err(err) = self.writer.write_all(s.as_bytes()) {
                self.err = Some(err);
            }
        }
    }

    fn signal(&mut self) -> &mut Signal {
        &mut self.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_emitter() {
        let mut e = StringEmitter::new();
        e.write_str("a");
        e.write(&Value::from(vec![1, 2]));
        e.write(&Value::Nil);
        assert_eq!(e.into_string(), "a12");
    }

    #[test]
    fn keep_type_emitter_single_value() {
        let mut e = KeepTypeEmitter::new();
        e.write(&Value::Integer(8080));
        assert_eq!(e.into_value(), Value::Integer(8080));
    }

    #[test]
    fn keep_type_emitter_concatenates() {
        let mut e = KeepTypeEmitter::new();
        e.write(&Value::Integer(1));
        e.write(&Value::Bool(true));
        assert_eq!(e.into_value(), Value::from("1true"));
    }

    #[test]
    fn keep_type_emitter_after_empty_string() {
        let mut e = KeepTypeEmitter::new();
        e.write_str("");
        e.write(&Value::Float(1.5));
        assert_eq!(e.into_value(), Value::Float(1.5));
    }

    #[test]
    fn writer_emitter() {
        let mut buf = Vec::new();
        let mut e = WriterEmitter::new(&mut buf);
        e.write_str("x=");
        e.write(&Value::Integer(1));
        assert!(e.take_err().is_none());
        assert_eq!(buf, b"x=1");
    }
}
