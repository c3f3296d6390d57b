#![allow(dead_code)]

use std::io;

/// A writer that fails once a byte budget is used up.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
    budget: Option<usize>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(budget: usize) -> Self {
        Self {
            buf: Vec::new(),
            budget: Some(budget),
        }
    }

    #[track_caller]
    pub fn into_string(self) -> String {
        String::from_utf8(self.buf).unwrap()
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(budget) = &mut self.budget {
            if buf.len() > *budget {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            *budget -= buf.len();
        }
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
