use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// A budget that fails once the total charged to it exceeds a limit.
#[derive(Debug)]
pub struct Limiter {
    resource: &'static str,
    limit: u64,
    used: AtomicU64,
}

impl Limiter {
    pub fn new(resource: &'static str, limit: u64) -> Self {
        Self {
            resource,
            limit,
            used: AtomicU64::new(0),
        }
    }

    /// Charges `n` units.
    pub fn use_(&self, n: u64) -> Result<()> {
        let prev = self.used.fetch_add(n, Ordering::Relaxed);
        if prev.saturating_add(n) > self.limit {
            return Err(Error::limit(self.resource));
        }
        Ok(())
    }

    /// Fails if `n` alone exceeds the limit, without charging it.
    pub fn check(&self, n: u64) -> Result<()> {
        if n > self.limit {
            return Err(Error::limit(self.resource));
        }
        Ok(())
    }
}

/// A wall clock budget measured from its creation.
#[derive(Debug)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            at: limit.and_then(|d| Instant::now().checked_add(d)),
        }
    }

    pub fn check(&self) -> Result<()> {
        match self.at {
            Some(at) if Instant::now() > at => Err(Error::limit("template render")),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accumulates() {
        let l = Limiter::new("memory alloc", 10);
        l.use_(6).unwrap();
        l.use_(4).unwrap();
        let err = l.use_(1).unwrap_err();
        assert_eq!(err.to_string(), "memory alloc limit exceeded");
    }

    #[test]
    fn limiter_check_does_not_charge() {
        let l = Limiter::new("parse length", 3);
        l.check(3).unwrap();
        l.check(3).unwrap();
        assert!(l.check(4).is_err());
    }

    #[test]
    fn deadline() {
        Deadline::new(None).check().unwrap();
        Deadline::new(Some(Duration::from_secs(60))).check().unwrap();
        let d = Deadline::new(Some(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(2));
        let err = d.check().unwrap_err();
        assert_eq!(err.to_string(), "template render limit exceeded");
    }
}
