//! Interrupt flag shared between `main` and a running command
//!
//! The binary triggers it on Ctrl-C. Commands check it before every step that
//! cannot be undone: writing a wallet file, printing a secret, broadcasting.

use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    requested: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Interrupted`] once the flag is set
    pub fn check(&self) -> Result<()> {
        if self.is_triggered() {
            return Err(Error::Interrupted);
        }
        Ok(())
    }
}
