//! Utility functions and helpers.

pub mod http;
pub mod url;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{AppError, Result};

/// Cooperative cancellation flag checked inside crawl and download
/// loops. Once triggered, [`Interrupt::check`] yields
/// [`AppError::Interrupted`], which no error boundary swallows.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return an error if cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_set() {
            Err(AppError::Interrupted)
        } else {
            Ok(())
        }
    }
}
