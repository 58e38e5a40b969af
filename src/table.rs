//! # Route Table Module
//!
//! Holds the current [`Resolution`] for readers that serve requests while
//! templates are being re-resolved. Reads are lock-free; a refresh builds a
//! new resolution off to the side and swaps it in.
//!
//! ## Error Handling
//!
//! If a refresh fails:
//! - the error is logged and returned
//! - the previous resolution remains active

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ResolveResult;
use crate::resolution::Resolution;
use crate::swagger::DocumentReader;
use crate::template::Stack;
use crate::walker::StackWalker;

/// Atomically swappable routing table
#[derive(Debug)]
pub struct RouteTable {
    current: ArcSwap<Resolution>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(Resolution::default())
    }
}

impl RouteTable {
    #[must_use]
    pub fn new(initial: Resolution) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(initial)),
        }
    }

    /// Snapshot of the active resolution
    #[must_use]
    pub fn load(&self) -> Arc<Resolution> {
        self.current.load_full()
    }

    pub fn replace(&self, resolution: Resolution) {
        self.current.store(Arc::new(resolution));
    }

    /// Re-resolve `stacks` and swap the result in
    ///
    /// # Errors
    ///
    /// Propagates the walker's error; the active table is left untouched.
    pub fn refresh<R>(&self, walker: &StackWalker<'_, R>, stacks: &[Stack]) -> ResolveResult<()>
    where
        R: DocumentReader + ?Sized,
    {
        match walker.resolve(stacks) {
            Ok(resolution) => {
                info!(routes = resolution.routes.len(), "Route table refreshed");
                self.replace(resolution);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Route table refresh failed, keeping previous routes");
                Err(e)
            }
        }
    }
}
