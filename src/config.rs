//! # Resolver Configuration Module
//!
//! Configuration that changes how stacks are resolved. It is passed
//! explicitly into every resolution call rather than read from global state,
//! so two resolutions with different settings can run side by side.
//!
//! ## Environment Variables
//!
//! ### `STACK_ROUTES_DISABLE_AUTHORIZER`
//!
//! When set to `1`, `true` or `yes` (case-insensitive), Lambda authorizers are
//! neither extracted nor linked. Routes keep no authorizer binding and the
//! emulator serves every route unauthenticated.
//!
//! Default: authorizers enabled
//!
//! ### `STACK_ROUTES_WORKING_DIR`
//!
//! Directory that relative `DefinitionUri` locations are resolved against.
//!
//! Default: unset (paths are used as given)
//!
//! ## Usage
//!
//! ```rust
//! use stack_routes::config::ResolverConfig;
//!
//! let config = ResolverConfig::from_env();
//! println!("authorizers disabled: {}", config.disable_authorizer);
//! ```

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that disables authorizer extraction
pub const DISABLE_AUTHORIZER_ENV: &str = "STACK_ROUTES_DISABLE_AUTHORIZER";
/// Environment variable naming the working directory for document URIs
pub const WORKING_DIR_ENV: &str = "STACK_ROUTES_WORKING_DIR";

/// Settings for a single resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Skip authorizer extraction and linking entirely
    pub disable_authorizer: bool,
    /// Base directory for relative `DefinitionUri` paths
    pub working_dir: Option<PathBuf>,
}

impl ResolverConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unrecognised values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let disable_authorizer = env::var(DISABLE_AUTHORIZER_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let working_dir = env::var_os(WORKING_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            disable_authorizer,
            working_dir,
        }
    }

    /// Toggle authorizer extraction
    #[must_use]
    pub fn with_disable_authorizer(mut self, disable: bool) -> Self {
        self.disable_authorizer = disable;
        self
    }

    /// Set the base directory for relative document locations
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Working directory as a path reference
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
