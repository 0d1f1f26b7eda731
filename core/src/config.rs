//! file: core/src/config.rs
//! description: options controlling a single graph build.
//!
//! Options are plain data so they can be embedded in a larger tool
//! configuration and deserialized from JSON. Every field has a default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::stack;

/// Nesting depth the reader and builder accept before giving up. Both run
/// on a worker whose stack is sized from this, see `stack`.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Largest accepted `max_depth`; its worker stack is 257 MiB.
pub const MAX_DEPTH_CEILING: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize { DEFAULT_MAX_DEPTH }

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl BuildOptions {
    pub fn from_json_str(raw: &str) -> Result<BuildOptions, ConfigError> {
        let opts: BuildOptions = serde_json::from_str(raw).map_err(|e| {
            ConfigError::new(format!("parse build options: {}", e), "flowgraph.config.from_json_str")
        })?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<BuildOptions, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            ConfigError::new(
                format!("read build options {}: {}", path.as_ref().display(), e),
                "flowgraph.config.from_file",
            )
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_CEILING {
            return Err(ConfigError::new(
                format!("max_depth must be between 1 and {}, got {}", MAX_DEPTH_CEILING, self.max_depth),
                "flowgraph.config.validate",
            ));
        }
        Ok(())
    }

    /// Stack the reader and builder workers reserve for these options.
    pub fn stack_size(&self) -> usize {
        stack::stack_size_for(self.max_depth)
    }
}
