// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging setup
//!
//! Logs go to stderr so command output on stdout stays clean.
//!
//! ## Environment Variables
//!
//! 1. **`SHORTCUT_REMAP_LOG`** (highest priority) - crate-specific control.
//!    A bare level (`debug`) applies to this crate only; anything with
//!    `=`, `:` or `,` is used as a full filter directive.
//! 2. **`RUST_LOG`** - standard tracing filter, used as-is
//! 3. **Default** - `warn`, or `warn,shortcut_remap=info` when verbose

use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const CRATE_TARGET: &str = "shortcut_remap";

#[derive(Clone, Copy, Debug, Default)]
pub struct LogConfig {
    /// Raise this crate's default level to `info`
    pub verbose: bool,
}

/// Installs the global subscriber.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place and return an error.
pub fn init(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directives = filter_directives(
        env::var("SHORTCUT_REMAP_LOG").ok().as_deref(),
        env::var("RUST_LOG").ok().as_deref(),
        config.verbose,
    );

    Registry::default()
        .with(EnvFilter::try_new(directives)?)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    Ok(())
}

/// Filter directives from the two environment variables, by priority.
fn filter_directives(crate_log: Option<&str>, rust_log: Option<&str>, verbose: bool) -> String {
    if let Some(level) = crate_log {
        if level.contains('=') || level.contains(':') || level.contains(',') {
            return level.to_string();
        }
        return format!("warn,{CRATE_TARGET}={level}");
    }

    if let Some(rust_log) = rust_log {
        return rust_log.to_string();
    }

    if verbose {
        format!("warn,{CRATE_TARGET}=info")
    } else {
        "warn".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_variable_wins() {
        assert_eq!(
            filter_directives(Some("debug"), Some("trace"), false),
            "warn,shortcut_remap=debug"
        );
        assert_eq!(
            filter_directives(Some("shortcut_remap::core=trace"), None, false),
            "shortcut_remap::core=trace"
        );
    }

    #[test]
    fn test_rust_log_used_as_is() {
        assert_eq!(filter_directives(None, Some("info"), true), "info");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(filter_directives(None, None, false), "warn");
        assert_eq!(filter_directives(None, None, true), "warn,shortcut_remap=info");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        let _ = init(LogConfig::default());
        assert!(init(LogConfig { verbose: true }).is_err());
    }
}
