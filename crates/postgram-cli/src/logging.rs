// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the postgram CLI.
//!
//! Uses `tracing` with `tracing-subscriber` for structured logging.
//! Log level can be controlled via the `RUST_LOG` environment variable.
//!
//! # Examples
//!
//! ```bash
//! # Default: warnings only
//! postgram post <url>
//!
//! # Debug output for troubleshooting (equivalent to -v)
//! RUST_LOG=postgram_core=debug postgram post <url>
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::OutputFormat;

/// Initialize the logging subsystem.
///
/// All log output goes to stderr so structured stdout stays parseable.
/// `RUST_LOG` overrides everything; otherwise `-v` raises the default
/// filter to debug and JSON output lowers it to errors only.
pub fn init_logging(format: OutputFormat, verbose: bool) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let default_filter = if verbose {
        "postgram=debug,postgram_core=debug,reqwest=warn"
    } else if matches!(format, OutputFormat::Json) {
        "postgram=error,postgram_core=error,reqwest=error"
    } else {
        "postgram=warn,postgram_core=warn,reqwest=error"
    };
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .expect("valid default filter directives");

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
