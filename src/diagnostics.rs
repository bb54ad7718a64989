//! Best-effort diagnostics
//!
//! Messages go to `tracing` whenever a subscriber is installed, leaving
//! level filtering to it, and to standard error otherwise. Nothing in here
//! can fail a parse.

use std::io::Write;

use tracing::subscriber::NoSubscriber;

use crate::error::{ParseError, ValidationError};

/// A handler rejected an element; the parse goes on
pub(crate) fn validation_error(element: &str, err: &ValidationError) {
    if subscriber_installed() {
        tracing::warn!(element, "{}", err);
    } else {
        to_stderr(format_args!("{}", err));
    }
}

/// A parse is about to fail with `err`
pub(crate) fn fatal(err: &ParseError) {
    if subscriber_installed() {
        tracing::error!(category = err.category(), "{}", err);
    } else {
        to_stderr(format_args!("xml parse failed: {}", err));
    }
}

/// Whether the current thread's default dispatcher is a real subscriber
fn subscriber_installed() -> bool {
    tracing::dispatcher::get_default(|dispatch| !dispatch.is::<NoSubscriber>())
}

fn to_stderr(args: std::fmt::Arguments<'_>) {
    // A closed or broken stderr is ignored
    let _ = writeln!(std::io::stderr().lock(), "{}", args);
}
