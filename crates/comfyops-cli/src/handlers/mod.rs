//! Command handlers.
//!
//! Each handler is a thin wrapper: gather input, call the library through
//! the objects built in [`crate::bootstrap`], and print through
//! [`crate::presentation`]. Results go to stdout, diagnostics to stderr.

pub mod download;
pub mod paths;
pub mod resolve;
pub mod run;

use std::io::IsTerminal;

use anyhow::Result;
use serde_json::Value;
use tokio::io::AsyncReadExt;

use crate::error::CliError;

/// URL lines from the arguments, or from stdin when none were given.
///
/// Stdin is returned as one chunk; line splitting happens in the library.
pub(crate) async fn read_url_lines(urls: &[String]) -> Result<Vec<String>, CliError> {
    if !urls.is_empty() {
        return Ok(urls.to_vec());
    }

    let mut stdin = tokio::io::stdin();
    if std::io::stdin().is_terminal() {
        return Err(CliError::Arguments(
            "no URLs given; pass them as arguments or pipe them on stdin".to_string(),
        ));
    }

    let mut buf = String::new();
    stdin.read_to_string(&mut buf).await?;
    tracing::debug!(bytes = buf.len(), "Read URL list from stdin");
    Ok(vec![buf])
}

/// Print one JSON document on stdout.
pub(crate) fn emit_json(doc: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(doc)?);
    Ok(())
}
