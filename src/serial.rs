// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration text rendering and parsing.
//!
//! Knot speaks two configuration formats: JSON and YAML. Every descriptor
//! and registry round-trip goes through this module so that file layout
//! stays consistent no matter which store produced it. File I/O is left to
//! the caller to figure out.
//!
//! # Weak Contract On Rendering
//!
//! [`render`] takes its format as a raw string because the format can come
//! straight from the command line. An unsupported format is not an error:
//! it gets logged, and the input mapping is passed back through in its
//! canonical text form. Callers must not rely on the passthrough output
//! for unknown formats. [`parse`] has no such escape hatch, since parse
//! callers are internal and always name a supported format; malformed text
//! fails loudly with no fallback.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::error;

/// Configuration formats knot can parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Display for Format {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Json => fmt.write_str("json"),
            Self::Yaml => fmt.write_str("yaml"),
        }
    }
}

/// Render a mapping as text in the requested format.
///
/// The `pretty` flag only affects JSON, which gets stable multi-line
/// 4-space indentation. YAML output is always multi-line with trailing
/// whitespace trimmed. Unsupported formats are logged and the input
/// mapping is echoed back in its canonical text form instead.
pub fn render(value: &Value, format: &str, pretty: bool) -> String {
    match format {
        "json" if pretty => render_pretty_json(value),
        "json" => value.to_string(),
        "yaml" => match serde_yml::to_string(value) {
            Ok(text) => text.trim_end().to_owned(),
            Err(error) => {
                error!("failed to render yaml: {error}");
                value.to_string()
            }
        },
        invalid => {
            error!("invalid output format {invalid:?}, valid options are: \"yaml\" or \"json\"");
            value.to_string()
        }
    }
}

fn render_pretty_json(value: &Value) -> String {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);

    if value.serialize(&mut serializer).is_err() {
        error!("failed to render pretty json");
        return value.to_string();
    }

    match String::from_utf8(buffer) {
        Ok(text) => text,
        Err(error) => {
            error!("failed to render pretty json: {error}");
            value.to_string()
        }
    }
}

/// Parse configuration text in the requested format.
///
/// # Errors
///
/// - Return [`SerialError::MalformedJson`] if JSON text does not
///   deserialize into `T`.
/// - Return [`SerialError::MalformedYaml`] if YAML text does not
///   deserialize into `T`.
pub fn parse<T>(text: &str, format: Format) -> Result<T>
where
    T: DeserializeOwned,
{
    match format {
        Format::Json => Ok(serde_json::from_str(text)?),
        Format::Yaml => Ok(serde_yml::from_str(text)?),
    }
}

/// All possible error types for configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// Text is not valid for the JSON format.
    #[error("malformed json configuration: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// Text is not valid for the YAML format.
    #[error("malformed yaml configuration: {0}")]
    MalformedYaml(#[from] serde_yml::Error),
}

/// Friendly result alias :3
pub type Result<T, E = SerialError> = std::result::Result<T, E>;
