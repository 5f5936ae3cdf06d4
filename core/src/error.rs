/*
 * error.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Staffetta, an HTTP client library for build and
 * integration tooling.
 *
 * Staffetta is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Staffetta is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Staffetta.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Client error taxonomy. Four kinds so callers can pattern-match instead of
//! string-matching messages: bad URI, non-rewindable entity source, TLS
//! certificate failure, and everything else that goes wrong on the wire.

use std::fmt;
use std::io;

/// Errors raised while building or invoking an HTTP request.
///
/// `InvalidUri` and `InvalidStream` are raised synchronously at the call
/// that caused them, before any network activity. `Certificate` and
/// `Invocation` are raised only by `invoke()`. A non-2xx HTTP status is
/// never an error; it is a normal `HttpResponse`.
#[derive(Debug)]
pub enum HttpError {
    /// The raw URL failed strict parsing, or its scheme is not http/https.
    /// Carries the offending input for diagnostics.
    InvalidUri { input: String, reason: String },
    /// An entity byte source could not be fully captured for re-reading.
    InvalidStream(String),
    /// The TLS handshake failed certificate verification. Distinguished
    /// from `Invocation` so callers can present trust-store guidance.
    Certificate(io::Error),
    /// Any other failure during the exchange: DNS, connect, I/O
    /// mid-transfer, protocol violation. Wraps the cause unclassified.
    Invocation(io::Error),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::InvalidUri { input, reason } => {
                write!(f, "invalid URI [{}]: {}", input, reason)
            }
            HttpError::InvalidStream(m) => write!(f, "invalid entity stream: {}", m),
            HttpError::Certificate(e) => write!(f, "TLS certificate not trusted: {}", e),
            HttpError::Invocation(e) => write!(f, "HTTP invocation failed: {}", e),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Certificate(e) | HttpError::Invocation(e) => Some(e),
            _ => None,
        }
    }
}

impl HttpError {
    pub(crate) fn invalid_uri(input: impl Into<String>, reason: impl Into<String>) -> Self {
        HttpError::InvalidUri {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
