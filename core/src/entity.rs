/*
 * entity.rs
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

//! Re-readable request entity. The body is captured fully into memory at
//! configuration time, so it can be inspected as text or bytes any number
//! of times and then transmitted, with no cursor to exhaust. A source that
//! cannot be captured is rejected up front as `InvalidStream`, before the
//! builder mutates anything.

use bytes::Bytes;
use std::io::Read;

use crate::error::HttpError;
use crate::streams;

/// A captured request body plus a flag marking it binary or text. The flag
/// only governs how the entity is presented (string view vs raw bytes); the
/// wire always carries the captured bytes.
#[derive(Debug, Clone)]
pub struct Entity {
    bytes: Bytes,
    binary: bool,
}

impl Entity {
    pub fn from_text(text: &str) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(text.as_bytes()),
            binary: false,
        }
    }

    pub fn from_bytes(bytes: impl Into<Bytes>, binary: bool) -> Self {
        Self {
            bytes: bytes.into(),
            binary,
        }
    }

    /// Capture a byte source completely. A source that fails mid-read
    /// cannot be made re-readable and is rejected as `InvalidStream`.
    pub fn from_reader(source: &mut impl Read, binary: bool) -> Result<Self, HttpError> {
        let bytes = streams::read_fully(source)
            .map_err(|e| HttpError::InvalidStream(format!("entity source not capturable: {}", e)))?;
        Ok(Self {
            bytes: Bytes::from(bytes),
            binary,
        })
    }

    /// Captured length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    /// Byte view. `None` for a zero-length entity, matching the text view.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if self.bytes.is_empty() {
            None
        } else {
            Some(&self.bytes)
        }
    }

    /// Text view (UTF-8, lossy). Pure projection: calling it repeatedly
    /// returns the same text. `None` for a zero-length entity.
    pub fn as_text(&self) -> Option<String> {
        if self.bytes.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.bytes).into_owned())
        }
    }

    /// The raw captured bytes, cheap to clone for transmission.
    pub(crate) fn raw(&self) -> Bytes {
        self.bytes.clone()
    }
}
