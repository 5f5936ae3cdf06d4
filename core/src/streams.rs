/*
 * streams.rs
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

//! Byte stream helpers: fully drain a reader into memory, as bytes or text.
//! Used by request entity capture and trust store capture. No length is
//! assumed up front; the source is read page by page until EOF.

use std::io::{self, Read};

const PAGE_SIZE: usize = 1024;

/// Read a source to the end and return all bytes.
pub fn read_fully(source: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut page = [0u8; PAGE_SIZE];
    loop {
        let n = source.read(&mut page)?;
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&page[..n]);
    }
}

/// Read a source to the end and return it as text (UTF-8, lossy).
pub fn read_fully_string(source: &mut impl Read) -> io::Result<String> {
    let bytes = read_fully(source)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
