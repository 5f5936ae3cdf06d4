/*
 * h1.rs
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

//! HTTP/1.1 response push parser: status line, headers, body framed by
//! Content-Length, chunked encoding, or connection close. Feed bytes via
//! `receive`; the sink is called as complete tokens are parsed. After the
//! header section the connection picks the body framing (it knows the
//! request method and the response status) via `set_body_framing`.

use bytes::{Buf, BytesMut};
use std::io;

/// Receives parse events. Trailers are delivered through `header` after the
/// body, matching how the response stores them.
pub trait ReplySink {
    fn status(&mut self, code: u16, reason: Option<&str>);
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: &[u8]);
}

/// How the response body is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// No body at all (HEAD, 204, 304, Content-Length: 0).
    None,
    Length(u64),
    Chunked,
    UntilClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePhase {
    Status,
    Headers,
    /// Header section parsed; waiting for `set_body_framing`.
    AwaitingBody,
    Body,
    ChunkSize,
    ChunkData,
    Trailers,
    Done,
}

/// Push parser for one HTTP/1.1 response.
pub struct ReplyParser {
    phase: ParsePhase,
    remaining: u64,
    until_close: bool,
}

impl ReplyParser {
    pub fn new() -> Self {
        Self {
            phase: ParsePhase::Status,
            remaining: 0,
            until_close: false,
        }
    }

    pub fn phase(&self) -> ParsePhase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = ParsePhase::Status;
        self.remaining = 0;
        self.until_close = false;
    }

    /// Called by the connection once it has inspected the headers.
    pub fn set_body_framing(&mut self, framing: BodyFraming) {
        if self.phase != ParsePhase::AwaitingBody {
            return;
        }
        match framing {
            BodyFraming::None => self.phase = ParsePhase::Done,
            BodyFraming::Length(n) => {
                if n == 0 {
                    self.phase = ParsePhase::Done;
                } else {
                    self.remaining = n;
                    self.phase = ParsePhase::Body;
                }
            }
            BodyFraming::Chunked => self.phase = ParsePhase::ChunkSize,
            BodyFraming::UntilClose => {
                self.until_close = true;
                self.phase = ParsePhase::Body;
            }
        }
    }

    /// Called by the connection at EOF when the body runs until close.
    pub fn finish_on_close(&mut self) -> bool {
        if self.phase == ParsePhase::Body && self.until_close {
            self.phase = ParsePhase::Done;
            true
        } else {
            false
        }
    }

    fn take_line(buf: &mut BytesMut) -> io::Result<Option<String>> {
        let end = buf
            .windows(2)
            .position(|w| w == b"\r\n");
        let Some(end) = end else {
            return Ok(None);
        };
        let line = buf.split_to(end + 2);
        let text = std::str::from_utf8(&line[..end])
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "response line not UTF-8"))?;
        Ok(Some(text.to_string()))
    }

    /// Parse as much as possible from `buf`, invoking the sink for each
    /// complete token. Partial data stays in `buf` for the next call.
    pub fn receive<S: ReplySink>(&mut self, buf: &mut BytesMut, sink: &mut S) -> io::Result<()> {
        loop {
            match self.phase {
                ParsePhase::Status => {
                    let Some(line) = Self::take_line(buf)? else {
                        return Ok(());
                    };
                    // "HTTP/1.1 200 OK", reason optional
                    let mut parts = line.splitn(3, ' ');
                    let _version = parts.next();
                    let code = parts
                        .next()
                        .and_then(|s| s.parse::<u16>().ok())
                        .ok_or_else(|| {
                            io::Error::new(io::ErrorKind::InvalidData, "malformed status line")
                        })?;
                    sink.status(code, parts.next());
                    self.phase = ParsePhase::Headers;
                }
                ParsePhase::Headers => {
                    let Some(line) = Self::take_line(buf)? else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        self.phase = ParsePhase::AwaitingBody;
                        return Ok(());
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        sink.header(name.trim(), value.trim());
                    }
                }
                ParsePhase::AwaitingBody | ParsePhase::Done => return Ok(()),
                ParsePhase::Body => {
                    if buf.is_empty() {
                        return Ok(());
                    }
                    if self.until_close {
                        let chunk = buf.split_to(buf.len());
                        sink.body_chunk(&chunk);
                        return Ok(());
                    }
                    let take = (self.remaining as usize).min(buf.len());
                    let chunk = buf.split_to(take);
                    sink.body_chunk(&chunk);
                    self.remaining -= take as u64;
                    if self.remaining == 0 {
                        self.phase = ParsePhase::Done;
                    }
                }
                ParsePhase::ChunkSize => {
                    let Some(line) = Self::take_line(buf)? else {
                        return Ok(());
                    };
                    let size_part = line.split(';').next().unwrap_or("").trim();
                    let size = u64::from_str_radix(size_part, 16).map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidData, "malformed chunk size")
                    })?;
                    if size == 0 {
                        self.phase = ParsePhase::Trailers;
                    } else {
                        self.remaining = size;
                        self.phase = ParsePhase::ChunkData;
                    }
                }
                ParsePhase::ChunkData => {
                    if self.remaining > 0 {
                        if buf.is_empty() {
                            return Ok(());
                        }
                        let take = (self.remaining as usize).min(buf.len());
                        let chunk = buf.split_to(take);
                        sink.body_chunk(&chunk);
                        self.remaining -= take as u64;
                    }
                    if self.remaining == 0 {
                        // chunk data is followed by CRLF
                        if buf.len() < 2 {
                            return Ok(());
                        }
                        if &buf[..2] != b"\r\n" {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidData,
                                "chunk data not terminated by CRLF",
                            ));
                        }
                        buf.advance(2);
                        self.phase = ParsePhase::ChunkSize;
                    }
                }
                ParsePhase::Trailers => {
                    let Some(line) = Self::take_line(buf)? else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        self.phase = ParsePhase::Done;
                    } else if let Some((name, value)) = line.split_once(':') {
                        sink.header(name.trim(), value.trim());
                    }
                }
            }
        }
    }
}

impl Default for ReplyParser {
    fn default() -> Self {
        Self::new()
    }
}
