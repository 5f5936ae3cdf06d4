/*
 * response.rs
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

//! Normalized result of one completed HTTP exchange: status, reason,
//! multi-valued headers, content metadata, and the captured entity bytes.
//! Immutable once assembled; the entity accessors are pure projections.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};

use crate::client::HttpClient;

/// Response descriptor. Owned by the caller that invoked the request; holds
/// a lookup reference back to the originating request descriptor.
#[derive(Debug)]
pub struct HttpResponse {
    request: HttpClient,
    status: u16,
    message: Option<String>,
    entity: Option<Bytes>,
    headers: HashMap<String, Vec<String>>,
    content_type: Option<String>,
    content_encoding: Option<String>,
    content_length: Option<u64>,
    date: Option<DateTime<FixedOffset>>,
    expires: Option<DateTime<FixedOffset>>,
    last_modified: Option<DateTime<FixedOffset>>,
}

/// Case-insensitive single-value lookup over the raw header pairs, used for
/// content metadata before the pairs are folded into the multimap.
fn find_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn parse_http_date(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    value.and_then(|v| DateTime::parse_from_rfc2822(v).ok())
}

impl HttpResponse {
    /// Assemble a response from the transport's raw capture. Headers are in
    /// arrival order; repeated names keep that order in the multimap.
    pub(crate) fn assemble(
        request: HttpClient,
        status: u16,
        message: Option<String>,
        header_pairs: Vec<(String, String)>,
        entity: Vec<u8>,
    ) -> Self {
        let content_type = find_value(&header_pairs, "Content-Type").map(|v| v.to_string());
        let content_encoding = find_value(&header_pairs, "Content-Encoding").map(|v| v.to_string());
        let content_length =
            find_value(&header_pairs, "Content-Length").and_then(|v| v.trim().parse::<u64>().ok());
        let date = parse_http_date(find_value(&header_pairs, "Date"));
        let expires = parse_http_date(find_value(&header_pairs, "Expires"));
        let last_modified = parse_http_date(find_value(&header_pairs, "Last-Modified"));

        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in header_pairs {
            headers.entry(name).or_default().push(value);
        }

        Self {
            request,
            status,
            message,
            entity: if entity.is_empty() {
                None
            } else {
                Some(Bytes::from(entity))
            },
            headers,
            content_type,
            content_encoding,
            content_length,
            date,
            expires,
            last_modified,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase from the status line, when the server sent one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The originating request descriptor (lookup only).
    pub fn request(&self) -> &HttpClient {
        &self.request
    }

    /// Entity bytes. `None` when the exchange produced no body.
    pub fn entity(&self) -> Option<&[u8]> {
        self.entity.as_deref()
    }

    /// Entity decoded as text (UTF-8, lossy). Repeatable; `None` for an
    /// absent or zero-length entity.
    pub fn entity_as_string(&self) -> Option<String> {
        self.entity
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// All values for a header name, in arrival order. `None` if absent.
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers.get(name).map(|v| v.as_slice())
    }

    /// First value for a header name, or `None`.
    pub fn header_single_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v| v.first())
            .map(|v| v.as_str())
    }

    pub fn headers(&self) -> &HashMap<String, Vec<String>> {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.content_encoding.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.date
    }

    pub fn expires(&self) -> Option<DateTime<FixedOffset>> {
        self.expires
    }

    pub fn last_modified(&self) -> Option<DateTime<FixedOffset>> {
        self.last_modified
    }
}
