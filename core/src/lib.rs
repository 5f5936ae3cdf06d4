/*
 * lib.rs
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

//! Fluent HTTP/HTTPS client with per-request TLS trust.
//!
//! A request starts from a raw URL, which is repaired (percent-encoding
//! fixup) and strictly parsed, then configured through a consuming builder
//! and invoked over a one-shot HTTP/1.1 connection:
//!
//! ```no_run
//! # async fn example() -> Result<(), staffetta_core::HttpError> {
//! use staffetta_core::HttpClient;
//!
//! let response = HttpClient::uri("https://api.example.com/items?tag=new releases")?
//!     .query("limit", Some("10"))
//!     .accept("application/json")
//!     .credentials(Some("user"), Some("secret"))
//!     .invoke()
//!     .await?;
//! if response.status() == 200 {
//!     println!("{}", response.entity_as_string().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! TLS trust is per request: platform roots by default, a caller-supplied
//! PEM bundle via `key_store`, or `trust_all` for self-signed test
//! endpoints. Request entities are captured into memory so they stay
//! re-readable (inspect, log, transmit) with no cursor to exhaust.

pub mod client;
pub mod entity;
pub mod error;
pub mod net;
pub mod response;
pub mod streams;
pub mod uri;

mod connection;
mod h1;

pub use client::{HttpClient, HttpClientBuilder, Method, Scheme, ACCEPT, CONTENT_TYPE};
pub use entity::Entity;
pub use error::HttpError;
pub use net::TlsTrust;
pub use response::HttpResponse;
pub use uri::ParamMap;
