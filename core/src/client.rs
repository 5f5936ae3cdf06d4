/*
 * client.rs
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

//! Request descriptor and its fluent builder.
//!
//! `HttpClient::uri(raw)` repairs and strictly parses a raw URL into a
//! descriptor, then the returned builder accumulates configuration through
//! chained calls (query, headers, method, credentials, entity, TLS trust).
//! The builder consumes and returns itself, so branching a configuration
//! requires an explicit `build()` on the descriptor and branches never
//! alias. `invoke()` performs one blocking exchange and yields an
//! `HttpResponse`.

use std::collections::HashMap;
use std::io::Read;

use bytes::Bytes;

use crate::connection;
use crate::entity::Entity;
use crate::error::HttpError;
use crate::net::TlsTrust;
use crate::response::HttpResponse;
use crate::streams;
use crate::uri::{self, ParamMap};

/// Header names the client sets itself use this fixed casing.
pub const ACCEPT: &str = "Accept";
pub const CONTENT_TYPE: &str = "Content-Type";
pub(crate) const CONTENT_LENGTH: &str = "Content-Length";
pub(crate) const AUTHORIZATION: &str = "Authorization";

/// URL scheme. Anything else fails parsing with `InvalidUri`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Scheme::Https)
    }
}

/// HTTP request method. Default is GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }
}

/// Request descriptor: the full configuration of one HTTP call.
///
/// Created by parsing a URL, mutated only through the builder, consumed by
/// `invoke()` which never writes back into it. The two query maps always
/// hold the same key set; `query_encoded` carries wire form and
/// `query_unencoded` the decoded values.
#[derive(Debug, Clone)]
pub struct HttpClient {
    scheme: Scheme,
    host: String,
    port: Option<u16>,
    path: String,
    method: Method,
    username: Option<String>,
    password: Option<String>,
    headers: HashMap<String, Option<String>>,
    query_unencoded: ParamMap,
    query_encoded: ParamMap,
    entity: Option<Entity>,
    follow_redirects: bool,
    emit_content_length: bool,
    trust: TlsTrust,
}

impl HttpClient {
    /// Start building a request from a raw, possibly loosely formed URL.
    /// The URL is repaired with the query-codec fixup pass, then parsed
    /// strictly. This is the only way to create a descriptor.
    pub fn uri(raw: &str) -> Result<HttpClientBuilder, HttpError> {
        let client = Self::parse(raw, true)?;
        Ok(HttpClientBuilder { client })
    }

    /// Re-enter configuration from this descriptor. The builder works on a
    /// clone, so two builders branched from one descriptor never interfere.
    pub fn build(&self) -> HttpClientBuilder {
        HttpClientBuilder {
            client: self.clone(),
        }
    }

    /// Parse `scheme://host[:port][/path][?query]`. `apply_fixup` is false
    /// when the input is already wire form (redirect targets).
    pub(crate) fn parse(raw: &str, apply_fixup: bool) -> Result<HttpClient, HttpError> {
        let fixed = if apply_fixup {
            uri::fixup(raw)
        } else {
            raw.to_string()
        };

        // The query is split off at the last '?' before strict parsing.
        let (base, query) = match fixed.rfind('?') {
            Some(i) => (&fixed[..i], Some(&fixed[i + 1..])),
            None => (fixed.as_str(), None),
        };

        let sep = base
            .find("://")
            .ok_or_else(|| HttpError::invalid_uri(raw, "missing scheme separator"))?;
        let scheme = match base[..sep].to_ascii_lowercase().as_str() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(HttpError::invalid_uri(
                    raw,
                    format!("scheme must be http or https, got [{}]", other),
                ))
            }
        };

        let after = &base[sep + 3..];
        let (authority, path) = match after.find('/') {
            Some(i) => (&after[..i], &after[i..]),
            None => (after, ""),
        };
        let (host, port) = match authority.rsplit_once(':') {
            // "host:" has no port, like a URL with no colon at all
            Some((h, p)) if p.is_empty() => (h, None),
            Some((h, p)) => {
                let port = p
                    .parse::<u16>()
                    .map_err(|_| HttpError::invalid_uri(raw, format!("invalid port [{}]", p)))?;
                (h, Some(port))
            }
            None => (authority, None),
        };
        if host.is_empty() {
            return Err(HttpError::invalid_uri(raw, "missing host"));
        }

        let mut client = HttpClient {
            scheme,
            host: host.to_string(),
            port,
            path: path.to_string(),
            method: Method::default(),
            username: None,
            password: None,
            headers: HashMap::new(),
            query_unencoded: ParamMap::new(),
            query_encoded: ParamMap::new(),
            entity: None,
            follow_redirects: true,
            emit_content_length: false,
            trust: TlsTrust::Default,
        };
        client.parse_query(query);
        Ok(client)
    }

    /// Split a query string on `&`, each part on the first `=` only. A part
    /// with no `=`, or with an empty value, maps its name to no value. The
    /// URL's query is already wire form, so the encoded map takes the
    /// segments verbatim and the unencoded map decodes them.
    fn parse_query(&mut self, query: Option<&str>) {
        let Some(query) = query else { return };
        if query.is_empty() {
            return;
        }
        for part in query.split('&') {
            let (name, value) = match part.split_once('=') {
                Some((n, v)) if !v.is_empty() => (n, Some(v)),
                Some((n, _)) => (n, None),
                None => (part, None),
            };
            if name.is_empty() {
                continue;
            }
            self.query_encoded.insert(name, value.map(str::to_string));
            self.query_unencoded.insert(name, uri::decode(value));
        }
    }

    /// Descriptor for a redirect target. Absolute targets are parsed
    /// without fixup (the Location header is already wire form); relative
    /// targets replace path and query on a clone. A 303 demotes the method
    /// to GET and drops the entity.
    pub(crate) fn with_target(&self, location: &str, demote_to_get: bool) -> Result<HttpClient, HttpError> {
        let mut next = if location.starts_with("http://") || location.starts_with("https://") {
            let mut parsed = Self::parse(location, false)?;
            parsed.method = self.method;
            parsed.username = self.username.clone();
            parsed.password = self.password.clone();
            parsed.headers = self.headers.clone();
            parsed.entity = self.entity.clone();
            parsed.follow_redirects = self.follow_redirects;
            parsed.emit_content_length = self.emit_content_length;
            parsed.trust = self.trust.clone();
            parsed
        } else {
            let mut next = self.clone();
            let target = if location.starts_with('/') {
                location.to_string()
            } else {
                // relative to the directory of the current path
                let dir = match self.path.rfind('/') {
                    Some(i) => &self.path[..=i],
                    None => "/",
                };
                format!("{}{}", dir, location)
            };
            let (path, query) = match target.find('?') {
                Some(i) => (target[..i].to_string(), Some(target[i + 1..].to_string())),
                None => (target, None),
            };
            next.path = path;
            next.query_unencoded = ParamMap::new();
            next.query_encoded = ParamMap::new();
            next.parse_query(query.as_deref());
            next
        };
        if demote_to_get {
            next.method = Method::Get;
            next.entity = None;
        }
        Ok(next)
    }

    /// Render the canonical URI: `scheme://host[:port][path|/][?pairs]`.
    /// Pairs render in map order; a name with no value renders bare.
    pub fn uri_string(&self) -> String {
        let mut out = format!("{}://{}", self.scheme.as_str(), self.host);
        if let Some(port) = self.port {
            out.push(':');
            out.push_str(&port.to_string());
        }
        if self.path.is_empty() {
            out.push('/');
        } else {
            out.push_str(&self.path);
        }
        if !self.query_encoded.is_empty() {
            out.push('?');
            out.push_str(&self.render_query());
        }
        out
    }

    fn render_query(&self) -> String {
        let mut out = String::new();
        for (i, (name, value)) in self.query_encoded.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(name);
            if let Some(value) = value {
                out.push('=');
                out.push_str(value);
            }
        }
        out
    }

    /// Path plus rendered query, as written on the request line.
    pub(crate) fn request_target(&self) -> String {
        let mut out = if self.path.is_empty() {
            "/".to_string()
        } else {
            self.path.clone()
        };
        if !self.query_encoded.is_empty() {
            out.push('?');
            out.push_str(&self.render_query());
        }
        out
    }

    /// Invoke the exchange this descriptor describes. Blocks the calling
    /// task until the exchange completes or fails. A non-2xx status is a
    /// normal response, not an error.
    pub async fn invoke(&self) -> Result<HttpResponse, HttpError> {
        connection::execute(self).await
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, or `None` for the scheme default.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn headers(&self) -> &HashMap<String, Option<String>> {
        &self.headers
    }

    pub fn query_unencoded(&self) -> &ParamMap {
        &self.query_unencoded
    }

    pub fn query_encoded(&self) -> &ParamMap {
        &self.query_encoded
    }

    pub fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    /// Request entity as text; repeatable, `None` for absent or empty.
    pub fn entity_as_string(&self) -> Option<String> {
        self.entity.as_ref().and_then(|e| e.as_text())
    }

    /// Request entity bytes; repeatable, `None` for absent or empty.
    pub fn entity_as_bytes(&self) -> Option<Vec<u8>> {
        self.entity
            .as_ref()
            .and_then(|e| e.as_bytes())
            .map(|b| b.to_vec())
    }

    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    pub fn emit_content_length(&self) -> bool {
        self.emit_content_length
    }

    pub fn trust(&self) -> &TlsTrust {
        &self.trust
    }
}

/// Fluent configuration over a parsed descriptor. Every call consumes and
/// returns the builder, so a configuration chain owns its descriptor
/// exclusively.
#[derive(Debug)]
pub struct HttpClientBuilder {
    client: HttpClient,
}

impl HttpClientBuilder {
    /// Upsert a query parameter (unencoded input; the encoded mirror is
    /// derived). No-op for an empty name. The value may be absent.
    pub fn query(mut self, name: &str, value: Option<&str>) -> Self {
        if !name.is_empty() {
            self.client
                .query_unencoded
                .insert(name, value.map(str::to_string));
            self.client.query_encoded.insert(name, uri::encode(value));
        }
        self
    }

    /// Upsert a header. No-op for an empty name. A `None` value keeps the
    /// header present with no value.
    pub fn header(mut self, name: &str, value: Option<&str>) -> Self {
        if !name.is_empty() {
            self.client
                .headers
                .insert(name.to_string(), value.map(str::to_string));
        }
        self
    }

    /// Set the `Accept` header.
    pub fn accept(self, value: &str) -> Self {
        self.header(ACCEPT, Some(value))
    }

    /// Set the `Content-Type` header.
    pub fn content_type(self, value: &str) -> Self {
        self.header(CONTENT_TYPE, Some(value))
    }

    pub fn method(mut self, method: Method) -> Self {
        self.client.method = method;
        self
    }

    pub fn get(self) -> Self {
        self.method(Method::Get)
    }

    pub fn post(self) -> Self {
        self.method(Method::Post)
    }

    pub fn put(self) -> Self {
        self.method(Method::Put)
    }

    pub fn delete(self) -> Self {
        self.method(Method::Delete)
    }

    pub fn head(self) -> Self {
        self.method(Method::Head)
    }

    pub fn options(self) -> Self {
        self.method(Method::Options)
    }

    pub fn trace(self) -> Self {
        self.method(Method::Trace)
    }

    /// Set basic-auth credentials. Passing `None` for both clears them.
    /// Auth is applied at invocation time, not stored as a header.
    pub fn credentials(mut self, username: Option<&str>, password: Option<&str>) -> Self {
        self.client.username = username.map(str::to_string);
        self.client.password = password.map(str::to_string);
        self
    }

    fn install_entity(mut self, entity: Entity) -> Self {
        if self.client.emit_content_length {
            self.client
                .headers
                .insert(CONTENT_LENGTH.to_string(), Some(entity.len().to_string()));
        }
        self.client.entity = Some(entity);
        self
    }

    /// Set a text entity.
    pub fn entity_text(self, text: &str) -> Self {
        self.install_entity(Entity::from_text(text))
    }

    /// Set a byte entity, flagged binary or text.
    pub fn entity_bytes(self, bytes: impl Into<Bytes>, binary: bool) -> Self {
        self.install_entity(Entity::from_bytes(bytes, binary))
    }

    /// Capture an entity from a byte source. The source is drained fully so
    /// the entity can be re-read; a source that cannot be drained fails
    /// with `InvalidStream` before any builder state changes.
    pub fn entity_reader(self, source: &mut impl Read, binary: bool) -> Result<Self, HttpError> {
        let entity = Entity::from_reader(source, binary)?;
        Ok(self.install_entity(entity))
    }

    /// Supply a PEM trust bundle for this request. The bundle is captured
    /// now and parsed at invocation time; parse failures surface from
    /// `invoke()` as `Invocation`. The password accompanies store formats
    /// that need one; PEM bundles do not.
    pub fn key_store(mut self, source: &mut impl Read, password: Option<&str>) -> Result<Self, HttpError> {
        let pem = streams::read_fully(source).map_err(|e| {
            HttpError::InvalidStream(format!("trust store source not capturable: {}", e))
        })?;
        self.client.trust = TlsTrust::KeyStore {
            pem: Bytes::from(pem),
            password: password.map(str::to_string),
        };
        Ok(self)
    }

    /// Accept any server certificate and hostname for this request.
    pub fn trust_all(mut self) -> Self {
        self.client.trust = TlsTrust::TrustAll;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.client.follow_redirects = follow;
        self
    }

    /// When enabled, entity setters compute a `Content-Length` header from
    /// the captured entity length.
    pub fn set_content_length(mut self, emit: bool) -> Self {
        self.client.emit_content_length = emit;
        self
    }

    /// The descriptor this builder represents, for inspection or logging
    /// without invoking.
    pub fn to_http_client(self) -> HttpClient {
        self.client
    }

    /// Invoke the configured request.
    pub async fn invoke(self) -> Result<HttpResponse, HttpError> {
        self.client.invoke().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    fn fields(c: &HttpClient) -> (Scheme, String, Option<u16>, String, Vec<(String, Option<String>)>) {
        (
            c.scheme(),
            c.host().to_string(),
            c.port(),
            c.path().to_string(),
            c.query_encoded()
                .iter()
                .map(|(n, v)| (n.to_string(), v.map(str::to_string)))
                .collect(),
        )
    }

    #[test]
    fn parses_scheme_host_port_path() {
        let c = HttpClient::uri("https://example.com:8443/api/v1").unwrap().to_http_client();
        assert_eq!(c.scheme(), Scheme::Https);
        assert_eq!(c.host(), "example.com");
        assert_eq!(c.port(), Some(8443));
        assert_eq!(c.path(), "/api/v1");
        assert_eq!(c.method(), Method::Get);
    }

    #[test]
    fn absent_port_is_none_not_sentinel() {
        let c = HttpClient::uri("http://example.com/x").unwrap().to_http_client();
        assert_eq!(c.port(), None);
    }

    #[test]
    fn empty_port_segment_is_absent() {
        let c = HttpClient::uri("http://host:/x").unwrap().to_http_client();
        assert_eq!(c.host(), "host");
        assert_eq!(c.port(), None);
        assert_eq!(c.path(), "/x");
        let c = HttpClient::uri("http://host:").unwrap().to_http_client();
        assert_eq!(c.port(), None);
    }

    #[test]
    fn scheme_is_lowercased() {
        let c = HttpClient::uri("HTTP://host/").unwrap().to_http_client();
        assert_eq!(c.scheme(), Scheme::Http);
    }

    #[test]
    fn rejects_non_http_scheme_before_any_network() {
        let err = HttpClient::uri("htt://host").unwrap_err();
        assert!(matches!(err, HttpError::InvalidUri { .. }));
        let err = HttpClient::uri("ftp://host/file").unwrap_err();
        assert!(matches!(err, HttpError::InvalidUri { .. }));
    }

    #[test]
    fn rejects_missing_host_and_bad_port() {
        assert!(matches!(
            HttpClient::uri("http:///path"),
            Err(HttpError::InvalidUri { .. })
        ));
        assert!(matches!(
            HttpClient::uri("http://host:notaport/"),
            Err(HttpError::InvalidUri { .. })
        ));
        assert!(matches!(
            HttpClient::uri("no-separator"),
            Err(HttpError::InvalidUri { .. })
        ));
    }

    #[test]
    fn builder_results_are_debug_inspectable() {
        // both arms of the uri() result format for diagnostics
        let ok = HttpClient::uri("http://host/");
        assert!(format!("{:?}", ok).contains("HttpClientBuilder"));
        let err = HttpClient::uri("htt://host");
        assert!(format!("{:?}", err).contains("InvalidUri"));
    }

    #[test]
    fn invalid_uri_carries_input() {
        match HttpClient::uri("htt://host") {
            Err(HttpError::InvalidUri { input, .. }) => assert_eq!(input, "htt://host"),
            other => panic!("expected InvalidUri, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn bare_query_key_maps_to_no_value() {
        let c = HttpClient::uri("http://host/?qp").unwrap().to_http_client();
        assert_eq!(c.query_encoded().get("qp"), Some(None));
        assert_eq!(c.query_unencoded().get("qp"), Some(None));
    }

    #[test]
    fn empty_query_value_normalizes_to_no_value() {
        let c = HttpClient::uri("http://host/?qp=").unwrap().to_http_client();
        assert_eq!(c.query_encoded().get("qp"), Some(None));
        assert_eq!(c.query_unencoded().get("qp"), Some(None));
    }

    #[test]
    fn query_value_may_contain_equals() {
        let c = HttpClient::uri("http://host/?f=a=b").unwrap().to_http_client();
        assert_eq!(c.query_encoded().get("f"), Some(Some("a=b")));
    }

    #[test]
    fn query_maps_share_key_set() {
        let c = HttpClient::uri("http://host/?a=1&b&c=x%20y")
            .unwrap()
            .query("d", Some("v v"))
            .to_http_client();
        let enc: Vec<_> = c.query_encoded().iter().map(|(n, _)| n.to_string()).collect();
        let unenc: Vec<_> = c.query_unencoded().iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(enc, unenc);
        assert_eq!(c.query_unencoded().get("c"), Some(Some("x y")));
        assert_eq!(c.query_encoded().get("d"), Some(Some("v+v")));
    }

    #[test]
    fn renders_spaces_as_plus() {
        let c = HttpClient::uri("http://host/context/longer/?qp=value with spaces")
            .unwrap()
            .to_http_client();
        assert_eq!(
            c.uri_string(),
            "http://host/context/longer/?qp=value+with+spaces"
        );
    }

    #[test]
    fn parsed_query_order_is_source_order() {
        let c = HttpClient::uri("http://host/p?qp=value with spaces&qp2=value2")
            .unwrap()
            .to_http_client();
        assert_eq!(c.uri_string(), "http://host/p?qp=value+with+spaces&qp2=value2");
    }

    #[test]
    fn builder_query_appends_in_call_order() {
        let c = HttpClient::uri("http://host/?first=1")
            .unwrap()
            .query("second", Some("2"))
            .query("third", None)
            .query("first", Some("override"))
            .to_http_client();
        assert_eq!(c.uri_string(), "http://host/?first=override&second=2&third");
    }

    #[test]
    fn missing_path_renders_root() {
        let c = HttpClient::uri("http://host?a=1").unwrap().to_http_client();
        assert_eq!(c.path(), "");
        assert_eq!(c.uri_string(), "http://host/?a=1");
    }

    #[test]
    fn parse_render_parse_is_idempotent() {
        for url in [
            "http://host/context/longer/?qp=value with spaces&qp2=value2",
            "https://example.com:8443/api?x&y=1",
            "http://host/",
        ] {
            let once = HttpClient::uri(url).unwrap().to_http_client();
            let twice = HttpClient::uri(&once.uri_string()).unwrap().to_http_client();
            assert_eq!(fields(&once), fields(&twice), "not idempotent for {}", url);
            // rendering is now a fixed point
            assert_eq!(once.uri_string(), twice.uri_string());
        }
        // a pathless URL renders with the root path, which then sticks
        let bare = HttpClient::uri("http://host").unwrap().to_http_client();
        assert_eq!(bare.uri_string(), "http://host/");
        let again = HttpClient::uri(&bare.uri_string()).unwrap().to_http_client();
        assert_eq!(again.uri_string(), "http://host/");
    }

    #[test]
    fn empty_names_are_noops() {
        let c = HttpClient::uri("http://host/")
            .unwrap()
            .query("", Some("dropped"))
            .header("", Some("dropped"))
            .to_http_client();
        assert!(c.query_encoded().is_empty());
        assert!(c.headers().is_empty());
    }

    #[test]
    fn header_upserts_last_write_wins() {
        let c = HttpClient::uri("http://host/")
            .unwrap()
            .header("X-Id", Some("one"))
            .header("X-Id", Some("two"))
            .header("X-Empty", None)
            .accept("application/json")
            .content_type("text/plain")
            .to_http_client();
        assert_eq!(c.headers()["X-Id"], Some("two".to_string()));
        assert_eq!(c.headers()["X-Empty"], None);
        assert_eq!(c.headers()[ACCEPT], Some("application/json".to_string()));
        assert_eq!(c.headers()[CONTENT_TYPE], Some("text/plain".to_string()));
    }

    #[test]
    fn method_shorthands() {
        let base = HttpClient::uri("http://host/").unwrap().to_http_client();
        assert_eq!(base.build().post().to_http_client().method(), Method::Post);
        assert_eq!(base.build().put().to_http_client().method(), Method::Put);
        assert_eq!(base.build().delete().to_http_client().method(), Method::Delete);
        assert_eq!(base.build().head().to_http_client().method(), Method::Head);
        assert_eq!(base.build().options().to_http_client().method(), Method::Options);
        assert_eq!(base.build().trace().to_http_client().method(), Method::Trace);
        assert_eq!(base.build().get().to_http_client().method(), Method::Get);
    }

    #[test]
    fn credentials_set_and_clear() {
        let c = HttpClient::uri("http://host/")
            .unwrap()
            .credentials(Some("user"), Some("pass"))
            .to_http_client();
        assert_eq!(c.username(), Some("user"));
        assert_eq!(c.password(), Some("pass"));
        let cleared = c.build().credentials(None, None).to_http_client();
        assert_eq!(cleared.username(), None);
        assert_eq!(cleared.password(), None);
    }

    #[test]
    fn entity_is_rereadable() {
        let c = HttpClient::uri("http://host/")
            .unwrap()
            .entity_text("same text twice")
            .to_http_client();
        assert_eq!(c.entity_as_string().unwrap(), "same text twice");
        assert_eq!(c.entity_as_string().unwrap(), "same text twice");
        assert_eq!(c.entity_as_bytes().unwrap(), b"same text twice");
    }

    struct OneShotReader;

    impl Read for OneShotReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "cannot rewind"))
        }
    }

    #[test]
    fn uncapturable_entity_source_fails_fast() {
        let err = HttpClient::uri("http://host/")
            .unwrap()
            .entity_reader(&mut OneShotReader, true)
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidStream(_)));
    }

    #[test]
    fn entity_reader_captures() {
        let c = HttpClient::uri("http://host/")
            .unwrap()
            .entity_reader(&mut Cursor::new(b"bytes".to_vec()), false)
            .unwrap()
            .to_http_client();
        assert_eq!(c.entity_as_string().unwrap(), "bytes");
    }

    #[test]
    fn content_length_computed_when_enabled() {
        let c = HttpClient::uri("http://host/")
            .unwrap()
            .set_content_length(true)
            .entity_text("12345")
            .to_http_client();
        assert_eq!(c.headers()["Content-Length"], Some("5".to_string()));

        // flag off: no header
        let c = HttpClient::uri("http://host/")
            .unwrap()
            .entity_text("12345")
            .to_http_client();
        assert!(!c.headers().contains_key("Content-Length"));
    }

    #[test]
    fn trust_configuration() {
        let c = HttpClient::uri("https://host/").unwrap().to_http_client();
        assert!(matches!(c.trust(), TlsTrust::Default));
        let c = c.build().trust_all().to_http_client();
        assert!(matches!(c.trust(), TlsTrust::TrustAll));
        let c = HttpClient::uri("https://host/")
            .unwrap()
            .key_store(&mut Cursor::new(b"-----BEGIN CERTIFICATE-----".to_vec()), Some("pw"))
            .unwrap()
            .to_http_client();
        assert!(matches!(c.trust(), TlsTrust::KeyStore { .. }));
    }

    #[test]
    fn branched_builders_do_not_interfere() {
        let base = HttpClient::uri("http://host/?a=1").unwrap().to_http_client();
        let left = base.build().query("left", Some("l")).to_http_client();
        let right = base.build().query("right", Some("r")).to_http_client();
        assert!(left.query_encoded().contains("left"));
        assert!(!left.query_encoded().contains("right"));
        assert!(right.query_encoded().contains("right"));
        assert!(!right.query_encoded().contains("left"));
        assert_eq!(base.query_encoded().len(), 1);
    }

    #[test]
    fn redirect_target_resolution() {
        let base = HttpClient::uri("http://host/a/b?q=1")
            .unwrap()
            .post()
            .entity_text("body")
            .to_http_client();

        let abs = base.with_target("https://other:9443/new?z=2", false).unwrap();
        assert_eq!(abs.scheme(), Scheme::Https);
        assert_eq!(abs.host(), "other");
        assert_eq!(abs.port(), Some(9443));
        assert_eq!(abs.path(), "/new");
        assert_eq!(abs.method(), Method::Post);
        assert!(abs.entity().is_some());

        let rooted = base.with_target("/moved", false).unwrap();
        assert_eq!(rooted.host(), "host");
        assert_eq!(rooted.path(), "/moved");
        assert!(rooted.query_encoded().is_empty());

        let relative = base.with_target("c", false).unwrap();
        assert_eq!(relative.path(), "/a/c");

        let demoted = base.with_target("/see-other", true).unwrap();
        assert_eq!(demoted.method(), Method::Get);
        assert!(demoted.entity().is_none());
    }

    #[test]
    fn request_target_defaults_to_root() {
        let c = HttpClient::uri("http://host").unwrap().to_http_client();
        assert_eq!(c.request_target(), "/");
        let c = HttpClient::uri("http://host/p?a=1").unwrap().to_http_client();
        assert_eq!(c.request_target(), "/p?a=1");
    }
}
