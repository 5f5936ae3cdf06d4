/*
 * connection.rs
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

//! Transport invocation: one TCP or TLS stream per exchange, HTTP/1.1 on
//! the wire, redirects followed here when enabled. Every exit path drops
//! the stream before returning. A TLS handshake rejected on certificate
//! grounds surfaces as `Certificate`; every other failure as `Invocation`.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::BytesMut;
use log::debug;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tokio_rustls::TlsConnector;

use crate::client::{HttpClient, Method, AUTHORIZATION, CONTENT_LENGTH};
use crate::error::HttpError;
use crate::h1::{BodyFraming, ParsePhase, ReplyParser, ReplySink};
use crate::net;
use crate::response::HttpResponse;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: usize = 10;

/// Unified stream: plain TCP or TLS.
enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Raw reply as captured off the wire, before normalization.
struct RawReply {
    status: u16,
    reason: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

#[derive(Default)]
struct Collector {
    status: Option<(u16, Option<String>)>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ReplySink for Collector {
    fn status(&mut self, code: u16, reason: Option<&str>) {
        self.status = Some((code, reason.map(|s| s.to_string())));
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn body_chunk(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }
}

/// Execute the exchange a descriptor describes, following redirects when
/// enabled. The returned response refers back to the original descriptor,
/// not to any intermediate redirect hop.
pub(crate) async fn execute(client: &HttpClient) -> Result<HttpResponse, HttpError> {
    let mut current = client.clone();
    let mut hops = 0usize;
    loop {
        let reply = exchange(&current).await?;
        let redirect = matches!(reply.status, 301 | 302 | 303 | 307 | 308);
        if redirect && current.follow_redirects() {
            let location = reply
                .headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case("Location"))
                .map(|(_, v)| v.clone());
            if let Some(location) = location {
                hops += 1;
                if hops > MAX_REDIRECTS {
                    return Err(HttpError::Invocation(io::Error::new(
                        io::ErrorKind::Other,
                        format!("redirect limit of {} exceeded", MAX_REDIRECTS),
                    )));
                }
                debug!("redirect {} -> {}", reply.status, location);
                // a bad Location is a failure of the exchange, not of parsing
                current = current
                    .with_target(&location, reply.status == 303)
                    .map_err(|e| {
                        HttpError::Invocation(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("unusable redirect target [{}]: {}", location, e),
                        ))
                    })?;
                continue;
            }
        }
        return Ok(HttpResponse::assemble(
            client.clone(),
            reply.status,
            reply.reason,
            reply.headers,
            reply.body,
        ));
    }
}

/// One request/response cycle on a fresh connection. The stream is dropped
/// before returning on every path.
async fn exchange(client: &HttpClient) -> Result<RawReply, HttpError> {
    let mut stream = connect(client).await?;
    let outcome = run_exchange(client, &mut stream).await;
    // release the connection unconditionally
    let _ = stream.shutdown().await;
    outcome.map_err(HttpError::Invocation)
}

async fn connect(client: &HttpClient) -> Result<HttpStream, HttpError> {
    let host = client.host();
    let port = client.port().unwrap_or(client.scheme().default_port());
    let addr = format!("{}:{}", host, port);
    debug!("connecting to {}", addr);
    let tcp = timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
        .await
        .map_err(|_| {
            HttpError::Invocation(io::Error::new(io::ErrorKind::TimedOut, "TCP connect timed out"))
        })?
        .map_err(HttpError::Invocation)?;

    if !client.scheme().is_secure() {
        return Ok(HttpStream::Plain(tcp));
    }

    let config = net::client_config(client.trust()).map_err(HttpError::Invocation)?;
    let server_name = ServerName::try_from(host.to_string()).map_err(|_| {
        HttpError::Invocation(io::Error::new(io::ErrorKind::InvalidInput, "invalid host name"))
    })?;
    let tls = TlsConnector::from(config)
        .connect(server_name, tcp)
        .await
        .map_err(classify_handshake_failure)?;
    debug!("TLS handshake complete with {}", host);
    Ok(HttpStream::Tls(Box::new(tls)))
}

/// A handshake refused on certificate grounds is a trust problem, reported
/// as `Certificate` so callers can special-case it. Everything else stays
/// generic.
fn classify_handshake_failure(e: io::Error) -> HttpError {
    let cert_problem = e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        .map(|tls| matches!(tls, rustls::Error::InvalidCertificate(_)))
        .unwrap_or(false);
    if cert_problem {
        HttpError::Certificate(e)
    } else {
        HttpError::Invocation(e)
    }
}

async fn run_exchange(client: &HttpClient, stream: &mut HttpStream) -> io::Result<RawReply> {
    write_request(client, stream).await?;
    read_reply(client, stream).await
}

async fn write_request(client: &HttpClient, stream: &mut HttpStream) -> io::Result<()> {
    let port = client.port().unwrap_or(client.scheme().default_port());
    let host_header = if port == client.scheme().default_port() {
        client.host().to_string()
    } else {
        format!("{}:{}", client.host(), port)
    };

    let mut head = format!(
        "{} {} HTTP/1.1\r\n",
        client.method().as_str(),
        client.request_target()
    );
    // a caller-stored Host header replaces the synthesized one
    let host_overridden = client
        .headers()
        .keys()
        .any(|n| n.eq_ignore_ascii_case("Host"));
    if !host_overridden {
        head.push_str("Host: ");
        head.push_str(&host_header);
        head.push_str("\r\n");
    }
    head.push_str("Connection: close\r\n");

    // basic auth from credentials; a missing password is an empty one
    if let Some(username) = client.username() {
        if !username.is_empty() {
            let userpass = format!("{}:{}", username, client.password().unwrap_or(""));
            head.push_str(AUTHORIZATION);
            head.push_str(": Basic ");
            head.push_str(&BASE64.encode(userpass.as_bytes()));
            head.push_str("\r\n");
        }
    }

    for (name, value) in client.headers() {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value.as_deref().unwrap_or(""));
        head.push_str("\r\n");
    }

    let use_chunked = client.entity().is_some() && !client.headers().contains_key(CONTENT_LENGTH);
    if use_chunked {
        head.push_str("Transfer-Encoding: chunked\r\n");
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).await?;

    if let Some(entity) = client.entity() {
        let body = entity.raw();
        if use_chunked {
            stream
                .write_all(format!("{:x}\r\n", body.len()).as_bytes())
                .await?;
            stream.write_all(&body).await?;
            stream.write_all(b"\r\n0\r\n\r\n").await?;
        } else {
            stream.write_all(&body).await?;
        }
    }
    stream.flush().await?;
    debug!(
        "wrote {} {} ({} entity bytes)",
        client.method().as_str(),
        client.request_target(),
        client.entity().map(|e| e.len()).unwrap_or(0)
    );
    Ok(())
}

async fn read_reply(client: &HttpClient, stream: &mut HttpStream) -> io::Result<RawReply> {
    let mut parser = ReplyParser::new();
    let mut collector = Collector::default();
    let mut buf = BytesMut::with_capacity(8192);
    let mut framing_set = false;

    loop {
        let mut page = [0u8; 8192];
        let n = stream.read(&mut page).await?;
        if n == 0 {
            if parser.finish_on_close() {
                break;
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before response completed",
            ));
        }
        buf.extend_from_slice(&page[..n]);

        parser.receive(&mut buf, &mut collector)?;

        if parser.phase() == ParsePhase::AwaitingBody && !framing_set {
            framing_set = true;
            let framing = pick_framing(client, &collector);
            parser.set_body_framing(framing);
            parser.receive(&mut buf, &mut collector)?;
        }

        if parser.phase() == ParsePhase::Done {
            break;
        }
    }

    let (status, reason) = collector.status.take().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "no status line in response")
    })?;
    debug!("response {} with {} body bytes", status, collector.body.len());
    Ok(RawReply {
        status,
        reason,
        headers: collector.headers,
        body: collector.body,
    })
}

fn pick_framing(client: &HttpClient, collector: &Collector) -> BodyFraming {
    let status = collector.status.as_ref().map(|(code, _)| *code).unwrap_or(0);
    if client.method() == Method::Head || status == 204 || status == 304 || (100..200).contains(&status) {
        return BodyFraming::None;
    }
    let chunked = collector.headers.iter().any(|(n, v)| {
        n.eq_ignore_ascii_case("Transfer-Encoding") && v.to_ascii_lowercase().contains("chunked")
    });
    if chunked {
        return BodyFraming::Chunked;
    }
    let content_length = collector
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, v)| v.trim().parse::<u64>().ok());
    match content_length {
        Some(n) => BodyFraming::Length(n),
        None => BodyFraming::UntilClose,
    }
}
