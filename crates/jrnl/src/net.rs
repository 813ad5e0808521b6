//! Minimal HTTP/1.1 GET client over tokio, with optional TLS

use std::io;
use std::time::Duration;

use bytes::Bytes;
use journalcache::{Error, Fetcher, Request, Response, Result};
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::tls::TlsConfig;

const HTTP_PORT: u16 = 80;
const HTTPS_PORT: u16 = 443;
const HTTPS_PREFIX: &str = "https://";
const HTTP_PREFIX: &str = "http://";

/// Parts of an absolute URL needed to issue a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub tls: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Target {
    /// `Host` header value
    fn authority(&self) -> String {
        let default_port = if self.tls { HTTPS_PORT } else { HTTP_PORT };
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Split an absolute `http://` or `https://` URL
pub fn parse_url(url: &str) -> std::result::Result<Target, String> {
    let (tls, rest) = if let Some(rest) = url.strip_prefix(HTTPS_PREFIX) {
        (true, rest)
    } else if let Some(rest) = url.strip_prefix(HTTP_PREFIX) {
        (false, rest)
    } else {
        return Err("unsupported scheme".to_string());
    };

    // The fragment never goes on the wire
    let rest = rest.split('#').next().unwrap_or_default();
    let (authority, path) = match rest.find(|c| c == '/' || c == '?') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    let path = if path.starts_with('?') {
        format!("/{}", path)
    } else {
        path.to_string()
    };

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().map_err(|_| format!("invalid port {:?}", port))?;
            (host, port)
        }
        None => (authority, if tls { HTTPS_PORT } else { HTTP_PORT }),
    };
    if host.is_empty() {
        return Err("missing host".to_string());
    }

    Ok(Target {
        tls,
        host: host.to_string(),
        port,
        path,
    })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn decode_chunked(mut body: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut out = Vec::new();
    loop {
        let line_end = find_subslice(body, b"\r\n").ok_or("truncated chunk size")?;
        let size_line = String::from_utf8_lossy(&body[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| format!("invalid chunk size {:?}", size_hex))?;
        body = &body[line_end + 2..];

        if size == 0 {
            return Ok(out);
        }
        // Chunk data plus its CRLF
        if body.len().saturating_sub(2) < size {
            return Err("truncated chunk".to_string());
        }
        out.extend_from_slice(&body[..size]);
        body = &body[size + 2..];
    }
}

/// Parse a complete HTTP/1.x response
pub fn parse_response(raw: &[u8]) -> std::result::Result<Response, String> {
    let head_end = find_subslice(raw, b"\r\n\r\n").ok_or("incomplete response head")?;
    let head = String::from_utf8_lossy(&raw[..head_end]);
    let body = &raw[head_end + 4..];

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let mut parts = status_line.split_whitespace();
    match parts.next() {
        Some(version) if version.starts_with("HTTP/1.") => {}
        _ => return Err(format!("invalid status line {:?}", status_line)),
    }
    let status: u16 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("invalid status line {:?}", status_line))?;

    let mut headers = Vec::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let header = |name: &str| {
        headers
            .iter()
            .find(|(n, _): &&(String, String)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    };

    let body = if header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked")) {
        decode_chunked(body)?
    } else if let Some(len) = header("content-length") {
        let len: usize = len.parse().map_err(|_| format!("invalid content-length {:?}", len))?;
        if body.len() < len {
            return Err(format!("body truncated: {} of {} bytes", body.len(), len));
        }
        body[..len].to_vec()
    } else {
        body.to_vec()
    };

    Ok(headers
        .into_iter()
        .fold(Response::new(status, Bytes::from(body)), |resp, (n, v)| {
            resp.with_header(n, v)
        }))
}

async fn exchange<S>(stream: &mut S, target: &Target) -> io::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: jrnl/{}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
        target.path,
        target.authority(),
        env!("CARGO_PKG_VERSION"),
    );
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    let mut buffer = Vec::new();
    match stream.read_to_end(&mut buffer).await {
        Ok(_) => Ok(buffer),
        // Servers often close TLS without close_notify once the body is sent
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !buffer.is_empty() => Ok(buffer),
        Err(e) => Err(e),
    }
}

/// Live network access for the offline cache and the entry loader
pub struct HttpFetcher {
    tls: TlsConfig,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(tls: TlsConfig, timeout: Duration) -> Self {
        Self { tls, timeout }
    }

    async fn get(&self, url: &str, target: &Target) -> Result<Response> {
        let mut stream = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|e| Error::network(url, e))?;

        let exchanged = if target.tls {
            let connector = self
                .tls
                .connector()
                .ok_or_else(|| Error::network(url, "TLS is not configured"))?;
            let name =
                ServerName::try_from(target.host.clone()).map_err(|e| Error::network(url, e))?;
            let mut tls_stream = connector
                .connect(name, stream)
                .await
                .map_err(|e| Error::network(url, e))?;
            exchange(&mut tls_stream, target).await
        } else {
            exchange(&mut stream, target).await
        };
        let raw = exchanged.map_err(|e| Error::network(url, e))?;

        parse_response(&raw).map_err(|e| Error::network(url, e))
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let url = request.url();
        let target = parse_url(url).map_err(|e| Error::network(url, e))?;
        debug!("GET {}", url);

        let response = tokio::time::timeout(self.timeout, self.get(url, &target))
            .await
            .map_err(|_| Error::network(url, "timed out"))??;
        debug!("{} -> {}", url, response.status());
        Ok(response)
    }
}
