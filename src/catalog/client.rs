// just enough http to talk to our own catalog service on startup and when a
// pad gets a sound. one request per connection, response read until close.
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use super::server::CATALOG_PATH;
use crate::pipeline::project::SoundRef;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const IO_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, PartialEq)]
struct HttpResponse {
    status: u16,
    body: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct CatalogClient {
    addr: SocketAddr,
}

impl CatalogClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn fetch_catalog(&self) -> anyhow::Result<Vec<String>> {
        let response = self.get(CATALOG_PATH)?;
        if response.status != 200 {
            anyhow::bail!(
                "catalog request failed ({}): {}",
                response.status,
                error_message(&response.body)
            );
        }
        serde_json::from_slice(&response.body)
            .context("catalog response is not a list of file names")
    }

    pub fn fetch_sound(&self, sound: &SoundRef) -> anyhow::Result<Vec<u8>> {
        let response = self.get(&encode_path(sound.as_str()))?;
        if response.status != 200 {
            anyhow::bail!(
                "fetching {sound} failed ({}): {}",
                response.status,
                error_message(&response.body)
            );
        }
        Ok(response.body)
    }

    fn get(&self, path: &str) -> anyhow::Result<HttpResponse> {
        let mut stream = TcpStream::connect_timeout(&self.addr, CONNECT_TIMEOUT)
            .with_context(|| format!("connecting to catalog service at {}", self.addr))?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;

        let request = format!(
            "GET {path} HTTP/1.1\r\nHost: {}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
            self.addr
        );
        stream.write_all(request.as_bytes())?;
        stream.flush()?;

        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .with_context(|| format!("reading response for {path}"))?;
        parse_response(&raw)
    }
}

/// Startup/retry path: a catalog we can't load is logged and treated as empty.
pub fn load_catalog(client: &CatalogClient) -> Vec<String> {
    match client.fetch_catalog() {
        Ok(sounds) => {
            log::info!("loaded {} sounds from {}", sounds.len(), client.addr());
            sounds
        }
        Err(e) => {
            log::error!("Error loading sounds: {e:#}");
            Vec::new()
        }
    }
}

fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned())
}

fn parse_response(raw: &[u8]) -> anyhow::Result<HttpResponse> {
    let head_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .context("malformed http response: no end of headers")?;
    let head = String::from_utf8_lossy(&raw[..head_end]);
    let mut lines = head.lines();

    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .context("malformed http status line")?;

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok());

    let mut body = raw[head_end + 4..].to_vec();
    if let Some(len) = content_length {
        if body.len() < len {
            anyhow::bail!("truncated response: expected {len} bytes, got {}", body.len());
        }
        body.truncate(len);
    }
    Ok(HttpResponse { status, body })
}

// percent-encode everything but unreserved characters and '/'
fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for b in path.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b'/') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
