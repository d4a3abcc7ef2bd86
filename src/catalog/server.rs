// tiny http/1.1 server for the catalog: one connection at a time, every
// response is `Connection: close`. routes:
//   GET  /api/sounds        json array of sound file names
//   GET  /sounds/<file>     the file's bytes, untouched
//   HEAD /sounds/<file>     same headers, no body
//   OPTIONS *               cors preflight
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;

use super::list_sounds;

pub const CATALOG_PATH: &str = "/api/sounds";
pub const SOUNDS_PATH: &str = "/sounds/";
pub const READ_ERROR: &str = "Unable to read sounds directory";

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REQUEST_HEAD: u64 = 16 * 1024;

pub struct CatalogServer {
    listener: TcpListener,
    sounds_dir: PathBuf,
}

impl CatalogServer {
    pub fn bind(addr: SocketAddr, sounds_dir: PathBuf) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .with_context(|| format!("binding catalog service to {addr}"))?;
        Ok(Self {
            listener,
            sounds_dir,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    // blocks forever; a bad connection is logged and dropped, never fatal
    pub fn serve(self) -> anyhow::Result<()> {
        log::info!(
            "catalog service on http://{} serving {}",
            self.local_addr()?,
            self.sounds_dir.display()
        );
        for stream in self.listener.incoming() {
            match stream {
                Ok(mut stream) => {
                    if let Err(e) = self.handle_connection(&mut stream) {
                        log::warn!("catalog connection failed: {e}");
                    }
                }
                Err(e) => log::warn!("catalog accept failed: {e}"),
            }
        }
        Ok(())
    }

    pub fn spawn(self) -> anyhow::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name(String::from("catalog"))
            .spawn(move || {
                if let Err(e) = self.serve() {
                    log::error!("catalog service stopped: {e:#}");
                }
            })
            .context("spawning catalog thread")
    }

    fn handle_connection(&self, stream: &mut TcpStream) -> io::Result<()> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let request_line = read_request_head(stream)?;
        let response = match parse_request_line(&request_line) {
            Some((method, target)) => {
                log::debug!("{method} {target}");
                self.route(method, target)
            }
            None => Response::text(400, "bad request"),
        };
        response.write_to(stream)
    }

    fn route(&self, method: &str, target: &str) -> Response {
        let (path, _query) = split_path_and_query(target);
        let is_sound_path = path.starts_with(SOUNDS_PATH);
        match (method, path) {
            ("OPTIONS", _) => Response::preflight(),
            ("GET", CATALOG_PATH) => self.catalog(),
            ("GET", _) if is_sound_path => self.sound_file(&path[SOUNDS_PATH.len()..]),
            ("HEAD", _) if is_sound_path => self.sound_file(&path[SOUNDS_PATH.len()..]).head_only(),
            (_, CATALOG_PATH) => Response::text(405, "method not allowed"),
            (_, _) if is_sound_path => Response::text(405, "method not allowed"),
            _ => Response::text(404, "not found"),
        }
    }

    fn catalog(&self) -> Response {
        match list_sounds(&self.sounds_dir) {
            Ok(sounds) => Response::json(200, serde_json::json!(sounds)),
            Err(e) => {
                log::error!("listing {}: {e}", self.sounds_dir.display());
                Response::json(500, serde_json::json!({ "error": READ_ERROR }))
            }
        }
    }

    fn sound_file(&self, raw_name: &str) -> Response {
        let Some(name) = percent_decode(raw_name) else {
            return Response::text(404, "not found");
        };
        // only plain names directly under the sounds dir; dotfiles stay hidden
        if name.is_empty()
            || name.starts_with('.')
            || name.contains("..")
            || name.contains(['/', '\\', '\0'])
        {
            return Response::text(404, "not found");
        }
        let path = self.sounds_dir.join(&name);
        if !path.is_file() {
            return Response::text(404, "not found");
        }
        match std::fs::read(&path) {
            Ok(bytes) => Response::bytes(200, content_type_for(&name), bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Response::text(404, "not found"),
            Err(e) => {
                log::error!("reading {}: {e}", path.display());
                Response::text(500, "unable to read sound file")
            }
        }
    }
}

pub fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".wav") {
        "audio/wav"
    } else if name.ends_with(".mp3") {
        "audio/mpeg"
    } else {
        "application/octet-stream"
    }
}

#[derive(Debug)]
struct Response {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    head_only: bool,
    extra_headers: &'static [(&'static str, &'static str)],
}

impl Response {
    fn bytes(status: u16, content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
            head_only: false,
            extra_headers: &[],
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self::bytes(status, "text/plain; charset=utf-8", body.as_bytes().to_vec())
    }

    fn json(status: u16, value: serde_json::Value) -> Self {
        Self::bytes(status, "application/json; charset=utf-8", value.to_string().into_bytes())
    }

    fn preflight() -> Self {
        Self {
            extra_headers: &[
                ("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS"),
                ("Access-Control-Allow-Headers", "*"),
            ],
            ..Self::bytes(204, "text/plain; charset=utf-8", Vec::new())
        }
    }

    fn head_only(mut self) -> Self {
        self.head_only = true;
        self
    }

    fn write_to(&self, stream: &mut impl Write) -> io::Result<()> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Connection: close\r\n",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len(),
        );
        for (name, value) in self.extra_headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("\r\n");

        stream.write_all(head.as_bytes())?;
        if !self.head_only {
            stream.write_all(&self.body)?;
        }
        stream.flush()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

// request line only; the remaining headers are read and ignored
fn read_request_head(stream: &TcpStream) -> io::Result<String> {
    let mut reader = BufReader::new(stream.take(MAX_REQUEST_HEAD));
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header)? == 0 || header.trim_end().is_empty() {
            break;
        }
    }
    Ok(request_line)
}

fn parse_request_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    Some((method, target))
}

fn split_path_and_query(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

fn percent_decode(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            // exactly two hex digits; from_str_radix alone would take a sign
            let hex = value.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
