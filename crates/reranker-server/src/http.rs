use std::io::{self, BufRead, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use serde_json::{json, Value};

/// Upper bound for the request line plus all header lines.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

const MAX_DISCARD_BYTES: usize = 1024 * 1024;
const DISCARD_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug)]
pub enum Inbound {
    Request(HttpRequest),
    /// Declared body exceeds the limit; at most `MAX_DISCARD_BYTES` of it were drained.
    TooLarge {
        method: String,
        path: String,
        content_length: usize,
    },
    /// No blank line within `MAX_HEAD_BYTES`.
    HeadTooLarge,
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json(status: u16, value: &Value) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    pub fn error(status: u16, code: &str, message: impl Into<String>) -> Self {
        Self::json(status, &json!({"error": code, "message": message.into()}))
    }
}

enum Head {
    Closed,
    TooLarge,
    Lines(Vec<String>),
}

fn read_head<R: BufRead>(reader: R) -> io::Result<Head> {
    let mut limited = reader.take(MAX_HEAD_BYTES as u64);
    let mut lines = Vec::new();
    loop {
        let mut raw = String::new();
        let read = limited.read_line(&mut raw)?;
        if !raw.ends_with('\n') && limited.limit() == 0 {
            return Ok(Head::TooLarge);
        }
        let line = raw.trim_end_matches(['\r', '\n']);
        if read == 0 || line.is_empty() {
            break;
        }
        lines.push(line.to_string());
    }
    if lines.is_empty() {
        Ok(Head::Closed)
    } else {
        Ok(Head::Lines(lines))
    }
}

/// Reads and drops pending request bytes so closing the socket does not reset
/// the connection before the client sees the response.
fn discard_pending<R: Read>(stream: &TcpStream, reader: R, limit: usize) {
    if stream.set_read_timeout(Some(DISCARD_TIMEOUT)).is_ok() {
        let _ = io::copy(&mut reader.take(limit as u64), &mut io::sink());
    }
}

/// Drops whatever the client has already sent, without waiting for more.
pub fn drain_available(stream: &TcpStream) {
    if stream.set_nonblocking(true).is_err() {
        return;
    }
    let mut buf = [0_u8; 8192];
    let mut remaining = MAX_DISCARD_BYTES;
    let mut reader = stream;
    while remaining > 0 {
        match reader.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => remaining = remaining.saturating_sub(n),
        }
    }
}

pub fn read_http_request(stream: &TcpStream, max_body_bytes: usize) -> io::Result<Option<Inbound>> {
    let mut reader = io::BufReader::new(stream.try_clone()?);
    let lines = match read_head(reader.by_ref())? {
        Head::Closed => return Ok(None),
        Head::TooLarge => {
            discard_pending(stream, reader, MAX_DISCARD_BYTES);
            return Ok(Some(Inbound::HeadTooLarge));
        }
        Head::Lines(lines) => lines,
    };

    let mut lines = lines.into_iter();
    let first = lines.next().unwrap_or_default();
    let mut parts = first.split_whitespace();
    let Some(method) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing method)",
        ));
    };
    let Some(target) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing path)",
        ));
    };
    let path = target
        .split_once('?')
        .map_or(target, |(path, _)| path)
        .to_string();

    let mut content_length = 0usize;
    for header in lines {
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidData, "invalid content-length header")
                })?;
            }
        }
    }

    if content_length > max_body_bytes {
        discard_pending(stream, reader, content_length.min(MAX_DISCARD_BYTES));
        return Ok(Some(Inbound::TooLarge {
            method: method.to_string(),
            path,
            content_length,
        }));
    }

    let mut body = vec![0_u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body)?;
    }
    Ok(Some(Inbound::Request(HttpRequest {
        method: method.to_string(),
        path,
        body,
    })))
}

pub fn write_http_response(stream: &mut TcpStream, response: &HttpResponse) -> io::Result<()> {
    let reason = http_reason_phrase(response.status);
    let headers = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len()
    );
    stream.write_all(headers.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

fn http_reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
