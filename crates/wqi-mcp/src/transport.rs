use std::io::{self, BufRead, Read, Write};
use std::net::{TcpListener, TcpStream};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::protocol::{JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use crate::server::WqiServer;

/// How a stdio message was delimited. Replies mirror it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Line,
    ContentLength,
}

/// A message taken off the wire, or the reason it was refused unread.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Message(Vec<u8>),
    Refused(String),
}

/// Pulls messages from a stdio stream. Bodies above `limit` bytes are
/// drained without being buffered.
struct FrameReader<R> {
    inner: R,
    limit: usize,
    line: String,
}

impl<R: BufRead> FrameReader<R> {
    const fn new(inner: R, limit: usize) -> Self {
        Self {
            inner,
            limit,
            line: String::new(),
        }
    }

    fn next_frame(&mut self) -> io::Result<Option<(Inbound, Framing)>> {
        loop {
            self.line.clear();
            if self.inner.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            if !is_frame_header(line) {
                let inbound = if line.len() > self.limit {
                    Inbound::Refused(too_large(line.len(), self.limit))
                } else {
                    Inbound::Message(line.as_bytes().to_vec())
                };
                return Ok(Some((inbound, Framing::Line)));
            }

            let first = line.to_string();
            let inbound = self.read_framed_body(&first)?;
            return Ok(Some((inbound, Framing::ContentLength)));
        }
    }

    fn read_framed_body(&mut self, first_header: &str) -> io::Result<Inbound> {
        let mut declared = content_length_value(first_header).map(str::to_string);
        let mut header = String::new();
        loop {
            header.clear();
            if self.inner.read_line(&mut header)? == 0 {
                return Ok(Inbound::Refused(
                    "unexpected eof while reading frame headers".to_string(),
                ));
            }
            let header = header.trim();
            if header.is_empty() {
                break;
            }
            if let Some(value) = content_length_value(header) {
                declared = Some(value.to_string());
            }
        }

        let Some(declared) = declared else {
            return Ok(Inbound::Refused("missing content-length header".to_string()));
        };
        let Ok(length) = declared.parse::<usize>() else {
            return Ok(Inbound::Refused(format!("invalid content-length `{declared}`")));
        };
        if length > self.limit {
            let skip = u64::try_from(length).unwrap_or(u64::MAX);
            io::copy(&mut (&mut self.inner).take(skip), &mut io::sink())?;
            return Ok(Inbound::Refused(too_large(length, self.limit)));
        }

        let mut body = vec![0_u8; length];
        Ok(match self.inner.read_exact(&mut body) {
            Ok(()) => Inbound::Message(body),
            Err(err) => Inbound::Refused(format!("invalid stdio frame body: {err}")),
        })
    }
}

fn is_frame_header(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.starts_with("content-length:") || lower.starts_with("content-type:")
}

fn content_length_value(header: &str) -> Option<&str> {
    let (name, value) = header.split_once(':')?;
    name.trim()
        .eq_ignore_ascii_case("content-length")
        .then_some(value.trim())
}

fn too_large(length: usize, limit: usize) -> String {
    format!("message of {length} bytes exceeds the {limit} byte limit")
}

fn decode_request(payload: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
    serde_json::from_slice(payload).map_err(|err| {
        JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("parse error: {err}"))
    })
}

fn write_frame<W: Write>(out: &mut W, response: &JsonRpcResponse, framing: Framing) -> io::Result<()> {
    let body = serde_json::to_vec(response)?;
    if framing == Framing::ContentLength {
        write!(out, "Content-Length: {}\r\n\r\n", body.len())?;
        out.write_all(&body)?;
    } else {
        out.write_all(&body)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

impl WqiServer {
    /// Serves JSON-RPC over stdin/stdout until stdin closes.
    pub fn serve_stdio(&self) -> io::Result<()> {
        info!(
            max_body_bytes = self.config().max_body_bytes,
            "wqi-mcp serving on stdio"
        );
        let stdin = io::stdin();
        self.serve_frames(io::BufReader::new(stdin.lock()), &mut io::stdout())
    }

    fn serve_frames<R: BufRead, W: Write>(&self, reader: R, out: &mut W) -> io::Result<()> {
        let mut frames = FrameReader::new(reader, self.config().max_body_bytes);
        while let Some((inbound, framing)) = frames.next_frame()? {
            let reply = match inbound {
                Inbound::Message(payload) => match decode_request(&payload) {
                    Ok(request) => self.handle_request(request),
                    Err(response) => Some(response),
                },
                Inbound::Refused(reason) => {
                    warn!(reason = reason.as_str(), "refused stdio frame");
                    Some(JsonRpcResponse::error(Value::Null, PARSE_ERROR, reason))
                }
            };
            if let Some(reply) = reply {
                write_frame(out, &reply, framing)?;
            }
        }
        Ok(())
    }

    /// Blocking HTTP/1.1 listener: `GET /health`, `GET /metrics`, `POST /mcp`.
    pub fn serve_http(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        info!(
            addr = %listener.local_addr()?,
            max_body_bytes = self.config().max_body_bytes,
            "wqi-mcp http listening"
        );
        for stream in listener.incoming() {
            let outcome = stream.and_then(|s| self.handle_http_connection(s));
            if let Err(err) = outcome {
                warn!(error = %err, "http connection failed");
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        let mut reader = io::BufReader::new(stream.try_clone()?);
        let response = match read_http_request(&mut reader, self.config().max_body_bytes)? {
            None => return Ok(()),
            Some(HttpInbound::Request(req)) => self.dispatch_http_request(&req),
            Some(HttpInbound::Rejected(response)) => {
                warn!(status = response.status, "rejected http request");
                response
            }
        };
        write_http_response(&mut stream, &response)
    }

    fn dispatch_http_request(&self, req: &HttpRequest) -> HttpResponse {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/health") => HttpResponse::json(
                200,
                &json!({"status": "ok", "parameter_sets": self.catalog().len()}),
            ),
            ("GET", "/metrics") => HttpResponse {
                status: 200,
                content_type: "text/plain; version=0.0.4; charset=utf-8",
                body: self.render_metrics_text().into_bytes(),
            },
            ("POST", "/mcp" | "/") => match decode_request(&req.body) {
                Err(response) => HttpResponse::json(400, &response),
                Ok(rpc) => self
                    .handle_request(rpc)
                    .map_or_else(|| HttpResponse::empty(202), |r| HttpResponse::json(200, &r)),
            },
            (_, "/mcp" | "/health" | "/metrics") => HttpResponse::error(405, "method_not_allowed", "use POST /mcp"),
            _ => HttpResponse::error(404, "not_found", "use POST /mcp"),
        }
    }
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

#[derive(Debug)]
enum HttpInbound {
    Request(HttpRequest),
    Rejected(HttpResponse),
}

#[derive(Debug)]
struct HttpResponse {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl HttpResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(_) => Self {
                status: 500,
                content_type: "application/json",
                body: br#"{"error":"internal_error"}"#.to_vec(),
            },
        }
    }

    fn error(status: u16, code: &str, message: &str) -> Self {
        Self::json(status, &json!({"error": code, "message": message}))
    }

    const fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: Vec::new(),
        }
    }
}

/// Reads one request. Oversized or malformed requests come back as a ready
/// rejection and their body is never read.
fn read_http_request<R: BufRead>(reader: &mut R, limit: usize) -> io::Result<Option<HttpInbound>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 || line.trim().is_empty() {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Ok(Some(HttpInbound::Rejected(HttpResponse::error(
            400,
            "bad_request",
            "malformed request line",
        ))));
    };
    let method = method.to_ascii_uppercase();
    let path = target.split_once('?').map_or(target, |(p, _)| p).to_string();

    let mut declared: Option<String> = None;
    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header)? == 0 {
            break;
        }
        let header = header.trim();
        if header.is_empty() {
            break;
        }
        if let Some(value) = content_length_value(header) {
            declared = Some(value.to_string());
        }
    }

    let length = match declared.as_deref().map(str::parse::<usize>) {
        None => 0,
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            return Ok(Some(HttpInbound::Rejected(HttpResponse::error(
                400,
                "bad_request",
                "invalid content-length",
            ))))
        }
    };
    if length > limit {
        return Ok(Some(HttpInbound::Rejected(HttpResponse::error(
            413,
            "payload_too_large",
            &too_large(length, limit),
        ))));
    }

    let mut body = vec![0_u8; length];
    reader.read_exact(&mut body)?;
    Ok(Some(HttpInbound::Request(HttpRequest { method, path, body })))
}

fn write_http_response<W: Write>(out: &mut W, response: &HttpResponse) -> io::Result<()> {
    let reason = match response.status {
        202 => "Accepted",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "OK",
    };
    let mut head = format!("HTTP/1.1 {} {reason}\r\n", response.status);
    head.push_str(&format!("Content-Type: {}\r\n", response.content_type));
    head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    head.push_str("Connection: close\r\n\r\n");
    out.write_all(head.as_bytes())?;
    out.write_all(&response.body)?;
    out.flush()
}
