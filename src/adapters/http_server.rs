//! Local HTTP endpoint.
//!
//! A minimal HTTP/1.x server on a non-blocking `std::net::TcpListener`,
//! polled once per control-loop iteration.  One connection is accepted
//! and answered per poll, then closed; there is no keep-alive.
//!
//! | Route                          | Response                               |
//! |--------------------------------|----------------------------------------|
//! | `GET /`                        | static dashboard page                  |
//! | `GET /data`                    | fresh reading as JSON                  |
//! | `GET /relay[?state=on\|off]`    | set or toggle charging, plain text     |
//! | anything else                  | `404`, malformed request line `400`    |
//!
//! ESP-IDF ships a BSD socket layer behind `std::net`, so the same code
//! serves on the device and in host tests.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::commands::{AppCommand, CommandReply};
use crate::app::events::TelemetryRecord;
use crate::app::ports::{ActuatorPort, EventSink, SensorPort};
use crate::app::service::AppService;

use super::labels::{alert_label, battery_state_label, charging_label};

const REQUEST_BUF_LEN: usize = 1024;
const IO_TIMEOUT: Duration = Duration::from_millis(250);
/// Total budget for receiving the request line, counted from accept.
const REQUEST_DEADLINE: Duration = Duration::from_millis(250);

// ───────────────────────────────────────────────────────────────
// Request parsing (pure)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Malformed,
    UnsupportedVersion,
}

/// A parsed HTTP request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
}

/// Parse `METHOD SP TARGET SP HTTP/1.x`, with or without the trailing CRLF.
pub fn parse_request_line(line: &str) -> Result<Request<'_>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parts = line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::Malformed);
    };

    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ParseError::Malformed);
    }
    if !target.starts_with('/') {
        return Err(ParseError::Malformed);
    }
    if version != "HTTP/1.1" && version != "HTTP/1.0" {
        return Err(ParseError::UnsupportedVersion);
    }

    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (target, None),
    };
    Ok(Request { method, path, query })
}

/// Look up `key` in an `a=b&c=d` query string.
pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Accepted spellings of the relay `state` parameter.
pub fn parse_state_param(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "1" | "true" => Some(true),
        "off" | "0" | "false" => Some(false),
        _ => None,
    }
}

// ───────────────────────────────────────────────────────────────
// Routing
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Data,
    /// `None` toggles.
    Relay(Option<bool>),
    NotFound,
    BadRequest,
    MethodNotAllowed,
}

pub fn route(req: &Request<'_>) -> Route {
    let known = matches!(req.path, "/" | "/data" | "/relay");
    if req.method != "GET" {
        return if known { Route::MethodNotAllowed } else { Route::NotFound };
    }
    match req.path {
        "/" => Route::Index,
        "/data" => Route::Data,
        "/relay" => match req.query.and_then(|q| query_param(q, "state")) {
            None => Route::Relay(None),
            Some(v) => parse_state_param(v).map_or(Route::BadRequest, |s| Route::Relay(Some(s))),
        },
        _ => Route::NotFound,
    }
}

// ───────────────────────────────────────────────────────────────
// Responses
// ───────────────────────────────────────────────────────────────

/// JSON body of `GET /data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    pub voltage: f32,
    pub current: f32,
    pub temperature: Option<f32>,
    pub soc: f32,
    pub soh: f32,
    pub amp_hours: f64,
    pub alert: u8,
    pub alert_text: &'static str,
    pub fan: bool,
    pub fan_duty: u8,
    pub relay: bool,
    pub battery_state: &'static str,
}

impl From<&TelemetryRecord> for DataResponse {
    fn from(t: &TelemetryRecord) -> Self {
        Self {
            voltage: t.voltage_v,
            current: t.current_a,
            temperature: t.temperature_c,
            soc: t.soc_pct,
            soh: t.soh_pct,
            amp_hours: t.amp_hours,
            alert: t.alert.code(),
            alert_text: alert_label(t.alert),
            fan: t.fan_on,
            fan_duty: t.fan_duty,
            relay: t.charging_enabled,
            battery_state: battery_state_label(t.battery_state),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_owned(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }

    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        write!(
            w,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\
             Access-Control-Allow-Origin: *\r\nConnection: close\r\n\r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        )?;
        w.write_all(self.body.as_bytes())?;
        w.flush()
    }
}

/// Produce the response for a route.  `/data` reads the sensors fresh;
/// `/relay` goes through the service as a manual charging command.
pub fn respond<H>(route: Route, app: &mut AppService, hw: &mut H, sink: &mut impl EventSink) -> Response
where
    H: SensorPort + ActuatorPort,
{
    match route {
        Route::Index => Response {
            status: 200,
            content_type: "text/html",
            body: INDEX_HTML.to_owned(),
        },
        Route::Data => {
            let record = app.live_status(hw);
            match serde_json::to_string(&DataResponse::from(&record)) {
                Ok(body) => Response {
                    status: 200,
                    content_type: "application/json",
                    body,
                },
                Err(e) => {
                    warn!("HTTP: /data serialise failed: {}", e);
                    Response::text(500, "serialisation error")
                }
            }
        }
        Route::Relay(desired) => match app.handle_command(AppCommand::SetCharging(desired), hw, sink) {
            Ok(CommandReply::Charging(enabled)) => Response::text(200, charging_label(enabled)),
            Ok(CommandReply::Applied) => Response::text(200, charging_label(app.charging().enabled)),
            Err(e) => {
                warn!("HTTP: /relay failed: {}", e);
                Response::text(500, "relay command failed")
            }
        },
        Route::BadRequest => Response::text(400, "Bad Request"),
        Route::MethodNotAllowed => Response::text(405, "Method Not Allowed"),
        Route::NotFound => Response::text(404, "Not Found"),
    }
}

// ───────────────────────────────────────────────────────────────
// Server
// ───────────────────────────────────────────────────────────────

pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    /// Bind `0.0.0.0:<port>` in non-blocking mode.  Port `0` lets the OS
    /// pick one (see [`local_addr`](Self::local_addr)).
    pub fn bind(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))?;
        listener.set_nonblocking(true)?;
        info!("HTTP: listening on port {}", port);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve at most one waiting client.  Returns the route served, or
    /// `None` when nobody was waiting or the socket failed.
    pub fn poll<H>(&mut self, app: &mut AppService, hw: &mut H, sink: &mut impl EventSink) -> Option<Route>
    where
        H: SensorPort + ActuatorPort,
    {
        let mut stream = match self.listener.accept() {
            Ok((stream, addr)) => {
                debug!("HTTP: client {}", addr);
                stream
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return None,
            Err(e) => {
                warn!("HTTP: accept error: {}", e);
                return None;
            }
        };

        let deadline = Instant::now() + REQUEST_DEADLINE;
        if let Err(e) = prepare(&stream) {
            warn!("HTTP: socket setup failed: {}", e);
            return None;
        }

        let route = match read_request_line(&mut stream, deadline) {
            Ok(line) => parse_request_line(&line).map_or(Route::BadRequest, |req| route(&req)),
            Err(e) => {
                debug!("HTTP: read failed: {}", e);
                Route::BadRequest
            }
        };

        let response = respond(route, app, hw, sink);
        if let Err(e) = response.write_to(&mut stream) {
            warn!("HTTP: write failed: {}", e);
        }
        let _ = stream.shutdown(std::net::Shutdown::Both);
        Some(route)
    }
}

fn prepare(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(IO_TIMEOUT))?;
    stream.set_write_timeout(Some(IO_TIMEOUT))
}

/// Read the request head and return its first line.  The rest of the
/// head is drained so closing the socket does not reset the connection.
///
/// Reading stops at `deadline` however slowly the client sends.  A
/// request line still incomplete by then is a `TimedOut` error.
fn read_request_line(stream: &mut TcpStream, deadline: Instant) -> io::Result<String> {
    let mut buf = [0u8; REQUEST_BUF_LEN];
    let mut len = 0;
    let mut expired = false;
    while len < buf.len() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            expired = true;
            break;
        }
        stream.set_read_timeout(Some(remaining))?;
        match stream.read(&mut buf[len..]) {
            Ok(0) => break,
            Ok(n) => {
                len += n;
                if buf[..len].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(ref e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                expired = true;
                break;
            }
            Err(e) => return Err(e),
        }
    }
    if expired && !buf[..len].contains(&b'\n') {
        return Err(io::Error::new(io::ErrorKind::TimedOut, "request line not received in time"));
    }
    let text = std::str::from_utf8(&buf[..len])
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "request is not UTF-8"))?;
    Ok(text.lines().next().unwrap_or_default().to_owned())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Battery Monitor</title>
<style>
body { font-family: sans-serif; margin: 1.5em; }
td { padding: 0.2em 1em 0.2em 0; }
.Warning { color: #b8860b; } .Critical { color: #c00; }
</style>
</head>
<body>
<h2>Battery Monitor</h2>
<table>
<tr><td>Voltage</td><td id="voltage">-</td></tr>
<tr><td>Current</td><td id="current">-</td></tr>
<tr><td>Temperature</td><td id="temperature">-</td></tr>
<tr><td>State of charge</td><td id="soc">-</td></tr>
<tr><td>State of health</td><td id="soh">-</td></tr>
<tr><td>Amp-hours</td><td id="ampHours">-</td></tr>
<tr><td>Battery</td><td id="batteryState">-</td></tr>
<tr><td>Alert</td><td id="alert">-</td></tr>
<tr><td>Fan</td><td id="fan">-</td></tr>
<tr><td>Charging</td><td id="relay">-</td></tr>
</table>
<p><button onclick="toggle()">Toggle charging</button> <span id="msg"></span></p>
<script>
function set(id, v) { document.getElementById(id).textContent = v; }
async function refresh() {
  try {
    const d = await (await fetch('/data')).json();
    set('voltage', d.voltage.toFixed(2) + ' V');
    set('current', d.current.toFixed(2) + ' A');
    set('temperature', d.temperature === null ? 'probe error' : d.temperature.toFixed(1) + ' °C');
    set('soc', d.soc.toFixed(1) + ' %');
    set('soh', d.soh.toFixed(1) + ' %');
    set('ampHours', d.ampHours.toFixed(4) + ' Ah');
    set('batteryState', d.batteryState);
    const a = document.getElementById('alert');
    a.textContent = d.alertText; a.className = d.alertText;
    set('fan', d.fan ? 'ON (' + d.fanDuty + ')' : 'OFF');
    set('relay', d.relay ? 'ENABLED' : 'DISABLED');
  } catch (e) { set('msg', 'offline'); }
}
async function toggle() {
  set('msg', await (await fetch('/relay')).text());
  refresh();
}
refresh();
setInterval(refresh, 2000);
</script>
</body>
</html>
"#;
