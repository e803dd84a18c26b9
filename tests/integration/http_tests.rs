//! Local HTTP endpoint against a real loopback socket.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use super::mock_hw::{MockHardware, RecordingSink};

use battmon::adapters::http_server::{HttpServer, Route, respond};
use battmon::app::service::AppService;
use battmon::config::SystemConfig;

fn setup() -> (HttpServer, AppService, MockHardware, RecordingSink) {
    let server = HttpServer::bind(0).unwrap();
    let mut hw = MockHardware::with_reading(12.34, -0.5, Some(27.0));
    let mut sink = RecordingSink::new();
    let mut app = AppService::new(SystemConfig::default());
    app.start(&mut hw, &mut sink);
    (server, app, hw, sink)
}

/// Send one raw request, let the server poll once, return the full reply.
fn exchange(
    server: &mut HttpServer,
    app: &mut AppService,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
    request: &str,
) -> (Option<Route>, String) {
    let port = server.local_addr().unwrap().port();
    let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
    client.write_all(request.as_bytes()).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    let route = server.poll(app, hw, sink);

    client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let mut reply = String::new();
    client.read_to_string(&mut reply).unwrap();
    (route, reply)
}

fn body(reply: &str) -> &str {
    reply.split_once("\r\n\r\n").map_or("", |(_, b)| b)
}

#[test]
fn idle_poll_returns_none() {
    let (mut server, mut app, mut hw, mut sink) = setup();
    assert_eq!(server.poll(&mut app, &mut hw, &mut sink), None);
}

#[test]
fn data_endpoint_serves_fresh_json() {
    let (mut server, mut app, mut hw, mut sink) = setup();
    let (route, reply) = exchange(
        &mut server,
        &mut app,
        &mut hw,
        &mut sink,
        "GET /data HTTP/1.1\r\nHost: battmon\r\n\r\n",
    );

    assert_eq!(route, Some(Route::Data));
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("Content-Type: application/json\r\n"));

    let v: serde_json::Value = serde_json::from_str(body(&reply)).unwrap();
    assert!((v["voltage"].as_f64().unwrap() - 12.34).abs() < 1e-4);
    assert!((v["temperature"].as_f64().unwrap() - 27.0).abs() < 1e-4);
    assert_eq!(v["alert"], 0);
    assert_eq!(v["alertText"], "Normal");
    assert_eq!(v["relay"], true);
    assert_eq!(v["batteryState"], "Discharging");
    assert!(v.get("ampHours").is_some());
}

#[test]
fn invalid_probe_is_json_null() {
    let (mut server, mut app, mut hw, mut sink) = setup();
    hw.temperature_c = None;
    let (_, reply) = exchange(&mut server, &mut app, &mut hw, &mut sink, "GET /data HTTP/1.1\r\n\r\n");
    let v: serde_json::Value = serde_json::from_str(body(&reply)).unwrap();
    assert!(v["temperature"].is_null());
    assert_eq!(v["alertText"], "Warning");
}

#[test]
fn relay_endpoint_sets_and_toggles() {
    let (mut server, mut app, mut hw, mut sink) = setup();

    let (route, reply) = exchange(
        &mut server,
        &mut app,
        &mut hw,
        &mut sink,
        "GET /relay?state=off HTTP/1.1\r\n\r\n",
    );
    assert_eq!(route, Some(Route::Relay(Some(false))));
    assert_eq!(body(&reply), "Charging DISABLED");
    assert!(hw.pin_level(), "inverted relay: HIGH disables charging");

    let (_, reply) = exchange(&mut server, &mut app, &mut hw, &mut sink, "GET /relay HTTP/1.1\r\n\r\n");
    assert_eq!(body(&reply), "Charging ENABLED");
    assert!(!hw.pin_level());
    assert!(app.charging().enabled);
}

#[test]
fn bad_requests_are_rejected() {
    let (mut server, mut app, mut hw, mut sink) = setup();

    let (route, reply) = exchange(&mut server, &mut app, &mut hw, &mut sink, "GARBAGE\r\n\r\n");
    assert_eq!(route, Some(Route::BadRequest));
    assert!(reply.starts_with("HTTP/1.1 400 "));

    let (_, reply) = exchange(
        &mut server,
        &mut app,
        &mut hw,
        &mut sink,
        "GET /relay?state=banana HTTP/1.1\r\n\r\n",
    );
    assert!(reply.starts_with("HTTP/1.1 400 "));
    assert!(app.charging().enabled, "a rejected request changes nothing");

    let (_, reply) = exchange(&mut server, &mut app, &mut hw, &mut sink, "GET /nope HTTP/1.1\r\n\r\n");
    assert!(reply.starts_with("HTTP/1.1 404 "));
}

#[test]
fn index_page_polls_data() {
    let (_server, mut app, mut hw, mut sink) = setup();
    let resp = respond(Route::Index, &mut app, &mut hw, &mut sink);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, "text/html");
    assert!(resp.body.contains("fetch('/data')"));
    assert!(resp.body.contains("fetch('/relay')"));
}

#[test]
fn trickling_client_cannot_stall_the_loop() {
    let (mut server, mut app, mut hw, mut sink) = setup();
    let port = server.local_addr().unwrap().port();
    let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();

    // One byte every 100 ms, never finishing the request line.
    let trickle = std::thread::spawn(move || {
        for _ in 0..20 {
            if client.write_all(b"G").is_err() {
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    });
    std::thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    let route = server.poll(&mut app, &mut hw, &mut sink);
    let elapsed = started.elapsed();

    assert_eq!(route, Some(Route::BadRequest));
    assert!(elapsed < Duration::from_millis(600), "poll blocked for {:?}", elapsed);
    trickle.join().unwrap();
}

#[test]
fn request_split_across_segments_is_served() {
    let (mut server, mut app, mut hw, mut sink) = setup();
    let port = server.local_addr().unwrap().port();
    let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let mut writer = client.try_clone().unwrap();

    let sender = std::thread::spawn(move || {
        writer.write_all(b"GET /da").unwrap();
        std::thread::sleep(Duration::from_millis(60));
        writer.write_all(b"ta HTTP/1.1\r\n\r\n").unwrap();
    });

    assert_eq!(server.poll(&mut app, &mut hw, &mut sink), Some(Route::Data));
    sender.join().unwrap();

    client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let mut reply = String::new();
    client.read_to_string(&mut reply).unwrap();
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
}
