use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

fn reserve_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("reserve addr");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr.to_string()
}

fn wait_for_http(addr: &str) {
    for _ in 0..80 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("http server not ready on {addr}");
}

fn send_http(addr: &str, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect http");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).expect("read response");
    buf
}

fn response_body(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or("")
}

fn send_raw(addr: &str, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect http");
    stream.write_all(raw.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).expect("read response");
    buf
}

fn spawn_http(addr: &str) -> Child {
    spawn_http_with_limit(addr, 8 * 1024 * 1024)
}

fn spawn_http_with_limit(addr: &str, max_body_bytes: usize) -> Child {
    Command::new(env!("CARGO_BIN_EXE_wqid"))
        .env("WQID_TRANSPORT", "http")
        .env("WQI_HTTP_ADDR", addr)
        .env("WQI_MAX_BODY_BYTES", max_body_bytes.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn wqid")
}

#[test]
fn http_health_and_mcp_call_work() {
    let addr = reserve_addr();
    let mut child = spawn_http(&addr);
    wait_for_http(&addr);

    let health = send_http(&addr, "GET", "/health", "");
    assert!(health.starts_with("HTTP/1.1 200"));
    assert!(response_body(&health).contains("\"status\":\"ok\""));

    let init_body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
    let init = send_http(&addr, "POST", "/mcp", init_body);
    assert!(init.starts_with("HTTP/1.1 200"));
    assert!(response_body(&init).contains("\"wqi-mcp\""));

    let score_body = r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"wqi_score","arguments":{"set":"EPA","values":{"pH":7.0,"DO":5.0}}}}"#;
    let score = send_http(&addr, "POST", "/mcp", score_body);
    let json: serde_json::Value =
        serde_json::from_str(response_body(&score)).expect("score json");
    assert_eq!(json["result"]["structuredContent"]["class"], "Very Poor");

    let metrics = send_http(&addr, "GET", "/metrics", "");
    assert!(metrics.starts_with("HTTP/1.1 200"));
    let text = response_body(&metrics);
    assert!(text.contains("wqi_tool_calls_total{tool=\"wqi_score\",status=\"ok\"} 1"));
    assert!(text.contains("wqi_samples_total{set=\"EPA\",outcome=\"scored\"} 1"));

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn http_rejects_bad_routes_and_bodies() {
    let addr = reserve_addr();
    let mut child = spawn_http(&addr);
    wait_for_http(&addr);

    let missing = send_http(&addr, "GET", "/nowhere", "");
    assert!(missing.starts_with("HTTP/1.1 404"));

    let wrong_method = send_http(&addr, "GET", "/mcp", "");
    assert!(wrong_method.starts_with("HTTP/1.1 405"));

    let garbage = send_http(&addr, "POST", "/mcp", "{oops");
    assert!(garbage.starts_with("HTTP/1.1 400"));
    assert!(response_body(&garbage).contains("-32700"));

    let notification = send_http(
        &addr,
        "POST",
        "/mcp",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
    );
    assert!(notification.starts_with("HTTP/1.1 202"));

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn http_oversized_bodies_are_refused_and_server_stays_up() {
    let addr = reserve_addr();
    let mut child = spawn_http_with_limit(&addr, 1024);
    wait_for_http(&addr);

    let absurd = send_raw(
        &addr,
        "POST /mcp HTTP/1.1\r\nContent-Length: 18446744073709551615\r\nConnection: close\r\n\r\n",
    );
    assert!(absurd.starts_with("HTTP/1.1 413"));
    assert!(response_body(&absurd).contains("payload_too_large"));

    let over = send_raw(
        &addr,
        "POST /mcp HTTP/1.1\r\nContent-Length: 4096\r\nConnection: close\r\n\r\n",
    );
    assert!(over.starts_with("HTTP/1.1 413"));

    let health = send_http(&addr, "GET", "/health", "");
    assert!(health.starts_with("HTTP/1.1 200"));

    let ping = send_http(&addr, "POST", "/mcp", r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#);
    assert!(ping.starts_with("HTTP/1.1 200"));

    let _ = child.kill();
    let _ = child.wait();
}
