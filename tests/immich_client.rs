//! Runs the Immich client and sync driver against a mock HTTP server.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{json, Value};

use immich_datefix::{sync_day, Catalog, CatalogConfig, CatalogError, ImmichClient, SyncOptions};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Value,
}

type Responder = dyn Fn(&Recorded) -> (u16, String) + Send + Sync;

struct MockServer {
    url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    fn start(responder: Box<Responder>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    break;
                };
                if let Some(request) = read_request(&stream) {
                    let (status, body) = responder(&request);
                    recorded.lock().unwrap().push(request);
                    write_response(stream, status, &body);
                }
            }
        });

        Self { url, requests }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &TcpStream) -> Option<Recorded> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = HashMap::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let mut raw = Vec::new();
    if let Some(len) = headers.get("content-length") {
        raw.resize(len.parse().ok()?, 0);
        reader.read_exact(&mut raw).ok()?;
    } else if headers
        .get("transfer-encoding")
        .is_some_and(|te| te.eq_ignore_ascii_case("chunked"))
    {
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line).ok()?;
            let size = usize::from_str_radix(size_line.trim(), 16).ok()?;
            let mut chunk = vec![0; size + 2];
            reader.read_exact(&mut chunk).ok()?;
            if size == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..size]);
        }
    }

    let body = if raw.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&raw).ok()?
    };

    Some(Recorded {
        method,
        path,
        headers,
        body,
    })
}

fn write_response(mut stream: TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn config(url: &str) -> CatalogConfig {
    CatalogConfig::new(url, "test-key", Duration::from_secs(5)).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 8, 1).unwrap()
}

fn asset(id: &str, name: &str, created: &str) -> Value {
    json!({ "id": id, "originalFileName": name, "fileCreatedAt": created })
}

fn catalog_responder(request: &Recorded) -> (u16, String) {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/api/search/metadata") => {
            let items = match request.body["page"].as_u64() {
                Some(1) => vec![
                    asset("a1", "IMG_20190130_172450.jpg", "2023-08-01T10:00:00.000Z"),
                    asset("a2", "random_file.png", "2023-08-01T10:00:00.000Z"),
                ],
                Some(2) => vec![
                    asset("a3", "IMG-20160123-WA0000.jpg", "2016-01-23T00:00:00.000Z"),
                    asset("bad", "2014-09-18.jpg", "2023-08-01T11:00:00.000Z"),
                ],
                _ => vec![],
            };
            (200, json!({ "assets": { "items": items } }).to_string())
        }
        ("PUT", "/api/assets/bad") => (500, r#"{"message":"boom"}"#.to_string()),
        ("PUT", _) => (200, "{}".to_string()),
        _ => (404, String::new()),
    }
}

#[test]
fn test_sync_day_against_server() {
    let server = MockServer::start(Box::new(catalog_responder));
    let client = ImmichClient::new(&config(&format!("{}/", server.url)));
    let options = SyncOptions {
        day: day(),
        asset_id: None,
        dry_run: false,
    };

    let report = sync_day(&client, &options).unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.updated, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.unrecognized, 1);
    assert_eq!(report.failed, 1);

    let requests = server.requests();
    let searches: Vec<&Recorded> = requests.iter().filter(|r| r.method == "POST").collect();
    assert_eq!(searches.len(), 3);
    for (i, search) in searches.iter().enumerate() {
        assert_eq!(search.path, "/api/search/metadata");
        assert_eq!(search.headers.get("x-api-key").map(String::as_str), Some("test-key"));
        assert_eq!(search.body["page"], json!(i + 1));
        assert_eq!(search.body["takenAfter"], "2023-08-01T00:00:00.000Z");
        assert_eq!(search.body["takenBefore"], "2023-08-01T23:59:59.999Z");
        assert_eq!(search.body["withExif"], true);
        assert_eq!(search.body["isVisible"], true);
    }

    let updates: Vec<&Recorded> = requests.iter().filter(|r| r.method == "PUT").collect();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].path, "/api/assets/a1");
    assert_eq!(updates[0].body, json!({ "dateTimeOriginal": "2019-01-30T17:24:50Z" }));
    assert_eq!(updates[1].path, "/api/assets/bad");
    assert_eq!(updates[1].body, json!({ "dateTimeOriginal": "2014-09-18T00:00:00Z" }));
}

#[test]
fn test_dry_run_sends_no_updates() {
    let server = MockServer::start(Box::new(catalog_responder));
    let client = ImmichClient::new(&config(&server.url));
    let options = SyncOptions {
        day: day(),
        asset_id: None,
        dry_run: true,
    };

    let report = sync_day(&client, &options).unwrap();
    assert_eq!(report.pending, 2);
    assert!(server.requests().iter().all(|r| r.method == "POST"));
}

#[test]
fn test_error_status_is_reported() {
    let server = MockServer::start(Box::new(|_: &Recorded| {
        (401, r#"{"message":"Invalid API key"}"#.to_string())
    }));
    let client = ImmichClient::new(&config(&server.url));

    match client.search_page(day(), 1) {
        Err(CatalogError::Status { status, body, .. }) => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid API key"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/api", listener.local_addr().unwrap());
    drop(listener);

    let client = ImmichClient::new(&config(&url));
    let result = client.search_page(day(), 1);
    assert!(matches!(result, Err(CatalogError::Transport(_))));
}
