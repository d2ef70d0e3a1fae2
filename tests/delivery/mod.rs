use ci_insight_cli::delivery::{Client, Outcome, PUSH_PATH};
use ci_insight_cli::model::{BuildRecord, BuildStatus, JobRecord};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Serves exactly one request with the given status line and hands back the
/// raw request (head + body) through the join handle.
pub fn one_shot_server(status_line: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let addr = listener.local_addr().expect("local addr");

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        let mut reader = BufReader::new(stream);

        let mut head = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read header line");
            if line.is_empty() || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }

        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);

        let mut body = vec![0_u8; content_length];
        reader.read_exact(&mut body).expect("read body");

        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        )
        .expect("write response");
        stream.flush().expect("flush response");

        format!("{head}{}", String::from_utf8_lossy(&body))
    });

    (format!("http://{addr}"), handle)
}

fn test_record() -> BuildRecord {
    BuildRecord {
        repository: "team/app".to_string(),
        status: BuildStatus::Failure,
        build_number: "42".to_string(),
        branch: "main".to_string(),
        commit: "abc123".to_string(),
        workflow_content: "Script not found. Showing logs as fallback.\n\nboom".to_string(),
        jobs: vec![JobRecord {
            name: "Build".to_string(),
            status: BuildStatus::Failure,
            logs: "boom".to_string(),
        }],
    }
}

fn client_for(api_url: &str, api_token: &str) -> Client {
    Client {
        api_url: api_url.to_string(),
        api_token: api_token.to_string(),
        timeout: Duration::from_secs(2),
    }
}

#[test]
fn push_skips_without_token() {
    // The address would refuse connections; skipping means it is never
    // contacted at all.
    let client = client_for("http://127.0.0.1:1", "");
    assert!(matches!(client.push(&test_record()), Outcome::Skipped));
}

#[test]
fn push_delivers_on_success_status() {
    let (url, handle) = one_shot_server("200 OK");

    // Trailing slash must not produce a doubled slash in the path.
    let client = client_for(&format!("{url}/"), "sekrit");
    assert!(matches!(client.push(&test_record()), Outcome::Delivered));

    let request = handle.join().expect("server thread");
    assert!(request.contains(&format!("POST {PUSH_PATH} HTTP/1.1")));
    assert!(request.contains("x-ci-insight-token: sekrit"));
    assert!(request.contains("content-type: application/json"));
    assert!(request.contains("\"repository\":\"team/app\""));
    assert!(request.contains("\"buildNumber\":\"42\""));
    assert!(request.contains("\"jobs\":[{\"name\":\"Build\""));
}

#[test]
fn push_reports_rejection_status() {
    let (url, handle) = one_shot_server("500 Internal Server Error");

    let client = client_for(&url, "sekrit");
    assert!(matches!(
        client.push(&test_record()),
        Outcome::Rejected(500)
    ));

    handle.join().expect("server thread");
}

#[test]
fn push_reports_transport_failure() {
    let client = client_for("http://127.0.0.1:1", "sekrit");

    match client.push(&test_record()) {
        Outcome::TransportFailed(err) => assert!(err.to_string().contains("send request")),
        other => panic!("expected transport failure, got {other:?}"),
    }
}

#[test]
fn send_swallows_rejection() {
    let (url, handle) = one_shot_server("503 Service Unavailable");

    let client = client_for(&url, "sekrit");
    assert!(matches!(
        client.send(&test_record()),
        Outcome::Rejected(503)
    ));

    handle.join().expect("server thread");
}

#[test]
fn send_swallows_transport_failure() {
    let client = client_for("http://127.0.0.1:1", "sekrit");
    assert!(matches!(
        client.send(&test_record()),
        Outcome::TransportFailed(_)
    ));
}
