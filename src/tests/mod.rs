use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::output::NullSink;
use crate::probe::{HttpProbe, Probe, ProbeOutcome};
use crate::runner::{self, ScanConfig, ScanState};
use crate::target;

struct Reply {
    status: &'static str,
    headers: Vec<(&'static str, String)>,
    body: String,
    stall: Option<Duration>,
}

impl Reply {
    fn new(status: &'static str, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
            stall: None,
        }
    }
}

fn route(path: &str, request: &str) -> Reply {
    match path {
        "/admin" => Reply::new("200 OK", "<html>admin panel</html>"),
        "/secret" => Reply::new("403 Forbidden", "forbidden"),
        "/old" => {
            let mut reply = Reply::new("301 Moved Permanently", "");
            reply.headers.push(("Location", "/new".to_string()));
            reply
        }
        "/new" => Reply::new("200 OK", "moved here"),
        "/agent" => {
            let agent = request
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("user-agent")
                        .then(|| value.trim().to_string())
                })
                .unwrap_or_default();
            Reply::new("200 OK", &agent)
        }
        "/slow" => {
            let mut reply = Reply::new("200 OK", "late");
            reply.stall = Some(Duration::from_secs(3));
            reply
        }
        _ => Reply::new("404 Not Found", "not found"),
    }
}

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf).to_string();
                let path = request
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();
                let reply = route(&path, &request);
                if let Some(stall) = reply.stall {
                    tokio::time::sleep(stall).await;
                }
                let mut head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                    reply.status,
                    reply.body.len()
                );
                for (name, value) in &reply.headers {
                    head.push_str(&format!("{name}: {value}\r\n"));
                }
                head.push_str("\r\n");
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(reply.body.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

fn config_with(codes: &[u16]) -> ScanConfig {
    ScanConfig {
        match_status_codes: codes.iter().copied().collect::<HashSet<u16>>(),
        timeout: Duration::from_secs(2),
        ..ScanConfig::default()
    }
}

async fn probe_once(config: &ScanConfig, base: &str, candidate: &str) -> ProbeOutcome {
    let probe = HttpProbe::new(config).unwrap();
    let target = target::normalize(base).unwrap();
    probe.probe(&target, candidate).await
}

#[tokio::test]
async fn http_probe_reports_match_with_body_length() {
    let addr = spawn_server().await;
    let outcome = probe_once(&config_with(&[200]), &format!("http://{addr}/"), "admin").await;
    match outcome {
        ProbeOutcome::Match(record) => {
            assert_eq!(record.url, format!("http://{addr}/admin"));
            assert_eq!(record.status_code, 200);
            assert_eq!(record.content_length, "<html>admin panel</html>".len());
            assert_eq!(record.candidate, "admin");
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[tokio::test]
async fn http_probe_reports_no_match_for_unlisted_status() {
    let addr = spawn_server().await;
    let outcome = probe_once(&config_with(&[200]), &addr.to_string(), "missing").await;
    assert_eq!(
        outcome,
        ProbeOutcome::NoMatch {
            url: format!("http://{addr}/missing"),
            status_code: 404,
        }
    );
}

#[tokio::test]
async fn http_probe_does_not_follow_redirects() {
    let addr = spawn_server().await;
    let outcome = probe_once(&config_with(&[301]), &addr.to_string(), "/old").await;
    match outcome {
        ProbeOutcome::Match(record) => {
            assert_eq!(record.status_code, 301);
            assert_eq!(record.url, format!("http://{addr}/old"));
            assert_eq!(record.content_length, 0);
        }
        other => panic!("expected 301 match, got {other:?}"),
    }
}

#[tokio::test]
async fn http_probe_sends_configured_user_agent() {
    let addr = spawn_server().await;
    let config = ScanConfig {
        user_agent: "dirforcer-test/1.0".to_string(),
        ..config_with(&[200])
    };
    let outcome = probe_once(&config, &addr.to_string(), "agent").await;
    match outcome {
        ProbeOutcome::Match(record) => {
            assert_eq!(record.content_length, "dirforcer-test/1.0".len());
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[tokio::test]
async fn tls_verification_disabled_still_matches() {
    let addr = spawn_server().await;
    let config = ScanConfig {
        verify_tls: false,
        ..config_with(&[200])
    };
    let outcome = probe_once(&config, &addr.to_string(), "admin").await;
    assert!(matches!(outcome, ProbeOutcome::Match(ref r) if r.status_code == 200));
}

#[tokio::test]
async fn http_probe_maps_refused_connection_to_transport_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let outcome = probe_once(&config_with(&[200]), &addr.to_string(), "admin").await;
    match outcome {
        ProbeOutcome::TransportError { url, cause } => {
            assert_eq!(url, format!("http://{addr}/admin"));
            assert!(!cause.is_empty());
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_probe_times_out_slow_responses() {
    let addr = spawn_server().await;
    let config = ScanConfig {
        timeout: Duration::from_millis(200),
        ..config_with(&[200])
    };
    let started = std::time::Instant::now();
    let outcome = probe_once(&config, &addr.to_string(), "slow").await;
    assert!(matches!(outcome, ProbeOutcome::TransportError { .. }));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn scan_against_local_server_end_to_end() {
    let addr = spawn_server().await;
    let candidates = ["admin", "secret", "nothing", "old", "", "agent"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let summary = runner::scan(
        &format!("{addr}/"),
        candidates,
        ScanConfig {
            concurrency: 3,
            ..config_with(&[200, 301, 403])
        },
        Arc::new(NullSink),
    )
    .await
    .unwrap();

    assert_eq!(summary.state, ScanState::Completed);
    assert_eq!(summary.target, format!("http://{addr}"));
    assert_eq!(summary.total_requests, 5);
    assert_eq!(summary.successful_requests, 5);
    assert_eq!(summary.failed_requests, 0);

    let mut found: Vec<(String, u16)> = summary
        .matches
        .iter()
        .map(|m| (m.candidate.clone(), m.status_code))
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![
            ("admin".to_string(), 200),
            ("agent".to_string(), 200),
            ("old".to_string(), 301),
            ("secret".to_string(), 403),
        ]
    );
}

#[tokio::test]
async fn scan_rejects_unsupported_scheme_before_probing() {
    let err = runner::scan(
        "ftp://example.test",
        vec!["admin".to_string()],
        ScanConfig::default(),
        Arc::new(NullSink),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, crate::runner::ScanError::InvalidTarget { .. }));
}

#[tokio::test]
async fn load_wordlist_reads_file_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.txt");
    tokio::fs::write(&path, "# comment\nadmin\n\nbackup\n  .git  \n#skip\nadmin\n")
        .await
        .unwrap();

    let words = crate::utils::load_wordlist(&path.to_string_lossy())
        .await
        .unwrap();
    assert_eq!(words, vec!["admin", "backup", ".git", "admin"]);
}

#[tokio::test]
async fn load_wordlist_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    let err = crate::utils::load_wordlist(&path.to_string_lossy())
        .await
        .unwrap_err();
    assert!(matches!(err, crate::runner::ScanError::FileOpen { .. }));
}
