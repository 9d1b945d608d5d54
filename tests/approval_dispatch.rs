use stagehand::actions::MessageExecutor;
use stagehand::config::Settings;
use stagehand::dispatch::handle_approved_record;
use stagehand::record::parse_document;
use stagehand::runtime::{EventLog, RunContext};
use stagehand::store::{bootstrap_store_root, Stage, StorePaths};
use stagehand::watch::notifier::list_records;
use stagehand::watch::InFlightSet;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

struct MockExecutor {
    url: String,
    bodies: Arc<Mutex<Vec<String>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MockExecutor {
    fn start(expected_requests: usize, response_json: &'static str, status_line: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock executor");
        let addr = listener.local_addr().expect("local addr");
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let bodies_for_thread = Arc::clone(&bodies);

        let handle = thread::spawn(move || {
            for _ in 0..expected_requests {
                let (mut stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

                let mut request_line = String::new();
                reader.read_line(&mut request_line).expect("request line");

                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).expect("read header");
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap_or(0);
                        }
                    }
                }

                let mut body = vec![0_u8; content_length];
                if content_length > 0 {
                    reader.read_exact(&mut body).expect("read body");
                }
                bodies_for_thread
                    .lock()
                    .expect("lock bodies")
                    .push(String::from_utf8_lossy(&body).to_string());

                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_json}",
                    response_json.len()
                );
                stream.write_all(response.as_bytes()).expect("write response");
            }
        });

        Self {
            url: format!("http://127.0.0.1:{}/send-message", addr.port()),
            bodies,
            handle: Some(handle),
        }
    }

    fn finish(mut self) -> Vec<String> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("join mock executor");
        }
        let bodies = self.bodies.lock().expect("lock bodies");
        bodies.clone()
    }
}

fn context(root: &std::path::Path) -> RunContext {
    let paths = StorePaths::new(root);
    bootstrap_store_root(&paths).expect("bootstrap");
    RunContext {
        paths,
        settings: Settings {
            settle_delay_ms: 0,
            ..Settings::default()
        },
        log: EventLog::to_stdout(),
        dry_run: false,
    }
}

fn approved_record(ctx: &RunContext, name: &str, content: &str) -> PathBuf {
    let path = ctx.paths.stage_dir(Stage::Approved).join(name);
    fs::write(&path, content).expect("write record");
    path
}

fn names_with_prefix(dir: &std::path::Path, prefix: &str) -> Vec<String> {
    list_records(dir)
        .expect("list records")
        .iter()
        .map(|path| path.file_name().expect("name").to_string_lossy().to_string())
        .filter(|name| name.starts_with(prefix))
        .collect()
}

#[test]
fn accepted_dispatch_moves_record_to_completed_with_receipt_in_audit() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ctx = context(dir.path());
    let server = MockExecutor::start(
        1,
        r#"{"success": true, "messageId": "m1"}"#,
        "HTTP/1.1 200 OK",
    );
    let executor = MessageExecutor::new(&server.url, Duration::from_secs(5));

    let record = approved_record(
        &ctx,
        "A.md",
        "---\naction_type: send-message\nto: alice@example.com\nsubject: \"Hi\"\nbody: \"Report attached\"\nthreadId: t-7\n---\n",
    );
    handle_approved_record(&ctx, &InFlightSet::new(), &executor, &record, &AtomicBool::new(false));

    assert!(!record.exists());
    assert!(ctx.paths.stage_dir(Stage::Completed).join("A.md").is_file());
    assert!(names_with_prefix(&ctx.paths.stage_dir(Stage::Approved), "A").is_empty());

    let successes = names_with_prefix(&ctx.paths.stage_dir(Stage::AuditLog), "ACTION_SUCCESS_");
    assert_eq!(successes.len(), 1);
    let entry = ctx.paths.stage_dir(Stage::AuditLog).join(&successes[0]);
    let doc = parse_document(&fs::read_to_string(entry).expect("read entry"));
    assert!(doc.body.contains("m1"));

    let bodies = server.finish();
    assert_eq!(bodies.len(), 1);
    let payload: serde_json::Value = serde_json::from_str(&bodies[0]).expect("payload json");
    assert_eq!(payload["to"], "alice@example.com");
    assert_eq!(payload["subject"], "Hi");
    assert_eq!(payload["body"], "Report attached");
    assert_eq!(payload["threadId"], "t-7");
}

#[test]
fn executor_rejection_keeps_record_in_approved_and_raises_one_alert() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ctx = context(dir.path());
    let server = MockExecutor::start(
        1,
        r#"{"success": false, "error": "smtp relay down"}"#,
        "HTTP/1.1 200 OK",
    );
    let executor = MessageExecutor::new(&server.url, Duration::from_secs(5));

    let record = approved_record(
        &ctx,
        "A.md",
        "---\naction_type: send-message\nto: alice@example.com\nsubject: Hi\n---\nReport attached\n",
    );
    handle_approved_record(&ctx, &InFlightSet::new(), &executor, &record, &AtomicBool::new(false));
    server.finish();

    assert!(record.exists());
    assert!(!ctx.paths.stage_dir(Stage::Completed).join("A.md").exists());

    let failures = names_with_prefix(&ctx.paths.stage_dir(Stage::AuditLog), "ACTION_FAILED_");
    assert_eq!(failures.len(), 1);
    let entry = ctx.paths.stage_dir(Stage::AuditLog).join(&failures[0]);
    let doc = parse_document(&fs::read_to_string(entry).expect("read entry"));
    assert!(doc.body.contains("smtp relay down"));

    let alerts = names_with_prefix(&ctx.paths.stage_dir(Stage::Inbox), "ALERT_FAILED_");
    assert_eq!(alerts.len(), 1);
}

#[test]
fn non_2xx_status_is_a_dispatch_failure() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ctx = context(dir.path());
    let server = MockExecutor::start(
        1,
        r#"{"error": "boom"}"#,
        "HTTP/1.1 500 Internal Server Error",
    );
    let executor = MessageExecutor::new(&server.url, Duration::from_secs(5));

    let record = approved_record(
        &ctx,
        "A.md",
        "---\naction_type: send-message\nto: alice@example.com\nsubject: Hi\n---\nReport attached\n",
    );
    handle_approved_record(&ctx, &InFlightSet::new(), &executor, &record, &AtomicBool::new(false));
    server.finish();

    assert!(record.exists());
    assert_eq!(
        names_with_prefix(&ctx.paths.stage_dir(Stage::AuditLog), "ACTION_FAILED_").len(),
        1
    );
    assert_eq!(
        names_with_prefix(&ctx.paths.stage_dir(Stage::Inbox), "ALERT_FAILED_").len(),
        1
    );
}

#[test]
fn invalid_directive_never_reaches_the_executor() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ctx = context(dir.path());
    // No server at all: a network attempt would fail loudly, but validation
    // must fail first.
    let executor = MessageExecutor::new("http://127.0.0.1:9/send-message", Duration::from_millis(200));

    let record = approved_record(
        &ctx,
        "A.md",
        "---\naction_type: send-message\nsubject: Hi\n---\nReport attached\n",
    );
    handle_approved_record(&ctx, &InFlightSet::new(), &executor, &record, &AtomicBool::new(false));

    assert!(record.exists());
    let failures = names_with_prefix(&ctx.paths.stage_dir(Stage::AuditLog), "ACTION_FAILED_");
    assert_eq!(failures.len(), 1);
    let entry = ctx.paths.stage_dir(Stage::AuditLog).join(&failures[0]);
    let doc = parse_document(&fs::read_to_string(entry).expect("read entry"));
    assert!(doc.body.contains("to"));
}
