use super::*;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::backend::{BackendError, IngestionOutcome, TestCase};
use crate::scripts::ScriptState;
use crate::session::Session;

#[derive(Default)]
struct ScriptedBackend {
    upload_responses: RefCell<VecDeque<Result<Vec<IngestionOutcome>, BackendError>>>,
    case_responses: RefCell<VecDeque<Result<Vec<TestCase>, BackendError>>>,
    script_responses: RefCell<VecDeque<Result<String, BackendError>>>,
    upload_calls: Cell<usize>,
    case_calls: Cell<usize>,
    script_calls: Cell<usize>,
    seen_session_ids: RefCell<Vec<String>>,
    uploaded_documents: RefCell<Vec<Vec<UploadDocument>>>,
}

impl ScriptedBackend {
    fn unscripted<T>() -> Result<T, BackendError> {
        Err(BackendError::Transport("unscripted call".to_string()))
    }
}

impl QaBackend for ScriptedBackend {
    fn upload_documents(
        &self,
        session: &Session,
        documents: Vec<UploadDocument>,
    ) -> Result<Vec<IngestionOutcome>, BackendError> {
        self.upload_calls.set(self.upload_calls.get() + 1);
        self.seen_session_ids
            .borrow_mut()
            .push(session.id().to_string());
        self.uploaded_documents.borrow_mut().push(documents);
        self.upload_responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(Self::unscripted)
    }

    fn generate_test_cases(
        &self,
        session: &Session,
        _query: &str,
    ) -> Result<Vec<TestCase>, BackendError> {
        self.case_calls.set(self.case_calls.get() + 1);
        self.seen_session_ids
            .borrow_mut()
            .push(session.id().to_string());
        self.case_responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(Self::unscripted)
    }

    fn generate_script(
        &self,
        session: &Session,
        _test_case: &TestCase,
    ) -> Result<String, BackendError> {
        self.script_calls.set(self.script_calls.get() + 1);
        self.seen_session_ids
            .borrow_mut()
            .push(session.id().to_string());
        self.script_responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(Self::unscripted)
    }

    fn notify_session_closed(&self, _session: &Session) {}
}

fn outcome(filename: &str, status: &str, message: &str) -> IngestionOutcome {
    serde_json::from_value(serde_json::json!({
        "filename": filename,
        "status": status,
        "message": message,
    }))
    .expect("outcome literal should deserialize")
}

fn case(id: &str, scenario: &str) -> TestCase {
    TestCase {
        test_id: Some(id.to_string()),
        test_scenario: scenario.to_string(),
        test_type: "functional".to_string(),
        feature: "checkout".to_string(),
        expected_result: "works".to_string(),
        grounded_in: "spec.md".to_string(),
    }
}

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("qa-console-{prefix}-{nanos}"));
        fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path.join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn test_app() -> App {
    App::with_session(Session::with_id("sess1234"))
}

fn status_texts(app: &App) -> Vec<&str> {
    app.status_lines()
        .iter()
        .map(|line| line.text.as_str())
        .collect()
}

#[test]
fn empty_upload_input_warns_and_sends_nothing() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    let mut app = test_app();

    service.build_knowledge_base(&mut app, &backend, "   ");

    assert_eq!(backend.upload_calls.get(), 0);
    assert!(status_texts(&app)[0].contains("at least one file"));
    assert!(app.registry().is_empty());
}

#[test]
fn partial_ingestion_merges_successes_and_reports_each_failure() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend.upload_responses.borrow_mut().push_back(Ok(vec![
        outcome("a.pdf", "success", ""),
        outcome("b.md", "failed", "bad format"),
    ]));
    let dir = TempDirGuard::new("partial");
    let a = dir.write_file("a.pdf", "pdf bytes");
    let b = dir.write_file("b.md", "# doc");
    let mut app = test_app();

    service.build_knowledge_base(
        &mut app,
        &backend,
        &format!("{}, {}", a.display(), b.display()),
    );

    let listed: Vec<&str> = app.registry().iter_sorted().collect();
    assert_eq!(listed, vec!["a.pdf"]);
    let texts = status_texts(&app);
    assert!(texts.iter().any(|t| t.contains("Successfully ingested 1")));
    assert!(
        texts
            .iter()
            .any(|t| t.contains("b.md") && t.contains("bad format"))
    );
}

#[test]
fn upload_attaches_filenames_and_mime_types() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .upload_responses
        .borrow_mut()
        .push_back(Ok(vec![outcome("notes.md", "success", "")]));
    let dir = TempDirGuard::new("mime");
    let notes = dir.write_file("notes.md", "# notes");
    let mut app = test_app();

    service.build_knowledge_base(&mut app, &backend, &notes.display().to_string());

    let batches = backend.uploaded_documents.borrow();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].filename, "notes.md");
    assert_eq!(batches[0][0].mime, "text/markdown");
    assert_eq!(batches[0][0].bytes, b"# notes");
    assert_eq!(backend.seen_session_ids.borrow()[0], "sess1234");
}

#[test]
fn wholesale_upload_failure_leaves_the_registry_unchanged() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .upload_responses
        .borrow_mut()
        .push_back(Err(BackendError::Server {
            status: 500,
            body: "ingestion exploded".to_string(),
        }));
    let dir = TempDirGuard::new("wholesale");
    let a = dir.write_file("a.pdf", "pdf bytes");
    let mut app = test_app();
    app.record_ingested(["earlier.txt".to_string()]);

    service.build_knowledge_base(&mut app, &backend, &a.display().to_string());

    let listed: Vec<&str> = app.registry().iter_sorted().collect();
    assert_eq!(listed, vec!["earlier.txt"]);
    assert!(
        status_texts(&app)
            .iter()
            .any(|t| t.contains("500") && t.contains("ingestion exploded"))
    );
}

#[test]
fn unreadable_file_fails_before_any_network_call() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    let mut app = test_app();

    service.build_knowledge_base(&mut app, &backend, "/no/such/file.pdf");

    assert_eq!(backend.upload_calls.get(), 0);
    assert!(
        status_texts(&app)
            .iter()
            .any(|t| t.contains("Could not read"))
    );
}

#[test]
fn all_files_failing_reports_an_aggregate_error() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .upload_responses
        .borrow_mut()
        .push_back(Ok(vec![outcome("a.pdf", "failed", "unreadable")]));
    let dir = TempDirGuard::new("allfail");
    let a = dir.write_file("a.pdf", "pdf bytes");
    let mut app = test_app();

    service.build_knowledge_base(&mut app, &backend, &a.display().to_string());

    assert!(app.registry().is_empty());
    assert!(
        status_texts(&app)
            .iter()
            .any(|t| t.contains("Failed to ingest any files"))
    );
}

#[test]
fn blank_query_warns_and_keeps_the_collection() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    let mut app = test_app();

    service.generate_test_cases(&mut app, &backend, "  ");

    assert_eq!(backend.case_calls.get(), 0);
    assert!(status_texts(&app)[0].contains("description"));
}

#[test]
fn successful_query_installs_the_collection_in_not_requested_state() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .case_responses
        .borrow_mut()
        .push_back(Ok(vec![case("TC1", "a"), case("TC2", "b")]));
    let mut app = test_app();

    service.generate_test_cases(&mut app, &backend, "discount code");

    assert_eq!(app.cases().len(), 2);
    assert_eq!(app.script_state_for(0), &ScriptState::NotRequested);
    assert_eq!(app.script_state_for(1), &ScriptState::NotRequested);
    assert!(
        status_texts(&app)
            .iter()
            .any(|t| t.contains("Generated 2 test case(s)"))
    );
}

#[test]
fn failed_query_leaves_an_empty_collection_and_surfaces_the_error() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .case_responses
        .borrow_mut()
        .push_back(Ok(vec![case("TC1", "a")]));
    backend
        .case_responses
        .borrow_mut()
        .push_back(Err(BackendError::Transport("connection refused".to_string())));
    let mut app = test_app();

    service.generate_test_cases(&mut app, &backend, "first");
    assert_eq!(app.cases().len(), 1);

    service.generate_test_cases(&mut app, &backend, "second");
    assert!(app.cases().is_empty());
    assert!(
        status_texts(&app)
            .iter()
            .any(|t| t.contains("connection refused"))
    );
}

#[test]
fn script_round_trip_reaches_ready() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .case_responses
        .borrow_mut()
        .push_back(Ok(vec![case("TC1", "Apply discount")]));
    backend
        .script_responses
        .borrow_mut()
        .push_back(Ok("driver.get(url)".to_string()));
    let mut app = test_app();
    service.generate_test_cases(&mut app, &backend, "discount");
    app.switch_page();

    app.request_script_for_selected();
    assert_eq!(app.script_state_for(0), &ScriptState::InFlight);

    assert!(service.dispatch_pending_script(&mut app, &backend));
    assert_eq!(
        app.script_state_for(0),
        &ScriptState::Ready("driver.get(url)".to_string())
    );
    assert_eq!(backend.script_calls.get(), 1);
}

#[test]
fn exactly_one_network_call_despite_repeated_triggers_and_dispatches() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .case_responses
        .borrow_mut()
        .push_back(Ok(vec![case("TC1", "a")]));
    backend
        .script_responses
        .borrow_mut()
        .push_back(Ok("once".to_string()));
    let mut app = test_app();
    service.generate_test_cases(&mut app, &backend, "q");
    app.switch_page();

    // Simulates the trigger firing again on every redraw while in flight.
    app.request_script_for_selected();
    app.request_script_for_selected();
    let mut dispatched = 0;
    for _ in 0..5 {
        app.request_script_for_selected();
        if service.dispatch_pending_script(&mut app, &backend) {
            dispatched += 1;
        }
    }
    assert_eq!(backend.script_calls.get(), 1);
    assert_eq!(dispatched, 1);
}

#[test]
fn regeneration_requires_a_full_new_round_trip_and_overwrites() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .case_responses
        .borrow_mut()
        .push_back(Ok(vec![case("TC1", "a")]));
    backend
        .script_responses
        .borrow_mut()
        .push_back(Ok("first".to_string()));
    backend
        .script_responses
        .borrow_mut()
        .push_back(Ok("second".to_string()));
    let mut app = test_app();
    service.generate_test_cases(&mut app, &backend, "q");
    app.switch_page();

    app.request_script_for_selected();
    service.dispatch_pending_script(&mut app, &backend);
    app.request_script_for_selected();
    assert_eq!(app.script_state_for(0), &ScriptState::InFlight);
    service.dispatch_pending_script(&mut app, &backend);

    assert_eq!(
        app.script_state_for(0),
        &ScriptState::Ready("second".to_string())
    );
    assert_eq!(backend.script_calls.get(), 2);
}

#[test]
fn failed_script_generation_surfaces_the_error_and_allows_retry() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .case_responses
        .borrow_mut()
        .push_back(Ok(vec![case("TC1", "a")]));
    backend
        .script_responses
        .borrow_mut()
        .push_back(Err(BackendError::Server {
            status: 502,
            body: "bad gateway".to_string(),
        }));
    backend
        .script_responses
        .borrow_mut()
        .push_back(Ok("recovered".to_string()));
    let mut app = test_app();
    service.generate_test_cases(&mut app, &backend, "q");
    app.switch_page();

    app.request_script_for_selected();
    service.dispatch_pending_script(&mut app, &backend);
    match app.script_state_for(0) {
        ScriptState::Failed(message) => assert!(message.contains("bad gateway")),
        other => panic!("expected Failed, got {other:?}"),
    }

    app.request_script_for_selected();
    service.dispatch_pending_script(&mut app, &backend);
    assert_eq!(
        app.script_state_for(0),
        &ScriptState::Ready("recovered".to_string())
    );
}

#[test]
fn dispatch_with_nothing_pending_is_a_no_op() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    let mut app = test_app();
    assert!(!service.dispatch_pending_script(&mut app, &backend));
    assert_eq!(backend.script_calls.get(), 0);
}

#[test]
fn saved_artifact_contains_the_scenario_comment_and_script() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .case_responses
        .borrow_mut()
        .push_back(Ok(vec![case("TC1", "Apply discount")]));
    backend
        .script_responses
        .borrow_mut()
        .push_back(Ok("driver.get(url)".to_string()));
    let mut app = test_app();
    service.generate_test_cases(&mut app, &backend, "q");
    app.switch_page();
    app.request_script_for_selected();
    service.dispatch_pending_script(&mut app, &backend);

    let dir = TempDirGuard::new("download");
    service.save_selected_script(&mut app, &dir.path().display().to_string());

    let saved = fs::read_to_string(dir.path().join("TC1.py")).expect("artifact should exist");
    assert_eq!(saved, "# Test Case: Apply discount\n\ndriver.get(url)");
}

#[test]
fn saving_without_a_ready_script_warns() {
    let service = DefaultWorkflowService;
    let backend = ScriptedBackend::default();
    backend
        .case_responses
        .borrow_mut()
        .push_back(Ok(vec![case("TC1", "a")]));
    let mut app = test_app();
    service.generate_test_cases(&mut app, &backend, "q");
    app.switch_page();

    let dir = TempDirGuard::new("nosave");
    service.save_selected_script(&mut app, &dir.path().display().to_string());

    assert!(
        status_texts(&app)
            .iter()
            .any(|t| t.contains("No generated script"))
    );
}

#[test]
fn path_list_splits_on_commas_and_trims() {
    let paths = parse_path_list(" a.pdf , b.md ,, ");
    assert_eq!(paths, vec![PathBuf::from("a.pdf"), PathBuf::from("b.md")]);
    assert!(parse_path_list("  ").is_empty());
}
