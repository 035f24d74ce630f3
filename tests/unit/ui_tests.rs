use super::*;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;

use crate::backend::TestCase;
use crate::session::Session;

fn case(id: &str, scenario: &str) -> TestCase {
    TestCase {
        test_id: Some(id.to_string()),
        test_scenario: scenario.to_string(),
        test_type: "functional".to_string(),
        feature: "checkout".to_string(),
        expected_result: "total drops by 10%".to_string(),
        grounded_in: "pricing.md".to_string(),
    }
}

fn test_cases_app(cases: Vec<TestCase>) -> App {
    let mut app = App::with_session(Session::with_id("cafef00d"));
    app.switch_page();
    app.install_test_cases(cases);
    app
}

fn render_text(app: &App, width: u16, height: u16) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).expect("test terminal should initialize");
    let theme = Theme::default();
    terminal
        .draw(|frame| render(frame, app, &theme))
        .expect("render should succeed");
    buffer_to_string(terminal.backend().buffer())
}

fn buffer_to_string(buffer: &Buffer) -> String {
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

#[test]
fn render_shows_title_session_and_help() {
    let app = App::with_session(Session::with_id("cafef00d"));
    let text = render_text(&app, 120, 30);
    assert!(text.contains("Autonomous QA Console"));
    assert!(text.contains("session cafef00d"));
    assert!(text.contains("Knowledge Base"));
    assert!(text.contains("Test Cases"));
    assert!(text.contains("Ctrl+C quit"));
}

#[test]
fn knowledge_base_page_lists_ingested_files_sorted() {
    let mut app = App::with_session(Session::with_id("cafef00d"));
    app.record_ingested(["b.md".to_string(), "a.pdf".to_string()]);
    let text = render_text(&app, 120, 30);
    assert!(text.contains("Ingested Files"));
    assert!(text.contains("+ a.pdf"));
    assert!(text.contains("+ b.md"));
    let a = text.find("+ a.pdf").expect("a.pdf shown");
    let b = text.find("+ b.md").expect("b.md shown");
    assert!(a < b);
}

#[test]
fn empty_knowledge_base_shows_placeholder() {
    let app = App::with_session(Session::with_id("cafef00d"));
    let text = render_text(&app, 120, 30);
    assert!(text.contains("No documents ingested yet."));
}

#[test]
fn test_cases_page_lists_case_headers() {
    let app = test_cases_app(vec![case("TC1", "Apply discount"), case("TC2", "Reject expired code")]);
    let text = render_text(&app, 120, 30);
    assert!(text.contains("TC1: Apply discount (functional)"));
    assert!(text.contains("TC2: Reject expired code (functional)"));
    assert!(text.contains("> TC1"));
}

#[test]
fn expanded_case_shows_details() {
    let mut app = test_cases_app(vec![case("TC1", "Apply discount")]);
    app.toggle_expanded();
    let text = render_text(&app, 120, 30);
    assert!(text.contains("Feature: checkout"));
    assert!(text.contains("Expected Result: total drops by 10%"));
    assert!(text.contains("Grounded In: pricing.md"));
}

#[test]
fn collapsed_case_hides_details() {
    let app = test_cases_app(vec![case("TC1", "Apply discount")]);
    let text = render_text(&app, 120, 30);
    assert!(!text.contains("Grounded In: pricing.md"));
}

#[test]
fn in_flight_case_shows_generating_marker() {
    let mut app = test_cases_app(vec![case("TC1", "Apply discount")]);
    app.request_script_for_selected();
    let text = render_text(&app, 120, 30);
    assert!(text.contains("[generating...]"));
    assert!(text.contains("Generating script for TC1..."));
}

#[test]
fn ready_case_shows_script_preview() {
    let mut app = test_cases_app(vec![case("TC1", "Apply discount")]);
    app.request_script_for_selected();
    app.take_pending_script();
    app.resolve_script("TC1", Ok("from selenium import webdriver".to_string()));
    let text = render_text(&app, 120, 30);
    assert!(text.contains("[script ready]"));
    assert!(text.contains("from selenium import webdriver"));
}

#[test]
fn failed_case_shows_the_error_message() {
    let mut app = test_cases_app(vec![case("TC1", "Apply discount")]);
    app.request_script_for_selected();
    app.take_pending_script();
    app.resolve_script("TC1", Err("model overloaded".to_string()));
    let text = render_text(&app, 120, 30);
    assert!(text.contains("[script failed]"));
    assert!(text.contains("Script generation failed: model overloaded"));
}

#[test]
fn empty_collection_shows_placeholder() {
    let app = test_cases_app(Vec::new());
    let text = render_text(&app, 120, 30);
    assert!(text.contains("No test cases yet."));
}

#[test]
fn status_log_and_busy_hint_are_rendered() {
    let mut app = App::with_session(Session::with_id("cafef00d"));
    app.push_error("Upload failed: server error 500: boom");
    app.set_busy("Ingesting documents...");
    let text = render_text(&app, 120, 30);
    assert!(text.contains("Upload failed: server error 500: boom"));
    assert!(text.contains("* Ingesting documents..."));
    assert!(!text.contains("Ctrl+C quit"));
}

#[test]
fn input_text_is_rendered_on_the_active_page() {
    let mut app = App::with_session(Session::with_id("cafef00d"));
    for c in "docs/spec.pdf".chars() {
        app.input_char(c);
    }
    let text = render_text(&app, 120, 30);
    assert!(text.contains("docs/spec.pdf"));
}
