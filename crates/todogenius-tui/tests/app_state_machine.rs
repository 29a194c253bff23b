//! State machine tests for the TUI App.
//!
//! Each test builds an App over a `MockService`, drives it with key events and
//! explicit instants, and waits for the spawned service calls with `settle`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use todogenius_core::context::{ContextEntry, SourceType};
use todogenius_core::task::{Status, Task, TaskPayload};
use todogenius_service::mock::{make_category, make_enhancement, make_task, Call, MockService, Op};
use todogenius_service::ServiceError;
use todogenius_tui::app::{App, Mode};
use todogenius_tui::config::UiConfig;
use todogenius_tui::route::Route;

const SETTLE: Duration = Duration::from_secs(5);
const TITLE_DELAY: Duration = Duration::from_millis(3000);
const SEARCH_DELAY: Duration = Duration::from_millis(500);

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn char_key(c: char) -> KeyEvent {
    key(KeyCode::Char(c))
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn type_text(app: &mut App, text: &str, at: Instant) {
    for c in text.chars() {
        app.handle_key_at(char_key(c), at);
    }
}

fn ui() -> UiConfig {
    UiConfig {
        title_debounce: TITLE_DELAY,
        search_debounce: SEARCH_DELAY,
    }
}

struct Harness {
    // Keeps the worker threads alive for the App's handle.
    _rt: tokio::runtime::Runtime,
    svc: Arc<MockService>,
    app: App,
}

fn harness(svc: MockService, route: Route) -> Harness {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let svc = Arc::new(svc);
    let mut app = App::new(svc.clone(), rt.handle().clone(), ui(), route);
    assert!(app.settle(SETTLE), "initial load did not finish");
    Harness { _rt: rt, svc, app }
}

/// A completed task as the server sends it, with a deadline written in a
/// non-UTC offset and both AI flags set.
fn completed_task() -> Task {
    serde_json::from_value(serde_json::json!({
        "id": "t2",
        "title": "Buy milk",
        "description": "Semi-skimmed",
        "is_ai_enhanced": true,
        "deadline": "2025-06-01T00:00:00+05:30",
        "is_ai_suggested_deadline": true,
        "priority_score": 0.75,
        "category": "c1",
        "category_name": "Shopping",
        "category_color": "#10B981",
        "status": "completed",
        "is_overdue": false,
        "days_until_deadline": null,
        "created_at": "2025-05-01T09:00:00Z",
        "updated_at": "2025-05-02T09:00:00Z",
        "completed_at": "2025-05-02T09:00:00Z"
    }))
    .unwrap()
}

fn seeded() -> MockService {
    MockService::new()
        .with_tasks(vec![make_task("t1", "Write report"), completed_task()])
        .with_categories(vec![make_category("c1", "Shopping", "#10B981")])
}

fn entry(id: &str, content: &str) -> ContextEntry {
    ContextEntry {
        id: id.into(),
        content: content.into(),
        source_type: SourceType::Email,
        is_processed: false,
        created_at: Some(Utc::now()),
        context_date: Some(Utc::now().date_naive()),
    }
}

// ---- Startup and navigation ----

#[test]
fn app_starts_normal_with_tasks_loaded() {
    let h = harness(seeded(), Route::Tasks);
    assert!(matches!(h.app.mode(), Mode::Normal));
    assert_eq!(h.app.route(), &Route::Tasks);
    assert_eq!(h.app.tasks().len(), 2);
    assert_eq!(h.app.categories().len(), 1);
    assert_eq!(h.svc.count(Op::ListTasks), 1);
    assert_eq!(h.svc.count(Op::ListContext), 0);
}

#[test]
fn unknown_route_shows_not_found_until_going_home() {
    let mut h = harness(seeded(), Route::parse("/settings"));
    assert_eq!(h.app.route(), &Route::NotFound("/settings".into()));
    assert_eq!(h.svc.count(Op::ListTasks), 0);

    h.app.handle_key(char_key('n'));
    assert!(matches!(h.app.mode(), Mode::Normal));
    assert!(h.app.form().is_none());

    h.app.handle_key(key(KeyCode::Enter));
    assert_eq!(h.app.route(), &Route::Tasks);
    assert!(h.app.settle(SETTLE));
    assert_eq!(h.app.tasks().len(), 2);
}

#[test]
fn v_switches_between_views() {
    let mut h = harness(seeded(), Route::Tasks);
    h.app.handle_key(char_key('v'));
    assert_eq!(h.app.route(), &Route::Context);
    assert!(h.app.settle(SETTLE));
    assert_eq!(h.svc.count(Op::ListContext), 1);

    h.app.handle_key(char_key('v'));
    assert_eq!(h.app.route(), &Route::Tasks);
}

#[test]
fn fetch_failure_shows_error_and_retry_recovers() {
    let svc = seeded();
    svc.fail(Op::ListTasks, ServiceError::Unavailable("connection refused".into()));
    let mut h = harness(svc, Route::Tasks);
    assert_eq!(h.app.tasks_error(), Some("Error fetching tasks"));
    assert!(h.app.tasks().is_empty());

    h.svc.recover(Op::ListTasks);
    h.app.handle_key(char_key('r'));
    assert!(h.app.settle(SETTLE));
    assert!(h.app.tasks_error().is_none());
    assert_eq!(h.app.tasks().len(), 2);
}

// ---- Task form ----

#[test]
fn n_opens_create_form_and_esc_closes() {
    let mut h = harness(seeded(), Route::Tasks);
    h.app.handle_key(char_key('n'));
    assert!(matches!(h.app.mode(), Mode::TaskForm { picker: None }));
    assert!(h.app.is_input_mode());
    assert!(!h.app.form().unwrap().is_edit());

    h.app.handle_key(key(KeyCode::Esc));
    assert!(matches!(h.app.mode(), Mode::Normal));
    assert!(h.app.form().is_none());
}

#[test]
fn create_task_closes_form_and_reloads() {
    let mut h = harness(seeded(), Route::Tasks);
    let now = Instant::now();
    h.app.handle_key_at(char_key('n'), now);
    type_text(&mut h.app, "Plan trip", now);
    h.app.handle_key_at(ctrl('s'), now);
    assert!(h.app.form().unwrap().is_saving());

    assert!(h.app.settle(SETTLE));
    assert!(matches!(h.app.mode(), Mode::Normal));
    assert_eq!(h.app.status_message(), Some("Task created"));
    assert!(h.app.tasks().iter().any(|t| t.title == "Plan trip"));

    let created = h
        .svc
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::CreateTask(p) => Some(p),
            _ => None,
        })
        .unwrap();
    assert_eq!(created.priority_score, 0.5);
    assert_eq!(created.status, None);
    assert!(!created.is_ai_enhanced);
}

#[test]
fn empty_title_is_rejected_without_a_request() {
    let mut h = harness(seeded(), Route::Tasks);
    h.app.handle_key(char_key('n'));
    type_text(&mut h.app, "   ", Instant::now());
    h.app.handle_key(key(KeyCode::Enter));

    assert!(matches!(h.app.mode(), Mode::TaskForm { .. }));
    assert_eq!(h.app.form().unwrap().error(), Some("title is required"));
    assert_eq!(h.svc.count(Op::CreateTask), 0);
}

#[test]
fn create_failure_keeps_form_open_with_server_message() {
    let svc = seeded();
    svc.fail(Op::CreateTask, ServiceError::InvalidInput("Title too long".into()));
    let mut h = harness(svc, Route::Tasks);

    h.app.handle_key(char_key('n'));
    type_text(&mut h.app, "Plan trip", Instant::now());
    h.app.handle_key(ctrl('s'));
    assert!(h.app.settle(SETTLE));

    let form = h.app.form().unwrap();
    assert!(matches!(h.app.mode(), Mode::TaskForm { .. }));
    assert!(!form.is_saving());
    assert_eq!(form.error(), Some("Title too long"));
    assert_eq!(form.title(), "Plan trip");
}

#[test]
fn edit_sends_update_with_existing_status() {
    let mut h = harness(seeded(), Route::Tasks);
    h.app.handle_key(char_key('j'));
    assert_eq!(h.app.selected_task().unwrap().id, "t2");

    h.app.handle_key(char_key('e'));
    assert!(h.app.form().unwrap().is_edit());
    type_text(&mut h.app, " today", Instant::now());
    h.app.handle_key(ctrl('s'));
    assert!(h.app.settle(SETTLE));

    assert_eq!(h.app.status_message(), Some("Task updated"));
    let calls = h.svc.calls();
    let (id, payload) = calls
        .iter()
        .find_map(|c| match c {
            Call::UpdateTask(id, p) => Some((id, p)),
            _ => None,
        })
        .unwrap();
    assert_eq!(id, "t2");
    assert_eq!(payload.title, "Buy milk today");
    assert_eq!(payload.status, Some(Status::Completed));
    assert_eq!(payload.category_name, "Shopping");
}

#[test]
fn category_picker_selects_existing_category() {
    let mut h = harness(seeded(), Route::Tasks);
    let now = Instant::now();
    h.app.handle_key_at(char_key('n'), now);
    type_text(&mut h.app, "Groceries", now);
    h.app.handle_key(key(KeyCode::Tab));
    h.app.handle_key(key(KeyCode::Tab));
    h.app.handle_key(key(KeyCode::Enter));
    assert!(matches!(h.app.mode(), Mode::TaskForm { picker: Some(0) }));

    h.app.handle_key(key(KeyCode::Enter));
    assert!(matches!(h.app.mode(), Mode::TaskForm { picker: None }));
    assert_eq!(h.app.form().unwrap().category().unwrap().name, "Shopping");
}

// ---- AI suggestions ----

#[test]
fn title_debounce_requests_one_enhancement_for_final_title() {
    let svc = seeded().with_enhancement(
        "Buy milk and eggs",
        make_enhancement("Get a dozen eggs too", "Errands", "#F59E0B"),
    );
    let mut h = harness(svc, Route::Tasks);

    let t0 = Instant::now();
    h.app.handle_key_at(char_key('n'), t0);
    type_text(&mut h.app, "Buy milk", t0);
    let t1 = t0 + Duration::from_millis(1000);
    type_text(&mut h.app, " and eggs", t1);

    h.app.tick(t0 + TITLE_DELAY);
    assert!(h.svc.enhance_calls().is_empty());

    h.app.tick(t1 + TITLE_DELAY);
    assert!(h.app.form().unwrap().reconciler().is_loading());
    assert!(h.app.settle(SETTLE));
    assert_eq!(h.svc.enhance_calls(), vec!["Buy milk and eggs".to_string()]);

    let form = h.app.form().unwrap();
    let suggestion = form.current_suggestion().unwrap();
    assert_eq!(suggestion.description(), "Get a dozen eggs too");
    assert!(form.reconciler().panel_visible());

    // Re-ticking with no edits does not ask again.
    h.app.tick(t1 + TITLE_DELAY * 2);
    assert_eq!(h.svc.count(Op::EnhanceTask), 1);
}

#[test]
fn applying_category_leaves_other_fields_alone() {
    let svc = seeded().with_enhancement(
        "Buy milk and eggs",
        make_enhancement("Get a dozen eggs too", "Errands", "#F59E0B"),
    );
    let mut h = harness(svc, Route::Tasks);

    let t0 = Instant::now();
    h.app.handle_key_at(char_key('n'), t0);
    type_text(&mut h.app, "Buy milk and eggs", t0);
    h.app.tick(t0 + TITLE_DELAY);
    assert!(h.app.settle(SETTLE));

    h.app.handle_key(ctrl('g'));
    let form = h.app.form().unwrap();
    assert_eq!(form.category().unwrap().name, "Errands");
    assert_eq!(form.category().unwrap().color, "#F59E0B");
    assert_eq!(form.description(), "");
    assert_eq!(form.priority(), 0.5);
    assert_eq!(form.deadline(), None);

    h.app.handle_key(ctrl('a'));
    assert_eq!(h.app.form().unwrap().description(), "Get a dozen eggs too");
}

#[test]
fn answer_for_an_old_title_is_discarded() {
    let mut h = harness(seeded(), Route::Tasks);

    let t0 = Instant::now();
    h.app.handle_key_at(char_key('n'), t0);
    type_text(&mut h.app, "Call mom", t0);
    h.app.tick(t0 + TITLE_DELAY);
    assert_eq!(h.svc.enhance_calls(), vec!["Call mom".to_string()]);

    // The title moves on before the answer is applied.
    type_text(&mut h.app, " today", t0 + TITLE_DELAY);
    assert!(h.app.settle(SETTLE));

    let form = h.app.form().unwrap();
    assert!(form.reconciler().suggestion().is_none());
    assert!(!form.reconciler().is_loading());

    h.app.handle_key(ctrl('a'));
    assert_eq!(h.app.status_message(), Some("no AI suggestion available"));
}

#[test]
fn enhancement_failure_shows_message_and_keeps_form() {
    let svc = seeded();
    svc.fail(Op::EnhanceTask, ServiceError::Internal(String::new()));
    let mut h = harness(svc, Route::Tasks);

    let t0 = Instant::now();
    h.app.handle_key_at(char_key('n'), t0);
    type_text(&mut h.app, "Renew passport", t0);
    h.app.tick(t0 + TITLE_DELAY);
    assert!(h.app.settle(SETTLE));

    let form = h.app.form().unwrap();
    assert!(form.reconciler().error().is_some());
    assert!(form.reconciler().suggestion().is_none());
    assert_eq!(form.title(), "Renew passport");
}

#[test]
fn answer_after_form_closed_is_ignored() {
    let mut h = harness(seeded(), Route::Tasks);

    let t0 = Instant::now();
    h.app.handle_key_at(char_key('n'), t0);
    type_text(&mut h.app, "Water plants", t0);
    h.app.tick(t0 + TITLE_DELAY);
    h.app.handle_key(key(KeyCode::Esc));
    h.app.handle_key(char_key('n'));
    assert!(h.app.settle(SETTLE));

    let form = h.app.form().unwrap();
    assert_eq!(form.title(), "");
    assert!(form.reconciler().suggestion().is_none());
}

// ---- Delete and toggle ----

#[test]
fn delete_cancel_leaves_list_unchanged() {
    let mut h = harness(seeded(), Route::Tasks);
    h.app.handle_key(char_key('d'));
    assert!(matches!(h.app.mode(), Mode::ConfirmDelete { busy: false, .. }));

    h.app.handle_key(char_key('n'));
    assert!(matches!(h.app.mode(), Mode::Normal));
    assert_eq!(h.svc.count(Op::DeleteTask), 0);
    assert_eq!(h.app.tasks().len(), 2);
}

#[test]
fn delete_confirm_sends_one_request_and_closes() {
    let mut h = harness(seeded(), Route::Tasks);
    h.app.handle_key(char_key('d'));
    h.app.handle_key(char_key('y'));
    assert!(matches!(h.app.mode(), Mode::ConfirmDelete { busy: true, .. }));

    // Keys are ignored while the request is in flight.
    h.app.handle_key(char_key('y'));
    assert!(h.app.settle(SETTLE));

    assert!(matches!(h.app.mode(), Mode::Normal));
    assert_eq!(h.svc.count(Op::DeleteTask), 1);
    assert_eq!(h.app.tasks().len(), 1);
    assert_eq!(h.app.status_message(), Some("Deleted: Write report"));
}

#[test]
fn delete_failure_keeps_dialog_with_error() {
    let svc = seeded();
    svc.fail(Op::DeleteTask, ServiceError::Internal(String::new()));
    let mut h = harness(svc, Route::Tasks);
    h.app.handle_key(char_key('d'));
    h.app.handle_key(key(KeyCode::Enter));
    assert!(h.app.settle(SETTLE));

    match h.app.mode() {
        Mode::ConfirmDelete { busy, error, .. } => {
            assert!(!busy);
            assert_eq!(
                error.as_deref(),
                Some("Failed to delete task. Please try again.")
            );
        }
        other => panic!("expected ConfirmDelete, got {other:?}"),
    }
    assert_eq!(h.app.tasks().len(), 2);
}

#[test]
fn toggling_completed_task_reopens_with_same_fields() {
    let mut h = harness(seeded(), Route::Tasks);
    h.app.handle_key(char_key('j'));
    h.app.handle_key(char_key(' '));
    assert!(matches!(h.app.mode(), Mode::ConfirmToggle { .. }));
    h.app.handle_key(char_key('y'));
    assert!(h.app.settle(SETTLE));

    assert!(matches!(h.app.mode(), Mode::Normal));
    let calls = h.svc.calls();
    let (id, payload) = calls
        .iter()
        .find_map(|c| match c {
            Call::UpdateTask(id, p) => Some((id, p)),
            _ => None,
        })
        .unwrap();
    assert_eq!(id, "t2");

    let expected = TaskPayload::from_task(&completed_task()).with_status(Status::Pending);
    assert_eq!(payload, &expected);
    assert_eq!(payload.deadline, NaiveDate::from_ymd_opt(2025, 6, 1));
    assert_eq!(payload.priority_score, 0.75);
    assert_eq!(payload.category_color, "#10B981");
    assert!(payload.is_ai_enhanced);
    assert!(payload.is_ai_suggested_deadline);

    let reopened = h.app.tasks().iter().find(|t| t.id == "t2").unwrap();
    assert_eq!(reopened.status, Status::Pending);
}

// ---- Search and filters ----

#[test]
fn search_waits_for_typing_to_pause() {
    let mut h = harness(seeded(), Route::Tasks);
    let t0 = Instant::now();
    h.app.handle_key_at(char_key('/'), t0);
    assert!(matches!(h.app.mode(), Mode::Search));
    type_text(&mut h.app, "milk", t0);

    h.app.tick(t0 + Duration::from_millis(100));
    assert_eq!(h.svc.count(Op::ListTasks), 1);

    h.app.tick(t0 + SEARCH_DELAY);
    assert!(h.app.settle(SETTLE));
    assert_eq!(h.svc.count(Op::ListTasks), 2);
    assert_eq!(h.app.task_filter().search, "milk");
    assert_eq!(h.app.tasks().len(), 1);
    assert_eq!(h.app.tasks()[0].title, "Buy milk");
}

#[test]
fn status_filter_and_clear() {
    let mut h = harness(seeded(), Route::Tasks);
    h.app.handle_key(char_key('s'));
    assert!(h.app.settle(SETTLE));
    assert_eq!(h.app.task_filter().active_count(), 1);
    let filtered = h.app.tasks().len();
    assert!(filtered < 2);

    h.app.handle_key(char_key('C'));
    assert!(h.app.settle(SETTLE));
    assert_eq!(h.app.task_filter().active_count(), 0);
    assert_eq!(h.app.tasks().len(), 2);
}

// ---- Context ----

#[test]
fn add_context_clears_input_and_shows_success() {
    let mut h = harness(MockService::new(), Route::Context);
    assert_eq!(h.svc.count(Op::ListContext), 1);

    h.app.handle_key(char_key('i'));
    assert!(matches!(h.app.mode(), Mode::ContextInput));
    type_text(&mut h.app, "Meeting moved to Friday", Instant::now());
    h.app.handle_key(key(KeyCode::Enter));
    assert!(h.app.settle(SETTLE));

    assert_eq!(h.app.context_entries().len(), 1);
    assert_eq!(h.app.context_form().content(), "");
    assert!(h.app.context_form().success_visible());
    assert_eq!(h.svc.context_entries()[0].content, "Meeting moved to Friday");
}

#[test]
fn empty_context_is_rejected_without_a_request() {
    let mut h = harness(MockService::new(), Route::Context);
    h.app.handle_key(char_key('i'));
    h.app.handle_key(key(KeyCode::Enter));

    assert_eq!(h.app.context_form().error(), Some("content is required"));
    assert_eq!(h.svc.count(Op::CreateContext), 0);
}

#[test]
fn mark_processed_and_delete_context() {
    let svc = MockService::new().with_context(vec![entry("e1", "Invoice due"), entry("e2", "Call Sam")]);
    let mut h = harness(svc, Route::Context);

    h.app.handle_key(char_key('m'));
    assert!(h.app.settle(SETTLE));
    assert!(h.app.context_entries()[0].is_processed);

    h.app.handle_key(char_key('d'));
    assert!(matches!(h.app.mode(), Mode::ConfirmDeleteContext { .. }));
    h.app.handle_key(char_key('y'));
    assert!(h.app.settle(SETTLE));

    assert!(matches!(h.app.mode(), Mode::Normal));
    assert_eq!(h.svc.count(Op::DeleteContext), 1);
    assert_eq!(h.app.context_entries().len(), 1);
    assert_eq!(h.app.context_entries()[0].id, "e2");
}
