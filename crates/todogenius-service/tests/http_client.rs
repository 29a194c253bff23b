//! Integration tests for HttpService against an in-process fake API.
//!
//! Each test spawns an axum router on 127.0.0.1:0 that answers with the
//! backend's `{success, message, data}` envelope and records the query
//! strings it receives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use todogenius_core::context::{ContextFilter, SourceType};
use todogenius_core::priority::PriorityBand;
use todogenius_core::task::{Status, StatusFilter, TaskFilter, TaskPayload};
use todogenius_service::{HttpService, ServiceError, TodoService};

#[derive(Clone, Default)]
struct Recorded {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

fn task_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "is_ai_enhanced": false,
        "deadline": "2025-06-01T00:00:00Z",
        "is_ai_suggested_deadline": false,
        "priority_score": 0.8,
        "category": "c1",
        "category_name": "Work",
        "category_color": "#3B82F6",
        "status": "pending",
        "is_overdue": false,
        "days_until_deadline": 3,
        "created_at": "2025-05-01T10:00:00.123456Z",
        "updated_at": "2025-05-01T10:00:00Z",
        "completed_at": null
    })
}

async fn list_tasks(
    State(rec): State<Recorded>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.queries.lock().unwrap().push(q);
    Json(json!({
        "success": true,
        "message": "Tasks retrieved successfully",
        "data": [task_json("t1", "Write report")]
    }))
}

async fn create_task(State(rec): State<Recorded>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    rec.bodies.lock().unwrap().push(body.clone());
    if body["title"].as_str().unwrap_or("").trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Title cannot be empty"})),
        );
    }
    let title = body["title"].as_str().unwrap_or_default().to_string();
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "message": "Task created", "data": task_json("new", &title)})),
    )
}

async fn update_task(
    State(rec): State<Recorded>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.bodies.lock().unwrap().push(body.clone());
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "Task not found"})),
        );
    }
    let mut task = task_json(&id, body["title"].as_str().unwrap_or_default());
    task["status"] = body["status"].clone();
    (StatusCode::OK, Json(json!({"success": true, "data": task})))
}

async fn delete_task(Path(id): Path<String>) -> StatusCode {
    if id == "missing" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn categories() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": [{"id": "c1", "name": "Work", "color": "#3B82F6", "usage_frequency": 4, "task_count": 2}]
    }))
}

async fn list_context(
    State(rec): State<Recorded>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.queries.lock().unwrap().push(q);
    Json(json!({
        "success": true,
        "data": [{
            "id": "e1",
            "content": "Dentist moved to Friday",
            "source_type": "whatsapp",
            "is_processed": false,
            "created_at": "2025-05-01T09:00:00Z",
            "context_date": "2025-05-01"
        }]
    }))
}

async fn mark_processed(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {"id": id, "content": "x", "source_type": "note", "is_processed": true}
    }))
}

async fn enhance(State(rec): State<Recorded>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    rec.bodies.lock().unwrap().push(body.clone());
    if body["task_name"] == "boom" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "AI service not available"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "title": body["task_name"],
                "descriptions": ["Call the bank before noon"],
                "category": {"name": "Finance", "color": "#10B981", "is_new": true},
                "priority_score": 0.7,
                "deadline": "2025-06-03",
                "confidence": 0.75,
                "reasoning": "Bank hours are limited"
            }
        })),
    )
}

async fn soft_failure() -> Json<Value> {
    Json(json!({"success": false, "message": "Database busy"}))
}

async fn spawn_server() -> (String, Recorded) {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/api/tasks/tasks-list/", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}/", put(update_task).delete(delete_task))
        .route("/api/tasks/categories/", get(categories))
        .route("/api/context/", get(list_context).post(soft_failure))
        .route("/api/context/{id}/mark-processed/", post(mark_processed))
        .route("/api/ai/enhance-task/", post(enhance))
        .with_state(rec.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), rec)
}

fn payload(title: &str) -> TaskPayload {
    TaskPayload {
        title: title.into(),
        description: "desc".into(),
        category_name: "Work".into(),
        category_color: "#3B82F6".into(),
        priority_score: 0.8,
        deadline: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
        is_ai_enhanced: false,
        is_ai_suggested_deadline: false,
        status: None,
    }
}

#[tokio::test]
async fn list_tasks_unwraps_envelope_and_sends_filters() {
    let (url, rec) = spawn_server().await;
    let svc = HttpService::new(&url);

    let filter = TaskFilter {
        search: "  report ".into(),
        status: StatusFilter::Overdue,
        priority: Some(PriorityBand::Medium),
        category_id: Some("c1".into()),
    };
    let tasks = svc.list_tasks(&filter).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Write report");
    assert_eq!(tasks[0].description, "");
    assert_eq!(tasks[0].category_id.as_deref(), Some("c1"));

    let queries = rec.queries.lock().unwrap();
    let q = &queries[0];
    assert_eq!(q.get("search").map(String::as_str), Some("report"));
    assert_eq!(q.get("overdue").map(String::as_str), Some("true"));
    assert!(!q.contains_key("status"));
    assert_eq!(q.get("min_priority").map(String::as_str), Some("0.3"));
    assert_eq!(q.get("max_priority").map(String::as_str), Some("0.7"));
    assert_eq!(q.get("category").map(String::as_str), Some("c1"));
}

#[tokio::test]
async fn empty_filter_sends_no_query() {
    let (url, rec) = spawn_server().await;
    let svc = HttpService::new(&format!("{url}/"));
    svc.list_tasks(&TaskFilter::default()).await.unwrap();
    assert!(rec.queries.lock().unwrap()[0].is_empty());
}

#[tokio::test]
async fn create_task_posts_payload() {
    let (url, rec) = spawn_server().await;
    let svc = HttpService::new(&url);

    let task = svc.create_task(&payload("Pay rent")).await.unwrap();
    assert_eq!(task.id, "new");
    assert_eq!(task.title, "Pay rent");

    let bodies = rec.bodies.lock().unwrap();
    assert_eq!(bodies[0]["deadline"], "2025-06-01");
    assert_eq!(bodies[0]["category_name"], "Work");
    assert!(bodies[0].get("status").is_none());
}

#[tokio::test]
async fn create_task_surfaces_server_message() {
    let (url, _rec) = spawn_server().await;
    let svc = HttpService::new(&url);
    let err = svc.create_task(&payload("   ")).await.unwrap_err();
    assert_eq!(err, ServiceError::InvalidInput("Title cannot be empty".into()));
    assert_eq!(
        err.user_message("Failed to create task. Please try again."),
        "Title cannot be empty"
    );
}

#[tokio::test]
async fn update_task_sends_status() {
    let (url, rec) = spawn_server().await;
    let svc = HttpService::new(&url);
    let updated = svc
        .update_task("t1", &payload("Pay rent").with_status(Status::Completed))
        .await
        .unwrap();
    assert_eq!(updated.status, Status::Completed);
    assert_eq!(rec.bodies.lock().unwrap()[0]["status"], "completed");

    let err = svc.update_task("missing", &payload("x")).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(m) if m == "Task not found"));
}

#[tokio::test]
async fn delete_task_accepts_no_content() {
    let (url, _rec) = spawn_server().await;
    let svc = HttpService::new(&url);
    svc.delete_task("t1").await.unwrap();
    assert!(matches!(
        svc.delete_task("missing").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn categories_and_context() {
    let (url, rec) = spawn_server().await;
    let svc = HttpService::new(&url);

    let cats = svc.list_categories().await.unwrap();
    assert_eq!(cats[0].name, "Work");
    assert_eq!(cats[0].task_count, 2);

    let filter = ContextFilter {
        source_type: Some(SourceType::Whatsapp),
        is_processed: Some(false),
        ..Default::default()
    };
    let entries = svc.list_context(&filter).await.unwrap();
    assert_eq!(entries[0].source_type, SourceType::Whatsapp);
    {
        let queries = rec.queries.lock().unwrap();
        assert_eq!(queries[0].get("source_type").map(String::as_str), Some("whatsapp"));
        assert_eq!(queries[0].get("is_processed").map(String::as_str), Some("false"));
    }

    let entry = svc.mark_context_processed("e1").await.unwrap();
    assert!(entry.is_processed);
}

#[tokio::test]
async fn success_false_is_an_error() {
    let (url, _rec) = spawn_server().await;
    let svc = HttpService::new(&url);
    let err = svc
        .create_context(&todogenius_core::context::CreateContext {
            content: "note".into(),
            source_type: SourceType::Note,
            context_date: chrono::NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::Internal("Database busy".into()));
}

#[tokio::test]
async fn enhance_task_posts_task_name() {
    let (url, rec) = spawn_server().await;
    let svc = HttpService::new(&url);

    let e = svc.enhance_task("Call bank").await.unwrap();
    assert_eq!(e.category.as_ref().unwrap().name, "Finance");
    assert_eq!(e.deadline, chrono::NaiveDate::from_ymd_opt(2025, 6, 3));
    assert_eq!(rec.bodies.lock().unwrap()[0]["task_name"], "Call bank");

    let err = svc.enhance_task("boom").await.unwrap_err();
    assert_eq!(err, ServiceError::Internal("AI service not available".into()));
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let svc = HttpService::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = svc.list_categories().await.unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
    assert_eq!(
        err.user_message("Failed to load categories"),
        "Failed to load categories"
    );
}
