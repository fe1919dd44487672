//! End-to-end checks of the REST surface against the in-memory store.

use api_lib::adapters::{KeywordCategoryAdapter, LogNotificationAdapter};
use api_lib::cache::TtlCache;
use api_lib::config::Config;
use api_lib::web::{router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use duotrack_core::clock::ManualClock;
use duotrack_core::memory::MemoryStore;
use duotrack_core::ports::DatabaseService;
use duotrack_core::Calendar;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    app: Router,
    clock: Arc<ManualClock>,
    db: Arc<MemoryStore>,
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn test_app(now: DateTime<Utc>) -> TestApp {
    let clock = Arc::new(ManualClock::new(now));
    let db = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState {
        db: db.clone(),
        config: Arc::new(Config::local()),
        notifier: Arc::new(LogNotificationAdapter),
        classifier: Arc::new(KeywordCategoryAdapter),
        clock: clock.clone(),
        calendar: Calendar::utc(),
        category_cache: Arc::new(TtlCache::new(Duration::hours(1))),
    });
    TestApp {
        app: router(state),
        clock,
        db,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Signs a user up and returns `(user id, bearer token)`.
    async fn signup(&self, name: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({ "name": name, "email": email, "password": "hunter22" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let id = body["data"]["user"]["id"].as_str().unwrap().to_string();
        let token = body["data"]["token"].as_str().unwrap().to_string();
        (id, token)
    }

    /// Links two users through a request and its acceptance.
    async fn link(&self, requester_token: &str, recipient_email: &str, recipient_token: &str) {
        let (status, _) = self
            .call(
                Method::POST,
                "/partners/requests",
                Some(requester_token),
                Some(json!({ "email": recipient_email })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, pending) = self
            .call(Method::GET, "/partners/requests", Some(recipient_token), None)
            .await;
        let request_id = pending["data"][0]["id"].as_str().unwrap().to_string();
        let (status, _) = self
            .call(
                Method::POST,
                "/partners/requests/respond",
                Some(recipient_token),
                Some(json!({ "requestId": request_id, "action": "accept" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn create_task(&self, token: &str, body: Value) -> Value {
        let (status, body) = self.call(Method::POST, "/tasks", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }
}

#[tokio::test]
async fn signup_login_and_profile() {
    let t = test_app(at(2026, 3, 2, 8, 0));
    let (id, token) = t.signup("Ada", "ada@example.com").await;

    let (status, body) = t
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (status, body) = t.call(Method::GET, "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(id));
    assert_eq!(body["data"]["streak"], json!(0));
}

#[tokio::test]
async fn rejects_bad_credentials_and_duplicate_accounts() {
    let t = test_app(at(2026, 3, 2, 8, 0));
    t.signup("Ada", "ada@example.com").await;

    let (status, body) = t
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "other" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));

    let (status, _) = t
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let t = test_app(at(2026, 3, 2, 8, 0));

    let (status, body) = t.call(Method::GET, "/tasks/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));

    let (status, _) = t
        .call(Method::GET, "/tasks/dashboard", Some("not-a-session"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn recurring_task_shows_up_on_each_day() {
    let t = test_app(at(2026, 3, 2, 8, 0));
    let (_, token) = t.signup("Ada", "ada@example.com").await;

    let created = t
        .create_task(
            &token,
            json!({
                "content": "Stand-up",
                "category": "Work",
                "date": "2026-03-02T09:00:00Z",
                "isRecurring": true,
                "recurrence": { "type": "daily", "endDate": "2026-03-04T23:00:00Z" }
            }),
        )
        .await;
    assert_eq!(created.as_array().unwrap().len(), 3);

    let (status, body) = t
        .call(
            Method::GET,
            "/tasks/dashboard?date=2026-03-03&viewMode=daily",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let mine = body["data"]["myTasks"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["date"], json!("2026-03-03T09:00:00Z"));
    assert_eq!(body["data"]["viewMode"], json!("daily"));
}

#[tokio::test]
async fn recurring_flag_without_a_rule_is_rejected() {
    let t = test_app(at(2026, 3, 2, 8, 0));
    let (_, token) = t.signup("Ada", "ada@example.com").await;

    let (status, body) = t
        .call(
            Method::POST,
            "/tasks",
            Some(&token),
            Some(json!({ "content": "Stand-up", "isRecurring": true })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn partner_may_complete_shared_tasks_only() {
    let t = test_app(at(2026, 3, 2, 8, 0));
    let (_, ada) = t.signup("Ada", "ada@example.com").await;
    let (_, bob) = t.signup("Bob", "bob@example.com").await;
    t.link(&ada, "bob@example.com", &bob).await;

    let shared = t
        .create_task(&ada, json!({ "content": "Plan trip", "isShared": true }))
        .await;
    let private = t.create_task(&ada, json!({ "content": "Diary" })).await;
    let shared_id = shared[0]["id"].as_str().unwrap();
    let private_id = private[0]["id"].as_str().unwrap();

    let (status, body) = t
        .call(
            Method::PATCH,
            &format!("/tasks/{}/status", shared_id),
            Some(&bob),
            Some(json!({ "isCompleted": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isCompleted"], json!(true));

    let (status, _) = t
        .call(
            Method::PATCH,
            &format!("/tasks/{}/status", private_id),
            Some(&bob),
            Some(json!({ "isCompleted": true })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Editing stays with the owner, and a stranger's task looks missing.
    let (status, _) = t
        .call(
            Method::PATCH,
            &format!("/tasks/{}", shared_id),
            Some(&bob),
            Some(json!({ "content": "Plan a longer trip" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_lists_partner_and_shared_tasks() {
    let t = test_app(at(2026, 3, 2, 8, 0));
    let (_, ada) = t.signup("Ada", "ada@example.com").await;
    let (_, bob) = t.signup("Bob", "bob@example.com").await;
    t.link(&ada, "bob@example.com", &bob).await;

    t.create_task(&ada, json!({ "content": "Plan trip", "isShared": true }))
        .await;
    t.create_task(&bob, json!({ "content": "Groceries" })).await;

    let (status, body) = t.call(Method::GET, "/tasks/dashboard", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["partner"]["email"], json!("bob@example.com"));
    assert!(data["partnerTasks"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["content"] == json!("Groceries")));
    assert!(data["sharedTasks"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["content"] == json!("Plan trip")));
}

#[tokio::test]
async fn completing_the_last_task_of_today_credits_the_streak() {
    let t = test_app(at(2026, 3, 2, 8, 0));
    let (_, token) = t.signup("Ada", "ada@example.com").await;
    let task = t
        .create_task(&token, json!({ "content": "Write report", "date": "2026-03-02T10:00:00Z" }))
        .await;
    let task_id = task[0]["id"].as_str().unwrap();

    let (status, _) = t
        .call(
            Method::PATCH,
            &format!("/tasks/{}/status", task_id),
            Some(&token),
            Some(json!({ "isCompleted": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The streak is evaluated off the request path.
    let mut streak = json!(0);
    for _ in 0..50 {
        let (_, me) = t.call(Method::GET, "/users/me", Some(&token), None).await;
        streak = me["data"]["streak"].clone();
        if streak == json!(1) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(streak, json!(1));
}

#[tokio::test]
async fn subtasks_drive_parent_completion() {
    let t = test_app(at(2026, 3, 2, 8, 0));
    let (_, token) = t.signup("Ada", "ada@example.com").await;
    let task = t.create_task(&token, json!({ "content": "Move house" })).await;
    let task_id = task[0]["id"].as_str().unwrap().to_string();

    let (_, body) = t
        .call(
            Method::POST,
            &format!("/tasks/{}/subtasks", task_id),
            Some(&token),
            Some(json!({ "content": "Pack books" })),
        )
        .await;
    let subtask_id = body["data"]["subtasks"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["isCompleted"], json!(false));

    let (status, body) = t
        .call(
            Method::PATCH,
            &format!("/tasks/{}/subtasks/{}", task_id, subtask_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subtasks"][0]["isCompleted"], json!(true));
    assert_eq!(body["data"]["isCompleted"], json!(true));
}

#[tokio::test]
async fn comments_are_recorded_with_their_sender() {
    let t = test_app(at(2026, 3, 2, 8, 0));
    let (ada_id, ada) = t.signup("Ada", "ada@example.com").await;
    let task = t.create_task(&ada, json!({ "content": "Plan trip" })).await;
    let task_id = task[0]["id"].as_str().unwrap();

    let (status, body) = t
        .call(
            Method::POST,
            &format!("/tasks/{}/comment", task_id),
            Some(&ada),
            Some(json!({ "text": "Booked the train" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["comments"][0]["text"], json!("Booked the train"));
    assert_eq!(body["data"]["comments"][0]["senderId"], json!(ada_id));

    let (status, _) = t
        .call(
            Method::POST,
            &format!("/tasks/{}/comment", task_id),
            Some(&ada),
            Some(json!({ "text": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn running_timer_rolls_over_at_midnight() {
    let t = test_app(at(2026, 3, 2, 23, 50));
    let (_, token) = t.signup("Ada", "ada@example.com").await;

    let (status, body) = t
        .call(Method::POST, "/work-session/start", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isRunning"], json!(true));

    t.clock.set(at(2026, 3, 3, 0, 10));
    let (status, today) = t.call(Method::GET, "/work-session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(today["data"]["date"], json!("2026-03-03"));
    assert_eq!(today["data"]["totalSeconds"], json!(600));
    assert_eq!(today["data"]["isRunning"], json!(true));

    let (_, yesterday) = t
        .call(Method::GET, "/work-session?date=2026-03-02", Some(&token), None)
        .await;
    assert_eq!(yesterday["data"]["totalSeconds"], json!(600));
    assert_eq!(yesterday["data"]["isRunning"], json!(false));

    t.clock.advance(Duration::minutes(5));
    let (_, paused) = t
        .call(Method::POST, "/work-session/pause", Some(&token), None)
        .await;
    assert_eq!(paused["data"]["totalSeconds"], json!(900));
    assert_eq!(paused["data"]["isRunning"], json!(false));
}

#[tokio::test]
async fn partner_session_needs_a_link() {
    let t = test_app(at(2026, 3, 2, 9, 0));
    let (_, ada) = t.signup("Ada", "ada@example.com").await;
    let (bob_id, bob) = t.signup("Bob", "bob@example.com").await;

    let uri = format!("/work-session?userId={}", bob_id);
    let (status, _) = t.call(Method::GET, &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    t.link(&ada, "bob@example.com", &bob).await;
    let (status, body) = t.call(Method::GET, &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], Value::Null);
    assert_eq!(body["data"]["liveTotalSeconds"], json!(0));
}

#[tokio::test]
async fn reset_without_a_ledger_reports_nothing_to_reset() {
    let t = test_app(at(2026, 3, 2, 9, 0));
    let (_, token) = t.signup("Ada", "ada@example.com").await;

    let (status, body) = t
        .call(Method::POST, "/work-session/reset", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("No session to reset"));
}

#[tokio::test]
async fn habit_toggles_a_day_on_and_off() {
    let t = test_app(at(2026, 3, 2, 9, 0));
    let (_, token) = t.signup("Ada", "ada@example.com").await;

    let (status, habit) = t
        .call(Method::POST, "/habits", Some(&token), Some(json!({ "name": "Floss" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let toggle = format!("/habits/{}/toggle", habit["data"]["id"].as_str().unwrap());

    let (_, on) = t
        .call(Method::POST, &toggle, Some(&token), Some(json!({ "date": "2026-03-02" })))
        .await;
    assert_eq!(on["data"]["completedDates"], json!(["2026-03-02"]));
    assert_eq!(on["data"]["streak"], json!(1));

    let (_, off) = t
        .call(Method::POST, &toggle, Some(&token), Some(json!({ "date": "2026-03-02" })))
        .await;
    assert_eq!(off["data"]["completedDates"], json!([]));

    let (_, list) = t.call(Method::GET, "/habits", Some(&token), None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn categorize_uses_keywords_without_a_model() {
    let t = test_app(at(2026, 3, 2, 9, 0));
    let (_, token) = t.signup("Ada", "ada@example.com").await;

    let (status, body) = t
        .call(
            Method::POST,
            "/ai/categorize",
            Some(&token),
            Some(json!({ "content": "Morning gym session" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["category"], json!("Workout"));

    let (status, _) = t
        .call(Method::POST, "/ai/categorize", Some(&token), Some(json!({ "content": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn past_ledger_started_today_does_not_invent_focus_time() {
    let t = test_app(at(2026, 3, 3, 10, 0));
    let (_, token) = t.signup("Ada", "ada@example.com").await;

    let (status, _) = t
        .call(
            Method::POST,
            "/work-session/start",
            Some(&token),
            Some(json!({ "date": "2026-03-02" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    t.clock.advance(Duration::minutes(5));
    let (_, today) = t.call(Method::GET, "/work-session", Some(&token), None).await;
    let (_, yesterday) = t
        .call(Method::GET, "/work-session?date=2026-03-02", Some(&token), None)
        .await;
    assert_eq!(yesterday["data"]["totalSeconds"], json!(0));
    assert_eq!(today["data"]["liveTotalSeconds"], json!(300));
}

#[tokio::test]
async fn analytics_summarise_tasks_and_focus() {
    let t = test_app(at(2026, 3, 2, 9, 0));
    let (_, ada) = t.signup("Ada", "ada@example.com").await;
    let (_, bob) = t.signup("Bob", "bob@example.com").await;
    t.link(&ada, "bob@example.com", &bob).await;

    let task = t
        .create_task(&ada, json!({ "content": "Write report", "category": "Work" }))
        .await;
    t.create_task(&ada, json!({ "content": "Gym", "category": "Workout" }))
        .await;
    t.create_task(&ada, json!({ "content": "Email client", "category": "Work" }))
        .await;
    let task_id = task[0]["id"].as_str().unwrap();
    t.call(
        Method::PATCH,
        &format!("/tasks/{}/status", task_id),
        Some(&ada),
        Some(json!({ "isCompleted": true })),
    )
    .await;

    let (status, heat) = t.call(Method::GET, "/analytics/heatmap", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(heat["data"], json!([{ "date": "2026-03-02", "count": 1 }]));

    let (_, categories) = t
        .call(Method::GET, "/analytics/categories", Some(&ada), None)
        .await;
    assert_eq!(categories["data"][0], json!({ "category": "Work", "count": 2 }));

    let (_, week) = t
        .call(Method::GET, "/analytics/partner-stats", Some(&ada), None)
        .await;
    assert_eq!(week["data"]["hasPartner"], json!(true));
    assert_eq!(week["data"]["days"].as_array().unwrap().len(), 7);
    assert_eq!(week["data"]["days"][6]["mine"], json!(1));

    t.call(Method::POST, "/work-session/start", Some(&bob), None).await;
    t.clock.advance(Duration::minutes(30));
    t.call(Method::POST, "/work-session/pause", Some(&bob), None).await;
    let (_, time) = t
        .call(Method::GET, "/analytics/time-stats", Some(&ada), None)
        .await;
    assert_eq!(time["data"]["mineTotalSeconds"], json!(0));
    assert_eq!(time["data"]["partnerTotalSeconds"], json!(1_800));
}

#[tokio::test]
async fn admin_routes_need_the_admin_flag() {
    let t = test_app(at(2026, 3, 2, 9, 0));
    let (ada_id, ada) = t.signup("Ada", "ada@example.com").await;
    let (bob_id, bob) = t.signup("Bob", "bob@example.com").await;

    let (status, _) = t.call(Method::GET, "/admin/users", Some(&ada), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let ada_uuid = Uuid::parse_str(&ada_id).unwrap();
    t.db.set_admin(ada_uuid, true).await.unwrap();

    let (status, users) = t.call(Method::GET, "/admin/users", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["data"].as_array().unwrap().len(), 2);

    let (_, stats) = t.call(Method::GET, "/admin/stats", Some(&ada), None).await;
    assert_eq!(stats["data"]["counts"]["users"], json!(2));

    let (status, promoted) = t
        .call(
            Method::PATCH,
            &format!("/admin/users/{}", bob_id),
            Some(&ada),
            Some(json!({ "isAdmin": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["data"]["isAdmin"], json!(true));

    let (status, _) = t.call(Method::GET, "/admin/stats", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
}
