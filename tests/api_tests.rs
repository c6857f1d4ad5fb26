//! End-to-end tests for the HTTP surface, with mocked face-analysis and mail
//! capabilities.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use rollcall::clients::face::{EyeCenters, FaceApiError, FaceGeometry, FaceMatcher, MatchResult};
use rollcall::clients::mailer::{MailerError, Notifier};
use rollcall::config::Config;
use rollcall::state::Capabilities;

// ============================================================================
// Mock capabilities
// ============================================================================

/// Configurable landmark locator.
struct MockGeometry {
    /// Eye separation to report; `None` means no face found.
    separation: Mutex<Option<f64>>,
}

impl MockGeometry {
    fn new(separation: Option<f64>) -> Arc<Self> {
        Arc::new(Self {
            separation: Mutex::new(separation),
        })
    }

    fn set(&self, separation: Option<f64>) {
        *self.separation.lock().unwrap() = separation;
    }
}

#[async_trait::async_trait]
impl FaceGeometry for MockGeometry {
    async fn locate_eyes(&self, _image: &[u8]) -> Result<Option<EyeCenters>, FaceApiError> {
        Ok(self.separation.lock().unwrap().map(|d| EyeCenters {
            left: (100.0, 100.0),
            right: (100.0 + d, 100.0),
        }))
    }
}

/// Configurable embedding comparator.
struct MockMatcher {
    distance: Mutex<f64>,
    verified: Mutex<bool>,
    /// When set, the image "contains no face": comparison fails whenever
    /// detection enforcement is requested.
    undetectable: Mutex<bool>,
    /// The `enforce_detection` flag seen on the most recent call.
    last_enforce: Mutex<Option<bool>>,
}

impl MockMatcher {
    fn new(distance: f64, verified: bool) -> Arc<Self> {
        Arc::new(Self {
            distance: Mutex::new(distance),
            verified: Mutex::new(verified),
            undetectable: Mutex::new(false),
            last_enforce: Mutex::new(None),
        })
    }

    fn set(&self, distance: f64, verified: bool) {
        *self.distance.lock().unwrap() = distance;
        *self.verified.lock().unwrap() = verified;
    }

    fn set_undetectable(&self, undetectable: bool) {
        *self.undetectable.lock().unwrap() = undetectable;
    }

    fn last_enforce(&self) -> Option<bool> {
        *self.last_enforce.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl FaceMatcher for MockMatcher {
    async fn compare(
        &self,
        _captured: &[u8],
        _reference: &[u8],
        enforce_detection: bool,
    ) -> Result<MatchResult, FaceApiError> {
        *self.last_enforce.lock().unwrap() = Some(enforce_detection);

        if enforce_detection && *self.undetectable.lock().unwrap() {
            return Err(FaceApiError::DetectionFailed);
        }

        Ok(MatchResult {
            distance: *self.distance.lock().unwrap(),
            verified: *self.verified.lock().unwrap(),
        })
    }
}

/// Captures outgoing mail so tests can read OTP codes and count side effects.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Extracts the 6-digit code from the most recent email body.
    fn last_otp(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let (_, _, body) = sent.last().expect("no email was sent");
        body.chars().filter(char::is_ascii_digit).take(6).collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

struct TestApp {
    router: Router,
    geometry: Arc<MockGeometry>,
    matcher: Arc<MockMatcher>,
    notifier: Arc<RecordingNotifier>,
}

fn test_config() -> Config {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    let db_path = std::env::temp_dir().join(format!(
        "rollcall-test-{}-{nanos}.db",
        std::process::id()
    ));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config
}

async fn spawn_app_with_config(config: Config) -> TestApp {
    let geometry = MockGeometry::new(Some(50.0));
    let matcher = MockMatcher::new(0.1, true);
    let notifier = Arc::new(RecordingNotifier::default());

    let capabilities = Capabilities {
        geometry: geometry.clone(),
        matcher: matcher.clone(),
        notifier: notifier.clone(),
    };

    let state = rollcall::api::create_app_state_with_capabilities(config, capabilities)
        .await
        .expect("failed to create app state");
    let router = rollcall::api::router(state);

    TestApp {
        router,
        geometry,
        matcher,
        notifier,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with_config(test_config()).await
}

async fn post_json(router: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn face_image() -> String {
    BASE64.encode(b"test-face-pixels")
}

/// Registers and confirms an employee through the API.
async fn enroll(app: &TestApp, employee_id: &str, email: &str, password: &str) {
    let (status, body) = post_json(
        &app.router,
        "/api/register",
        serde_json::json!({
            "employeeID": employee_id,
            "email": email,
            "employeeName": "Test Person",
            "department": "QA",
            "faceImage": face_image(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");

    let otp = app.notifier.last_otp();
    let (status, body) = post_json(
        &app.router,
        "/api/verify-otp",
        serde_json::json!({
            "employeeID": employee_id,
            "otp": otp,
            "password": password,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "verify-otp failed: {body}");
}

// ============================================================================
// Identity lifecycle
// ============================================================================

#[tokio::test]
async fn test_register_confirm_login_flow() {
    let app = spawn_app().await;
    enroll(&app, "E100", "e100@example.com", "secret-pass").await;

    let (status, body) = post_json(
        &app.router,
        "/api/login",
        serde_json::json!({"employeeID": "E100", "password": "secret-pass"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["employeeName"], "Test Person");
    assert!(
        body["data"]["message"]
            .as_str()
            .unwrap()
            .contains("Welcome, Test Person")
    );

    let (status, _) = post_json(
        &app.router,
        "/api/login",
        serde_json::json!({"employeeID": "E100", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_rejected_before_email() {
    let app = spawn_app().await;
    enroll(&app, "E200", "e200@example.com", "pw").await;
    let emails_before = app.notifier.count();

    let (status, _) = post_json(
        &app.router,
        "/api/register",
        serde_json::json!({
            "employeeID": "E200",
            "email": "other@example.com",
            "employeeName": "Other",
            "department": "QA",
            "faceImage": face_image(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Duplicate email under a new id must also conflict.
    let (status, _) = post_json(
        &app.router,
        "/api/register",
        serde_json::json!({
            "employeeID": "E201",
            "email": "e200@example.com",
            "employeeName": "Other",
            "department": "QA",
            "faceImage": face_image(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Neither rejection may have sent an OTP email.
    assert_eq!(app.notifier.count(), emails_before);
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let app = spawn_app().await;

    let (status, _) = post_json(
        &app.router,
        "/api/register",
        serde_json::json!({
            "employeeID": "E300",
            "email": "not-an-email",
            "employeeName": "X",
            "department": "QA",
            "faceImage": face_image(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.notifier.count(), 0);
}

#[tokio::test]
async fn test_otp_replay_fails() {
    let app = spawn_app().await;

    let (status, _) = post_json(
        &app.router,
        "/api/register",
        serde_json::json!({
            "employeeID": "E400",
            "email": "e400@example.com",
            "employeeName": "X",
            "department": "QA",
            "faceImage": face_image(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let otp = app.notifier.last_otp();

    let (status, _) = post_json(
        &app.router,
        "/api/verify-otp",
        serde_json::json!({"employeeID": "E400", "otp": otp, "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The code was consumed; replaying it must fail.
    let (status, _) = post_json(
        &app.router,
        "/api/verify-otp",
        serde_json::json!({"employeeID": "E400", "otp": otp, "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = spawn_app().await;
    enroll(&app, "E500", "e500@example.com", "old-pass").await;

    let (status, _) = post_json(
        &app.router,
        "/api/send-forgot-password-otp",
        serde_json::json!({"email": "e500@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let otp = app.notifier.last_otp();
    let (status, _) = post_json(
        &app.router,
        "/api/reset-password",
        serde_json::json!({"email": "e500@example.com", "otp": otp, "password": "new-pass"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &app.router,
        "/api/login",
        serde_json::json!({"employeeID": "E500", "password": "old-pass"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_json(
        &app.router,
        "/api/login",
        serde_json::json!({"employeeID": "E500", "password": "new-pass"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &app.router,
        "/api/send-forgot-password-otp",
        serde_json::json!({"email": "unknown@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_employee_flow() {
    let app = spawn_app().await;
    enroll(&app, "E600", "e600@example.com", "pw").await;

    let (status, _) = post_json(
        &app.router,
        "/api/send-update-otp",
        serde_json::json!({"employeeID": "E600", "email": "e600@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let otp = app.notifier.last_otp();
    let (status, _) = post_json(
        &app.router,
        "/api/update-employee",
        serde_json::json!({
            "employeeID": "E600",
            "otp": otp,
            "employeeName": "Renamed Person",
            "email": "e600@example.com",
            "department": "Engineering",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &app.router,
        "/api/login",
        serde_json::json!({"employeeID": "E600", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["data"]["message"]
            .as_str()
            .unwrap()
            .contains("Renamed Person")
    );

    // Id/email mismatch must not issue an OTP.
    let (status, _) = post_json(
        &app.router,
        "/api/send-update-otp",
        serde_json::json!({"employeeID": "E600", "email": "wrong@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Check-in
// ============================================================================

#[tokio::test]
async fn test_verify_accepts_at_similarity_boundary() {
    let app = spawn_app().await;
    enroll(&app, "E700", "e700@example.com", "pw").await;

    // distance 0.30 -> similarity exactly 70, inclusive.
    app.matcher.set(0.30, true);
    let (status, body) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "E700",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "70.0 must clear the bar: {body}");
    assert_eq!(body["data"]["inTime"], "09:00:00");
    assert!(body["data"]["lateTime"].is_null());
}

#[tokio::test]
async fn test_verify_rejects_below_similarity_boundary() {
    let app = spawn_app().await;
    enroll(&app, "E701", "e701@example.com", "pw").await;

    app.matcher.set(0.31, true);
    let (status, body) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "E701",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;

    // A failed match is a normal outcome, not an HTTP error.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Face verification failed");
    assert!(body["data"]["similarityScore"].as_f64().unwrap() < 70.0);
}

#[tokio::test]
async fn test_verify_liveness_gate() {
    let app = spawn_app().await;
    enroll(&app, "E702", "e702@example.com", "pw").await;

    // Eyes too close together for a live capture.
    app.geometry.set(Some(5.0));
    let (status, _) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "E702",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No face at all.
    app.geometry.set(None);
    let (status, _) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "E702",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_is_idempotent_per_day() {
    let app = spawn_app().await;
    enroll(&app, "E703", "e703@example.com", "pw").await;

    app.matcher.set(0.1, true);
    let (status, body) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "E703",
            "faceImage": face_image(),
            "inTime": "09:05:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // Second check-in the same day refuses and reports the first in-time.
    let (status, body) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "E703",
            "faceImage": face_image(),
            "inTime": "10:30:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Attendance already marked for today");
    assert_eq!(body["data"]["inTime"], "09:05:00");
}

#[tokio::test]
async fn test_verify_records_lateness() {
    let app = spawn_app().await;
    enroll(&app, "E704", "e704@example.com", "pw").await;

    // Default threshold is 09:30.
    app.matcher.set(0.1, true);
    let (status, body) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "E704",
            "faceImage": face_image(),
            "inTime": "11:05:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lateTime"], "1 hr 35 min");
}

#[tokio::test]
async fn test_verify_unknown_employee() {
    let app = spawn_app().await;

    let (status, _) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "NOPE",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fallback_uses_stricter_bar() {
    let app = spawn_app().await;
    enroll(&app, "E800", "e800@example.com", "pw").await;

    // similarity 75 clears the camera path but not the fallback path.
    app.matcher.set(0.25, true);
    let (status, body) = post_json(
        &app.router,
        "/api/verify-fallback",
        serde_json::json!({
            "employeeID": "E800",
            "password": "pw",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Face verification failed");

    app.matcher.set(0.15, true);
    let (status, body) = post_json(
        &app.router,
        "/api/verify-fallback",
        serde_json::json!({
            "employeeID": "E800",
            "password": "pw",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "85% must clear the 80 bar: {body}");
}

#[tokio::test]
async fn test_fallback_tolerates_wrong_password() {
    let app = spawn_app().await;
    enroll(&app, "E801", "e801@example.com", "pw").await;

    // The face match decides; a bad password alone does not refuse.
    app.matcher.set(0.1, true);
    let (status, body) = post_json(
        &app.router,
        "/api/verify-fallback",
        serde_json::json!({
            "employeeID": "E801",
            "password": "wrong-password",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_fallback_enforces_detection() {
    let app = spawn_app().await;
    enroll(&app, "E803", "e803@example.com", "pw").await;
    enroll(&app, "E804", "e804@example.com", "pw").await;

    app.matcher.set(0.1, true);
    app.matcher.set_undetectable(true);

    // The camera path compares without enforcement, so an undetectable face
    // still yields a best-effort distance.
    let (status, body) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "E803",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(app.matcher.last_enforce(), Some(false));

    // The fallback path enforces detection, so the same capture is a hard
    // failure, not a low score.
    let (status, body) = post_json(
        &app.router,
        "/api/verify-fallback",
        serde_json::json!({
            "employeeID": "E804",
            "password": "pw",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No face detected in image");
    assert_eq!(app.matcher.last_enforce(), Some(true));

    // No ledger write happened for the failed attempt.
    let (status, body) = get_json(&app.router, "/api/attendance-records?employeeID=E804").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_fallback_no_liveness_gate() {
    let app = spawn_app().await;
    enroll(&app, "E802", "e802@example.com", "pw").await;

    // The gate would trip on the camera path; the fallback path skips it.
    app.geometry.set(None);
    app.matcher.set(0.1, true);
    let (status, body) = post_json(
        &app.router,
        "/api/verify-fallback",
        serde_json::json!({
            "employeeID": "E802",
            "password": "pw",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

// ============================================================================
// Absence
// ============================================================================

#[tokio::test]
async fn test_mark_absent_after_cutoff() {
    // Cutoff hour 0 makes "after cutoff" true at any wall-clock time.
    let mut config = test_config();
    config.attendance.absence_cutoff_hour = 0;
    let app = spawn_app_with_config(config).await;
    enroll(&app, "E900", "e900@example.com", "pw").await;

    let (status, body) = post_json(
        &app.router,
        "/api/mark-absent",
        serde_json::json!({"employeeID": "E900"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // The ledger row reads "Absent" with no lateness.
    let (status, body) = get_json(&app.router, "/api/attendance-records?employeeID=E900").await;
    assert_eq!(status, StatusCode::OK);
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["inTime"], "Absent");
    assert_eq!(records[0]["status"], "absent");
    assert!(records[0]["lateTime"].is_null());

    // Absence marking is idempotent too.
    let (status, body) = post_json(
        &app.router,
        "/api/mark-absent",
        serde_json::json!({"employeeID": "E900"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Attendance already marked for today");
}

#[tokio::test]
async fn test_mark_absent_too_early() {
    // Cutoff hour 24 is never reached, so every call is too early.
    let mut config = test_config();
    config.attendance.absence_cutoff_hour = 24;
    let app = spawn_app_with_config(config).await;
    enroll(&app, "E901", "e901@example.com", "pw").await;

    let (status, body) = post_json(
        &app.router,
        "/api/mark-absent",
        serde_json::json!({"employeeID": "E901"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Too early to mark absent");
}

// ============================================================================
// Ledger reads
// ============================================================================

#[tokio::test]
async fn test_attendance_records_and_history() {
    let app = spawn_app().await;
    enroll(&app, "EA00", "ea00@example.com", "pw").await;

    app.matcher.set(0.1, true);
    let (status, _) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "EA00",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(&app.router, "/api/attendance-records?employeeID=EA00").await;
    assert_eq!(status, StatusCode::OK);
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["inTime"], "09:00:00");
    assert_eq!(records[0]["status"], "present");

    // Filtering by a day with no records yields an empty list.
    let (status, body) = get_json(
        &app.router,
        "/api/attendance-records?employeeID=EA00&date=2000-01-01",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = get_json(&app.router, "/api/employee-history?employeeID=EA00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // History requires the employee to exist.
    let (status, _) = get_json(&app.router, "/api/employee-history?employeeID=NOPE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_roster_defaults_to_today() {
    let app = spawn_app().await;
    enroll(&app, "EB00", "eb00@example.com", "pw").await;
    enroll(&app, "EB01", "eb01@example.com", "pw").await;

    app.matcher.set(0.1, true);
    let (status, _) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "EB00",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(&app.router, "/api/employees").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);

    let marked = entries
        .iter()
        .find(|e| e["employeeID"] == "EB00")
        .unwrap();
    assert_eq!(marked["status"], "present");
    assert_eq!(marked["inTime"], "09:00:00");

    let unmarked = entries
        .iter()
        .find(|e| e["employeeID"] == "EB01")
        .unwrap();
    assert_eq!(unmarked["status"], "not_marked");
    assert!(unmarked["inTime"].is_null());

    // Unmarked rows still report the day being asked about.
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert_eq!(unmarked["date"], today);

    let (status, body) = get_json(&app.router, "/api/employees?date=2020-01-01").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert!(entries.iter().all(|e| e["date"] == "2020-01-01"));
}

#[tokio::test]
async fn test_attendance_percentage() {
    let app = spawn_app().await;
    enroll(&app, "EC00", "ec00@example.com", "pw").await;

    // Empty ledger: zero percent, not a division error.
    let (status, body) = post_json(
        &app.router,
        "/api/attendance",
        serde_json::json!({"employeeID": "EC00"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attendancePercentage"], 0.0);
    assert_eq!(body["data"]["totalDays"], 0);

    app.matcher.set(0.1, true);
    let (status, _) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "EC00",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &app.router,
        "/api/attendance",
        serde_json::json!({"employeeID": "EC00"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["presentDays"], 1);
    assert_eq!(body["data"]["totalDays"], 1);
    assert_eq!(body["data"]["attendancePercentage"], 100.0);
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_in_time_threshold_roundtrip() {
    let app = spawn_app().await;

    let (status, body) = get_json(&app.router, "/api/in-time").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["inTimeThreshold"], "09:30");

    let (status, _) = post_json(
        &app.router,
        "/api/update-in-time",
        serde_json::json!({"inTimeThreshold": "10:00"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(&app.router, "/api/in-time").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["inTimeThreshold"], "10:00");

    let (status, _) = post_json(
        &app.router,
        "/api/update-in-time",
        serde_json::json!({"inTimeThreshold": "25:99"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app.router,
        "/api/update-in-time",
        serde_json::json!({"inTimeThreshold": "9:30"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_threshold_change_affects_lateness() {
    let app = spawn_app().await;
    enroll(&app, "ED00", "ed00@example.com", "pw").await;

    let (status, _) = post_json(
        &app.router,
        "/api/update-in-time",
        serde_json::json!({"inTimeThreshold": "08:00"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    app.matcher.set(0.1, true);
    let (status, body) = post_json(
        &app.router,
        "/api/verify",
        serde_json::json!({
            "employeeID": "ED00",
            "faceImage": face_image(),
            "inTime": "09:00:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lateTime"], "1 hr 0 min");
}
