use actix_web::{App, http::StatusCode, test, web};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use clinic_scheduler::database::memory::MemoryStore;
use clinic_scheduler::database::models::{Appointment, Shift, ShiftStatus, StaffLeaveRequest};
use clinic_scheduler::routes;

mod common;

use common::{Actors, AuthHelper, TestAssertions, TestContext, setup_test_env};

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx.config.clone()))
                .app_data(web::Data::new($ctx.state()))
                .configure(routes::configure::<MemoryStore>),
        )
        .await
    };
}

#[actix_web::test]
async fn test_requests_without_token_are_unauthorized() {
    setup_test_env();

    let ctx = TestContext::new().await;
    let app = init_app!(ctx);

    let missing = test::TestRequest::get().uri("/api/v1/shifts").to_request();
    let missing = test::call_service(&app, missing).await;

    let garbage = test::TestRequest::get()
        .uri("/api/v1/shifts")
        .insert_header(AuthHelper::auth_header("not-a-jwt"))
        .to_request();
    let garbage = test::call_service(&app, garbage).await;

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_and_list_shifts() {
    setup_test_env();

    // Arrange
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let token = AuthHelper::create_test_token(&Actors::admin(), &ctx.config).unwrap();

    // Act
    let req = test::TestRequest::post()
        .uri("/api/v1/shifts")
        .insert_header(AuthHelper::auth_header(&token))
        .set_json(json!({
            "staffId": ctx.doctor.id,
            "date": "2025-06-01",
            "startTime": "09:00:00",
            "endTime": "13:00:00",
            "shiftType": "MORNING"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = test::read_body(resp).await;
    let created: Shift = TestAssertions::assert_success_response(&body);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/shifts?staffId={}&startDate=2025-06-01&endDate=2025-06-07",
            ctx.doctor.id
        ))
        .insert_header(AuthHelper::auth_header(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let listed: Vec<Shift> = TestAssertions::assert_success_response(&body);

    // Assert
    assert_eq!(created.status, ShiftStatus::Scheduled);
    assert_eq!(created.staff_id, ctx.doctor.id);
    assert_eq!(listed, vec![created]);
}

#[actix_web::test]
async fn test_overlapping_shift_returns_conflict() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let token = AuthHelper::create_test_token(&Actors::admin(), &ctx.config).unwrap();
    let shift = |start: &str, end: &str| {
        json!({
            "staffId": ctx.doctor.id,
            "date": "2025-06-01",
            "startTime": start,
            "endTime": end
        })
    };

    let req = test::TestRequest::post()
        .uri("/api/v1/shifts")
        .insert_header(AuthHelper::auth_header(&token))
        .set_json(shift("09:00:00", "13:00:00"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/v1/shifts")
        .insert_header(AuthHelper::auth_header(&token))
        .set_json(shift("12:00:00", "14:00:00"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = test::read_body(resp).await;
    let message = TestAssertions::assert_error_response(&body);
    assert!(message.contains("Overlaps shift"));
}

#[actix_web::test]
async fn test_staff_cannot_schedule_own_shifts() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let token = AuthHelper::create_test_token(&Actors::staff(&ctx.doctor), &ctx.config).unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/shifts")
        .insert_header(AuthHelper::auth_header(&token))
        .set_json(json!({
            "staffId": ctx.doctor.id,
            "date": "2025-06-01",
            "startTime": "09:00:00",
            "endTime": "13:00:00"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_leave_approval_reports_cancelled_shifts() {
    setup_test_env();

    // Arrange
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let manager = AuthHelper::create_test_token(
        &Actors::department_head(&ctx.cardiology),
        &ctx.config,
    )
    .unwrap();
    let staff = AuthHelper::create_test_token(&Actors::staff(&ctx.doctor), &ctx.config).unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/shifts")
        .insert_header(AuthHelper::auth_header(&manager))
        .set_json(json!({
            "staffId": ctx.doctor.id,
            "date": "2025-06-11",
            "startTime": "09:00:00",
            "endTime": "17:00:00"
        }))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let shift: Shift = TestAssertions::assert_success_response(&body);

    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(AuthHelper::auth_header(&staff))
        .set_json(json!({
            "staffId": ctx.doctor.id,
            "leaveType": "ANNUAL",
            "startDate": "2025-06-10",
            "endDate": "2025-06-12"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = test::read_body(resp).await;
    let leave: StaffLeaveRequest = TestAssertions::assert_success_response(&body);

    // Act
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/leave/{}/decision", leave.id))
        .insert_header(AuthHelper::auth_header(&manager))
        .set_json(json!({ "status": "APPROVED", "managerNote": "Approved" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    // Assert
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["leave"]["status"], json!("APPROVED"));
    assert_eq!(
        body["data"]["cancelledShiftIds"],
        json!([shift.id.to_string()])
    );
    assert_eq!(body["message"], json!("Leave approved, 1 shift(s) cancelled"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/shifts/{}", shift.id))
        .insert_header(AuthHelper::auth_header(&staff))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let shift: Shift = TestAssertions::assert_success_response(&body);
    assert_eq!(shift.status, ShiftStatus::Cancelled);
}

#[actix_web::test]
async fn test_appointment_booking_and_status_change() {
    // Arrange
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let patient =
        AuthHelper::create_test_token(&Actors::patient(&ctx.patient), &ctx.config).unwrap();
    let booking = json!({
        "patient": ctx.patient.code,
        "staff": ctx.doctor.code,
        "hospital": ctx.hospital.code,
        "date": "2025-06-02",
        "startTime": "10:00:00",
        "endTime": "10:30:00"
    });

    // Act
    let req = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .insert_header(AuthHelper::auth_header(&patient))
        .set_json(&booking)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = test::read_body(resp).await;
    let appointment: Appointment = TestAssertions::assert_success_response(&body);

    let req = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .insert_header(AuthHelper::auth_header(&patient))
        .set_json(&booking)
        .to_request();
    let duplicate = test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/appointments/{}/status", appointment.id))
        .insert_header(AuthHelper::auth_header(&patient))
        .set_json(json!({ "action": "confirm" }))
        .to_request();
    let confirmed = test::call_service(&app, req).await;
    assert_eq!(confirmed.status(), StatusCode::OK);
    let confirmed: Value = test::read_body_json(confirmed).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/appointments/{}/status", appointment.id))
        .insert_header(AuthHelper::auth_header(&patient))
        .set_json(json!({ "action": "teleport" }))
        .to_request();
    let unknown = test::call_service(&app, req).await;

    // Assert
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(confirmed["data"]["status"], json!("CONFIRMED"));
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.notices.count(), 2);
}

#[actix_web::test]
async fn test_unknown_shift_returns_not_found() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let token = AuthHelper::create_test_token(&Actors::admin(), &ctx.config).unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/shifts/{}", uuid::Uuid::new_v4()))
        .insert_header(AuthHelper::auth_header(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_day_off_availability_blocks_booking() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let staff = AuthHelper::create_test_token(&Actors::staff(&ctx.doctor), &ctx.config).unwrap();

    let req = test::TestRequest::put()
        .uri("/api/v1/availability")
        .insert_header(AuthHelper::auth_header(&staff))
        .set_json(json!({
            "staffId": ctx.doctor.id,
            "date": "2025-06-02",
            "dayOff": true
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .insert_header(AuthHelper::auth_header(&staff))
        .set_json(json!({
            "patient": ctx.patient.code,
            "staff": ctx.doctor.code,
            "hospital": ctx.hospital.code,
            "date": "2025-06-02",
            "startTime": "10:00:00",
            "endTime": "10:30:00"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
