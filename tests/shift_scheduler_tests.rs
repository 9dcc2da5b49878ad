use pretty_assertions::assert_eq;

use clinic_scheduler::AppError;
use clinic_scheduler::database::models::{
    ShiftQuery, ShiftStatus, ShiftStatusInput, ShiftUpdateInput, ShiftType, StaffAvailabilityInput,
};
use clinic_scheduler::services::StrictProvisioning;

mod common;

use common::{Actors, MockData, TestContext, d, setup_test_env, t};

#[actix_web::test]
async fn test_schedule_shifts_provisions_and_widens_availability() {
    setup_test_env();

    // Arrange
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let admin = Actors::admin();

    // Act
    let first = state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(13, 0)))
        .await
        .expect("first shift");
    let snapshot = ctx.store.snapshot().await;

    // Assert
    assert_eq!(first.status, ShiftStatus::Scheduled);
    assert_eq!(first.hospital_id, ctx.hospital.id);
    assert_eq!(first.department_id, Some(ctx.cardiology.id));
    assert_eq!(snapshot.availability.len(), 1);
    assert_eq!(snapshot.availability[0].available_from, t(9, 0));
    assert_eq!(snapshot.availability[0].available_to, t(13, 0));
    assert!(snapshot.availability[0].provisioned);

    // Adjacent shift is accepted
    state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(13, 0), t(15, 0)))
        .await
        .expect("adjacent shift");

    // Overlapping shift is rejected
    let result = state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(12, 0), t(14, 0)))
        .await;
    assert!(matches!(result, Err(AppError::OverlapConflict(_))));

    let snapshot = ctx.store.snapshot().await;
    assert_eq!(snapshot.shifts.len(), 2);
    assert_eq!(snapshot.availability[0].available_to, t(15, 0));
}

#[actix_web::test]
async fn test_schedule_shift_outside_explicit_availability() {
    setup_test_env();

    // Arrange
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let admin = Actors::admin();
    state
        .availability
        .set_availability(
            &admin,
            StaffAvailabilityInput {
                staff_id: ctx.doctor.id,
                date: d(6, 1),
                available_from: Some(t(9, 0)),
                available_to: Some(t(13, 0)),
                day_off: false,
            },
        )
        .await
        .expect("availability");

    // Act
    let result = state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(12, 0), t(14, 30)))
        .await;

    // Assert
    assert!(matches!(result, Err(AppError::AvailabilityViolation(_))));
    assert!(ctx.store.snapshot().await.shifts.is_empty());
}

#[actix_web::test]
async fn test_schedule_shift_on_day_off() {
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let staff_actor = Actors::staff(&ctx.doctor);
    state
        .availability
        .set_availability(
            &staff_actor,
            StaffAvailabilityInput {
                staff_id: ctx.doctor.id,
                date: d(6, 3),
                available_from: None,
                available_to: None,
                day_off: true,
            },
        )
        .await
        .expect("day off");

    let result = state
        .shifts
        .schedule_shift(
            &Actors::department_head(&ctx.cardiology),
            MockData::shift(&ctx.doctor, d(6, 3), t(9, 0), t(12, 0)),
        )
        .await;

    assert!(matches!(result, Err(AppError::AvailabilityViolation(_))));
}

#[actix_web::test]
async fn test_schedule_shift_in_the_past() {
    let ctx = TestContext::new().await;

    let result = ctx
        .state()
        .shifts
        .schedule_shift(
            &Actors::admin(),
            MockData::shift(&ctx.doctor, d(5, 29), t(9, 0), t(12, 0)),
        )
        .await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[actix_web::test]
async fn test_schedule_shift_with_end_before_start() {
    let ctx = TestContext::new().await;
    let state = ctx.state();

    let inverted = state
        .shifts
        .schedule_shift(
            &Actors::admin(),
            MockData::shift(&ctx.doctor, d(6, 1), t(12, 0), t(9, 0)),
        )
        .await;
    let empty = state
        .shifts
        .schedule_shift(
            &Actors::admin(),
            MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(9, 0)),
        )
        .await;

    assert!(matches!(inverted, Err(AppError::ValidationError(_))));
    assert!(matches!(empty, Err(AppError::ValidationError(_))));
    assert!(ctx.store.snapshot().await.availability.is_empty());
}

#[actix_web::test]
async fn test_schedule_shift_requires_manager() {
    let ctx = TestContext::new().await;
    let state = ctx.state();

    let as_self = state
        .shifts
        .schedule_shift(
            &Actors::staff(&ctx.doctor),
            MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0)),
        )
        .await;
    let (other_hospital, _) = ctx.add_staff_elsewhere("DR-X").await;
    let foreign_admin = state
        .shifts
        .schedule_shift(
            &Actors::hospital_admin(&other_hospital),
            MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0)),
        )
        .await;

    assert!(matches!(as_self, Err(AppError::PermissionDenied(_))));
    assert!(matches!(foreign_admin, Err(AppError::PermissionDenied(_))));
}

#[actix_web::test]
async fn test_schedule_shift_for_unknown_staff() {
    let ctx = TestContext::new().await;
    let mut input = MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0));
    input.staff_id = uuid::Uuid::new_v4();

    let result = ctx.state().shifts.schedule_shift(&Actors::admin(), input).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[actix_web::test]
async fn test_strict_provisioning_refuses_unconfigured_dates() {
    let ctx = TestContext::new().await;
    let state = ctx.state_with(ctx.collaborators().with_provisioning(StrictProvisioning));

    let result = state
        .shifts
        .schedule_shift(
            &Actors::admin(),
            MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0)),
        )
        .await;

    assert!(matches!(result, Err(AppError::AvailabilityViolation(_))));
    assert!(ctx.store.snapshot().await.availability.is_empty());
}

#[actix_web::test]
async fn test_update_shift_ignores_itself_when_checking_overlap() {
    // Arrange
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let admin = Actors::admin();
    let shift = state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0)))
        .await
        .expect("shift");

    // Act
    let moved = state
        .shifts
        .update_shift(
            &admin,
            shift.id,
            ShiftUpdateInput {
                department_id: None,
                date: d(6, 1),
                start_time: t(10, 0),
                end_time: t(13, 0),
                shift_type: ShiftType::Morning,
                notes: Some("Moved one hour later".to_string()),
            },
        )
        .await
        .expect("moved");

    // Assert
    assert_eq!(moved.id, shift.id);
    assert_eq!(moved.start_time, t(10, 0));
    assert_eq!(moved.end_time, t(13, 0));
    assert_eq!(moved.shift_type, ShiftType::Morning);
    assert_eq!(moved.created_at, shift.created_at);
    assert_eq!(ctx.store.snapshot().await.shifts.len(), 1);
}

#[actix_web::test]
async fn test_update_shift_into_another_shift() {
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let admin = Actors::admin();
    state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0)))
        .await
        .expect("morning");
    let afternoon = state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(13, 0), t(16, 0)))
        .await
        .expect("afternoon");

    let result = state
        .shifts
        .update_shift(
            &admin,
            afternoon.id,
            ShiftUpdateInput {
                department_id: None,
                date: d(6, 1),
                start_time: t(11, 0),
                end_time: t(14, 0),
                shift_type: ShiftType::Custom,
                notes: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::OverlapConflict(_))));
}

#[actix_web::test]
async fn test_cancelled_shift_frees_its_slot() {
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let admin = Actors::admin();
    let shift = state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0)))
        .await
        .expect("shift");

    let cancelled = state
        .shifts
        .update_shift_status(
            &admin,
            shift.id,
            ShiftStatusInput {
                status: ShiftStatus::Cancelled,
                cancellation_reason: Some("  Ward closed  ".to_string()),
            },
        )
        .await
        .expect("cancelled");
    let replacement = state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(10, 0), t(12, 0)))
        .await;

    assert_eq!(cancelled.status, ShiftStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Ward closed"));
    assert!(replacement.is_ok());
}

#[actix_web::test]
async fn test_cancel_shift_requires_reason() {
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let admin = Actors::admin();
    let shift = state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0)))
        .await
        .expect("shift");

    let missing = state
        .shifts
        .update_shift_status(
            &admin,
            shift.id,
            ShiftStatusInput {
                status: ShiftStatus::Cancelled,
                cancellation_reason: None,
            },
        )
        .await;
    let blank = state
        .shifts
        .update_shift_status(
            &admin,
            shift.id,
            ShiftStatusInput {
                status: ShiftStatus::Cancelled,
                cancellation_reason: Some("   ".to_string()),
            },
        )
        .await;

    assert!(matches!(missing, Err(AppError::ValidationError(_))));
    assert!(matches!(blank, Err(AppError::ValidationError(_))));
    assert_eq!(
        ctx.store.snapshot().await.shifts[0].status,
        ShiftStatus::Scheduled
    );
}

#[actix_web::test]
async fn test_shift_status_transitions() {
    // Arrange
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let admin = Actors::admin();
    let shift = state
        .shifts
        .schedule_shift(&admin, MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0)))
        .await
        .expect("shift");

    // Act
    let completed = state
        .shifts
        .update_shift_status(
            &admin,
            shift.id,
            ShiftStatusInput {
                status: ShiftStatus::Completed,
                cancellation_reason: None,
            },
        )
        .await
        .expect("completed");
    let repeated = state
        .shifts
        .update_shift_status(
            &admin,
            shift.id,
            ShiftStatusInput {
                status: ShiftStatus::Completed,
                cancellation_reason: None,
            },
        )
        .await
        .expect("no-op");
    let reopened = state
        .shifts
        .update_shift_status(
            &admin,
            shift.id,
            ShiftStatusInput {
                status: ShiftStatus::Scheduled,
                cancellation_reason: None,
            },
        )
        .await;
    let edited = state
        .shifts
        .update_shift(
            &admin,
            shift.id,
            ShiftUpdateInput {
                department_id: None,
                date: d(6, 2),
                start_time: t(9, 0),
                end_time: t(12, 0),
                shift_type: ShiftType::Custom,
                notes: None,
            },
        )
        .await;

    // Assert
    assert_eq!(completed.status, ShiftStatus::Completed);
    assert_eq!(repeated, completed);
    assert!(matches!(reopened, Err(AppError::NotEditable(_))));
    assert!(matches!(edited, Err(AppError::NotEditable(_))));
}

#[actix_web::test]
async fn test_get_shift_visibility() {
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let shift = state
        .shifts
        .schedule_shift(
            &Actors::admin(),
            MockData::shift(&ctx.doctor, d(6, 1), t(9, 0), t(12, 0)),
        )
        .await
        .expect("shift");

    let own = state.shifts.get_shift(&Actors::staff(&ctx.doctor), shift.id).await;
    let colleague = state
        .shifts
        .get_shift(&Actors::staff(&ctx.other_doctor), shift.id)
        .await;
    let missing = state
        .shifts
        .get_shift(&Actors::admin(), uuid::Uuid::new_v4())
        .await;

    assert_eq!(own.expect("own shift").id, shift.id);
    assert!(matches!(colleague, Err(AppError::PermissionDenied(_))));
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[actix_web::test]
async fn test_list_shifts_by_scope_and_window() {
    // Arrange
    let ctx = TestContext::new().await;
    let state = ctx.state();
    let admin = Actors::admin();
    for (staff, date) in [
        (&ctx.doctor, d(6, 1)),
        (&ctx.doctor, d(6, 20)),
        (&ctx.other_doctor, d(6, 2)),
    ] {
        state
            .shifts
            .schedule_shift(&admin, MockData::shift(staff, date, t(9, 0), t(12, 0)))
            .await
            .expect("shift");
    }

    // Act
    let department = state
        .shifts
        .list_shifts(&Actors::department_head(&ctx.cardiology), ShiftQuery::default())
        .await
        .expect("department shifts");
    let own = state
        .shifts
        .list_shifts(
            &Actors::staff(&ctx.doctor),
            ShiftQuery {
                end_date: Some(d(6, 30)),
                ..ShiftQuery::default()
            },
        )
        .await
        .expect("own shifts");
    let inverted = state
        .shifts
        .list_shifts(
            &admin,
            ShiftQuery {
                start_date: Some(d(6, 10)),
                end_date: Some(d(6, 1)),
                ..ShiftQuery::default()
            },
        )
        .await;
    let patient = state
        .shifts
        .list_shifts(&Actors::patient(&ctx.patient), ShiftQuery::default())
        .await;

    // Assert
    let dates: Vec<_> = department.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![d(6, 1), d(6, 2)]);
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|s| s.staff_id == ctx.doctor.id));
    assert!(matches!(inverted, Err(AppError::ValidationError(_))));
    assert!(matches!(patient, Err(AppError::PermissionDenied(_))));
}
