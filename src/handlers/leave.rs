use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::AppState;
use crate::auth::ActorContext;
use crate::database::{
    ScheduleStore,
    models::{LeaveDecisionInput, LeaveQuery, LeaveRequestInput},
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;

pub async fn request_leave<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    input: web::Json<LeaveRequestInput>,
) -> Result<HttpResponse, AppError> {
    let leave = state
        .leave
        .request_leave(&actor, input.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(leave)))
}

pub async fn list_leave<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    query: web::Query<LeaveQuery>,
) -> Result<HttpResponse, AppError> {
    let requests = state.leave.list_leave(&actor, query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(requests)))
}

pub async fn get_leave<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let leave = state.leave.get_leave(&actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(leave)))
}

/// Approve or reject. The response lists shifts cancelled by an approval.
pub async fn decide_leave<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
    input: web::Json<LeaveDecisionInput>,
) -> Result<HttpResponse, AppError> {
    let decision = state
        .leave
        .decide_leave(&actor, path.into_inner(), input.into_inner())
        .await?;

    let message = format!(
        "Leave {}, {} shift(s) cancelled",
        decision.leave.status.as_str().to_lowercase(),
        decision.cancelled_shift_ids.len()
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(decision, &message)))
}

pub async fn cancel_leave<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let leave = state.leave.cancel_leave(&actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(leave)))
}
