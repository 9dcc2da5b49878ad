use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::AppState;
use crate::auth::ActorContext;
use crate::database::{
    ScheduleStore,
    models::{ShiftInput, ShiftQuery, ShiftStatusInput, ShiftUpdateInput},
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;

pub async fn create_shift<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    input: web::Json<ShiftInput>,
) -> Result<HttpResponse, AppError> {
    let shift = state
        .shifts
        .schedule_shift(&actor, input.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(shift)))
}

pub async fn get_shifts<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    query: web::Query<ShiftQuery>,
) -> Result<HttpResponse, AppError> {
    let shifts = state.shifts.list_shifts(&actor, query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(shifts)))
}

pub async fn get_shift<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let shift = state.shifts.get_shift(&actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(shift)))
}

pub async fn update_shift<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
    input: web::Json<ShiftUpdateInput>,
) -> Result<HttpResponse, AppError> {
    let shift = state
        .shifts
        .update_shift(&actor, path.into_inner(), input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(shift)))
}

pub async fn update_shift_status<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
    input: web::Json<ShiftStatusInput>,
) -> Result<HttpResponse, AppError> {
    let shift = state
        .shifts
        .update_shift_status(&actor, path.into_inner(), input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(shift)))
}
