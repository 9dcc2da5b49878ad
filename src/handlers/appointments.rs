use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::AppState;
use crate::auth::ActorContext;
use crate::database::{
    ScheduleStore,
    models::{AppointmentActionInput, AppointmentInput, AppointmentQuery},
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;

pub async fn create_appointment<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    input: web::Json<AppointmentInput>,
) -> Result<HttpResponse, AppError> {
    let appointment = state
        .appointments
        .create_appointment(&actor, input.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(appointment)))
}

pub async fn list_appointments<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    query: web::Query<AppointmentQuery>,
) -> Result<HttpResponse, AppError> {
    let appointments = state
        .appointments
        .list_appointments(&actor, query.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(appointments)))
}

pub async fn get_appointment<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let appointment = state
        .appointments
        .get_appointment(&actor, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(appointment)))
}

pub async fn update_appointment<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
    input: web::Json<AppointmentInput>,
) -> Result<HttpResponse, AppError> {
    let appointment = state
        .appointments
        .update_appointment(&actor, path.into_inner(), input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(appointment)))
}

pub async fn change_appointment_status<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
    input: web::Json<AppointmentActionInput>,
) -> Result<HttpResponse, AppError> {
    let appointment = state
        .appointments
        .change_status(&actor, path.into_inner(), input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(appointment)))
}
