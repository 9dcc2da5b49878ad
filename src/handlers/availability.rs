use actix_web::{HttpResponse, web};

use crate::AppState;
use crate::auth::ActorContext;
use crate::database::{
    ScheduleStore,
    models::{AvailabilityQuery, StaffAvailabilityInput},
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;

pub async fn set_availability<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    input: web::Json<StaffAvailabilityInput>,
) -> Result<HttpResponse, AppError> {
    let availability = state
        .availability
        .set_availability(&actor, input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(availability)))
}

pub async fn list_availability<S: ScheduleStore>(
    actor: ActorContext,
    state: web::Data<AppState<S>>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, AppError> {
    let records = state
        .availability
        .list_availability(&actor, query.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}
