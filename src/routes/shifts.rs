use actix_web::web;

use crate::database::ScheduleStore;
use crate::handlers::shifts;

pub fn configure<S: ScheduleStore>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/shifts")
            .route("", web::post().to(shifts::create_shift::<S>))
            .route("", web::get().to(shifts::get_shifts::<S>))
            .route("/{id}", web::get().to(shifts::get_shift::<S>))
            .route("/{id}", web::put().to(shifts::update_shift::<S>))
            .route(
                "/{id}/status",
                web::post().to(shifts::update_shift_status::<S>),
            ),
    );
}
