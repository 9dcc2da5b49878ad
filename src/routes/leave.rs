use actix_web::web;

use crate::database::ScheduleStore;
use crate::handlers::leave;

pub fn configure<S: ScheduleStore>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            .route("", web::post().to(leave::request_leave::<S>))
            .route("", web::get().to(leave::list_leave::<S>))
            .route("/{id}", web::get().to(leave::get_leave::<S>))
            .route("/{id}/decision", web::post().to(leave::decide_leave::<S>))
            .route("/{id}/cancel", web::post().to(leave::cancel_leave::<S>)),
    );
}
