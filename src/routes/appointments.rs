use actix_web::web;

use crate::database::ScheduleStore;
use crate::handlers::appointments;

pub fn configure<S: ScheduleStore>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/appointments")
            .route("", web::post().to(appointments::create_appointment::<S>))
            .route("", web::get().to(appointments::list_appointments::<S>))
            .route("/{id}", web::get().to(appointments::get_appointment::<S>))
            .route("/{id}", web::put().to(appointments::update_appointment::<S>))
            .route(
                "/{id}/status",
                web::post().to(appointments::change_appointment_status::<S>),
            ),
    );
}
