use actix_web::web;

use crate::database::ScheduleStore;

pub mod appointments;
pub mod availability;
pub mod leave;
pub mod shifts;

pub fn configure<S: ScheduleStore>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(availability::configure::<S>)
            .configure(shifts::configure::<S>)
            .configure(leave::configure::<S>)
            .configure(appointments::configure::<S>),
    );
}
