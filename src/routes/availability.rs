use actix_web::web;

use crate::database::ScheduleStore;
use crate::handlers::availability;

pub fn configure<S: ScheduleStore>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/availability")
            .route("", web::put().to(availability::set_availability::<S>))
            .route("", web::get().to(availability::list_availability::<S>)),
    );
}
