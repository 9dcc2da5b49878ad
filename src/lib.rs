pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::AppError;

use database::ScheduleStore;
use services::{AppointmentBook, AvailabilityService, Collaborators, LeaveWorkflow, ShiftScheduler};

/// Scheduling services over one store, shared by every worker.
pub struct AppState<S> {
    pub availability: AvailabilityService<S>,
    pub shifts: ShiftScheduler<S>,
    pub leave: LeaveWorkflow<S>,
    pub appointments: AppointmentBook<S>,
}

impl<S: ScheduleStore> AppState<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self::with_collaborators(store, Collaborators::from_config(config))
    }

    pub fn with_collaborators(store: S, collaborators: Collaborators) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone(), collaborators.clone()),
            shifts: ShiftScheduler::new(store.clone(), collaborators.clone()),
            leave: LeaveWorkflow::new(store.clone(), collaborators.clone()),
            appointments: AppointmentBook::new(store, collaborators),
        }
    }
}
