use std::sync::Arc;

use crate::config::{Config, ProvisioningMode};

pub mod appointments;
pub mod authorization;
pub mod availability;
pub mod cascade;
pub mod clock;
pub mod identity;
pub mod leave_workflow;
pub mod notification;
pub mod overlap;
pub mod scope;
pub mod shift_scheduler;

pub use appointments::AppointmentBook;
pub use authorization::{Authorizer, RoleAuthorizer};
pub use availability::{
    AvailabilityLedger, AvailabilityProvisioningPolicy, AvailabilityService, LenientProvisioning,
    StrictProvisioning,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use leave_workflow::{LeaveDecision, LeaveWorkflow};
pub use notification::{AppointmentNotice, LogNotificationSink, NotificationSink};
pub use shift_scheduler::ShiftScheduler;

/// Pluggable policies shared by every scheduling service.
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub authorizer: Arc<dyn Authorizer>,
    pub provisioning: Arc<dyn AvailabilityProvisioningPolicy>,
    pub notifications: Arc<dyn NotificationSink>,
    pub schedule_window_days: i64,
}

impl Collaborators {
    pub fn from_config(config: &Config) -> Self {
        let provisioning: Arc<dyn AvailabilityProvisioningPolicy> =
            match config.availability_provisioning {
                ProvisioningMode::Lenient => Arc::new(LenientProvisioning),
                ProvisioningMode::Strict => Arc::new(StrictProvisioning),
            };

        Self {
            clock: Arc::new(SystemClock),
            authorizer: Arc::new(RoleAuthorizer),
            provisioning,
            notifications: Arc::new(LogNotificationSink),
            schedule_window_days: config.schedule_window_days,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_provisioning(
        mut self,
        policy: impl AvailabilityProvisioningPolicy + 'static,
    ) -> Self {
        self.provisioning = Arc::new(policy);
        self
    }

    pub fn with_notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifications = sink;
        self
    }

    pub fn ledger(&self) -> AvailabilityLedger {
        AvailabilityLedger::new(self.provisioning.clone(), self.clock.clone())
    }
}
