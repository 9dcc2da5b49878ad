use anyhow::Result;
use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};

pub mod memory;
pub mod models;
pub mod repositories;
pub mod transaction;
pub mod utils;

use repositories::{
    AppointmentRepository, AvailabilityRepository, DirectoryRepository, LeaveRepository,
    ShiftRepository,
};

pub async fn init_database(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    log::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Migrations completed successfully");

    Ok(pool)
}

/// One unit of work over every scheduling table.
///
/// Dropping a transaction without committing discards its writes.
#[allow(async_fn_in_trait)]
pub trait ScheduleTx:
    AvailabilityRepository
    + ShiftRepository
    + LeaveRepository
    + AppointmentRepository
    + DirectoryRepository
{
    async fn commit(self) -> Result<(), sqlx::Error>
    where
        Self: Sized;

    async fn rollback(self) -> Result<(), sqlx::Error>
    where
        Self: Sized;
}

/// A store hands out transactions; it is the mutual-exclusion boundary for
/// concurrent writers on the same staff timeline.
#[allow(async_fn_in_trait)]
pub trait ScheduleStore: Clone + Send + Sync + 'static {
    type Tx: ScheduleTx;

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error>;
}

impl ScheduleStore for PgPool {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error> {
        sqlx::Pool::begin(self).await
    }
}

impl ScheduleTx for Transaction<'_, Postgres> {
    async fn commit(self) -> Result<(), sqlx::Error> {
        Transaction::commit(self).await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        Transaction::rollback(self).await
    }
}
