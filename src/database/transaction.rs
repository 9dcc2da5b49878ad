use crate::database::ScheduleTx;
use crate::error::AppError;

/// Commits `tx` when `result` is Ok, otherwise rolls it back and hands the
/// original error back to the caller.
pub async fn finish<T, X>(tx: X, result: Result<T, AppError>) -> Result<T, AppError>
where
    X: ScheduleTx,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            log::warn!("Transaction failed with error: {}, rolling back", err);
            if let Err(rollback_err) = tx.rollback().await {
                log::error!(
                    "Rollback failed after error (orig: {}, rollback: {})",
                    err,
                    rollback_err
                );
            }
            Err(err)
        }
    }
}
