mod film;
mod rental;

pub use self::{film::*, rental::*};

use kernel::interface::database::Transaction;
use kernel::KernelError;

/// Commits on success. On failure rolls back first and then hands the original error back.
pub(crate) async fn settle<T, C>(
    con: C,
    result: error_stack::Result<T, KernelError>,
) -> error_stack::Result<T, KernelError>
where
    C: Transaction,
{
    match result {
        Ok(value) => {
            con.commit().await?;
            Ok(value)
        }
        Err(report) => {
            if let Err(rollback) = con.roll_back().await {
                tracing::warn!("Failed to roll back transaction: {:?}", rollback);
            }
            Err(report)
        }
    }
}
