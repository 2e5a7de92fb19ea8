pub mod artist;
pub mod listing;
pub mod shows;
pub mod venue;

use std::future::Future;
use std::pin::Pin;

use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::database::Database;
use crate::error::{BookingError, BookingResult};

/// Run `work` as one all-or-nothing unit: commit on `Ok`, roll back on `Err`.
pub(crate) async fn in_transaction<T, F>(db: &Database, what: &str, work: F) -> BookingResult<T>
where
    F: for<'c> FnOnce(
            &'c DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = BookingResult<T>> + Send + 'c>>
        + Send,
    T: Send,
{
    db.conn.transaction(work).await.map_err(|err| {
        let err = BookingError::from(err);
        log::warn!("Rolled back {what}: {err}");
        err
    })
}
