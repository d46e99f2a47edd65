use std::fmt;
use std::sync::Arc;

use sqlx::{PgConnection, Postgres, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::{CoreError, Result};

/// Transaction handle shared between one unit of work and its repositories.
///
/// The slot is filled on `enter` and emptied on commit or rollback, so a
/// repository holding a stale clone fails with `ScopeState` instead of
/// writing outside the scope. Dropping a filled slot rolls the transaction
/// back.
#[derive(Clone, Default)]
pub(crate) struct PgScope {
    slot: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl fmt::Debug for PgScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = self.slot.try_lock().map(|slot| slot.is_some()).ok();
        f.debug_struct("PgScope")
            .field("transaction_open", &open)
            .finish()
    }
}

impl PgScope {
    pub(crate) async fn install(&self, tx: Transaction<'static, Postgres>) {
        *self.slot.lock().await = Some(tx);
    }

    pub(crate) async fn take(&self) -> Option<Transaction<'static, Postgres>> {
        self.slot.lock().await.take()
    }

    /// Locks the live transaction for one statement or a short sequence.
    pub(crate) async fn connection(
        &self,
    ) -> Result<MappedMutexGuard<'_, PgConnection>> {
        let guard = self.slot.lock().await;
        MutexGuard::try_map(guard, |slot| slot.as_deref_mut()).map_err(|_| {
            CoreError::ScopeState(
                "no transaction is open for this unit of work".into(),
            )
        })
    }
}
