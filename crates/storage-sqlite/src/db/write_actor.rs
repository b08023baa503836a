//! Single-writer actor for SQLite.
//!
//! SQLite tolerates many readers but only one writer. All repository writes
//! go through this actor: it owns one dedicated connection and processes
//! jobs serially, each inside an immediate transaction. A repository call
//! that batches several statements into one job therefore commits or rolls
//! back as a unit.

use std::any::Any;
use tokio::sync::{mpsc, oneshot};

use diesel::{Connection, SqliteConnection};
use gestima_core::errors::Result;

use super::DbPool;
use crate::errors::StorageError;

type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type Reply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

/// Handle for submitting write jobs to the actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(ErasedJob, Reply)>,
}

impl WriteHandle {
    /// Runs a job on the writer's connection inside one immediate
    /// transaction and returns its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |conn| job(conn).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                reply_tx,
            ))
            .await
            .expect("writer actor channel closed - the actor has stopped");

        reply_rx
            .await
            .expect("writer actor dropped the reply sender")
            .map(|boxed| {
                *boxed
                    .downcast::<T>()
                    .unwrap_or_else(|_| panic!("writer actor result type mismatch"))
            })
    }
}

/// Spawns the writer task. The actor holds one pool connection for its whole
/// lifetime and terminates when the last `WriteHandle` is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(ErasedJob, Reply)>(1024);

    tokio::spawn(async move {
        let mut conn = pool
            .get()
            .expect("failed to acquire the writer actor's connection");

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| {
                    job(c).map_err(StorageError::from)
                })
                .map_err(|e: StorageError| e.into());

            // Receiver may have been dropped (caller cancelled); ignore.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
