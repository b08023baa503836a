//! Database connection management: pool, migrations, single-writer actor.

mod write_actor;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use gestima_core::errors::{DatabaseError, Error, Result};
use std::path::Path;
use std::sync::Arc;

pub use write_actor::{spawn_writer, WriteHandle};

pub type DbPool = Arc<Pool<ConnectionManager<SqliteConnection>>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates the connection pool. WAL mode and foreign keys are enabled per
/// connection; busy_timeout covers the writer/reader handoff.
pub fn create_pool(database_path: &Path) -> Result<DbPool> {
    let database_url = database_path.to_string_lossy().to_string();
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);

    let pool = Pool::builder()
        .max_size(8)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))?;

    Ok(Arc::new(pool))
}

#[derive(Debug)]
struct ConnectionOptions;

impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get()
        .map_err(|e| Error::Database(DatabaseError::ConnectionFailed(e.to_string())))
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = get_connection(pool)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Database(DatabaseError::MigrationFailed(e.to_string())))?;
    Ok(())
}

/// One-call initialization: pool + migrations + writer actor.
pub fn init(database_path: &Path) -> Result<(DbPool, WriteHandle)> {
    let pool = create_pool(database_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer(pool.clone());
    Ok((pool, writer))
}
