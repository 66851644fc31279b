use crate::db::{DbPool, OrmConn};

/// Shared handles: SeaORM for transactional entity work, the raw sqlx pool
/// for joined read shapes and the audit trail.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}
