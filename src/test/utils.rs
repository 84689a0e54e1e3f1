#[cfg(test)]
pub mod test_db {
    use std::sync::Once;

    use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};

    use crate::db::initialize_database;

    static INIT: Once = Once::new();

    fn init_test_logging() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter("info")
                .with_test_writer()
                .try_init();
        });
    }

    // One connection keeps every statement on the same in-memory database.
    pub async fn bare_pool() -> Pool<Sqlite> {
        init_test_logging();

        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database")
    }

    pub async fn setup_test_db() -> Pool<Sqlite> {
        let pool = bare_pool().await;

        initialize_database(&pool)
            .await
            .expect("Failed to initialize database");

        pool
    }
}
