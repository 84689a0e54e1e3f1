#[cfg(test)]
mod tests {
    use sqlx::{Pool, Row, Sqlite};

    use crate::db::{get_user, initialize_database};
    use crate::test::utils::test_db::{bare_pool, setup_test_db};

    // The users table as it looked before the admin feature shipped.
    const PRE_ADMIN_SCHEMA: &str = r#"
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            full_name TEXT,
            parent_name TEXT,
            dob TEXT,
            class TEXT,
            section TEXT,
            school TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_login TIMESTAMP
        );
    "#;

    async fn admin_count(pool: &Pool<Sqlite>) -> i64 {
        sqlx::query("SELECT COUNT(*) FROM users WHERE is_admin = TRUE")
            .fetch_one(pool)
            .await
            .expect("Failed to count admins")
            .get::<i64, _>(0)
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent_on_fresh_database() {
        let pool = bare_pool().await;

        initialize_database(&pool).await.unwrap();
        initialize_database(&pool).await.unwrap();

        assert_eq!(admin_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_pre_admin_database_gains_column_and_one_admin() {
        let pool = bare_pool().await;

        sqlx::raw_sql(PRE_ADMIN_SCHEMA).execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?), (?, ?)")
            .bind("amara")
            .bind("h1")
            .bind("ben")
            .bind("h2")
            .execute(&pool)
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        let amara = get_user(&pool, "amara").await.unwrap().unwrap();
        let ben = get_user(&pool, "ben").await.unwrap().unwrap();
        assert!(amara.is_admin, "First user should be promoted");
        assert!(!ben.is_admin);
        assert_eq!(admin_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_admin_bootstrap_does_not_repeat() {
        let pool = bare_pool().await;

        sqlx::raw_sql(PRE_ADMIN_SCHEMA).execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?), (?, ?)")
            .bind("amara")
            .bind("h1")
            .bind("ben")
            .bind("h2")
            .execute(&pool)
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();
        initialize_database(&pool).await.unwrap();

        assert_eq!(admin_count(&pool).await, 1);
        let amara = get_user(&pool, "amara").await.unwrap().unwrap();
        assert!(amara.is_admin);
    }

    #[tokio::test]
    async fn test_reinitialize_promotes_when_no_admin_exists() {
        let pool = setup_test_db().await;

        crate::db::add_user(&pool, "amara", "h1", None, false)
            .await
            .unwrap();
        assert_eq!(admin_count(&pool).await, 0);

        initialize_database(&pool).await.unwrap();

        assert_eq!(admin_count(&pool).await, 1);
    }
}
