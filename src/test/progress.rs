#[cfg(test)]
mod tests {
    use crate::db::{add_user, get_user_progress, update_user_progress};
    use crate::error::StoreError;
    use crate::models::Progress;
    use crate::test::utils::test_db::setup_test_db;

    #[tokio::test]
    async fn test_fresh_user_has_zero_progress() {
        let pool = setup_test_db().await;

        let user_id = add_user(&pool, "amara", "hash123", None, false)
            .await
            .unwrap();

        let progress = get_user_progress(&pool, user_id).await.unwrap();
        assert_eq!(progress, Progress::default());
    }

    #[tokio::test]
    async fn test_update_progress_round_trips() {
        let pool = setup_test_db().await;

        let user_id = add_user(&pool, "amara", "hash123", None, false)
            .await
            .unwrap();

        let tutorials = vec!["variables".to_string(), "loops".to_string()];
        let challenges = vec!["fizzbuzz".to_string()];
        let emojis = vec!["🦀".to_string(), "🚀".to_string()];

        update_user_progress(&pool, user_id, 120, &tutorials, &challenges, &emojis)
            .await
            .unwrap();

        let progress = get_user_progress(&pool, user_id).await.unwrap();
        assert_eq!(progress.points, 120);
        assert_eq!(progress.completed_tutorials, tutorials);
        assert_eq!(progress.completed_challenges, challenges);
        assert_eq!(progress.emoji_collection, emojis);
    }

    #[tokio::test]
    async fn test_update_progress_is_full_overwrite() {
        let pool = setup_test_db().await;

        let user_id = add_user(&pool, "amara", "hash123", None, false)
            .await
            .unwrap();

        let first = vec!["variables".to_string(), "loops".to_string()];
        update_user_progress(&pool, user_id, 50, &first, &[], &[])
            .await
            .unwrap();

        let second = vec!["functions".to_string()];
        update_user_progress(&pool, user_id, 10, &second, &[], &[])
            .await
            .unwrap();

        let progress = get_user_progress(&pool, user_id).await.unwrap();
        assert_eq!(progress.points, 10);
        assert_eq!(progress.completed_tutorials, second);
    }

    #[tokio::test]
    async fn test_progress_for_unknown_user_is_default() {
        let pool = setup_test_db().await;

        let progress = get_user_progress(&pool, 999).await.unwrap();
        assert_eq!(progress, Progress::default());
    }

    #[tokio::test]
    async fn test_update_progress_for_unknown_user_is_not_found() {
        let pool = setup_test_db().await;

        let result = update_user_progress(&pool, 999, 10, &[], &[], &[]).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
