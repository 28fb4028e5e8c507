use sqlx::PgPool;
use tracing::instrument;

use lms_core::AppError;

use crate::modules::dashboard::model::DashboardStats;

pub struct DashboardService;

impl DashboardService {
    #[instrument(skip(db))]
    pub async fn stats(db: &PgPool) -> Result<DashboardStats, AppError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"SELECT
                   (SELECT COUNT(*) FROM users) AS user_count,
                   (SELECT COUNT(*) FROM courses_master) AS course_count,
                   (SELECT COUNT(*) FROM course_instances) AS instance_count,
                   (SELECT COUNT(*) FROM enrollments) AS enrollment_count"#,
        )
        .fetch_one(db)
        .await?;
        Ok(stats)
    }
}
