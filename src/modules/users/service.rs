use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use lms_core::text::sanitize_full_name;
use lms_core::{AppError, hash_password, verify_password};

use crate::modules::users::model::{
    CreateUserDto, DEFAULT_PASSWORD, UpdateOutcome, UpdateUserDto, User, UserRole,
    UserWithPassword,
};
use crate::utils::csv::CsvRow;
use crate::utils::db::is_unique_violation;
use crate::utils::response::BatchResult;

const USER_COLUMNS: &str = "user_id, external_id, full_name, role, created_at";

fn parse_role(role: Option<&str>) -> Result<UserRole, AppError> {
    match role.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(UserRole::default()),
        Some(value) => UserRole::parse(value).ok_or_else(|| {
            AppError::invalid(format!(
                "Invalid role. Must be one of: {}",
                UserRole::ALL.map(UserRole::as_str).join(", ")
            ))
        }),
    }
}

fn clean_name(full_name: &str) -> Result<String, AppError> {
    let name = sanitize_full_name(full_name);
    if name.is_empty() {
        return Err(AppError::invalid("Full name contains no valid characters"));
    }
    Ok(name)
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn list_users(db: &PgPool) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, user_id DESC"
        ))
        .fetch_all(db)
        .await?;

        Ok(users)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, user_id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn find_with_password(
        db: &PgPool,
        external_id: &str,
    ) -> Result<Option<UserWithPassword>, AppError> {
        let user = sqlx::query_as::<_, UserWithPassword>(
            "SELECT user_id, external_id, full_name, role, password_hash FROM users WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(db)
        .await?;

        Ok(user)
    }

    /// Inserts a user with a pre-validated role and an already sanitized name.
    pub async fn insert_user(
        db: &PgPool,
        external_id: &str,
        full_name: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let password_hash = hash_password(password)?;

        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (external_id, full_name, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(external_id)
        .bind(full_name)
        .bind(&password_hash)
        .bind(role.as_str())
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::conflict(anyhow::anyhow!(
                    "User with external ID '{}' already exists",
                    external_id
                ));
            }
            AppError::from(e)
        })
    }

    #[instrument(skip(db, dto), fields(external_id = ?dto.external_id))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let external_id = dto.external_id.as_deref().map(str::trim).unwrap_or_default();
        let full_name = dto.full_name.as_deref().map(str::trim).unwrap_or_default();
        if external_id.is_empty() || full_name.is_empty() {
            return Err(AppError::invalid("External ID and full name are required"));
        }

        let role = parse_role(dto.role.as_deref())?;
        let full_name = clean_name(full_name)?;
        let password = dto
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PASSWORD);

        Self::insert_user(db, external_id, &full_name, password, role).await
    }

    /// Writes only the fields that differ from the stored row.
    #[instrument(skip(db, dto))]
    pub async fn update_user(
        db: &PgPool,
        user_id: i64,
        dto: UpdateUserDto,
    ) -> Result<UpdateOutcome, AppError> {
        let existing = sqlx::query_as::<_, UserWithPassword>(
            "SELECT user_id, external_id, full_name, role, password_hash FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("User not found"))?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut changes = builder.separated(", ");
        let mut changed = false;

        if let Some(external_id) = dto.external_id.as_deref().map(str::trim)
            && !external_id.is_empty()
            && external_id != existing.external_id
        {
            changes.push("external_id = ").push_bind_unseparated(external_id.to_string());
            changed = true;
        }

        if let Some(full_name) = dto.full_name.as_deref().map(str::trim)
            && !full_name.is_empty()
        {
            let full_name = clean_name(full_name)?;
            if full_name != existing.full_name {
                changes.push("full_name = ").push_bind_unseparated(full_name);
                changed = true;
            }
        }

        if dto.role.as_deref().is_some_and(|r| !r.trim().is_empty()) {
            let role = parse_role(dto.role.as_deref())?;
            if role.as_str() != existing.role {
                changes.push("role = ").push_bind_unseparated(role.as_str());
                changed = true;
            }
        }

        if let Some(password) = dto.password.as_deref().filter(|p| !p.is_empty())
            && !verify_password(password, &existing.password_hash).unwrap_or(false)
        {
            changes
                .push("password_hash = ")
                .push_bind_unseparated(hash_password(password)?);
            changed = true;
        }

        if !changed {
            return Ok(UpdateOutcome::Unchanged);
        }

        builder
            .push(" WHERE user_id = ")
            .push_bind(user_id)
            .push(format!(" RETURNING {USER_COLUMNS}"));

        let user = builder
            .build_query_as::<User>()
            .fetch_one(db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AppError::conflict(anyhow::anyhow!("External ID already in use"));
                }
                AppError::from(e)
            })?;

        Ok(UpdateOutcome::Updated(user))
    }

    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, user_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::missing("User not found"));
        }
        Ok(())
    }

    /// Creates one user per CSV row, collecting per-row errors.
    #[instrument(skip(db, rows), fields(rows = rows.len()))]
    pub async fn import_rows(db: &PgPool, rows: &[CsvRow]) -> Result<BatchResult, AppError> {
        let mut result = BatchResult::new();

        for row in rows {
            let (Some(external_id), Some(raw_name)) =
                (row.get(&["external_id"]), row.get(&["full_name"]))
            else {
                result.error(format!(
                    "Row {}: external_id and full_name are required",
                    row.line
                ));
                continue;
            };

            let Ok(role) = parse_role(row.get(&["role"])) else {
                result.error(format!(
                    "Row {}: Invalid role '{}'",
                    row.line,
                    row.get(&["role"]).unwrap_or_default()
                ));
                continue;
            };

            let full_name = sanitize_full_name(raw_name);
            if full_name.is_empty() {
                result.error(format!("Row {}: Full name contains no valid characters", row.line));
                continue;
            }

            let password = row.get(&["password"]).unwrap_or(DEFAULT_PASSWORD);
            let password_hash = hash_password(password)?;

            let inserted = sqlx::query_scalar::<_, i64>(
                r#"INSERT INTO users (external_id, full_name, password_hash, role)
                   VALUES ($1, $2, $3, $4)
                   ON CONFLICT (external_id) DO NOTHING
                   RETURNING user_id"#,
            )
            .bind(external_id)
            .bind(&full_name)
            .bind(&password_hash)
            .bind(role.as_str())
            .fetch_optional(db)
            .await?;

            match inserted {
                Some(_) => result.created += 1,
                None => result.error(format!(
                    "Row {}: User with external ID '{}' already exists",
                    row.line, external_id
                )),
            }
        }

        Ok(result)
    }
}
