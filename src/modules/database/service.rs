use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row};
use tracing::{info, instrument, warn};

use lms_core::AppError;

use crate::modules::database::model::{
    QueryOutcome, StatementKind, TableDataResponse, statement_count,
};

const DEFAULT_PAGE_SIZE: i64 = 50;

/// Turns a failing statement into a 400 carrying the database's message.
fn statement_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => AppError::invalid(db_err.message().to_string()),
        _ => AppError::from(err),
    }
}

/// Text rendering of a raw row, used for `SHOW`/`EXPLAIN` style output.
fn text_row(row: &PgRow) -> Value {
    let mut object = Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null);
        object.insert(column.name().to_string(), value);
    }
    Value::Object(object)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn columns_of(rows: &[Value]) -> Vec<String> {
    rows.first()
        .and_then(Value::as_object)
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}

pub struct DatabaseService;

impl DatabaseService {
    #[instrument(skip(db))]
    pub async fn list_tables(db: &PgPool) -> Result<Vec<String>, AppError> {
        let tables = sqlx::query_scalar::<_, String>(
            r#"SELECT table_name::TEXT
               FROM information_schema.tables
               WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
               ORDER BY table_name"#,
        )
        .fetch_all(db)
        .await?;
        Ok(tables)
    }

    #[instrument(skip(db))]
    pub async fn table_data(
        db: &PgPool,
        table: &str,
        page: i64,
        per_page: Option<i64>,
    ) -> Result<TableDataResponse, AppError> {
        let tables = Self::list_tables(db).await?;
        let Some(table) = tables.into_iter().find(|t| t == table) else {
            return Err(AppError::invalid("Invalid table name"));
        };

        let per_page = per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 500);
        let page = page.max(1);
        let offset = (page - 1) * per_page;

        let columns = sqlx::query_scalar::<_, String>(
            r#"SELECT column_name::TEXT
               FROM information_schema.columns
               WHERE table_schema = 'public' AND table_name = $1
               ORDER BY ordinal_position"#,
        )
        .bind(&table)
        .fetch_all(db)
        .await?;

        // Names are quoted and come from the catalogue, never from the request.
        let quoted = quote_ident(&table);
        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {quoted}"))
            .fetch_one(db)
            .await?;
        let order_by = columns
            .first()
            .map(|column| format!(" ORDER BY t.{}", quote_ident(column)))
            .unwrap_or_default();
        let data = sqlx::query_scalar::<_, Value>(&format!(
            "SELECT row_to_json(t) FROM {quoted} t{order_by} LIMIT $1 OFFSET $2"
        ))
        .bind(per_page)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(TableDataResponse {
            success: true,
            table,
            columns,
            data,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        })
    }

    #[instrument(skip(db, query))]
    pub async fn execute(db: &PgPool, query: &str, confirmed: bool) -> Result<QueryOutcome, AppError> {
        let query = query.trim().trim_end_matches(';').trim();
        if query.is_empty() {
            return Err(AppError::invalid("Query is required"));
        }

        match StatementKind::classify(query) {
            StatementKind::Read => {
                if statement_count(query) > 1 {
                    return Err(AppError::invalid(
                        "Only one statement can be run at a time without confirmation",
                    ));
                }

                let data = Self::read_only(db, query).await?;
                Ok(QueryOutcome::Rows {
                    success: true,
                    columns: columns_of(&data),
                    row_count: data.len(),
                    data,
                })
            }
            StatementKind::Write if !confirmed => Ok(QueryOutcome::NeedsConfirmation {
                success: false,
                requires_confirmation: true,
                message: "This query will modify the database. Please confirm to proceed."
                    .to_string(),
            }),
            StatementKind::Write => {
                warn!("Executing confirmed write statement from the SQL console");
                let result = sqlx::raw_sql(query)
                    .execute(db)
                    .await
                    .map_err(statement_error)?;
                info!(affected_rows = result.rows_affected(), "Console statement executed");

                Ok(QueryOutcome::Executed {
                    success: true,
                    message: "Query executed successfully".to_string(),
                    affected_rows: result.rows_affected(),
                })
            }
        }
    }
}

impl DatabaseService {
    /// Runs one prepared statement inside a read-only transaction.
    async fn read_only(db: &PgPool, query: &str) -> Result<Vec<Value>, AppError> {
        let mut tx = db.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;

        let upper = query.to_ascii_uppercase();
        let data = if upper.starts_with("SELECT") || upper.starts_with("WITH") {
            sqlx::query_scalar::<_, Value>(&format!("SELECT row_to_json(q) FROM ({query}) q"))
                .fetch_all(&mut *tx)
                .await
                .map_err(statement_error)?
        } else {
            sqlx::query(query)
                .fetch_all(&mut *tx)
                .await
                .map_err(statement_error)?
                .iter()
                .map(text_row)
                .collect()
        };

        tx.rollback().await?;
        Ok(data)
    }
}
