use serde::{Deserialize, Serialize};
use serde_json::Value;

use lms_core::PageParams;

const READ_PREFIXES: [&str; 5] = ["SELECT", "SHOW", "EXPLAIN", "DESCRIBE", "WITH"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Returns rows and never needs confirmation.
    Read,
    Write,
}

impl StatementKind {
    pub fn classify(query: &str) -> Self {
        let upper = query.trim_start().to_ascii_uppercase();
        if upper.starts_with("EXPLAIN") && explains_with_analyze(&upper) {
            return StatementKind::Write;
        }
        if READ_PREFIXES.iter().any(|p| upper.starts_with(p)) {
            StatementKind::Read
        } else {
            StatementKind::Write
        }
    }
}

/// `EXPLAIN ANALYZE` executes the statement it explains.
fn explains_with_analyze(upper: &str) -> bool {
    let rest = upper["EXPLAIN".len()..].trim_start();
    let options = match rest.strip_prefix('(') {
        Some(inner) => inner.split(')').next().unwrap_or_default(),
        None => rest.split_whitespace().next().unwrap_or_default(),
    };
    options
        .split(|c: char| c == ',' || c.is_whitespace())
        .any(|word| word == "ANALYZE" || word == "ANALYSE")
}

/// Counts the statements in `query`, ignoring semicolons inside quotes and
/// a trailing terminator.
pub fn statement_count(query: &str) -> usize {
    let mut count = 0;
    let mut pending = false;
    let mut quote: Option<char> = None;
    for ch in query.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    pending = true;
                }
                ';' => {
                    if pending {
                        count += 1;
                    }
                    pending = false;
                }
                c if !c.is_whitespace() => pending = true,
                _ => {}
            },
        }
    }
    count + usize::from(pending)
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub success: bool,
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableDataQuery {
    pub table: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

#[derive(Debug, Serialize)]
pub struct TableDataResponse {
    pub success: bool,
    pub table: String,
    pub columns: Vec<String>,
    pub data: Vec<Value>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteQueryDto {
    pub query: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Rows {
        success: bool,
        columns: Vec<String>,
        data: Vec<Value>,
        row_count: usize,
    },
    NeedsConfirmation {
        success: bool,
        requires_confirmation: bool,
        message: String,
    },
    Executed {
        success: bool,
        message: String,
        affected_rows: u64,
    },
}
