//! CSV import and export helpers.
//!
//! Uploads arrive as multipart forms with the file in a `file` field. Rows are
//! exposed as maps keyed by the lowercased, trimmed header so column order does
//! not matter. Row numbers in error messages count the header as row 1.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::Multipart,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use lms_core::AppError;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A file upload plus the other text fields of its form.
#[derive(Debug)]
pub struct CsvUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub fields: HashMap<String, String>,
}

/// One data row and its 1-based line number in the file.
#[derive(Debug, Clone)]
pub struct CsvRow {
    pub line: usize,
    values: HashMap<String, String>,
}

impl CsvRow {
    /// Trimmed value of the first present, non-empty column among `names`.
    pub fn get(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.values.get(*name))
            .map(|v| v.as_str())
            .find(|v| !v.is_empty())
    }
}

/// Reads a multipart form whose `file` field must be a `.csv` file.
pub async fn read_csv_upload(
    mut multipart: Multipart,
    max_bytes: Option<usize>,
) -> Result<CsvUpload, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::invalid(e.body_text()))?;
            file = Some((filename, bytes.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::invalid(e.body_text()))?;
            fields.insert(name, value);
        }
    }

    let (filename, bytes) = file.ok_or_else(|| AppError::invalid("No file uploaded"))?;
    if filename.trim().is_empty() {
        return Err(AppError::invalid("No file selected"));
    }
    if !filename.to_lowercase().ends_with(".csv") {
        return Err(AppError::invalid("File must be CSV format"));
    }
    if let Some(max) = max_bytes
        && bytes.len() > max
    {
        return Err(AppError::invalid(format!(
            "File size must be less than {}MB",
            max / (1024 * 1024)
        )));
    }

    Ok(CsvUpload {
        filename,
        bytes,
        fields,
    })
}

/// Parses CSV bytes into normalized headers and rows.
///
/// A leading UTF-8 BOM is ignored and short rows are allowed.
pub fn parse_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<CsvRow>), AppError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::invalid(format!("Invalid CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::invalid(format!("Invalid CSV: {}", e)))?;
        if record.iter().all(|v| v.is_empty()) {
            continue;
        }
        let values = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(CsvRow {
            line: index + 2,
            values,
        });
    }

    Ok((headers, rows))
}

/// Serializes rows to CSV, optionally prefixed with a UTF-8 BOM.
pub fn write_csv<I>(headers: &[&str], rows: I, with_bom: bool) -> Result<Vec<u8>, AppError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut buffer = Vec::new();
    if with_bom {
        buffer.extend_from_slice(UTF8_BOM);
    }

    let mut writer = csv::Writer::from_writer(buffer);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::internal_error(format!("Failed to write CSV: {}", e)))
}

/// A downloadable attachment response.
pub fn attachment(body: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename={}", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(body),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_normalizes_headers_and_lines() {
        let data = b"\xEF\xBB\xBFExternal_ID , Full_Name\n S-1 , Ana Cruz \n\n,\nS-2,Ben\n";
        let (headers, rows) = parse_csv(data).unwrap();

        assert_eq!(headers, vec!["external_id", "full_name"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].get(&["external_id"]), Some("S-1"));
        assert_eq!(rows[0].get(&["full_name"]), Some("Ana Cruz"));
        assert_eq!(rows[1].get(&["usn", "external_id"]), Some("S-2"));
    }

    #[test]
    fn test_parse_csv_short_rows() {
        let (_, rows) = parse_csv(b"course_code,course_title,description\nCS101,Intro\n").unwrap();
        assert_eq!(rows[0].get(&["course_title"]), Some("Intro"));
        assert_eq!(rows[0].get(&["description"]), None);
    }

    #[test]
    fn test_write_csv_with_bom_and_quoting() {
        let bytes = write_csv(
            &["code", "title"],
            vec![vec!["CS101".to_string(), "Intro, Part 1".to_string()]],
            true,
        )
        .unwrap();

        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(text, "code,title\nCS101,\"Intro, Part 1\"\n");
    }

    #[test]
    fn test_attachment_headers() {
        let response = attachment(b"a,b\n".to_vec(), "text/csv", "courses.csv");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=courses.csv"
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    }
}
