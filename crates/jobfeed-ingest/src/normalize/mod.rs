// Job Listing Normalizer
//
// Turns the raw search API document into a typed table:
// - Validate: the container field must exist and hold an array
// - Flatten: records and arrays-of-records become one ordered record list
// - Rename: source fields to canonical column names
// - Coerce: numeric columns and the posting timestamp, bad values become null
// - Prune: drop URL and free-text columns not kept in storage
//
// Only the validation step can fail. Row-level data problems degrade to nulls.

pub mod coerce;
pub mod raw;
pub mod schema;
pub mod table;

pub use raw::{flatten, FlatRecord, RawNode};
pub use schema::{
    COLUMN_RENAMES, CONTAINER_FIELD, DROPPED_COLUMNS, NUMERIC_COLUMNS, POSTED_DATE_COLUMN,
};
pub use table::{Cell, ColumnDef, ColumnType, NormalizedTable};

use serde_json::Value;
use tracing::{debug, info, warn};

/// Result type for normalization
pub type Result<T> = std::result::Result<T, SchemaError>;

/// The raw document does not have the expected shape
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Unexpected JSON format: expected a top-level object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("Unexpected JSON format or '{field}' field missing")]
    MissingContainer { field: String },

    #[error("Unexpected JSON format: '{field}' is {found}, expected an array")]
    NotASequence { field: String, found: &'static str },
}

/// Normalize a document using the default `response` container
pub fn normalize(raw: Value) -> Result<NormalizedTable> {
    Normalizer::default().normalize(raw)
}

/// Flattens, renames, coerces and prunes raw job listings
#[derive(Debug, Clone)]
pub struct Normalizer {
    container_field: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(CONTAINER_FIELD)
    }
}

impl Normalizer {
    pub fn new(container_field: impl Into<String>) -> Self {
        Self {
            container_field: container_field.into(),
        }
    }

    pub fn container_field(&self) -> &str {
        &self.container_field
    }

    /// Run every normalization step over one raw document
    pub fn normalize(&self, raw: Value) -> Result<NormalizedTable> {
        let items = self.extract_container(raw)?;
        let elements = items.len();

        let records = flatten(items);
        info!(elements, records = records.len(), "Flattened API response");

        let mut table = NormalizedTable::from_records(records);

        rename_columns(&mut table);
        log_schema("before conversion", &table);

        let anomalies = coerce_numeric_columns(&mut table) + coerce_posted_date(&mut table);
        log_schema("after conversion", &table);

        drop_columns(&mut table);

        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            nulled_values = anomalies,
            "Normalized job listings"
        );

        Ok(table)
    }

    /// Validate the document shape and take ownership of the container array
    fn extract_container(&self, document: Value) -> Result<Vec<Value>> {
        let mut fields = match document {
            Value::Object(map) => map,
            other => {
                return Err(SchemaError::NotAnObject {
                    found: raw::json_kind(&other),
                })
            },
        };

        match fields.remove(&self.container_field) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(SchemaError::NotASequence {
                field: self.container_field.clone(),
                found: raw::json_kind(&other),
            }),
            None => Err(SchemaError::MissingContainer {
                field: self.container_field.clone(),
            }),
        }
    }
}

/// Apply [`COLUMN_RENAMES`]; absent source columns are skipped
pub fn rename_columns(table: &mut NormalizedTable) {
    for (from, to) in COLUMN_RENAMES {
        if !table.has_column(from) {
            continue;
        }
        if !table.rename_column(from, to) {
            warn!(from, to, "Column rename skipped, target column already exists");
        }
    }
}

/// Coerce [`NUMERIC_COLUMNS`]; returns how many values became null.
///
/// Each coerced column is declared numeric: integer when every value is an
/// integer, float otherwise, including when every value is null.
pub fn coerce_numeric_columns(table: &mut NormalizedTable) -> usize {
    NUMERIC_COLUMNS
        .iter()
        .filter_map(|column| {
            let nulled = table.convert_column(column, coerce::to_numeric)?;
            if nulled > 0 {
                debug!(column, nulled, "Non-numeric values replaced with null");
            }

            let inferred = table
                .column_index(column)
                .and_then(|idx| table.inferred_type(idx));
            let numeric_type = match inferred {
                Some(ColumnType::Integer) => ColumnType::Integer,
                _ => ColumnType::Float,
            };
            table.declare_column_type(column, numeric_type);

            Some(nulled)
        })
        .sum()
}

/// Coerce [`POSTED_DATE_COLUMN`]; returns how many values became null.
///
/// The column is declared a timestamp even when no value parsed.
pub fn coerce_posted_date(table: &mut NormalizedTable) -> usize {
    match table.convert_column(POSTED_DATE_COLUMN, coerce::to_timestamp) {
        Some(nulled) => {
            if nulled > 0 {
                debug!(column = POSTED_DATE_COLUMN, nulled, "Unparsable timestamps replaced with null");
            }
            table.declare_column_type(POSTED_DATE_COLUMN, ColumnType::Timestamp);
            nulled
        },
        None => 0,
    }
}

/// Remove [`DROPPED_COLUMNS`] that are present
pub fn drop_columns(table: &mut NormalizedTable) {
    for column in DROPPED_COLUMNS {
        if table.drop_column(column) {
            debug!(column, "Dropped column");
        }
    }
}

fn log_schema(stage: &str, table: &NormalizedTable) {
    for def in table.schema() {
        debug!(stage, column = %def.name, dtype = %def.column_type, "Column data type");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_container() {
        let err = normalize(json!({"data": []})).unwrap_err();
        assert!(matches!(err, SchemaError::MissingContainer { ref field } if field == "response"));
    }

    #[test]
    fn test_container_not_a_sequence() {
        let err = normalize(json!({"response": {"title": "x"}})).unwrap_err();
        assert!(matches!(err, SchemaError::NotASequence { found: "an object", .. }));
    }

    #[test]
    fn test_document_not_an_object() {
        let err = normalize(json!([{"title": "x"}])).unwrap_err();
        assert!(matches!(err, SchemaError::NotAnObject { found: "an array" }));
    }

    #[test]
    fn test_custom_container_field() {
        let table = Normalizer::new("jobs")
            .normalize(json!({"jobs": [{"title": "Data Engineer"}]}))
            .unwrap();
        assert_eq!(table.columns(), &["JobTitle"]);
    }

    #[test]
    fn test_empty_container_gives_empty_table() {
        let table = normalize(json!({"response": []})).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 0);
    }

    fn column_types(table: &NormalizedTable) -> Vec<(String, ColumnType)> {
        table
            .schema()
            .into_iter()
            .map(|def| (def.name, def.column_type))
            .collect()
    }

    #[test]
    fn test_unparsable_designated_columns_keep_their_types() {
        let table = normalize(json!({
            "response": [
                {"salaryInsights": "n/a", "companyId": null, "listedAt": "garbage"},
                {"salaryInsights": "", "companyId": "unknown", "listedAt": null}
            ]
        }))
        .unwrap();

        assert_eq!(
            column_types(&table),
            vec![
                ("SalaryInsights".to_string(), ColumnType::Float),
                ("CompanyId".to_string(), ColumnType::Float),
                ("PostedDate".to_string(), ColumnType::Timestamp),
            ]
        );
    }

    #[test]
    fn test_numeric_columns_widen_like_the_values() {
        let table = normalize(json!({
            "response": [
                {"companyId": "1441", "salaryInsights": "85000"},
                {"companyId": 9217, "salaryInsights": "60000.5"}
            ]
        }))
        .unwrap();

        assert_eq!(
            column_types(&table),
            vec![
                ("CompanyId".to_string(), ColumnType::Integer),
                ("SalaryInsights".to_string(), ColumnType::Float),
            ]
        );
    }

    #[test]
    fn test_rename_passes_unmapped_fields_through() {
        let mut table = normalize(json!({"response": [{"title": "a", "trackingId": "t1"}]})).unwrap();
        rename_columns(&mut table);
        assert_eq!(table.columns(), &["JobTitle", "trackingId"]);
    }
}
