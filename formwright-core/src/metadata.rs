//! Columns every backend row carries regardless of its form.

pub const ROW_ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

const RESERVED_COLUMNS: &[&str] = &[ROW_ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN];

pub fn is_reserved_column(name: &str) -> bool {
    RESERVED_COLUMNS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}
