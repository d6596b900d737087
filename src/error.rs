//! Error types for the row store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tried to fetch page number out of bounds. {page_num} >= {max_pages}")]
    PageOutOfBounds { page_num: usize, max_pages: usize },

    #[error("Page limit {max_pages} is outside 1..={limit}")]
    InvalidPageLimit { max_pages: usize, limit: usize },

    #[error("Row {0} does not fit inside its page")]
    RowOutOfBounds(usize),

    #[error("Tried to flush null page {0}")]
    FlushAbsentPage(usize),

    #[error("Table full.")]
    TableFull,

    #[error("Database file holds {rows} rows, more than the table capacity of {max_rows}")]
    FileTooLarge { rows: usize, max_rows: usize },
}

impl DbError {
    /// Everything but a full table leaves the store in a state the caller
    /// should not keep using.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DbError::TableFull)
    }
}
