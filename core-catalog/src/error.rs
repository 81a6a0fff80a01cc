use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown sort option: {0} (expected date-desc, date-asc, size-desc or size-asc)")]
    InvalidSortOption(String),

    #[error("Unknown sort key: {0}")]
    InvalidSortKey(String),

    #[error("Unknown sort direction: {0}")]
    InvalidSortDirection(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
