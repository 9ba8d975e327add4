//! Stored price lists.
//!
//! A price list is created in one step from the catalog entries of an import
//! and can then be browsed and have individual prices corrected.

pub mod memory;
pub mod service;

use crate::import::section::CatalogEntry;
use bigdecimal::BigDecimal;
use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_LIST_NAME_LENGTH: usize = 200;
pub const MAX_SOURCE_FILE_NAME_LENGTH: usize = 260;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_CODE_LENGTH: usize = 200;
pub const MAX_SECTION_NAME_LENGTH: usize = 200;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Price item '{0}' not found")]
    ItemNotFound(Uuid),

    #[error("Invalid {field}: {message}")]
    ValidationError { field: &'static str, message: String },

    #[error("Price list store is unusable after a panic while writing")]
    LockPoisoned,
}

/// An imported price list.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceList {
    pub id: Uuid,
    pub name: String,
    pub source_file_name: String,
    pub imported_at: DateTime<Utc>,
}

/// An item of a price list.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceItem {
    pub id: Uuid,
    pub price_list_id: Uuid,
    pub code: Option<String>,
    pub description: String,
    pub unit_price: BigDecimal,
    pub section_name: Option<String>,
}

/// A price list with the number of items it holds.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceListSummary {
    pub id: Uuid,
    pub name: String,
    pub source_file_name: String,
    pub imported_at: DateTime<Utc>,
    pub items_count: usize,
}

/// Header of a price list about to be created.
#[derive(Clone, Debug)]
pub struct NewPriceList {
    pub name: String,
    pub source_file_name: String,
    pub imported_at: DateTime<Utc>,
}

/// Storage for price lists and their items.
pub trait PriceListStore {
    /// Stores a list with all of its items, or nothing when any of them is invalid.
    fn create_list_with_items(&self, list: NewPriceList, entries: Vec<CatalogEntry>) -> Result<Uuid, StoreError>;

    /// All lists, most recent import first.
    fn lists(&self) -> Result<Vec<PriceList>, StoreError>;

    /// All lists with their item counts, most recent import first.
    fn summaries(&self) -> Result<Vec<PriceListSummary>, StoreError>;

    fn list(&self, id: Uuid) -> Result<Option<PriceList>, StoreError>;

    /// Items of a list ordered by description.
    fn items(&self, list_id: Uuid) -> Result<Vec<PriceItem>, StoreError>;

    fn item(&self, id: Uuid) -> Result<Option<PriceItem>, StoreError>;

    fn update_item_price(&self, item_id: Uuid, price: BigDecimal) -> Result<(), StoreError>;
}

fn check_length(field: &'static str, value: &str, max_length: usize) -> Result<(), StoreError> {
    let length = value.chars().count();
    if length > max_length {
        return Err(StoreError::ValidationError {
            field,
            message: format!("{} characters exceed the limit of {}", length, max_length),
        });
    }
    Ok(())
}

fn check_required(field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::ValidationError {
            field,
            message: "a value is required".to_owned(),
        });
    }
    Ok(())
}

pub(crate) fn validate_list(list: &NewPriceList) -> Result<(), StoreError> {
    check_required("list name", &list.name)?;
    check_length("list name", &list.name, MAX_LIST_NAME_LENGTH)?;
    check_length("source file name", &list.source_file_name, MAX_SOURCE_FILE_NAME_LENGTH)
}

pub(crate) fn validate_entry(entry: &CatalogEntry) -> Result<(), StoreError> {
    check_required("description", &entry.description)?;
    check_length("description", &entry.description, MAX_DESCRIPTION_LENGTH)?;
    if let Some(code) = &entry.code {
        check_length("code", code, MAX_CODE_LENGTH)?;
    }
    if let Some(section_name) = &entry.section_name {
        check_length("section name", section_name, MAX_SECTION_NAME_LENGTH)?;
    }
    Ok(())
}
