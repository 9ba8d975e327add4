use crate::catalog::NewPriceList;
use crate::catalog::PriceListStore;
use crate::error::PriceSheetError;
use crate::import::load_catalog;
use crate::import::CancellationToken;
use crate::import::ImportOptions;
use chrono::Utc;
use std::path::Path;
use uuid::Uuid;

/// Imports spreadsheets into a price list store.
pub struct PriceListService<S: PriceListStore> {
    store: S,
}

impl<S: PriceListStore> PriceListService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads every row of `source` and stores them as a new list named `list_name`.
    pub fn import_as_new_list(
        &self,
        source: &str,
        list_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Uuid, PriceSheetError> {
        let entries = load_catalog(source, &ImportOptions::unbounded(), cancel)?;
        let list = NewPriceList {
            name: list_name.to_owned(),
            source_file_name: source_file_name(source),
            imported_at: Utc::now(),
        };

        let count = entries.len();
        let id = self.store.create_list_with_items(list, entries)?;
        tracing::info!("Stored price list '{}' ({}) with {} items", list_name, id, count);
        Ok(id)
    }
}

fn source_file_name(source: &str) -> String {
    let source = source.trim();
    Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_owned())
}
