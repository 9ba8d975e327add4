use crate::catalog::validate_entry;
use crate::catalog::validate_list;
use crate::catalog::NewPriceList;
use crate::catalog::PriceItem;
use crate::catalog::PriceList;
use crate::catalog::PriceListStore;
use crate::catalog::PriceListSummary;
use crate::catalog::StoreError;
use crate::import::section::CatalogEntry;
use bigdecimal::BigDecimal;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    lists: Vec<PriceList>,
    items: Vec<PriceItem>,
}

/// Price list store kept in memory, shareable between threads.
#[derive(Clone, Default)]
pub struct MemoryPriceListStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryPriceListStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::LockPoisoned)
    }
}

fn newest_first(lists: &mut [PriceList]) {
    lists.sort_by(|a, b| b.imported_at.cmp(&a.imported_at));
}

impl PriceListStore for MemoryPriceListStore {
    fn create_list_with_items(&self, list: NewPriceList, entries: Vec<CatalogEntry>) -> Result<Uuid, StoreError> {
        validate_list(&list)?;
        for entry in &entries {
            validate_entry(entry)?;
        }

        let list = PriceList {
            id: Uuid::new_v4(),
            name: list.name,
            source_file_name: list.source_file_name,
            imported_at: list.imported_at,
        };
        let items = entries.into_iter().map(|entry| PriceItem {
            id: Uuid::new_v4(),
            price_list_id: list.id,
            code: entry.code,
            description: entry.description,
            unit_price: entry.unit_price,
            section_name: entry.section_name,
        });

        let id = list.id;
        let mut tables = self.write()?;
        tables.items.extend(items);
        tables.lists.push(list);
        Ok(id)
    }

    fn lists(&self) -> Result<Vec<PriceList>, StoreError> {
        let mut lists = self.read()?.lists.clone();
        newest_first(&mut lists);
        Ok(lists)
    }

    fn summaries(&self) -> Result<Vec<PriceListSummary>, StoreError> {
        let tables = self.read()?;
        let mut lists = tables.lists.clone();
        newest_first(&mut lists);
        Ok(lists
            .into_iter()
            .map(|list| PriceListSummary {
                items_count: tables.items.iter().filter(|item| item.price_list_id == list.id).count(),
                id: list.id,
                name: list.name,
                source_file_name: list.source_file_name,
                imported_at: list.imported_at,
            })
            .collect())
    }

    fn list(&self, id: Uuid) -> Result<Option<PriceList>, StoreError> {
        Ok(self.read()?.lists.iter().find(|list| list.id == id).cloned())
    }

    fn items(&self, list_id: Uuid) -> Result<Vec<PriceItem>, StoreError> {
        let mut items: Vec<PriceItem> = self
            .read()?
            .items
            .iter()
            .filter(|item| item.price_list_id == list_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.description.cmp(&b.description));
        Ok(items)
    }

    fn item(&self, id: Uuid) -> Result<Option<PriceItem>, StoreError> {
        Ok(self.read()?.items.iter().find(|item| item.id == id).cloned())
    }

    fn update_item_price(&self, item_id: Uuid, price: BigDecimal) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let item = tables
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(StoreError::ItemNotFound(item_id))?;
        item.unit_price = price;
        Ok(())
    }
}
