use crate::error::PriceSheetError;
use crate::error::ResultMessage;
use crate::extension::writer::write_decimal;
use crate::extension::writer::write_text;
use crate::extension::writer::CHUNK_SIZE;
use crate::extension::NamedParam;
use crate::extension::Param;
use crate::extension::SheetParam;
use crate::extension::SourceParam;
use crate::import::load_catalog;
use crate::import::section::CatalogEntry;
use crate::import::CancellationToken;
use crate::import::ImportOptions;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

const COLUMNS: [&str; 4] = ["code", "description", "unit_price", "section_name"];

#[repr(C)]
pub(crate) struct ReadPriceListBindData {
    entries: Vec<CatalogEntry>,
}

impl ReadPriceListBindData {
    fn load(bind: &BindInfo) -> Result<(String, Self), PriceSheetError> {
        let source = SourceParam::read(bind, 0)?;
        let options = ImportOptions::unbounded().with_sheet(SheetParam::read(bind)?);
        let entries = load_catalog(&source, &options, &CancellationToken::new()).with_prefix(source.as_str())?;
        Ok((source, ReadPriceListBindData { entries }))
    }
}

#[repr(C)]
pub(crate) struct ReadPriceListInitData {
    index: AtomicUsize,
}

/// Table function reading a whole price list with section names
pub(crate) struct ReadPriceListTableFunction;

impl VTab for ReadPriceListTableFunction {
    type InitData = ReadPriceListInitData;
    type BindData = ReadPriceListBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let (source, data) = ReadPriceListBindData::load(bind)?;
        tracing::debug!("Bound read_price_list to '{}' with {} entries", source, data.entries.len());
        for name in COLUMNS {
            bind.add_result_column(name, LogicalTypeHandle::from(LogicalTypeId::Varchar));
        }
        Ok(data)
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(ReadPriceListInitData {
            index: AtomicUsize::new(0),
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let init = func.get_init_data();
        let entries = &func.get_bind_data().entries;
        let lower = init.index.fetch_add(CHUNK_SIZE, Ordering::Relaxed);
        let upper = entries.len().min(lower + CHUNK_SIZE);
        if lower < upper {
            let mut vectors: Vec<_> = (0..COLUMNS.len()).map(|index| output.flat_vector(index)).collect();
            for (row, entry) in entries[lower..upper].iter().enumerate() {
                write_text(&mut vectors[0], row, entry.code.as_deref());
                write_text(&mut vectors[1], row, Some(entry.description.as_str()));
                write_decimal(&mut vectors[2], row, Some(&entry.unit_price));
                write_text(&mut vectors[3], row, entry.section_name.as_deref());
            }
            output.set_len(upper - lower);
        } else {
            output.set_len(0);
        }
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![SourceParam::kind()])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![SheetParam::definition()])
    }
}
