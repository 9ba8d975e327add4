use crate::error::PriceSheetError;
use crate::error::ResultMessage;
use crate::extension::writer::write_decimal;
use crate::extension::writer::write_position;
use crate::extension::writer::write_text;
use crate::extension::writer::CHUNK_SIZE;
use crate::extension::MaxRowsParam;
use crate::extension::NamedParam;
use crate::extension::Param;
use crate::extension::SheetParam;
use crate::extension::SourceParam;
use crate::import::import_preview;
use crate::import::CancellationToken;
use crate::import::ImportOptions;
use crate::import::ImportPreview;
use crate::import::DEFAULT_PREVIEW_ROWS;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use glob::Pattern;
use std::error::Error;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

const COLUMNS: [(&str, LogicalTypeId); 8] = [
    ("sheet_name", LogicalTypeId::Varchar),
    ("header_row", LogicalTypeId::Bigint),
    ("code_column", LogicalTypeId::Bigint),
    ("description_column", LogicalTypeId::Bigint),
    ("price_column", LogicalTypeId::Bigint),
    ("code", LogicalTypeId::Varchar),
    ("description", LogicalTypeId::Varchar),
    ("price", LogicalTypeId::Varchar),
];

/// Parameters for the preview_price_list table function
struct PreviewPriceListParameters {
    /// Path or URL of the spreadsheet
    source: String,
    /// Most rows to read below the header (default: 20)
    max_rows: Option<usize>,
    /// Optional sheet name pattern
    sheet: Option<Pattern>,
}

impl TryFrom<&BindInfo> for PreviewPriceListParameters {
    type Error = PriceSheetError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(PreviewPriceListParameters {
            source: SourceParam::read(bind, 0)?,
            max_rows: MaxRowsParam::read(bind)?,
            sheet: SheetParam::read(bind)?,
        })
    }
}

#[repr(C)]
pub(crate) struct PreviewPriceListBindData {
    preview: ImportPreview,
}

impl TryFrom<&PreviewPriceListParameters> for PreviewPriceListBindData {
    type Error = PriceSheetError;

    fn try_from(parameters: &PreviewPriceListParameters) -> Result<Self, Self::Error> {
        let options = ImportOptions {
            max_rows: Some(parameters.max_rows.unwrap_or(DEFAULT_PREVIEW_ROWS)),
            sheet: parameters.sheet.clone(),
        };
        let preview = import_preview(&parameters.source, &options, &CancellationToken::new())?;
        Ok(PreviewPriceListBindData { preview })
    }
}

#[repr(C)]
pub(crate) struct PreviewPriceListInitData {
    /// Next preview row to emit
    index: AtomicUsize,
}

/// Table function listing the rows a price list import would read
pub(crate) struct PreviewPriceListTableFunction;

impl VTab for PreviewPriceListTableFunction {
    type InitData = PreviewPriceListInitData;
    type BindData = PreviewPriceListBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = PreviewPriceListParameters::try_from(bind)?;
        let data = PreviewPriceListBindData::try_from(&parameters).with_prefix(parameters.source.as_str())?;
        for (name, kind) in COLUMNS {
            bind.add_result_column(name, LogicalTypeHandle::from(kind));
        }
        Ok(data)
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(PreviewPriceListInitData {
            index: AtomicUsize::new(0),
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let init = func.get_init_data();
        let preview = &func.get_bind_data().preview;
        let lower = init.index.fetch_add(CHUNK_SIZE, Ordering::Relaxed);
        let upper = preview.rows.len().min(lower + CHUNK_SIZE);
        if lower < upper {
            let mut vectors: Vec<_> = (0..COLUMNS.len()).map(|index| output.flat_vector(index)).collect();
            for (row, record) in preview.rows[lower..upper].iter().enumerate() {
                write_text(&mut vectors[0], row, Some(preview.sheet_name.as_str()));
                write_position(&mut vectors[1], row, preview.header_row);
                write_position(&mut vectors[2], row, preview.code_column);
                write_position(&mut vectors[3], row, preview.description_column);
                write_position(&mut vectors[4], row, preview.price_column);
                write_text(&mut vectors[5], row, record.code.as_deref());
                write_text(&mut vectors[6], row, record.description.as_deref());
                write_decimal(&mut vectors[7], row, record.price.as_ref());
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
        Some(vec![MaxRowsParam::definition(), SheetParam::definition()])
    }
}
