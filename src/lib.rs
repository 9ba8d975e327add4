//! # DuckDB Price List Extension
//!
//! Imports supplier price lists kept in spreadsheets. The header row is found
//! by keyword, the code, description and price columns are read until the
//! table ends, prices are parsed as exact decimals in either invariant or
//! Spanish notation, and section headings are carried onto the items below
//! them.
//!
//! ## Features
//!
//! - **Formats**: Excel Open XML (`.xlsx`, `.xlsm`, `.xlam`) and OpenDocument (`.ods`)
//! - **Header detection**: case and accent insensitive keywords such as `Código`,
//!   `Descripción`, `Precio`, `SKU` or `PVP`
//! - **Exact prices**: `1.234,56`, `1,234.56` and `€ 12,50` all parse without
//!   binary floating point
//! - **Sections**: rows naming a group without a code or price become the
//!   section of the items that follow
//! - **Remote files**: URLs are fetched through DuckDB's `read_blob`
//!
//! ## Table Functions
//!
//! - `preview_price_list`: the rows an import would read, with the located
//!   header position
//! - `read_price_list`: every priced item of the sheet with its section
//!
//! The same pipeline is available to Rust callers through [`import`] and the
//! [`catalog`] store.
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

pub mod catalog;
pub mod error;
mod extension;
mod helpers;
pub mod import;
pub mod spreadsheet;

pub use crate::catalog::memory::MemoryPriceListStore;
pub use crate::catalog::service::PriceListService;
pub use crate::catalog::PriceListStore;
pub use crate::error::PriceSheetError;
pub use crate::import::import_preview;
pub use crate::import::load_catalog;
pub use crate::import::CancellationToken;
pub use crate::import::ImportOptions;

use crate::extension::preview_price_list::PreviewPriceListTableFunction;
use crate::extension::read_price_list::ReadPriceListTableFunction;
use anyhow::Context;
use anyhow::Result;
use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint_c_api;
use libduckdb_sys as ffi;

/// Extension entry point for DuckDB.
///
/// Registers `preview_price_list` and `read_price_list`.
///
/// # Errors
///
/// Returns an error if either table function fails to register with DuckDB.
#[duckdb_entrypoint_c_api()]
pub unsafe fn extension_entrypoint(connection: Connection) -> Result<()> {
    connection
        .register_table_function::<PreviewPriceListTableFunction>("preview_price_list")
        .context("Failed to register preview_price_list table function")?;
    connection
        .register_table_function::<ReadPriceListTableFunction>("read_price_list")
        .context("Failed to register read_price_list table function")?;
    tracing::debug!("Registered price list table functions");
    Ok(())
}
