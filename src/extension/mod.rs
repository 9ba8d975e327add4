//! # Extension Core Module
//!
//! Parameter handling and error types shared by the price list table functions.

pub(crate) mod preview_price_list;
pub(crate) mod read_price_list;
mod writer;

use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use glob::Pattern;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtensionError {
    /// Invalid parameter provided to a table function
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },
}

impl ExtensionError {
    fn invalid(name: &str, message: String) -> Self {
        ExtensionError::InvalidParameter {
            name: name.to_owned(),
            message,
        }
    }
}

/// Positional parameter of a table function.
pub(crate) trait Param<T> {
    /// Returns the DuckDB logical type for this parameter
    fn kind() -> LogicalTypeHandle;

    /// Extracts the parameter at `index` from bind information
    fn read(bind: &BindInfo, index: u64) -> Result<T, ExtensionError>;
}

/// Trait for handling named parameters in DuckDB table functions.
///
/// # Type Parameters
///
/// * `T` - The type of the parameter value
pub(crate) trait NamedParam<T> {
    /// Returns the parameter name as used in SQL
    fn name() -> &'static str;

    /// Returns the DuckDB logical type for this parameter
    fn kind() -> LogicalTypeHandle;

    /// Returns the complete parameter definition (name and type)
    fn definition() -> (String, LogicalTypeHandle) {
        (Self::name().to_string(), Self::kind())
    }

    /// Extracts the parameter value from bind information
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The parameter was not provided
    /// * `Err(_)` - The parameter was provided with an unusable value
    fn read(bind: &BindInfo) -> Result<Option<T>, ExtensionError>;
}

/// Path or URL of the spreadsheet to import
pub(crate) struct SourceParam;

/// Upper bound on previewed rows
pub(crate) struct MaxRowsParam;

/// Glob restricting which sheets are considered
pub(crate) struct SheetParam;

impl Param<String> for SourceParam {
    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    /// A NULL source reads as an empty reference, which the import rejects as missing.
    fn read(bind: &BindInfo, index: u64) -> Result<String, ExtensionError> {
        let value = bind.get_parameter(index);
        Ok(Self::text(value.is_null(), || value.to_string()))
    }
}

impl SourceParam {
    fn text(is_null: bool, text: impl FnOnce() -> String) -> String {
        if is_null {
            String::new()
        } else {
            text()
        }
    }
}

impl MaxRowsParam {
    fn parse(value: i64) -> Result<usize, ExtensionError> {
        usize::try_from(value)
            .map_err(|_| ExtensionError::invalid(Self::name(), format!("{value} is not a row count")))
    }
}

impl NamedParam<usize> for MaxRowsParam {
    fn name() -> &'static str {
        "max_rows"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, ExtensionError> {
        bind.get_named_parameter(Self::name())
            .map(|value| Self::parse(value.to_int64()))
            .transpose()
    }
}

impl SheetParam {
    fn parse(value: &str) -> Result<Pattern, ExtensionError> {
        Pattern::new(value).map_err(|error| ExtensionError::invalid(Self::name(), format!("'{value}' {error}")))
    }
}

impl NamedParam<Pattern> for SheetParam {
    fn name() -> &'static str {
        "sheet"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<Pattern>, ExtensionError> {
        bind.get_named_parameter(Self::name())
            .map(|value| Self::parse(&value.to_string()))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_source_reads_as_missing() {
        use crate::error::PriceSheetError;
        use crate::import::import_preview;
        use crate::import::CancellationToken;
        use crate::import::ImportError;
        use crate::import::ImportOptions;

        let source = SourceParam::text(true, || "NULL".to_owned());
        assert_eq!(source, "");
        let result = import_preview(&source, &ImportOptions::preview(), &CancellationToken::new());
        assert!(matches!(result, Err(PriceSheetError::ImportError(ImportError::InputInvalid))));
        assert_eq!(SourceParam::text(false, || "precios.xlsx".to_owned()), "precios.xlsx");
    }

    #[test]
    fn max_rows_must_not_be_negative() {
        assert_eq!(MaxRowsParam::parse(0).unwrap(), 0);
        assert_eq!(MaxRowsParam::parse(20).unwrap(), 20);
        let message = MaxRowsParam::parse(-1).unwrap_err().to_string();
        assert_eq!(message, "Invalid parameter 'max_rows': -1 is not a row count");
    }

    #[test]
    fn sheet_must_be_a_glob() {
        assert!(SheetParam::parse("Precios*").unwrap().matches("Precios 2024"));
        assert!(SheetParam::parse("Hoja1").unwrap().matches("Hoja1"));
        let result = SheetParam::parse("[Precios");
        assert!(matches!(result, Err(ExtensionError::InvalidParameter { ref name, .. }) if name == "sheet"));
    }
}
