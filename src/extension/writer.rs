//! Helpers for filling DuckDB output vectors.

use bigdecimal::BigDecimal;
use duckdb::core::FlatVector;
use duckdb::core::Inserter;

/// Rows written per output chunk.
pub(super) const CHUNK_SIZE: usize = 2048;

/// Writes text, or NULL when absent.
pub(super) fn write_text(vector: &mut FlatVector, row: usize, value: Option<&str>) {
    match value {
        Some(value) => vector.insert(row, value),
        None => vector.set_null(row),
    }
}

/// Writes a decimal as its exact text, or NULL when absent.
pub(super) fn write_decimal(vector: &mut FlatVector, row: usize, value: Option<&BigDecimal>) {
    match value {
        Some(value) => vector.insert(row, decimal_text(value).as_str()),
        None => vector.set_null(row),
    }
}

/// Writes a 1-based sheet position to a BIGINT vector.
pub(super) fn write_position(vector: &mut FlatVector, row: usize, value: usize) {
    write_primitive(vector, row, value as i64);
}

/// Writes a primitive value directly to a vector using pointer arithmetic.
fn write_primitive<T>(vector: &mut FlatVector, index: usize, value: T) {
    unsafe {
        let pointer: *mut T = vector.as_mut_ptr();
        std::ptr::write(pointer.add(index), value);
    }
}

/// Plain decimal notation keeping the parsed scale, never an exponent.
pub(super) fn decimal_text(value: &BigDecimal) -> String {
    value.to_plain_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn decimals_keep_their_scale() {
        assert_eq!(decimal_text(&BigDecimal::from_str("10.00").unwrap()), "10.00");
        assert_eq!(decimal_text(&BigDecimal::from_str("-1234.5").unwrap()), "-1234.5");
        assert_eq!(decimal_text(&BigDecimal::from_str("0.0000001").unwrap()), "0.0000001");
    }
}
