//! Open-mode flags and conversion between SQLite text values and Apache Arrow.
//!
//! The driver treats every value as text: parameters are bound as text and
//! columns are read as text. This module maps that model onto Arrow, where
//! every result column is `Utf8` and every bound Arrow value is rendered to
//! its text form.

use std::str::FromStr;

use arrow_array::Array;
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type, UInt16Type,
    UInt32Type, UInt64Type,
};
use arrow_schema::{DataType, Field, Schema};

use crate::error::{Result, SqliteError};

bitflags::bitflags! {
    /// Open-mode bitmask passed to the engine when a connection is opened.
    ///
    /// Values can be or'd together. Some only apply together with a custom
    /// VFS. Whatever the caller passes, [`OpenFlags::serialized`] is applied
    /// before opening, so `NO_MUTEX` never has an effect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: i32 {
        const READ_ONLY = 0x0000_0001;
        const READ_WRITE = 0x0000_0002;
        const CREATE = 0x0000_0004;
        /// VFS only
        const DELETE_ON_CLOSE = 0x0000_0008;
        /// VFS only
        const EXCLUSIVE = 0x0000_0010;
        /// VFS only
        const MAIN_DB = 0x0000_0100;
        /// VFS only
        const TEMP_DB = 0x0000_0200;
        /// VFS only
        const TRANSIENT_DB = 0x0000_0400;
        /// VFS only
        const MAIN_JOURNAL = 0x0000_0800;
        /// VFS only
        const TEMP_JOURNAL = 0x0000_1000;
        /// VFS only
        const SUB_JOURNAL = 0x0000_2000;
        /// VFS only
        const MASTER_JOURNAL = 0x0000_4000;
        const NO_MUTEX = 0x0000_8000;
        const FULL_MUTEX = 0x0001_0000;
        const SHARED_CACHE = 0x0002_0000;
        const PRIVATE_CACHE = 0x0004_0000;

        // bits the engine knows and this list doesn't pass through untouched
        const _ = !0;
    }
}

impl OpenFlags {
    /// Clears `NO_MUTEX` and sets `FULL_MUTEX`.
    pub const fn serialized(self) -> Self {
        self.difference(Self::NO_MUTEX).union(Self::FULL_MUTEX)
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self::READ_WRITE | Self::CREATE
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal bitmask.
impl FromStr for OpenFlags {
    type Err = SqliteError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => i32::from_str_radix(hex, 16),
            None => s.parse::<i32>(),
        };
        parsed
            .map(Self::from_bits_retain)
            .map_err(|e| SqliteError::config(format!("invalid flags value '{}': {}", s, e)))
    }
}

/// Builds the Arrow schema for a result: one non-nullable `Utf8` field per column.
pub fn text_schema(column_names: &[String]) -> Schema {
    Schema::new(
        column_names
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    )
}

/// Renders one Arrow value as the text that gets bound to a parameter slot.
///
/// Booleans become `1`/`0`, the way SQLite stores them. Nulls are rejected
/// since only text parameters are supported.
pub fn arrow_value_to_text(array: &dyn Array, row: usize) -> Result<String> {
    if array.is_null(row) {
        return Err(SqliteError::usage(format!(
            "bind: row {} holds a null, only text parameters are supported",
            row
        )));
    }

    let text = match array.data_type() {
        DataType::Utf8 => array.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => array.as_string::<i64>().value(row).to_string(),
        DataType::Boolean => (if array.as_boolean().value(row) { "1" } else { "0" }).to_string(),
        DataType::Int8 => array.as_primitive::<Int8Type>().value(row).to_string(),
        DataType::Int16 => array.as_primitive::<Int16Type>().value(row).to_string(),
        DataType::Int32 => array.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => array.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::UInt8 => array.as_primitive::<UInt8Type>().value(row).to_string(),
        DataType::UInt16 => array.as_primitive::<UInt16Type>().value(row).to_string(),
        DataType::UInt32 => array.as_primitive::<UInt32Type>().value(row).to_string(),
        DataType::UInt64 => array.as_primitive::<UInt64Type>().value(row).to_string(),
        DataType::Float32 => array.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => array.as_primitive::<Float64Type>().value(row).to_string(),
        DataType::Binary => String::from_utf8_lossy(array.as_binary::<i32>().value(row)).into_owned(),
        other => {
            return Err(SqliteError::usage(format!(
                "bind: unsupported Arrow type {:?}",
                other
            )));
        }
    };
    Ok(text)
}
