// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::ops::Range;

use crate::DataArray;
use crate::DataType;
use crate::DataValue;
use crate::DataValueRef;

/// One column of a block: either full storage or a constant
/// (one value logically repeated `len` times).
#[derive(Debug, Clone, PartialEq)]
pub enum DataColumn {
    Array(DataArray),
    Constant(DataValue, usize),
}

impl DataColumn {
    pub fn len(&self) -> usize {
        match self {
            DataColumn::Array(array) => array.len(),
            DataColumn::Constant(_, len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, DataColumn::Constant(_, _))
    }

    pub fn value(&self, index: usize) -> DataValueRef<'_> {
        match self {
            DataColumn::Array(array) => array.value(index),
            DataColumn::Constant(value, _) => value.as_value_ref(),
        }
    }

    /// Materialize into full storage.
    pub fn to_array(&self, data_type: &DataType) -> DataArray {
        match self {
            DataColumn::Array(array) => array.clone(),
            DataColumn::Constant(value, len) => DataArray::repeat(value, *len, data_type),
        }
    }

    pub fn slice(&self, range: Range<usize>) -> DataColumn {
        match self {
            DataColumn::Array(array) => DataColumn::Array(array.slice(range)),
            DataColumn::Constant(value, _) => DataColumn::Constant(value.clone(), range.len()),
        }
    }

    pub fn memory_size(&self) -> usize {
        match self {
            DataColumn::Array(array) => array.memory_size(),
            DataColumn::Constant(value, _) => match value {
                DataValue::Utf8(s) => s.len() + std::mem::size_of::<String>(),
                _ => std::mem::size_of::<DataValue>(),
            },
        }
    }
}
