// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::mem;
use std::ops::Range;

use enum_as_inner::EnumAsInner;

use crate::DataType;
use crate::DataValue;
use crate::DataValueRef;

/// Typed columnar storage.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum DataArray {
    Boolean(Vec<bool>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float64(Vec<f64>),
    Utf8(Vec<String>),
    Nullable(Box<NullableArray>),
}

/// A validity mask over an inner array. Slots with `validity[i] == false`
/// hold the type's default value and must be read as null.
#[derive(Debug, Clone, PartialEq)]
pub struct NullableArray {
    pub validity: Vec<bool>,
    pub array: DataArray,
}

impl DataArray {
    pub fn empty(data_type: &DataType) -> DataArray {
        DataArrayBuilder::with_capacity(data_type, 0).finish()
    }

    /// An array of `len` copies of `value` (the materialization of a
    /// constant column).
    pub fn repeat(value: &DataValue, len: usize, data_type: &DataType) -> DataArray {
        let mut builder = DataArrayBuilder::with_capacity(data_type, len);
        for _ in 0..len {
            builder.push(value.as_value_ref());
        }
        builder.finish()
    }

    pub fn len(&self) -> usize {
        match self {
            DataArray::Boolean(v) => v.len(),
            DataArray::Int64(v) => v.len(),
            DataArray::UInt64(v) => v.len(),
            DataArray::Float64(v) => v.len(),
            DataArray::Utf8(v) => v.len(),
            DataArray::Nullable(v) => v.validity.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DataArray::Boolean(_) => DataType::Boolean,
            DataArray::Int64(_) => DataType::Int64,
            DataArray::UInt64(_) => DataType::UInt64,
            DataArray::Float64(_) => DataType::Float64,
            DataArray::Utf8(_) => DataType::Utf8,
            DataArray::Nullable(v) => DataType::Nullable(Box::new(v.array.data_type())),
        }
    }

    /// The value at row `index`. Panics if out of range.
    pub fn value(&self, index: usize) -> DataValueRef<'_> {
        match self {
            DataArray::Boolean(v) => DataValueRef::Boolean(v[index]),
            DataArray::Int64(v) => DataValueRef::Int64(v[index]),
            DataArray::UInt64(v) => DataValueRef::UInt64(v[index]),
            DataArray::Float64(v) => DataValueRef::Float64(v[index]),
            DataArray::Utf8(v) => DataValueRef::Utf8(v[index].as_str()),
            DataArray::Nullable(v) => {
                if v.validity[index] {
                    v.array.value(index)
                } else {
                    DataValueRef::Null
                }
            }
        }
    }

    pub fn slice(&self, range: Range<usize>) -> DataArray {
        match self {
            DataArray::Boolean(v) => DataArray::Boolean(v[range].to_vec()),
            DataArray::Int64(v) => DataArray::Int64(v[range].to_vec()),
            DataArray::UInt64(v) => DataArray::UInt64(v[range].to_vec()),
            DataArray::Float64(v) => DataArray::Float64(v[range].to_vec()),
            DataArray::Utf8(v) => DataArray::Utf8(v[range].to_vec()),
            DataArray::Nullable(v) => DataArray::Nullable(Box::new(NullableArray {
                validity: v.validity[range.clone()].to_vec(),
                array: v.array.slice(range),
            })),
        }
    }

    pub fn memory_size(&self) -> usize {
        match self {
            DataArray::Boolean(v) => v.len(),
            DataArray::Int64(v) => v.len() * mem::size_of::<i64>(),
            DataArray::UInt64(v) => v.len() * mem::size_of::<u64>(),
            DataArray::Float64(v) => v.len() * mem::size_of::<f64>(),
            DataArray::Utf8(v) => {
                v.iter().map(|s| s.len()).sum::<usize>() + v.len() * mem::size_of::<String>()
            }
            DataArray::Nullable(v) => v.validity.len() + v.array.memory_size(),
        }
    }
}

/// Mutable counterpart of [`DataArray`].
#[derive(Debug, EnumAsInner)]
pub enum DataArrayBuilder {
    Boolean(Vec<bool>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float64(Vec<f64>),
    Utf8(Vec<String>),
    Nullable(Box<NullableArrayBuilder>),
}

#[derive(Debug)]
pub struct NullableArrayBuilder {
    data_type: DataType,
    validity: Vec<bool>,
    builder: DataArrayBuilder,
}

impl DataArrayBuilder {
    pub fn with_capacity(data_type: &DataType, capacity: usize) -> DataArrayBuilder {
        match data_type {
            DataType::Boolean => DataArrayBuilder::Boolean(Vec::with_capacity(capacity)),
            DataType::Int64 => DataArrayBuilder::Int64(Vec::with_capacity(capacity)),
            DataType::UInt64 => DataArrayBuilder::UInt64(Vec::with_capacity(capacity)),
            DataType::Float64 => DataArrayBuilder::Float64(Vec::with_capacity(capacity)),
            DataType::Utf8 => DataArrayBuilder::Utf8(Vec::with_capacity(capacity)),
            DataType::Nullable(inner) => DataArrayBuilder::Nullable(Box::new(
                NullableArrayBuilder {
                    data_type: inner.as_ref().clone(),
                    validity: Vec::with_capacity(capacity),
                    builder: DataArrayBuilder::with_capacity(inner, capacity),
                },
            )),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DataArrayBuilder::Boolean(v) => v.len(),
            DataArrayBuilder::Int64(v) => v.len(),
            DataArrayBuilder::UInt64(v) => v.len(),
            DataArrayBuilder::Float64(v) => v.len(),
            DataArrayBuilder::Utf8(v) => v.len(),
            DataArrayBuilder::Nullable(v) => v.validity.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, value: DataValueRef<'_>) {
        match (self, value) {
            (DataArrayBuilder::Boolean(v), DataValueRef::Boolean(x)) => v.push(x),
            (DataArrayBuilder::Int64(v), DataValueRef::Int64(x)) => v.push(x),
            (DataArrayBuilder::UInt64(v), DataValueRef::UInt64(x)) => v.push(x),
            (DataArrayBuilder::Float64(v), DataValueRef::Float64(x)) => v.push(x),
            (DataArrayBuilder::Utf8(v), DataValueRef::Utf8(x)) => v.push(x.to_string()),
            (DataArrayBuilder::Nullable(v), DataValueRef::Null) => {
                v.validity.push(false);
                let default = DataValue::default_of(&v.data_type);
                v.builder.push(default.as_value_ref());
            }
            (DataArrayBuilder::Nullable(v), x) => {
                v.validity.push(true);
                v.builder.push(x);
            }
            (builder, value) => {
                unreachable!("cannot push {:?} into {:?} builder", value, builder)
            }
        }
    }

    pub fn finish(self) -> DataArray {
        match self {
            DataArrayBuilder::Boolean(v) => DataArray::Boolean(v),
            DataArrayBuilder::Int64(v) => DataArray::Int64(v),
            DataArrayBuilder::UInt64(v) => DataArray::UInt64(v),
            DataArrayBuilder::Float64(v) => DataArray::Float64(v),
            DataArrayBuilder::Utf8(v) => DataArray::Utf8(v),
            DataArrayBuilder::Nullable(v) => DataArray::Nullable(Box::new(NullableArray {
                validity: v.validity,
                array: v.builder.finish(),
            })),
        }
    }
}
