// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::cmp::Ordering;
use std::fmt;

use crate::DataType;

/// A single owned value of any supported type.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    Utf8(String),
}

/// Borrowed view of a [`DataValue`], used on comparison and copy paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataValueRef<'a> {
    Null,
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    Utf8(&'a str),
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn as_value_ref(&self) -> DataValueRef<'_> {
        match self {
            DataValue::Null => DataValueRef::Null,
            DataValue::Boolean(v) => DataValueRef::Boolean(*v),
            DataValue::Int64(v) => DataValueRef::Int64(*v),
            DataValue::UInt64(v) => DataValueRef::UInt64(*v),
            DataValue::Float64(v) => DataValueRef::Float64(*v),
            DataValue::Utf8(v) => DataValueRef::Utf8(v.as_str()),
        }
    }

    /// The default value used to fill null slots of a non-nullable storage.
    pub fn default_of(data_type: &DataType) -> DataValue {
        match data_type.remove_nullable() {
            DataType::Boolean => DataValue::Boolean(false),
            DataType::Int64 => DataValue::Int64(0),
            DataType::UInt64 => DataValue::UInt64(0),
            DataType::Float64 => DataValue::Float64(0.0),
            DataType::Utf8 => DataValue::Utf8(String::new()),
            DataType::Nullable(_) => DataValue::Null,
        }
    }
}

impl<'a> DataValueRef<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValueRef::Null)
    }

    pub fn to_owned(&self) -> DataValue {
        match self {
            DataValueRef::Null => DataValue::Null,
            DataValueRef::Boolean(v) => DataValue::Boolean(*v),
            DataValueRef::Int64(v) => DataValue::Int64(*v),
            DataValueRef::UInt64(v) => DataValue::UInt64(*v),
            DataValueRef::Float64(v) => DataValue::Float64(*v),
            DataValueRef::Utf8(v) => DataValue::Utf8((*v).to_string()),
        }
    }

    /// Total order between two values of the same type.
    ///
    /// Nulls compare equal to each other and below every value; streams that
    /// need a configurable null position handle nulls before calling this.
    /// Floats use the IEEE total ordering.
    pub fn compare(&self, other: &DataValueRef<'a>) -> Ordering {
        match (self, other) {
            (DataValueRef::Null, DataValueRef::Null) => Ordering::Equal,
            (DataValueRef::Null, _) => Ordering::Less,
            (_, DataValueRef::Null) => Ordering::Greater,
            (DataValueRef::Boolean(l), DataValueRef::Boolean(r)) => l.cmp(r),
            (DataValueRef::Int64(l), DataValueRef::Int64(r)) => l.cmp(r),
            (DataValueRef::UInt64(l), DataValueRef::UInt64(r)) => l.cmp(r),
            (DataValueRef::Float64(l), DataValueRef::Float64(r)) => l.total_cmp(r),
            (DataValueRef::Utf8(l), DataValueRef::Utf8(r)) => l.cmp(r),
            (l, r) => unreachable!("cannot compare values of different types: {:?} vs {:?}", l, r),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => write!(f, "NULL"),
            DataValue::Boolean(v) => write!(f, "{}", v),
            DataValue::Int64(v) => write!(f, "{}", v),
            DataValue::UInt64(v) => write!(f, "{}", v),
            DataValue::Float64(v) => write!(f, "{}", v),
            DataValue::Utf8(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for DataValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValueRef::Null => write!(f, "NULL"),
            DataValueRef::Boolean(v) => write!(f, "{}", v),
            DataValueRef::Int64(v) => write!(f, "{}", v),
            DataValueRef::UInt64(v) => write!(f, "{}", v),
            DataValueRef::Float64(v) => write!(f, "{}", v),
            DataValueRef::Utf8(v) => write!(f, "{}", v),
        }
    }
}
