// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int64,
    UInt64,
    Float64,
    Utf8,
    Nullable(Box<DataType>),
}

impl DataType {
    pub fn wrap_nullable(&self) -> DataType {
        match self {
            DataType::Nullable(_) => self.clone(),
            other => DataType::Nullable(Box::new(other.clone())),
        }
    }

    pub fn remove_nullable(&self) -> DataType {
        match self {
            DataType::Nullable(inner) => inner.as_ref().clone(),
            other => other.clone(),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Boolean => write!(f, "Boolean"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::UInt64 => write!(f, "UInt64"),
            DataType::Float64 => write!(f, "Float64"),
            DataType::Utf8 => write!(f, "Utf8"),
            DataType::Nullable(inner) => write!(f, "Nullable({})", inner),
        }
    }
}
