// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::sync::Arc;

use common_exception::Error;
use common_exception::Result;

use crate::DataType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataField {
    name: String,
    data_type: DataType,
}

impl DataField {
    pub fn new(name: &str, data_type: DataType) -> DataField {
        DataField {
            name: name.to_string(),
            data_type,
        }
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSchema {
    fields: Vec<DataField>,
}

pub type DataSchemaRef = Arc<DataSchema>;

impl DataSchema {
    pub fn empty() -> DataSchema {
        DataSchema { fields: vec![] }
    }

    pub fn new(fields: Vec<DataField>) -> DataSchema {
        DataSchema { fields }
    }

    pub fn fields(&self) -> &[DataField] {
        &self.fields
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Panics if `i` is out of range.
    pub fn field(&self, i: usize) -> &DataField {
        &self.fields[i]
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| Error::UnknownColumn {
                name: name.to_string(),
            })
    }
}

pub struct DataSchemaRefExt;

impl DataSchemaRefExt {
    pub fn create(fields: Vec<DataField>) -> DataSchemaRef {
        Arc::new(DataSchema::new(fields))
    }
}
