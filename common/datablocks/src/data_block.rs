// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::ops::Range;

use common_datavalues::DataArray;
use common_datavalues::DataArrayBuilder;
use common_datavalues::DataColumn;
use common_datavalues::DataSchemaRef;
use common_exception::Error;
use common_exception::Result;

/// A batch of rows: named, equally sized columns sharing one schema.
///
/// A block with zero rows is a header; constant columns keep their value in
/// the header so it can be re-attached to outgoing data.
#[derive(Debug, Clone)]
pub struct DataBlock {
    schema: DataSchemaRef,
    columns: Vec<DataColumn>,
    num_rows: usize,
}

impl DataBlock {
    pub fn create(schema: DataSchemaRef, columns: Vec<DataColumn>) -> Result<DataBlock> {
        if schema.num_fields() != columns.len() {
            return Err(Error::schema_mismatch(format!(
                "schema has {} fields but {} columns given",
                schema.num_fields(),
                columns.len()
            )));
        }
        let num_rows = columns.first().map_or(0, |c| c.len());
        for (field, column) in schema.fields().iter().zip(columns.iter()) {
            if column.len() != num_rows {
                return Err(Error::schema_mismatch(format!(
                    "column {} has {} rows, expected {}",
                    field.name(),
                    column.len(),
                    num_rows
                )));
            }
        }
        Ok(DataBlock {
            schema,
            columns,
            num_rows,
        })
    }

    pub fn empty_with_schema(schema: DataSchemaRef) -> DataBlock {
        let columns = schema
            .fields()
            .iter()
            .map(|f| DataColumn::Array(DataArray::empty(f.data_type())))
            .collect();
        DataBlock {
            schema,
            columns,
            num_rows: 0,
        }
    }

    pub fn schema(&self) -> &DataSchemaRef {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Panics if `i` is out of range.
    pub fn column(&self, i: usize) -> &DataColumn {
        &self.columns[i]
    }

    pub fn columns(&self) -> &[DataColumn] {
        &self.columns
    }

    pub fn slice(&self, range: Range<usize>) -> DataBlock {
        let columns = self
            .columns
            .iter()
            .map(|c| c.slice(range.clone()))
            .collect();
        DataBlock {
            schema: self.schema.clone(),
            columns,
            num_rows: range.len(),
        }
    }

    pub fn memory_size(&self) -> usize {
        self.columns.iter().map(|c| c.memory_size()).sum()
    }

    /// Glue blocks of identical schema into one.
    pub fn concat(blocks: &[DataBlock]) -> Result<DataBlock> {
        let first = blocks
            .first()
            .ok_or_else(|| Error::bad_arguments("cannot concat zero blocks"))?;
        if blocks.len() == 1 {
            return Ok(first.clone());
        }

        let total_rows = blocks.iter().map(|b| b.num_rows()).sum();
        let schema = first.schema().clone();
        let mut columns = Vec::with_capacity(first.num_columns());
        for (i, field) in schema.fields().iter().enumerate() {
            match first.column(i) {
                DataColumn::Constant(value, _) => {
                    columns.push(DataColumn::Constant(value.clone(), total_rows));
                }
                DataColumn::Array(_) => {
                    let mut builder = DataArrayBuilder::with_capacity(field.data_type(), total_rows);
                    for block in blocks {
                        if block.schema() != &schema {
                            return Err(Error::schema_mismatch(
                                "cannot concat blocks of different schemas",
                            ));
                        }
                        let column = block.column(i);
                        for row in 0..block.num_rows() {
                            builder.push(column.value(row));
                        }
                    }
                    columns.push(DataColumn::Array(builder.finish()));
                }
            }
        }
        DataBlock::create(schema, columns)
    }
}
