// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use common_datablocks::DataBlock;
use common_datablocks::SortColumnDescription;
use common_datavalues::DataColumn;
use common_datavalues::DataSchemaRefExt;
use common_exception::Error;
use common_exception::Result;

/// Strip constant columns from a block. Sorting never looks at constants;
/// they are re-attached on the outgoing boundary.
pub fn remove_constants_from_block(block: &DataBlock) -> Result<DataBlock> {
    if !block.columns().iter().any(|c| c.is_constant()) {
        return Ok(block.clone());
    }

    let mut fields = Vec::with_capacity(block.num_columns());
    let mut columns = Vec::with_capacity(block.num_columns());
    for (field, column) in block.schema().fields().iter().zip(block.columns()) {
        if !column.is_constant() {
            fields.push(field.clone());
            columns.push(column.clone());
        }
    }
    DataBlock::create(DataSchemaRefExt::create(fields), columns)
}

/// Drop specifiers addressing constant columns of `header` and rewrite the
/// survivors to offsets into the constant-free schema.
pub fn remove_constants_from_description(
    header: &DataBlock,
    description: &[SortColumnDescription],
) -> Result<Vec<SortColumnDescription>> {
    let schema = header.schema();
    let mut result = Vec::with_capacity(description.len());
    for desc in description {
        let offset = desc.resolve_offset(schema)?;
        if header.column(offset).is_constant() {
            continue;
        }
        let stripped_offset = offset
            - header.columns()[..offset]
                .iter()
                .filter(|c| c.is_constant())
                .count();
        let mut desc = desc.clone();
        desc.column_name = None;
        desc.offset = stripped_offset;
        result.push(desc);
    }
    Ok(result)
}

/// Re-attach the constant columns of `header` to a block whose constants
/// were stripped, restoring the original column order.
pub fn enrich_block_with_constants(block: &DataBlock, header: &DataBlock) -> Result<DataBlock> {
    if !header.columns().iter().any(|c| c.is_constant()) {
        return Ok(block.clone());
    }

    let num_rows = block.num_rows();
    let mut columns = Vec::with_capacity(header.num_columns());
    let mut stripped = block.columns().iter();
    for column in header.columns() {
        match column {
            DataColumn::Constant(value, _) => {
                columns.push(DataColumn::Constant(value.clone(), num_rows));
            }
            DataColumn::Array(_) => {
                let column = stripped.next().ok_or_else(|| {
                    Error::schema_mismatch("block has fewer columns than its header")
                })?;
                columns.push(column.clone());
            }
        }
    }
    DataBlock::create(header.schema().clone(), columns)
}
