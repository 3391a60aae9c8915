// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::sync::Arc;

use common_datablocks::has_collation;
use common_datablocks::DataBlock;
use common_datablocks::SortColumnDescription;
use common_datavalues::DataArrayBuilder;
use common_datavalues::DataColumn;
use common_datavalues::DataSchemaRef;
use common_exception::Error;
use common_exception::Result;

use crate::cursor::MergeQueue;
use crate::cursor::SortCursor;
use crate::stream::BlockStream;

/// Merges a set of individually sorted in-memory blocks into one sorted
/// stream of bounded blocks.
pub struct SortBlocksStream {
    schema: DataSchemaRef,
    blocks: Vec<DataBlock>,
    queue: MergeQueue,
    max_merged_block_size: usize,
    limit: Option<usize>,
    /// Rows merged across all `read` calls, compared against `limit`.
    total_merged_rows: usize,
}

impl SortBlocksStream {
    pub fn try_create(
        schema: DataSchemaRef,
        blocks: Vec<DataBlock>,
        description: Arc<Vec<SortColumnDescription>>,
        max_merged_block_size: usize,
        limit: Option<usize>,
    ) -> Result<SortBlocksStream> {
        if max_merged_block_size == 0 {
            return Err(Error::bad_arguments("max_merged_block_size must be > 0"));
        }

        let blocks: Vec<DataBlock> = blocks.into_iter().filter(|b| !b.is_empty()).collect();
        let mut queue =
            MergeQueue::with_capacity(has_collation(&schema, &description)?, blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            queue.push(SortCursor::try_create(i, block, &description)?);
        }

        Ok(SortBlocksStream {
            schema,
            blocks,
            queue,
            max_merged_block_size,
            limit,
            total_merged_rows: 0,
        })
    }

    fn merge(&mut self) -> Result<Option<DataBlock>> {
        let num_columns = self.schema.num_fields();
        let mut builders: Vec<DataArrayBuilder> = self
            .schema
            .fields()
            .iter()
            .map(|f| DataArrayBuilder::with_capacity(f.data_type(), self.max_merged_block_size))
            .collect();

        let mut merged_rows = 0;
        while let Some(mut cursor) = self.queue.pop() {
            let block = &self.blocks[cursor.input_index];
            for (i, builder) in builders.iter_mut().enumerate() {
                builder.push(block.column(i).value(cursor.row_index));
            }

            if !cursor.is_last() {
                cursor.advance();
                self.queue.push(cursor);
            }

            self.total_merged_rows += 1;
            if Some(self.total_merged_rows) == self.limit {
                let block = self.build_block(builders)?;
                self.blocks.clear();
                return Ok(Some(block));
            }

            merged_rows += 1;
            if merged_rows == self.max_merged_block_size {
                return self.build_block(builders).map(Some);
            }
        }

        if merged_rows == 0 {
            return Ok(None);
        }
        self.build_block(builders).map(Some)
    }

    fn build_block(&self, builders: Vec<DataArrayBuilder>) -> Result<DataBlock> {
        let columns = builders
            .into_iter()
            .map(|b| DataColumn::Array(b.finish()))
            .collect();
        DataBlock::create(self.schema.clone(), columns)
    }
}

impl BlockStream for SortBlocksStream {
    fn header(&self) -> DataBlock {
        DataBlock::empty_with_schema(self.schema.clone())
    }

    fn read(&mut self) -> Result<Option<DataBlock>> {
        if self.blocks.is_empty() {
            return Ok(None);
        }

        // A lone block is already sorted, hand it back as is.
        if self.blocks.len() == 1 {
            let block = self.blocks.swap_remove(0);
            return Ok(Some(block));
        }

        self.merge()
    }
}
