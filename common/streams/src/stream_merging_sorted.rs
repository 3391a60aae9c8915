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

/// K-way merge over child streams that are each sorted by the description.
/// Unlike [`crate::SortBlocksStream`], the inputs are lazy block streams:
/// a cursor that exhausts its block is refilled from its stream.
pub struct MergingSortedStream {
    schema: DataSchemaRef,
    description: Arc<Vec<SortColumnDescription>>,
    inputs: Vec<Box<dyn BlockStream>>,
    /// The block each live cursor points into, indexed by input.
    source_blocks: Vec<DataBlock>,
    queue: MergeQueue,
    max_merged_block_size: usize,
    limit: Option<usize>,
    total_merged_rows: usize,
    initialized: bool,
    finished: bool,
}

impl MergingSortedStream {
    pub fn try_create(
        schema: DataSchemaRef,
        inputs: Vec<Box<dyn BlockStream>>,
        description: Arc<Vec<SortColumnDescription>>,
        max_merged_block_size: usize,
        limit: Option<usize>,
    ) -> Result<MergingSortedStream> {
        if max_merged_block_size == 0 {
            return Err(Error::bad_arguments("max_merged_block_size must be > 0"));
        }

        let queue = MergeQueue::with_capacity(has_collation(&schema, &description)?, inputs.len());
        let source_blocks = vec![DataBlock::empty_with_schema(schema.clone()); inputs.len()];
        Ok(MergingSortedStream {
            schema,
            description,
            inputs,
            source_blocks,
            queue,
            max_merged_block_size,
            limit,
            total_merged_rows: 0,
            initialized: false,
            finished: false,
        })
    }

    /// The next non-empty block of input `i`, if any.
    fn fetch(&mut self, i: usize) -> Result<Option<DataBlock>> {
        while let Some(block) = self.inputs[i].read()? {
            if !block.is_empty() {
                return Ok(Some(block));
            }
        }
        Ok(None)
    }

    fn init_queue(&mut self) -> Result<()> {
        for i in 0..self.inputs.len() {
            if let Some(block) = self.fetch(i)? {
                self.queue
                    .push(SortCursor::try_create(i, &block, &self.description)?);
                self.source_blocks[i] = block;
            }
        }
        Ok(())
    }
}

impl BlockStream for MergingSortedStream {
    fn header(&self) -> DataBlock {
        DataBlock::empty_with_schema(self.schema.clone())
    }

    fn read(&mut self) -> Result<Option<DataBlock>> {
        if self.finished {
            return Ok(None);
        }
        if !self.initialized {
            self.initialized = true;
            self.init_queue()?;
        }

        let mut builders: Vec<DataArrayBuilder> = self
            .schema
            .fields()
            .iter()
            .map(|f| DataArrayBuilder::with_capacity(f.data_type(), self.max_merged_block_size))
            .collect();

        let mut merged_rows = 0;
        while let Some(mut cursor) = self.queue.pop() {
            let input_index = cursor.input_index;
            let block = &self.source_blocks[input_index];
            for (i, builder) in builders.iter_mut().enumerate() {
                builder.push(block.column(i).value(cursor.row_index));
            }

            if !cursor.is_last() {
                cursor.advance();
                self.queue.push(cursor);
            } else if let Some(block) = self.fetch(input_index)? {
                self.queue
                    .push(SortCursor::try_create(input_index, &block, &self.description)?);
                self.source_blocks[input_index] = block;
            }

            self.total_merged_rows += 1;
            if Some(self.total_merged_rows) == self.limit {
                self.finished = true;
                return self.build_block(builders).map(Some);
            }

            merged_rows += 1;
            if merged_rows == self.max_merged_block_size {
                return self.build_block(builders).map(Some);
            }
        }

        self.finished = true;
        if merged_rows == 0 {
            return Ok(None);
        }
        self.build_block(builders).map(Some)
    }
}

impl MergingSortedStream {
    fn build_block(&self, builders: Vec<DataArrayBuilder>) -> Result<DataBlock> {
        let columns = builders
            .into_iter()
            .map(|b| DataColumn::Array(b.finish()))
            .collect();
        DataBlock::create(self.schema.clone(), columns)
    }
}
