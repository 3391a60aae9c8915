// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::cmp::Ordering;
use std::mem;
use std::sync::Arc;

use common_datablocks::compare_rows;
use common_datablocks::sort_columns;
use common_datablocks::CompareWithCollation;
use common_datablocks::DataBlock;
use common_datablocks::SortColumnDescription;
use common_exception::Error;
use common_exception::Result;

use crate::stream::BlockStream;
use crate::stream_sort_blocks::SortBlocksStream;
use crate::util::enrich_block_with_constants;
use crate::util::remove_constants_from_block;
use crate::util::remove_constants_from_description;

/// Completes a partial sort: the input is already sorted by a prefix of the
/// requested key, so only runs of rows with an equal prefix need sorting.
///
/// Chunks may cross block boundaries; the rows of the next chunk found at
/// the end of a block are carried over as `tail_block` and seed the chunk
/// that follows.
pub struct FinishSortStream {
    input: Box<dyn BlockStream>,
    header: DataBlock,
    header_without_constants: DataBlock,
    description_sorted: Arc<Vec<SortColumnDescription>>,
    description_to_sort: Arc<Vec<SortColumnDescription>>,
    max_merged_block_size: usize,
    limit: Option<usize>,

    /// The chunk under construction.
    blocks: Vec<DataBlock>,
    tail_block: Option<DataBlock>,
    inner: Option<SortBlocksStream>,
    end_of_stream: bool,
    total_rows_processed: usize,
}

impl FinishSortStream {
    pub fn try_create(
        input: Box<dyn BlockStream>,
        description_sorted: Vec<SortColumnDescription>,
        description_to_sort: Vec<SortColumnDescription>,
        max_merged_block_size: usize,
        limit: Option<usize>,
    ) -> Result<FinishSortStream> {
        if max_merged_block_size == 0 {
            return Err(Error::bad_arguments("max_merged_block_size must be > 0"));
        }

        let header = input.header();
        let header_without_constants = remove_constants_from_block(&header)?;
        let description_sorted =
            Arc::new(remove_constants_from_description(&header, &description_sorted)?);
        let description_to_sort =
            Arc::new(remove_constants_from_description(&header, &description_to_sort)?);

        Ok(FinishSortStream {
            input,
            header,
            header_without_constants,
            description_sorted,
            description_to_sort,
            max_merged_block_size,
            limit,
            blocks: vec![],
            tail_block: None,
            inner: None,
            end_of_stream: false,
            total_rows_processed: 0,
        })
    }

    /// Accumulate the next chunk of equal-prefix rows into `self.blocks`.
    /// Returns a block directly when the full description is empty after
    /// constant removal: such input needs no sorting.
    fn next_chunk(&mut self) -> Result<Option<DataBlock>> {
        self.blocks.clear();
        if let Some(tail) = self.tail_block.take() {
            self.blocks.push(tail);
        }

        let mut split = None;
        loop {
            let block = match self.input.read()? {
                Some(block) => block,
                None => {
                    self.end_of_stream = true;
                    break;
                }
            };

            if self.description_to_sort.is_empty() {
                return Ok(Some(block));
            }
            if block.is_empty() {
                continue;
            }

            let block = remove_constants_from_block(&block)?;
            if block.schema() != self.header_without_constants.schema() {
                return Err(Error::schema_mismatch(
                    "input block schema does not match the stream header",
                ));
            }
            let block = block.sort(&self.description_to_sort, None)?;

            // Find the first row whose prefix key leaves the chunk the last
            // accumulated block belongs to.
            if let Some(last_block) = self.blocks.last() {
                let left = sort_columns(last_block, &self.description_sorted)?;
                let right = sort_columns(&block, &self.description_sorted)?;
                let last_row = last_block.num_rows() - 1;

                let mut lo = 0;
                let mut hi = block.num_rows();
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    if compare_rows::<CompareWithCollation>(&left, last_row, &right, mid)
                        == Ordering::Less
                    {
                        hi = mid;
                    } else {
                        lo = mid + 1;
                    }
                }
                if lo < block.num_rows() {
                    split = Some((block, lo));
                    break;
                }
            }

            // The block starts the chunk, or every row of it shares the
            // prefix key of the previous tail.
            self.blocks.push(block);
        }

        // Save the tail: the next block may start with the same prefix key
        // and those rows must be sorted within one chunk.
        if let Some((block, tail_pos)) = split {
            let head = block.slice(0..tail_pos);
            let tail = block.slice(tail_pos..block.num_rows());
            if !head.is_empty() {
                self.blocks.push(head);
            }
            self.tail_block = Some(tail);
        }

        Ok(None)
    }
}

impl BlockStream for FinishSortStream {
    fn header(&self) -> DataBlock {
        self.header.clone()
    }

    fn read(&mut self) -> Result<Option<DataBlock>> {
        if let Some(limit) = self.limit {
            if self.total_rows_processed >= limit {
                return Ok(None);
            }
        }

        let mut res = match self.inner.as_mut() {
            Some(inner) => inner.read()?,
            None => None,
        };

        // The previous chunk is done: delimit and merge the next one.
        if res.is_none() {
            if self.end_of_stream {
                return Ok(None);
            }

            if let Some(block) = self.next_chunk()? {
                return Ok(Some(block));
            }

            let inner = self.inner.insert(SortBlocksStream::try_create(
                self.header_without_constants.schema().clone(),
                mem::take(&mut self.blocks),
                self.description_to_sort.clone(),
                self.max_merged_block_size,
                self.limit,
            )?);
            res = inner.read()?;
        }

        match res {
            Some(block) => {
                let block = match self.limit {
                    Some(limit) => {
                        let remaining = limit - self.total_rows_processed;
                        if block.num_rows() > remaining {
                            block.slice(0..remaining)
                        } else {
                            block
                        }
                    }
                    None => block,
                };
                self.total_rows_processed += block.num_rows();
                Ok(Some(enrich_block_with_constants(&block, &self.header)?))
            }
            None => Ok(None),
        }
    }
}
