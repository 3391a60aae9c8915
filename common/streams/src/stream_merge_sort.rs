// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::fs;
use std::mem;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common_datablocks::DataBlock;
use common_datablocks::SortColumnDescription;
use common_exception::Error;
use common_exception::Result;
use tempfile::NamedTempFile;

use crate::profile::ProfileEvents;
use crate::spill::copy_data;
use crate::spill::SpillReader;
use crate::spill::SpillWriter;
use crate::stream::BlockStream;
use crate::stream_merging_sorted::MergingSortedStream;
use crate::stream_sort_blocks::SortBlocksStream;
use crate::util::enrich_block_with_constants;
use crate::util::remove_constants_from_block;
use crate::util::remove_constants_from_description;

pub struct MergeSortSettings {
    /// Target row count of output blocks, > 0.
    pub max_merged_block_size: usize,
    /// Global row limit, `None` disables.
    pub limit: Option<usize>,
    /// In-memory re-merge threshold in bytes, 0 disables.
    pub max_bytes_before_remerge: usize,
    /// External sort threshold in bytes, 0 disables.
    pub max_bytes_before_external_sort: usize,
    /// Directory for spill files, shared between operator instances.
    pub tmp_path: PathBuf,
    /// Counter sink for the external sort profile events.
    pub profile: Arc<ProfileEvents>,
    /// Cooperative cancellation flag; any thread may flip it.
    pub aborting: Arc<AtomicBool>,
}

impl MergeSortSettings {
    pub fn new(max_merged_block_size: usize, tmp_path: impl Into<PathBuf>) -> MergeSortSettings {
        MergeSortSettings {
            max_merged_block_size,
            limit: None,
            max_bytes_before_remerge: 0,
            max_bytes_before_external_sort: 0,
            tmp_path: tmp_path.into(),
            profile: Arc::new(ProfileEvents::default()),
            aborting: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Full sort of an unsorted input stream under a bounded memory budget.
///
/// Blocks are sorted as they arrive and accumulated in memory. When a limit
/// makes it profitable the reservoir is compacted by an in-memory re-merge;
/// when the external sort threshold is crossed the reservoir is merged into
/// a compressed temporary file. Once the input is exhausted, the output is
/// either a merge of the reservoir or a multi-way merge of the spilled runs
/// plus the residual reservoir.
pub struct MergeSortStream {
    input: Box<dyn BlockStream>,
    header: DataBlock,
    header_without_constants: DataBlock,
    description: Arc<Vec<SortColumnDescription>>,

    max_merged_block_size: usize,
    limit: Option<usize>,
    max_bytes_before_remerge: usize,
    max_bytes_before_external_sort: usize,
    tmp_path: PathBuf,
    profile: Arc<ProfileEvents>,
    aborting: Arc<AtomicBool>,

    blocks: Vec<DataBlock>,
    sum_rows_in_blocks: usize,
    sum_bytes_in_blocks: usize,
    temporary_files: Vec<NamedTempFile>,
    remerge_is_useful: bool,
    inner: Option<SortedOutput>,
    end_of_stream: bool,
}

enum SortedOutput {
    Blocks(SortBlocksStream),
    Merge(MergingSortedStream),
}

impl SortedOutput {
    fn read(&mut self) -> Result<Option<DataBlock>> {
        match self {
            SortedOutput::Blocks(s) => s.read(),
            SortedOutput::Merge(s) => s.read(),
        }
    }
}

impl MergeSortStream {
    pub fn try_create(
        input: Box<dyn BlockStream>,
        description: Vec<SortColumnDescription>,
        settings: MergeSortSettings,
    ) -> Result<MergeSortStream> {
        if settings.max_merged_block_size == 0 {
            return Err(Error::bad_arguments("max_merged_block_size must be > 0"));
        }

        let header = input.header();
        let header_without_constants = remove_constants_from_block(&header)?;
        let description = Arc::new(remove_constants_from_description(&header, &description)?);

        Ok(MergeSortStream {
            input,
            header,
            header_without_constants,
            description,
            max_merged_block_size: settings.max_merged_block_size,
            limit: settings.limit,
            max_bytes_before_remerge: settings.max_bytes_before_remerge,
            max_bytes_before_external_sort: settings.max_bytes_before_external_sort,
            tmp_path: settings.tmp_path,
            profile: settings.profile,
            aborting: settings.aborting,
            blocks: vec![],
            sum_rows_in_blocks: 0,
            sum_bytes_in_blocks: 0,
            temporary_files: vec![],
            remerge_is_useful: true,
            inner: None,
            end_of_stream: false,
        })
    }

    pub fn interrupt(&self) {
        self.aborting.store(true, Ordering::Relaxed);
    }

    /// Pull the input to exhaustion (or cancellation), sorting and
    /// accumulating blocks. Returns a block directly when the description
    /// is empty after constant removal: such input needs no sorting.
    fn accumulate(&mut self) -> Result<Option<DataBlock>> {
        while !self.aborting.load(Ordering::Relaxed) {
            let block = match self.input.read()? {
                Some(block) => block,
                None => break,
            };

            if self.description.is_empty() {
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

            let block = block.sort(&self.description, self.limit)?;
            self.sum_rows_in_blocks += block.num_rows();
            self.sum_bytes_in_blocks += block.memory_size();
            self.blocks.push(block);

            // A significant amount of data accumulated under a small limit:
            // a preliminary merge shrinks the reservoir to the limit.
            if self.blocks.len() > 1
                && self.limit.map_or(false, |l| l * 2 < self.sum_rows_in_blocks)
                && self.remerge_is_useful
                && self.max_bytes_before_remerge > 0
                && self.sum_bytes_in_blocks > self.max_bytes_before_remerge
            {
                self.remerge()?;
            }

            if self.max_bytes_before_external_sort > 0
                && self.sum_bytes_in_blocks > self.max_bytes_before_external_sort
            {
                self.spill()?;
            }
        }
        Ok(None)
    }

    fn reservoir_merger(&mut self) -> Result<SortBlocksStream> {
        SortBlocksStream::try_create(
            self.header_without_constants.schema().clone(),
            mem::take(&mut self.blocks),
            self.description.clone(),
            self.max_merged_block_size,
            self.limit,
        )
    }

    fn remerge(&mut self) -> Result<()> {
        tracing::debug!(
            "Re-merging intermediate ORDER BY data ({} blocks with {} rows) to save memory consumption",
            self.blocks.len(),
            self.sum_rows_in_blocks
        );

        let mut merger = self.reservoir_merger()?;
        let mut new_blocks = Vec::new();
        let mut new_sum_rows_in_blocks = 0;
        let mut new_sum_bytes_in_blocks = 0;
        while let Some(block) = merger.read()? {
            new_sum_rows_in_blocks += block.num_rows();
            new_sum_bytes_in_blocks += block.memory_size();
            new_blocks.push(block);
        }

        tracing::debug!(
            "Memory usage is lowered from {} to {} bytes",
            self.sum_bytes_in_blocks,
            new_sum_bytes_in_blocks
        );

        // If the memory consumption was not lowered enough, stop re-merging.
        if new_sum_bytes_in_blocks * 2 > self.sum_bytes_in_blocks {
            self.remerge_is_useful = false;
        }

        self.blocks = new_blocks;
        self.sum_rows_in_blocks = new_sum_rows_in_blocks;
        self.sum_bytes_in_blocks = new_sum_bytes_in_blocks;
        Ok(())
    }

    fn spill(&mut self) -> Result<()> {
        fs::create_dir_all(&self.tmp_path)?;
        let file = tempfile::Builder::new()
            .prefix("merge-sort-")
            .suffix(".spill")
            .tempfile_in(&self.tmp_path)?;

        tracing::info!(
            "Sorting and writing part of data into temporary file {}",
            file.path().display()
        );
        self.profile.inc_external_sort_write_part();

        let mut block_in = self.reservoir_merger()?;
        let mut block_out = SpillWriter::try_create(file.reopen()?)?;
        copy_data(&mut block_in, &mut block_out, &self.aborting)?;

        tracing::info!(
            "Done writing part of data into temporary file {}",
            file.path().display()
        );

        self.temporary_files.push(file);
        self.sum_rows_in_blocks = 0;
        self.sum_bytes_in_blocks = 0;
        Ok(())
    }

    fn build_output(&mut self) -> Result<SortedOutput> {
        if self.temporary_files.is_empty() {
            return Ok(SortedOutput::Blocks(self.reservoir_merger()?));
        }

        self.profile.inc_external_sort_merge();
        tracing::info!(
            "There are {} temporary sorted parts to merge",
            self.temporary_files.len()
        );

        let schema = self.header_without_constants.schema().clone();
        let mut inputs: Vec<Box<dyn BlockStream>> =
            Vec::with_capacity(self.temporary_files.len() + 1);
        for file in &self.temporary_files {
            inputs.push(Box::new(SpillReader::open(file.path(), schema.clone())?));
        }
        if !self.blocks.is_empty() {
            inputs.push(Box::new(self.reservoir_merger()?));
        }

        Ok(SortedOutput::Merge(MergingSortedStream::try_create(
            schema,
            inputs,
            self.description.clone(),
            self.max_merged_block_size,
            self.limit,
        )?))
    }
}

impl BlockStream for MergeSortStream {
    fn header(&self) -> DataBlock {
        self.header.clone()
    }

    fn read(&mut self) -> Result<Option<DataBlock>> {
        if self.end_of_stream {
            return Ok(None);
        }

        if self.inner.is_none() {
            if let Some(block) = self.accumulate()? {
                return Ok(Some(block));
            }

            // Nothing was accumulated, or the sort was cancelled: end of
            // stream. Spilled runs, if any, are abandoned on drop.
            if (self.blocks.is_empty() && self.temporary_files.is_empty())
                || self.aborting.load(Ordering::Relaxed)
            {
                self.end_of_stream = true;
                return Ok(None);
            }

            self.inner = Some(self.build_output()?);
        }

        match self.inner.as_mut() {
            Some(inner) => match inner.read()? {
                Some(block) => Ok(Some(enrich_block_with_constants(&block, &self.header)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }
}
