// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

mod cursor;
mod profile;
mod serialize;
mod spill;
mod stream;
mod stream_finish_sort;
mod stream_merge_sort;
mod stream_merging_sorted;
mod stream_sort_blocks;
mod util;

pub use cursor::MergeQueue;
pub use cursor::SortCursor;
pub use profile::ProfileEvents;
pub use spill::copy_data;
pub use spill::SpillReader;
pub use spill::SpillWriter;
pub use stream::BlockStream;
pub use stream::DataBlockStream;
pub use stream_finish_sort::FinishSortStream;
pub use stream_merge_sort::MergeSortSettings;
pub use stream_merge_sort::MergeSortStream;
pub use stream_merging_sorted::MergingSortedStream;
pub use stream_sort_blocks::SortBlocksStream;
pub use util::enrich_block_with_constants;
pub use util::remove_constants_from_block;
pub use util::remove_constants_from_description;
