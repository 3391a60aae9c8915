// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

mod data_block;
mod data_block_debug;
mod data_block_sort;

pub use data_block::DataBlock;
pub use data_block_debug::assert_blocks_eq;
pub use data_block_debug::assert_blocks_eq_with_name;
pub use data_block_debug::pretty_format_blocks;
pub use data_block_sort::compare_rows;
pub use data_block_sort::has_collation;
pub use data_block_sort::sort_columns;
pub use data_block_sort::Collator;
pub use data_block_sort::CompareValues;
pub use data_block_sort::CompareWithCollation;
pub use data_block_sort::SortColumnDescription;
pub use data_block_sort::SortColumns;
pub use data_block_sort::ValueComparator;
