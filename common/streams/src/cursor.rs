// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::marker::PhantomData;

use common_datablocks::compare_rows;
use common_datablocks::sort_columns;
use common_datablocks::CompareValues;
use common_datablocks::CompareWithCollation;
use common_datablocks::DataBlock;
use common_datablocks::SortColumnDescription;
use common_datablocks::SortColumns;
use common_datablocks::ValueComparator;
use common_exception::Error;
use common_exception::Result;

/// An advancing position into one block. The cursor owns a materialized copy
/// of its key columns and addresses the source block by `input_index`, so
/// reservoirs can be rebuilt without aliasing hazards.
pub struct SortCursor {
    pub input_index: usize,
    pub row_index: usize,
    num_rows: usize,
    keys: SortColumns,
}

impl SortCursor {
    pub fn try_create(
        input_index: usize,
        block: &DataBlock,
        description: &[SortColumnDescription],
    ) -> Result<SortCursor> {
        if block.is_empty() {
            return Err(Error::bad_arguments(
                "cannot create a sort cursor over an empty block",
            ));
        }
        Ok(SortCursor {
            input_index,
            row_index: 0,
            num_rows: block.num_rows(),
            keys: sort_columns(block, description)?,
        })
    }

    pub fn is_last(&self) -> bool {
        self.row_index + 1 == self.num_rows
    }

    pub fn advance(&mut self) {
        self.row_index += 1;
    }
}

/// Heap entry: a cursor ordered by its current row under a comparator
/// capability, ties broken by input index.
struct HeapCursor<C: ValueComparator> {
    cursor: SortCursor,
    _c: PhantomData<C>,
}

impl<C: ValueComparator> HeapCursor<C> {
    fn new(cursor: SortCursor) -> Self {
        HeapCursor {
            cursor,
            _c: PhantomData,
        }
    }
}

impl<C: ValueComparator> PartialEq for HeapCursor<C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<C: ValueComparator> Eq for HeapCursor<C> {}

impl<C: ValueComparator> PartialOrd for HeapCursor<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: ValueComparator> Ord for HeapCursor<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_rows::<C>(
            &self.cursor.keys,
            self.cursor.row_index,
            &other.cursor.keys,
            other.cursor.row_index,
        )
        .then_with(|| self.cursor.input_index.cmp(&other.cursor.input_index))
    }
}

/// Priority queue of cursors yielding the globally smallest current row.
/// The plain and collation-aware variants share one contract; the variant is
/// picked once at construction.
pub struct MergeQueue(Queue);

enum Queue {
    Plain(BinaryHeap<Reverse<HeapCursor<CompareValues>>>),
    Collation(BinaryHeap<Reverse<HeapCursor<CompareWithCollation>>>),
}

impl MergeQueue {
    pub fn with_capacity(has_collation: bool, capacity: usize) -> MergeQueue {
        if has_collation {
            MergeQueue(Queue::Collation(BinaryHeap::with_capacity(capacity)))
        } else {
            MergeQueue(Queue::Plain(BinaryHeap::with_capacity(capacity)))
        }
    }

    pub fn push(&mut self, cursor: SortCursor) {
        match &mut self.0 {
            Queue::Plain(heap) => heap.push(Reverse(HeapCursor::new(cursor))),
            Queue::Collation(heap) => heap.push(Reverse(HeapCursor::new(cursor))),
        }
    }

    /// The cursor whose current row is smallest, or `None` when drained.
    pub fn pop(&mut self) -> Option<SortCursor> {
        match &mut self.0 {
            Queue::Plain(heap) => heap.pop().map(|Reverse(c)| c.cursor),
            Queue::Collation(heap) => heap.pop().map(|Reverse(c)| c.cursor),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Queue::Plain(heap) => heap.is_empty(),
            Queue::Collation(heap) => heap.is_empty(),
        }
    }
}
