// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// Profile counters of the external sort. Handed to the operators as an
/// `Arc` so callers decide the aggregation scope.
#[derive(Debug, Default)]
pub struct ProfileEvents {
    external_sort_write_part: AtomicUsize,
    external_sort_merge: AtomicUsize,
}

impl ProfileEvents {
    /// Incremented once per spilled part.
    pub fn inc_external_sort_write_part(&self) {
        self.external_sort_write_part.fetch_add(1, Ordering::Relaxed);
    }

    /// Incremented once when the final multi-way merge starts.
    pub fn inc_external_sort_merge(&self) {
        self.external_sort_merge.fetch_add(1, Ordering::Relaxed);
    }

    pub fn external_sort_write_part(&self) -> usize {
        self.external_sort_write_part.load(Ordering::Relaxed)
    }

    pub fn external_sort_merge(&self) -> usize {
        self.external_sort_merge.load(Ordering::Relaxed)
    }
}
