// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::collections::VecDeque;

use common_datablocks::DataBlock;
use common_exception::Result;

/// A pull-based stream of blocks. The caller drives iteration; `None`
/// terminates the stream.
pub trait BlockStream: Send {
    /// A zero-row block describing the schema. Constant columns keep their
    /// value in the header.
    fn header(&self) -> DataBlock;

    fn read(&mut self) -> Result<Option<DataBlock>>;
}

/// A stream over blocks already resident in memory.
pub struct DataBlockStream {
    header: DataBlock,
    blocks: VecDeque<DataBlock>,
}

impl DataBlockStream {
    pub fn create(header: DataBlock, blocks: Vec<DataBlock>) -> DataBlockStream {
        DataBlockStream {
            header,
            blocks: blocks.into(),
        }
    }
}

impl BlockStream for DataBlockStream {
    fn header(&self) -> DataBlock {
        self.header.clone()
    }

    fn read(&mut self) -> Result<Option<DataBlock>> {
        Ok(self.blocks.pop_front())
    }
}
