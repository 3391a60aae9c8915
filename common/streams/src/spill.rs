// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use common_datablocks::DataBlock;
use common_datavalues::DataSchemaRef;
use common_exception::Error;
use common_exception::Result;

use crate::serialize::read_block;
use crate::serialize::write_block;
use crate::stream::BlockStream;

/// Writes a sorted run of blocks into a zstd-compressed spill file.
pub struct SpillWriter {
    encoder: Option<zstd::Encoder<'static, BufWriter<File>>>,
}

impl SpillWriter {
    pub fn try_create(file: File) -> Result<SpillWriter> {
        let encoder = zstd::Encoder::new(BufWriter::new(file), 0)?;
        Ok(SpillWriter {
            encoder: Some(encoder),
        })
    }

    pub fn write(&mut self, block: &DataBlock) -> Result<()> {
        match self.encoder.as_mut() {
            Some(encoder) => write_block(encoder, block),
            None => Err(Error::bad_arguments("spill writer is already finished")),
        }
    }

    /// Flush the compression frame. Without this the file is a partial
    /// write and must be abandoned.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(encoder) = self.encoder.take() {
            let mut writer = encoder.finish()?;
            writer.flush()?;
        }
        Ok(())
    }
}

/// Reads a spill file back as a block stream. The blocks come out sorted by
/// the description that was active at spill time.
pub struct SpillReader {
    decoder: zstd::Decoder<'static, BufReader<File>>,
    schema: DataSchemaRef,
}

impl SpillReader {
    pub fn open(path: &Path, schema: DataSchemaRef) -> Result<SpillReader> {
        let file = File::open(path)?;
        let decoder = zstd::Decoder::new(file)?;
        Ok(SpillReader { decoder, schema })
    }
}

impl BlockStream for SpillReader {
    fn header(&self) -> DataBlock {
        DataBlock::empty_with_schema(self.schema.clone())
    }

    fn read(&mut self) -> Result<Option<DataBlock>> {
        read_block(&mut self.decoder, &self.schema)
    }
}

/// Drain `from` into `to`, polling the cancellation flag between blocks.
/// On cancellation the destination is left partial; callers abandon it.
pub fn copy_data(
    from: &mut dyn BlockStream,
    to: &mut SpillWriter,
    is_cancelled: &AtomicBool,
) -> Result<()> {
    while !is_cancelled.load(Ordering::Relaxed) {
        match from.read()? {
            Some(block) => to.write(&block)?,
            None => break,
        }
    }
    to.finish()
}
