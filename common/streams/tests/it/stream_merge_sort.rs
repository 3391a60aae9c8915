// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common_datablocks::assert_blocks_eq;
use common_datablocks::DataBlock;
use common_datavalues::DataArray;
use common_datavalues::DataColumn;
use common_datavalues::DataField;
use common_datavalues::DataSchemaRefExt;
use common_datavalues::DataType;
use common_datavalues::DataValue;
use common_datablocks::SortColumnDescription;
use common_exception::Result;
use common_streams::BlockStream;
use common_streams::MergeSortSettings;
use common_streams::MergeSortStream;
use common_streams::ProfileEvents;
use itertools::Itertools;
use rand::Rng;

use crate::collect_int64;
use crate::int64_block;
use crate::int64_schema;
use crate::source;

fn asc(offset: usize) -> Vec<SortColumnDescription> {
    vec![SortColumnDescription::new(offset, true, false)]
}

fn settings(tmp: &tempfile::TempDir) -> MergeSortSettings {
    MergeSortSettings::new(4, tmp.path())
}

#[test]
fn test_sort_single_block() -> Result<()> {
    let schema = int64_schema();
    let tmp = tempfile::tempdir()?;
    let input = source(&schema, vec![int64_block(&schema, vec![3, 1, 2])]);

    let mut stream = MergeSortStream::try_create(input, asc(0), settings(&tmp))?;
    let mut blocks = Vec::new();
    while let Some(block) = stream.read()? {
        blocks.push(block);
    }

    assert_blocks_eq(
        vec![
            "+---+", //
            "| a |", //
            "+---+", //
            "| 1 |", //
            "| 2 |", //
            "| 3 |", //
            "+---+",
        ],
        &blocks,
    );
    Ok(())
}

#[test]
fn test_sort_two_blocks() -> Result<()> {
    let schema = int64_schema();
    let tmp = tempfile::tempdir()?;
    let input = source(
        &schema,
        vec![
            int64_block(&schema, vec![5, 3]),
            int64_block(&schema, vec![4, 1, 2]),
        ],
    );

    let mut stream = MergeSortStream::try_create(input, asc(0), settings(&tmp))?;
    assert_eq!(collect_int64(&mut stream)?, vec![1, 2, 3, 4, 5]);
    Ok(())
}

#[test]
fn test_sort_preserves_constants() -> Result<()> {
    let schema = DataSchemaRefExt::create(vec![
        DataField::new("k", DataType::Utf8),
        DataField::new("v", DataType::Int64),
    ]);
    let block = DataBlock::create(
        schema.clone(),
        vec![
            DataColumn::Constant(DataValue::Utf8("x".to_string()), 3),
            DataColumn::Array(DataArray::Int64(vec![3, 1, 2])),
        ],
    )?;
    let header = block.slice(0..0);
    let tmp = tempfile::tempdir()?;

    let input = Box::new(common_streams::DataBlockStream::create(header, vec![block]));
    let description = vec![SortColumnDescription::with_name("v", true, false)];
    let mut stream = MergeSortStream::try_create(input, description, settings(&tmp))?;

    let mut blocks = Vec::new();
    while let Some(block) = stream.read()? {
        assert!(block.column(0).is_constant());
        blocks.push(block);
    }
    assert_blocks_eq(
        vec![
            "+---+---+",
            "| k | v |",
            "+---+---+",
            "| x | 1 |",
            "| x | 2 |",
            "| x | 3 |",
            "+---+---+",
        ],
        &blocks,
    );
    Ok(())
}

#[test]
fn test_sort_with_limit() -> Result<()> {
    let schema = int64_schema();
    let tmp = tempfile::tempdir()?;
    let input = source(
        &schema,
        vec![
            int64_block(&schema, vec![5, 3]),
            int64_block(&schema, vec![4, 1, 2]),
        ],
    );

    let mut settings = settings(&tmp);
    settings.limit = Some(2);
    let mut stream = MergeSortStream::try_create(input, asc(0), settings)?;
    assert_eq!(collect_int64(&mut stream)?, vec![1, 2]);
    assert!(stream.read()?.is_none());
    assert!(stream.read()?.is_none());
    Ok(())
}

#[test]
fn test_sort_empty_input() -> Result<()> {
    let schema = int64_schema();
    let tmp = tempfile::tempdir()?;
    let input = source(&schema, vec![]);

    let mut stream = MergeSortStream::try_create(input, asc(0), settings(&tmp))?;
    assert!(stream.read()?.is_none());
    Ok(())
}

#[test]
fn test_sort_by_constant_passes_blocks_through() -> Result<()> {
    let schema = DataSchemaRefExt::create(vec![
        DataField::new("k", DataType::Utf8),
        DataField::new("v", DataType::Int64),
    ]);
    let block = DataBlock::create(
        schema.clone(),
        vec![
            DataColumn::Constant(DataValue::Utf8("x".to_string()), 3),
            DataColumn::Array(DataArray::Int64(vec![3, 1, 2])),
        ],
    )?;
    let header = block.slice(0..0);
    let tmp = tempfile::tempdir()?;

    let input = Box::new(common_streams::DataBlockStream::create(
        header,
        vec![block.clone()],
    ));
    let description = vec![SortColumnDescription::with_name("k", true, false)];
    let mut stream = MergeSortStream::try_create(input, description, settings(&tmp))?;

    // The only sort key is constant: blocks come back unsorted and intact.
    let out = stream.read()?.unwrap();
    assert_eq!(out.columns(), block.columns());
    Ok(())
}

#[test]
fn test_schema_mismatch_is_fatal() -> Result<()> {
    let schema = int64_schema();
    let other = DataSchemaRefExt::create(vec![DataField::new("b", DataType::Int64)]);
    let tmp = tempfile::tempdir()?;

    let input = Box::new(common_streams::DataBlockStream::create(
        DataBlock::empty_with_schema(schema),
        vec![int64_block(&other, vec![1, 2])],
    ));
    let mut stream = MergeSortStream::try_create(input, asc(0), settings(&tmp))?;
    assert!(stream.read().is_err());
    Ok(())
}

struct CaseInsensitive;

impl common_datablocks::Collator for CaseInsensitive {
    fn name(&self) -> &str {
        "case_insensitive"
    }

    fn compare(&self, lhs: &str, rhs: &str) -> std::cmp::Ordering {
        lhs.to_lowercase().cmp(&rhs.to_lowercase())
    }
}

#[test]
fn test_sort_with_collation() -> Result<()> {
    let schema = DataSchemaRefExt::create(vec![DataField::new("s", DataType::Utf8)]);
    let tmp = tempfile::tempdir()?;

    let blocks = vec![
        DataBlock::create(
            schema.clone(),
            vec![DataColumn::Array(DataArray::Utf8(vec![
                "b".to_string(),
                "D".to_string(),
            ]))],
        )?,
        DataBlock::create(
            schema.clone(),
            vec![DataColumn::Array(DataArray::Utf8(vec![
                "A".to_string(),
                "c".to_string(),
            ]))],
        )?,
    ];

    let description = vec![
        SortColumnDescription::new(0, true, false).with_collation(Arc::new(CaseInsensitive))
    ];
    let mut stream =
        MergeSortStream::try_create(source(&schema, blocks), description, settings(&tmp))?;

    let mut out = Vec::new();
    while let Some(block) = stream.read()? {
        let array = block.column(0).to_array(&DataType::Utf8);
        out.extend(array.as_utf8().unwrap().clone());
    }
    assert_eq!(out, vec!["A", "b", "c", "D"]);
    Ok(())
}

fn run_sort(
    blocks: Vec<DataBlock>,
    limit: Option<usize>,
    max_bytes_before_remerge: usize,
    max_bytes_before_external_sort: usize,
) -> Result<(Vec<i64>, Arc<ProfileEvents>)> {
    let schema = int64_schema();
    let tmp = tempfile::tempdir()?;
    let mut settings = MergeSortSettings::new(100, tmp.path());
    settings.limit = limit;
    settings.max_bytes_before_remerge = max_bytes_before_remerge;
    settings.max_bytes_before_external_sort = max_bytes_before_external_sort;
    let profile = settings.profile.clone();

    let mut stream = MergeSortStream::try_create(source(&schema, blocks), asc(0), settings)?;
    let out = collect_int64(&mut stream)?;
    Ok((out, profile))
}

#[test]
fn test_external_sort_spills_and_merges() -> Result<()> {
    let blocks: Vec<DataBlock> = (0..10)
        .map(|i| {
            let schema = int64_schema();
            int64_block(&schema, (0..1000).map(|v| (v * 7 + i * 13) % 1000).collect())
        })
        .collect();
    let expected: Vec<i64> = blocks
        .iter()
        .flat_map(|b| b.column(0).to_array(&DataType::Int64).as_int64().unwrap().clone())
        .sorted()
        .collect();

    // ~8KB per block, spill every other block.
    let (spilled, profile) = run_sort(blocks.clone(), None, 0, 10_000)?;
    assert_eq!(spilled, expected);
    assert!(profile.external_sort_write_part() >= 2);
    assert_eq!(profile.external_sort_merge(), 1);

    // Spill transparency: same output with the external sort disabled.
    let (in_memory, profile) = run_sort(blocks, None, 0, 0)?;
    assert_eq!(in_memory, expected);
    assert_eq!(profile.external_sort_write_part(), 0);
    assert_eq!(profile.external_sort_merge(), 0);
    Ok(())
}

#[test]
fn test_remerge_transparency() -> Result<()> {
    let schema = int64_schema();
    let blocks: Vec<DataBlock> = (0..20)
        .map(|i| int64_block(&schema, (0..100).map(|v| (v * 31 + i * 3) % 500).collect()))
        .collect();

    let (remerged, _) = run_sort(blocks.clone(), Some(10), 1000, 0)?;
    let (plain, _) = run_sort(blocks, Some(10), 0, 0)?;
    assert_eq!(remerged, plain);
    assert_eq!(remerged.len(), 10);
    Ok(())
}

/// An upstream that flips the sort's cancellation flag while serving its
/// n-th block.
struct InterruptingStream {
    header: DataBlock,
    blocks: VecDeque<DataBlock>,
    aborting: Arc<AtomicBool>,
    abort_at: usize,
    reads: usize,
}

impl BlockStream for InterruptingStream {
    fn header(&self) -> DataBlock {
        self.header.clone()
    }

    fn read(&mut self) -> Result<Option<DataBlock>> {
        self.reads += 1;
        if self.reads == self.abort_at {
            self.aborting.store(true, Ordering::Relaxed);
        }
        Ok(self.blocks.pop_front())
    }
}

#[test]
fn test_cancellation_abandons_spills() -> Result<()> {
    let schema = int64_schema();
    let tmp = tempfile::tempdir()?;
    let mut settings = MergeSortSettings::new(100, tmp.path());
    settings.max_bytes_before_external_sort = 1000;
    let profile = settings.profile.clone();

    let blocks: Vec<DataBlock> = (0..4)
        .map(|i| int64_block(&schema, (0..500).map(|v| v + i).collect()))
        .collect();
    let input = Box::new(InterruptingStream {
        header: DataBlock::empty_with_schema(schema),
        blocks: blocks.into(),
        aborting: settings.aborting.clone(),
        abort_at: 2,
        reads: 0,
    });

    let mut stream = MergeSortStream::try_create(input, asc(0), settings)?;
    assert!(stream.read()?.is_none());
    assert!(stream.read()?.is_none());
    assert!(profile.external_sort_write_part() >= 1);

    // Spill files exist until the operator is dropped, then disappear.
    assert!(std::fs::read_dir(tmp.path())?.count() >= 1);
    drop(stream);
    assert_eq!(std::fs::read_dir(tmp.path())?.count(), 0);
    Ok(())
}

fn random_test(rng: &mut impl Rng, limit: Option<usize>) -> Result<()> {
    let schema = int64_schema();
    let num_blocks = rng.gen_range(1..=6);
    let blocks: Vec<DataBlock> = (0..num_blocks)
        .map(|_| {
            let rows = rng.gen_range(0..=20);
            int64_block(&schema, (0..rows).map(|_| rng.gen_range(0..=100)).collect())
        })
        .collect();

    let mut expected: Vec<i64> = blocks
        .iter()
        .flat_map(|b| b.column(0).to_array(&DataType::Int64).as_int64().unwrap().clone())
        .sorted()
        .collect();
    if let Some(limit) = limit {
        expected.truncate(limit);
    }

    let remerge = if rng.gen_bool(0.5) { 64 } else { 0 };
    let spill = if rng.gen_bool(0.5) { 64 } else { 0 };
    let (out, _) = run_sort(blocks, limit, remerge, spill)?;
    assert_eq!(out, expected, "limit: {:?}", limit);
    Ok(())
}

#[test]
fn fuzz_test() -> Result<()> {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        random_test(&mut rng, None)?;

        let limit = rng.gen_range(1..=10);
        random_test(&mut rng, Some(limit))?;
    }
    Ok(())
}
