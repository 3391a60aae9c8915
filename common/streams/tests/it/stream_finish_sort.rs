// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use common_datablocks::assert_blocks_eq;
use common_datablocks::DataBlock;
use common_datablocks::SortColumnDescription;
use common_datavalues::DataArray;
use common_datavalues::DataColumn;
use common_datavalues::DataField;
use common_datavalues::DataSchemaRefExt;
use common_datavalues::DataType;
use common_datavalues::DataValue;
use common_exception::Result;
use common_streams::BlockStream;
use common_streams::FinishSortStream;
use itertools::Itertools;
use rand::Rng;

use crate::collect_pairs;
use crate::pair_block;
use crate::pair_schema;
use crate::source;

fn prefix() -> Vec<SortColumnDescription> {
    vec![SortColumnDescription::new(0, true, false)]
}

fn full() -> Vec<SortColumnDescription> {
    vec![
        SortColumnDescription::new(0, true, false),
        SortColumnDescription::new(1, true, false),
    ]
}

#[test]
fn test_finish_sort_across_blocks() -> Result<()> {
    let schema = pair_schema();
    let input = source(
        &schema,
        vec![
            pair_block(&schema, vec![(1, 9), (1, 3)]),
            pair_block(&schema, vec![(1, 5), (2, 8), (2, 1)]),
        ],
    );

    let mut stream = FinishSortStream::try_create(input, prefix(), full(), 4, None)?;
    let mut blocks = Vec::new();
    while let Some(block) = stream.read()? {
        blocks.push(block);
    }
    assert_blocks_eq(
        vec![
            "+---+---+",
            "| a | b |",
            "+---+---+",
            "| 1 | 3 |",
            "| 1 | 5 |",
            "| 1 | 9 |",
            "| 2 | 1 |",
            "| 2 | 8 |",
            "+---+---+",
        ],
        &blocks,
    );
    Ok(())
}

#[test]
fn test_finish_sort_single_chunk() -> Result<()> {
    let schema = pair_schema();
    let input = source(
        &schema,
        vec![
            pair_block(&schema, vec![(7, 3), (7, 1)]),
            pair_block(&schema, vec![(7, 2)]),
        ],
    );

    let mut stream = FinishSortStream::try_create(input, prefix(), full(), 4, None)?;
    assert_eq!(collect_pairs(&mut stream)?, vec![(7, 1), (7, 2), (7, 3)]);
    Ok(())
}

#[test]
fn test_finish_sort_empty_prefix() -> Result<()> {
    // A degenerate prefix makes the whole input one chunk: a full sort.
    let schema = pair_schema();
    let input = source(
        &schema,
        vec![
            pair_block(&schema, vec![(2, 1), (1, 2)]),
            pair_block(&schema, vec![(1, 1), (2, 2)]),
        ],
    );

    let mut stream = FinishSortStream::try_create(input, vec![], full(), 4, None)?;
    assert_eq!(
        collect_pairs(&mut stream)?,
        vec![(1, 1), (1, 2), (2, 1), (2, 2)]
    );
    Ok(())
}

#[test]
fn test_finish_sort_empty_input() -> Result<()> {
    let schema = pair_schema();
    let input = source(&schema, vec![]);

    let mut stream = FinishSortStream::try_create(input, prefix(), full(), 4, None)?;
    assert!(stream.read()?.is_none());
    assert!(stream.read()?.is_none());
    Ok(())
}

#[test]
fn test_finish_sort_limit_is_exact() -> Result<()> {
    let schema = pair_schema();
    let input = source(
        &schema,
        vec![
            pair_block(&schema, vec![(1, 9), (1, 3), (1, 5)]),
            pair_block(&schema, vec![(2, 8), (2, 1)]),
        ],
    );

    // The first chunk alone is bigger than the limit.
    let mut stream = FinishSortStream::try_create(input, prefix(), full(), 10, Some(2))?;
    assert_eq!(collect_pairs(&mut stream)?, vec![(1, 3), (1, 5)]);
    assert!(stream.read()?.is_none());
    Ok(())
}

#[test]
fn test_finish_sort_preserves_constants() -> Result<()> {
    let schema = DataSchemaRefExt::create(vec![
        DataField::new("k", DataType::Utf8),
        DataField::new("a", DataType::Int64),
        DataField::new("b", DataType::Int64),
    ]);
    let blocks = vec![DataBlock::create(
        schema.clone(),
        vec![
            DataColumn::Constant(DataValue::Utf8("x".to_string()), 3),
            DataColumn::Array(DataArray::Int64(vec![1, 1, 2])),
            DataColumn::Array(DataArray::Int64(vec![9, 3, 4])),
        ],
    )?];
    let header = blocks[0].slice(0..0);

    let input = Box::new(common_streams::DataBlockStream::create(header, blocks));
    let description_sorted = vec![SortColumnDescription::with_name("a", true, false)];
    let description_to_sort = vec![
        SortColumnDescription::with_name("a", true, false),
        SortColumnDescription::with_name("b", true, false),
    ];
    let mut stream =
        FinishSortStream::try_create(input, description_sorted, description_to_sort, 4, None)?;

    let mut blocks = Vec::new();
    while let Some(block) = stream.read()? {
        assert!(block.column(0).is_constant());
        blocks.push(block);
    }
    assert_blocks_eq(
        vec![
            "+---+---+---+",
            "| k | a | b |",
            "+---+---+---+",
            "| x | 1 | 3 |",
            "| x | 1 | 9 |",
            "| x | 2 | 4 |",
            "+---+---+---+",
        ],
        &blocks,
    );
    Ok(())
}

#[test]
fn fuzz_test() -> Result<()> {
    let schema = pair_schema();
    let mut rng = rand::thread_rng();

    for _ in 0..20 {
        // Rows sorted by the prefix across the whole input, chopped into
        // random blocks.
        let num_rows = rng.gen_range(0..=60);
        let mut rows: Vec<(i64, i64)> = (0..num_rows)
            .map(|_| (rng.gen_range(0..=5), rng.gen_range(0..=100)))
            .collect();
        rows.sort_by_key(|&(a, _)| a);

        let mut blocks = Vec::new();
        let mut rest = rows.as_slice();
        while !rest.is_empty() {
            let take = rng.gen_range(1..=rest.len());
            blocks.push(pair_block(&schema, rest[..take].to_vec()));
            rest = &rest[take..];
        }

        let limit = if rng.gen_bool(0.5) {
            Some(rng.gen_range(1..=20))
        } else {
            None
        };
        let mut expected: Vec<(i64, i64)> = rows.iter().copied().sorted().collect();
        if let Some(limit) = limit {
            expected.truncate(limit);
        }

        let input = source(&schema, blocks);
        let mut stream = FinishSortStream::try_create(input, prefix(), full(), 7, limit)?;
        assert_eq!(collect_pairs(&mut stream)?, expected, "limit: {:?}", limit);
    }
    Ok(())
}
