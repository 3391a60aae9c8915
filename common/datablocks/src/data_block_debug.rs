// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use common_exception::Result;

use crate::DataBlock;

/// ! Create a visual representation of the blocks, one table over all rows.
pub fn pretty_format_blocks(blocks: &[DataBlock]) -> Result<String> {
    let block = DataBlock::concat(blocks)?;

    let num_columns = block.num_columns();
    let mut widths: Vec<usize> = block
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().len())
        .collect();
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(block.num_rows());
    for row in 0..block.num_rows() {
        let mut line = Vec::with_capacity(num_columns);
        for (i, width) in widths.iter_mut().enumerate() {
            let cell = block.column(i).value(row).to_string();
            *width = (*width).max(cell.len());
            line.push(cell);
        }
        cells.push(line);
    }

    let separator = {
        let mut s = String::from("+");
        for width in &widths {
            s.push_str(&"-".repeat(width + 2));
            s.push('+');
        }
        s
    };
    let format_line = |values: &[String]| {
        let mut s = String::from("|");
        for (value, width) in values.iter().zip(widths.iter()) {
            s.push_str(&format!(" {:<1$} |", value, width));
        }
        s
    };

    let header: Vec<String> = block
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let mut out = String::new();
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&format_line(&header));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for line in &cells {
        out.push_str(&format_line(line));
        out.push('\n');
    }
    out.push_str(&separator);
    Ok(out)
}

pub fn assert_blocks_eq(expect: Vec<&str>, blocks: &[DataBlock]) {
    assert_blocks_eq_with_name("", expect, blocks)
}

pub fn assert_blocks_eq_with_name(test_name: &str, expect: Vec<&str>, blocks: &[DataBlock]) {
    let expected_lines: Vec<String> = expect.iter().map(|&s| s.into()).collect();
    let formatted = pretty_format_blocks(blocks).unwrap();
    let actual_lines: Vec<&str> = formatted.trim().lines().collect();

    assert_eq!(
        expected_lines, actual_lines,
        "{:#?}\n\nexpected:\n\n{:#?}\nactual:\n\n{:#?}\n\n",
        test_name, expected_lines, actual_lines
    );
}
