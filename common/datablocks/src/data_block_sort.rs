// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use common_datavalues::DataArray;
use common_datavalues::DataArrayBuilder;
use common_datavalues::DataColumn;
use common_datavalues::DataSchema;
use common_datavalues::DataType;
use common_datavalues::DataValueRef;
use common_exception::Error;
use common_exception::Result;

use crate::DataBlock;

/// External collation interface. The engine never implements a collation
/// itself; string keys that carry a collator are compared through it.
pub trait Collator: Send + Sync {
    fn name(&self) -> &str;

    fn compare(&self, lhs: &str, rhs: &str) -> Ordering;
}

/// One sort key specifier. The column is addressed by name when
/// `column_name` is set, otherwise by `offset`.
///
/// `nulls_first` places nulls before every value regardless of `asc`;
/// `asc` only reverses the value comparison.
#[derive(Clone)]
pub struct SortColumnDescription {
    pub column_name: Option<String>,
    pub offset: usize,
    pub asc: bool,
    pub nulls_first: bool,
    pub collator: Option<Arc<dyn Collator>>,
}

impl SortColumnDescription {
    pub fn new(offset: usize, asc: bool, nulls_first: bool) -> SortColumnDescription {
        SortColumnDescription {
            column_name: None,
            offset,
            asc,
            nulls_first,
            collator: None,
        }
    }

    pub fn with_name(name: &str, asc: bool, nulls_first: bool) -> SortColumnDescription {
        SortColumnDescription {
            column_name: Some(name.to_string()),
            offset: 0,
            asc,
            nulls_first,
            collator: None,
        }
    }

    pub fn with_collation(mut self, collator: Arc<dyn Collator>) -> SortColumnDescription {
        self.collator = Some(collator);
        self
    }

    pub fn resolve_offset(&self, schema: &DataSchema) -> Result<usize> {
        match &self.column_name {
            Some(name) => schema.index_of(name),
            None => {
                if self.offset >= schema.num_fields() {
                    return Err(Error::bad_arguments(format!(
                        "sort column offset {} out of range, schema has {} fields",
                        self.offset,
                        schema.num_fields()
                    )));
                }
                Ok(self.offset)
            }
        }
    }
}

impl fmt::Debug for SortColumnDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortColumnDescription")
            .field("column_name", &self.column_name)
            .field("offset", &self.offset)
            .field("asc", &self.asc)
            .field("nulls_first", &self.nulls_first)
            .field("collator", &self.collator.as_ref().map(|c| c.name()))
            .finish()
    }
}

/// Key columns of one block, materialized and paired with their specifiers.
pub type SortColumns = Vec<(DataArray, SortColumnDescription)>;

pub fn sort_columns(block: &DataBlock, description: &[SortColumnDescription]) -> Result<SortColumns> {
    let schema = block.schema();
    description
        .iter()
        .map(|desc| {
            let offset = desc.resolve_offset(schema)?;
            let data_type = schema.field(offset).data_type();
            Ok((block.column(offset).to_array(data_type), desc.clone()))
        })
        .collect()
}

/// Whether a description requires the collation comparison path: some
/// specifier carries a collator and addresses a string column.
pub fn has_collation(schema: &DataSchema, description: &[SortColumnDescription]) -> Result<bool> {
    for desc in description {
        if desc.collator.is_some() {
            let offset = desc.resolve_offset(schema)?;
            if schema.field(offset).data_type().remove_nullable() == DataType::Utf8 {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// How two non-null key values compare. The plain and collation-aware merge
/// paths differ only in this capability.
pub trait ValueComparator: Send + Sync + 'static {
    fn compare_values(
        desc: &SortColumnDescription,
        lhs: &DataValueRef<'_>,
        rhs: &DataValueRef<'_>,
    ) -> Ordering;
}

pub struct CompareValues;

impl ValueComparator for CompareValues {
    fn compare_values(
        _desc: &SortColumnDescription,
        lhs: &DataValueRef<'_>,
        rhs: &DataValueRef<'_>,
    ) -> Ordering {
        lhs.compare(rhs)
    }
}

pub struct CompareWithCollation;

impl ValueComparator for CompareWithCollation {
    fn compare_values(
        desc: &SortColumnDescription,
        lhs: &DataValueRef<'_>,
        rhs: &DataValueRef<'_>,
    ) -> Ordering {
        if let (Some(collator), DataValueRef::Utf8(l), DataValueRef::Utf8(r)) =
            (desc.collator.as_deref(), *lhs, *rhs)
        {
            collator.compare(l, r)
        } else {
            lhs.compare(rhs)
        }
    }
}

/// Lexicographic comparison of row `a` of `left` against row `b` of `right`
/// in description order.
pub fn compare_rows<C: ValueComparator>(
    left: &SortColumns,
    a: usize,
    right: &SortColumns,
    b: usize,
) -> Ordering {
    for ((left_array, desc), (right_array, _)) in left.iter().zip(right.iter()) {
        let lhs = left_array.value(a);
        let rhs = right_array.value(b);
        let ord = match (lhs.is_null(), rhs.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => {
                if desc.nulls_first {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (false, true) => {
                if desc.nulls_first {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (false, false) => {
                let ord = C::compare_values(desc, &lhs, &rhs);
                if desc.asc {
                    ord
                } else {
                    ord.reverse()
                }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

impl DataBlock {
    /// Sort the rows of one block by `description`, truncating to `limit`
    /// rows when given. Blocks already in order are returned as cheap clones.
    pub fn sort(
        &self,
        description: &[SortColumnDescription],
        limit: Option<usize>,
    ) -> Result<DataBlock> {
        let rows = self.num_rows();
        if rows <= 1 || description.is_empty() {
            return Ok(self.clone());
        }

        let keys = sort_columns(self, description)?;
        let sorted = (1..rows).all(|i| {
            compare_rows::<CompareWithCollation>(&keys, i - 1, &keys, i) != Ordering::Greater
        });
        if sorted {
            return Ok(match limit {
                Some(limit) if limit < rows => self.slice(0..limit),
                _ => self.clone(),
            });
        }

        let mut permutation: Vec<usize> = (0..rows).collect();
        permutation
            .sort_unstable_by(|&a, &b| compare_rows::<CompareWithCollation>(&keys, a, &keys, b));
        if let Some(limit) = limit {
            permutation.truncate(limit);
        }

        let columns = self
            .columns()
            .iter()
            .zip(self.schema().fields())
            .map(|(column, field)| match column {
                DataColumn::Constant(value, _) => {
                    DataColumn::Constant(value.clone(), permutation.len())
                }
                DataColumn::Array(array) => {
                    let mut builder =
                        DataArrayBuilder::with_capacity(field.data_type(), permutation.len());
                    for &i in &permutation {
                        builder.push(array.value(i));
                    }
                    DataColumn::Array(builder.finish())
                }
            })
            .collect();
        DataBlock::create(self.schema().clone(), columns)
    }
}
