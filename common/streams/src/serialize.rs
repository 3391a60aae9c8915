// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;

use byteorder::LittleEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use common_datablocks::DataBlock;
use common_datavalues::DataArray;
use common_datavalues::DataColumn;
use common_datavalues::DataSchemaRef;
use common_datavalues::DataType;
use common_datavalues::NullableArray;
use common_exception::Error;
use common_exception::Result;

/// Native little-endian block encoding for spill files.
///
/// The format carries no schema: the reader drives decoding from the schema
/// the file was written with. Layout per block: row count, then each column
/// in schema order (nullable columns write the validity mask first).
pub(crate) fn write_block<W: Write>(writer: &mut W, block: &DataBlock) -> Result<()> {
    writer.write_u64::<LittleEndian>(block.num_rows() as u64)?;
    for (column, field) in block.columns().iter().zip(block.schema().fields()) {
        let array = match column {
            DataColumn::Array(array) => array.clone(),
            DataColumn::Constant(_, _) => column.to_array(field.data_type()),
        };
        write_array(writer, &array)?;
    }
    Ok(())
}

fn write_array<W: Write>(writer: &mut W, array: &DataArray) -> Result<()> {
    match array {
        DataArray::Boolean(values) => {
            for v in values {
                writer.write_u8(*v as u8)?;
            }
        }
        DataArray::Int64(values) => {
            for v in values {
                writer.write_i64::<LittleEndian>(*v)?;
            }
        }
        DataArray::UInt64(values) => {
            for v in values {
                writer.write_u64::<LittleEndian>(*v)?;
            }
        }
        DataArray::Float64(values) => {
            for v in values {
                writer.write_f64::<LittleEndian>(*v)?;
            }
        }
        DataArray::Utf8(values) => {
            for v in values {
                writer.write_u64::<LittleEndian>(v.len() as u64)?;
                writer.write_all(v.as_bytes())?;
            }
        }
        DataArray::Nullable(nullable) => {
            for v in &nullable.validity {
                writer.write_u8(*v as u8)?;
            }
            write_array(writer, &nullable.array)?;
        }
    }
    Ok(())
}

/// Read the next block, or `None` at a clean end of stream.
pub(crate) fn read_block<R: Read>(
    reader: &mut R,
    schema: &DataSchemaRef,
) -> Result<Option<DataBlock>> {
    let num_rows = match reader.read_u64::<LittleEndian>() {
        Ok(n) => n as usize,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut columns = Vec::with_capacity(schema.num_fields());
    for field in schema.fields() {
        let array = read_array(reader, field.data_type(), num_rows)?;
        columns.push(DataColumn::Array(array));
    }
    DataBlock::create(schema.clone(), columns).map(Some)
}

fn read_array<R: Read>(reader: &mut R, data_type: &DataType, num_rows: usize) -> Result<DataArray> {
    let array = match data_type {
        DataType::Boolean => {
            let mut values = Vec::with_capacity(num_rows);
            for _ in 0..num_rows {
                values.push(reader.read_u8()? != 0);
            }
            DataArray::Boolean(values)
        }
        DataType::Int64 => {
            let mut values = Vec::with_capacity(num_rows);
            for _ in 0..num_rows {
                values.push(reader.read_i64::<LittleEndian>()?);
            }
            DataArray::Int64(values)
        }
        DataType::UInt64 => {
            let mut values = Vec::with_capacity(num_rows);
            for _ in 0..num_rows {
                values.push(reader.read_u64::<LittleEndian>()?);
            }
            DataArray::UInt64(values)
        }
        DataType::Float64 => {
            let mut values = Vec::with_capacity(num_rows);
            for _ in 0..num_rows {
                values.push(reader.read_f64::<LittleEndian>()?);
            }
            DataArray::Float64(values)
        }
        DataType::Utf8 => {
            let mut values = Vec::with_capacity(num_rows);
            for _ in 0..num_rows {
                let len = reader.read_u64::<LittleEndian>()? as usize;
                let mut buf = vec![0u8; len];
                reader.read_exact(&mut buf)?;
                let value = String::from_utf8(buf)
                    .map_err(|e| Error::bad_bytes(format!("invalid utf8 in spill data: {}", e)))?;
                values.push(value);
            }
            DataArray::Utf8(values)
        }
        DataType::Nullable(inner) => {
            let mut validity = Vec::with_capacity(num_rows);
            for _ in 0..num_rows {
                validity.push(reader.read_u8()? != 0);
            }
            let array = read_array(reader, inner, num_rows)?;
            DataArray::Nullable(Box::new(NullableArray { validity, array }))
        }
    };
    Ok(array)
}
