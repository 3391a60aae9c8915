// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

mod data_array;
mod data_column;
mod data_schema;
mod data_type;
mod data_value;

pub use data_array::DataArray;
pub use data_array::DataArrayBuilder;
pub use data_array::NullableArray;
pub use data_array::NullableArrayBuilder;
pub use data_column::DataColumn;
pub use data_schema::DataField;
pub use data_schema::DataSchema;
pub use data_schema::DataSchemaRef;
pub use data_schema::DataSchemaRefExt;
pub use data_type::DataType;
pub use data_value::DataValue;
pub use data_value::DataValueRef;
