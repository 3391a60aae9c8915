// Copyright 2020-2021 The Datafuse Authors.
//
// SPDX-License-Identifier: Apache-2.0.

use std::result;

use snafu::Snafu;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Schema mismatch: {}", message))]
    SchemaMismatch { message: String },

    #[snafu(display("Unknown column: {}", name))]
    UnknownColumn { name: String },

    #[snafu(display("Bad arguments: {}", message))]
    BadArguments { message: String },

    #[snafu(display("Bad bytes: {}", message))]
    BadBytes { message: String },

    #[snafu(display("IO error: {}", source))]
    Io { source: std::io::Error },
}

impl Error {
    pub fn schema_mismatch(message: impl Into<String>) -> Error {
        Error::SchemaMismatch {
            message: message.into(),
        }
    }

    pub fn bad_arguments(message: impl Into<String>) -> Error {
        Error::BadArguments {
            message: message.into(),
        }
    }

    pub fn bad_bytes(message: impl Into<String>) -> Error {
        Error::BadBytes {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}
