// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use core::fmt;

use miniscript::descriptor::ConversionError;

/// Signing error
///
/// Ordinary unsatisfiability (missing keys, scripts or signatures) is never reported through this
/// type: it is recorded in [`SignatureData`](crate::SignatureData) instead. These variants cover
/// violated preconditions of the caller.
#[derive(Debug)]
pub enum SignerError {
    /// Input index is out of range
    InputIndexOutOfRange,
    /// The output referenced by the input does not exist in the funding transaction
    PrevoutIndexOutOfRange,
    /// No spent output was supplied for the input at the given index
    MissingSpentOutput(usize),
    /// Error while deriving the keys of a descriptor
    Conversion(ConversionError),
    /// Miniscript error
    Miniscript(miniscript::Error),
}

impl From<ConversionError> for SignerError {
    fn from(e: ConversionError) -> Self {
        SignerError::Conversion(e)
    }
}

impl From<miniscript::Error> for SignerError {
    fn from(e: miniscript::Error) -> Self {
        SignerError::Miniscript(e)
    }
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputIndexOutOfRange => write!(f, "Input index out of range"),
            Self::PrevoutIndexOutOfRange => {
                write!(f, "Spent output index out of range in the funding transaction")
            }
            Self::MissingSpentOutput(index) => {
                write!(f, "Missing spent output for input {}", index)
            }
            Self::Conversion(err) => write!(f, "Descriptor key conversion error: {}", err),
            Self::Miniscript(err) => write!(f, "Miniscript error: {}", err),
        }
    }
}

impl std::error::Error for SignerError {}
