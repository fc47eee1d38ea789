// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

#![doc = include_str!("../README.md")]
// only enables the `doc_cfg` feature when the `docsrs` configuration attribute is defined
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

extern crate alloc;

pub extern crate bitcoin;
pub extern crate miniscript;

mod creator;
mod descriptor;
mod error;
mod extract;
pub mod interpreter;
mod provider;
mod sigdata;
pub mod sighash;
mod sign;
pub mod solver;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use creator::{
    DummySignatureChecker, DummySignatureCreator, SignatureCreator, TransactionSignatureChecker,
    TransactionSignatureCreator, DUMMY_CHECKER, DUMMY_MAXIMUM_SIGNATURE_CREATOR,
    DUMMY_SIGNATURE_CREATOR,
};
pub use error::SignerError;
pub use extract::{data_from_transaction, SignatureExtractorChecker};
pub use provider::{
    DummySigningProvider, FlatSigningProvider, HidingSigningProvider, KeyId, KeyOriginInfo,
    ScriptId, SigningProvider, DUMMY_SIGNING_PROVIDER,
};
pub use sigdata::{SigPair, SignatureData};
pub use sighash::SigHashType;
pub use sign::{
    is_solvable, produce_signature, push_all, sign_signature, sign_signature_from_tx, sign_step,
    sign_transaction, update_input, SignOptions, StepResult,
};
pub use solver::{solve, Template, TemplateKind};

/// Secp256k1 context used for signing and verification
pub type SecpCtx = bitcoin::secp256k1::Secp256k1<bitcoin::secp256k1::All>;
