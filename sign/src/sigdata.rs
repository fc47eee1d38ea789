// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Partial signature data

use alloc::collections::BTreeMap;

use bitcoin::{PublicKey, ScriptBuf};
use serde::{Deserialize, Serialize};

use crate::provider::{KeyId, KeyOriginInfo, ScriptId};

/// A public key and a signature made with it (DER plus one sighash byte)
pub type SigPair = (PublicKey, Vec<u8>);

/// In-progress signing state of one transaction input
///
/// Produced by [`produce_signature`](crate::produce_signature) and
/// [`data_from_transaction`](crate::data_from_transaction), and exchanged between cooperating
/// signers, which combine their results with [`SignatureData::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureData {
    /// Whether `script_sig` fully satisfies the locking script
    pub complete: bool,
    /// Unlocking script built so far
    pub script_sig: ScriptBuf,
    /// Redeem script, empty when unknown
    pub redeem_script: ScriptBuf,
    /// Signatures collected so far, by key hash
    pub signatures: BTreeMap<KeyId, SigPair>,
    /// Public keys and origins discovered while signing
    pub misc_pubkeys: BTreeMap<KeyId, (PublicKey, KeyOriginInfo)>,
    /// Key hashes for which no public key could be found
    pub missing_pubkeys: Vec<KeyId>,
    /// Keys for which no signature could be made
    pub missing_sigs: Vec<KeyId>,
    /// Hash of the redeem script that could not be found
    pub missing_redeem_script: Option<ScriptId>,
}

impl SignatureData {
    /// Combine with the data of another signer for the same input
    ///
    /// A complete side wins outright, `self` first. Otherwise the redeem script of `self` is kept
    /// unless empty, and the signatures are united with those of `self` taking precedence. The
    /// `missing_*` fields are not merged.
    pub fn merge(mut self, other: SignatureData) -> SignatureData {
        self.merge_signature_data(other);
        self
    }

    /// In-place version of [`SignatureData::merge`]
    pub fn merge_signature_data(&mut self, other: SignatureData) {
        if self.complete {
            return;
        }
        if other.complete {
            *self = other;
            return;
        }
        if self.redeem_script.is_empty() && !other.redeem_script.is_empty() {
            self.redeem_script = other.redeem_script;
        }
        for (key_id, pair) in other.signatures {
            self.signatures.entry(key_id).or_insert(pair);
        }
    }
}
