// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Signature creators and checkers
//!
//! A [`SignatureCreator`] produces signatures for a given key over a script code, and exposes the
//! [`SignatureChecker`] able to validate what it produces. Two families are provided:
//!
//! * [`TransactionSignatureCreator`] signs a specific transaction input with real private keys,
//!   paired with a [`TransactionSignatureChecker`];
//! * [`DummySignatureCreator`] returns correctly shaped placeholder signatures, paired with a
//!   checker accepting anything. It is used for solvability checks and size estimation.

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{ecdsa, Message};
use bitcoin::{Amount, PublicKey, Script, Transaction};

use crate::interpreter::{SignatureChecker, VerifyFlags};
use crate::provider::{KeyId, SigningProvider};
use crate::sighash::{fork_id_signature_hash, legacy_signature_hash, signature_hash, SigHashType};
use crate::sign::SignOptions;
use crate::SecpCtx;

/// Produces signatures for keys known to a provider
pub trait SignatureCreator {
    /// Checker that accepts the signatures produced by this creator
    fn checker(&self) -> &dyn SignatureChecker;

    /// Create a signature (DER plus one sighash byte) for `key_id` over `script_code`
    ///
    /// Returns `None` if the signature can't be made, usually because `provider` doesn't know
    /// the private key.
    fn create_sig(
        &self,
        provider: &dyn SigningProvider,
        key_id: &KeyId,
        script_code: &Script,
    ) -> Option<Vec<u8>>;
}

/// Checks signatures against one input of a transaction
#[derive(Debug, Clone, Copy)]
pub struct TransactionSignatureChecker<'a> {
    tx: &'a Transaction,
    input_index: usize,
    amount: Amount,
    secp: &'a SecpCtx,
}

impl<'a> TransactionSignatureChecker<'a> {
    /// Bind a checker to the input `input_index` of `tx`, spending `amount`
    pub fn new(
        tx: &'a Transaction,
        input_index: usize,
        amount: Amount,
        secp: &'a SecpCtx,
    ) -> Self {
        TransactionSignatureChecker {
            tx,
            input_index,
            amount,
            secp,
        }
    }
}

impl SignatureChecker for TransactionSignatureChecker<'_> {
    fn check_sig(
        &self,
        signature: &[u8],
        pubkey: &[u8],
        script_code: &Script,
        flags: VerifyFlags,
    ) -> bool {
        let pubkey = match PublicKey::from_slice(pubkey) {
            Ok(pubkey) => pubkey,
            Err(_) => return false,
        };
        let (hash_byte, der) = match signature.split_last() {
            Some(split) => split,
            None => return false,
        };
        let mut sig = match ecdsa::Signature::from_der_lax(der) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        sig.normalize_s();

        let sighash_type = SigHashType::from_u32(u32::from(*hash_byte));
        let hash = if sighash_type.has_fork_id()
            && flags.contains(VerifyFlags::ENABLE_SIGHASH_FORKID)
        {
            fork_id_signature_hash(
                self.tx,
                self.input_index,
                script_code,
                self.amount,
                sighash_type,
            )
        } else {
            legacy_signature_hash(self.tx, self.input_index, script_code, sighash_type)
        };
        let hash = match hash {
            Ok(hash) => hash,
            Err(_) => return false,
        };

        let msg = Message::from_digest(hash.to_byte_array());
        self.secp.verify_ecdsa(&msg, &sig, &pubkey.inner).is_ok()
    }
}

/// Signs one input of a transaction with keys from the provider
#[derive(Debug, Clone, Copy)]
pub struct TransactionSignatureCreator<'a> {
    tx: &'a Transaction,
    input_index: usize,
    amount: Amount,
    sighash_type: SigHashType,
    allow_grinding: bool,
    secp: &'a SecpCtx,
    checker: TransactionSignatureChecker<'a>,
}

impl<'a> TransactionSignatureCreator<'a> {
    /// Bind a creator to the input `input_index` of `tx`, spending `amount`
    pub fn new(
        tx: &'a Transaction,
        input_index: usize,
        amount: Amount,
        options: &SignOptions,
        secp: &'a SecpCtx,
    ) -> Self {
        TransactionSignatureCreator {
            tx,
            input_index,
            amount,
            sighash_type: options.sighash_type,
            allow_grinding: options.allow_grinding,
            secp,
            checker: TransactionSignatureChecker::new(tx, input_index, amount, secp),
        }
    }
}

impl SignatureCreator for TransactionSignatureCreator<'_> {
    fn checker(&self) -> &dyn SignatureChecker {
        &self.checker
    }

    fn create_sig(
        &self,
        provider: &dyn SigningProvider,
        key_id: &KeyId,
        script_code: &Script,
    ) -> Option<Vec<u8>> {
        let key = provider.get_key(key_id)?;

        let hash = match signature_hash(
            self.tx,
            self.input_index,
            script_code,
            self.amount,
            self.sighash_type,
        ) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::debug!(input = self.input_index, error = %e, "cannot compute sighash");
                return None;
            }
        };

        let msg = Message::from_digest(hash.to_byte_array());
        let sig = if self.allow_grinding {
            self.secp.sign_ecdsa_low_r(&msg, &key.inner)
        } else {
            self.secp.sign_ecdsa(&msg, &key.inner)
        };

        let mut sig = sig.serialize_der().to_vec();
        sig.push(self.sighash_type.to_byte());
        Some(sig)
    }
}

/// Checker accepting every signature
#[derive(Debug, Clone, Copy, Default)]
pub struct DummySignatureChecker;

impl SignatureChecker for DummySignatureChecker {
    fn check_sig(&self, _: &[u8], _: &[u8], _: &Script, _: VerifyFlags) -> bool {
        true
    }
}

/// Creator of placeholder signatures with the given R and S lengths
///
/// The placeholders are valid strict DER, so the result can go through full verification with
/// [`DUMMY_CHECKER`], and have the size of a real signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummySignatureCreator {
    r_len: u8,
    s_len: u8,
}

impl DummySignatureCreator {
    /// Placeholder with `r_len` bytes of R and `s_len` bytes of S
    pub const fn new(r_len: u8, s_len: u8) -> Self {
        DummySignatureCreator { r_len, s_len }
    }

    fn dummy_signature(&self) -> Vec<u8> {
        let r = self.r_len as usize;
        let s = self.s_len as usize;

        let mut sig = vec![0u8; r + s + 7];
        sig[0] = 0x30;
        sig[1] = (r + s + 4) as u8;
        sig[2] = 0x02;
        sig[3] = self.r_len;
        sig[4] = 0x01;
        sig[4 + r] = 0x02;
        sig[5 + r] = self.s_len;
        sig[6 + r] = 0x01;
        sig[6 + r + s] = SigHashType::default().to_byte();
        sig
    }
}

impl SignatureCreator for DummySignatureCreator {
    fn checker(&self) -> &dyn SignatureChecker {
        &DUMMY_CHECKER
    }

    fn create_sig(&self, _: &dyn SigningProvider, _: &KeyId, _: &Script) -> Option<Vec<u8>> {
        Some(self.dummy_signature())
    }
}

/// Checker accepting every signature
pub static DUMMY_CHECKER: DummySignatureChecker = DummySignatureChecker;

/// Placeholder creator for typical 71-byte signatures
pub static DUMMY_SIGNATURE_CREATOR: DummySignatureCreator = DummySignatureCreator::new(32, 32);

/// Placeholder creator for the largest 72-byte signatures
pub static DUMMY_MAXIMUM_SIGNATURE_CREATOR: DummySignatureCreator =
    DummySignatureCreator::new(33, 32);
