// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Signature hashing
//!
//! Two digest algorithms are supported: the replay-protected one selected by the
//! [`SigHashType::FORKID`] bit, which commits to the spent amount (BIP143 layout), and the legacy
//! pre-fork digest.

use core::fmt;

use bitcoin::consensus::encode::{serialize, VarInt};
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::sighash::SighashCache;
use bitcoin::{Amount, Script, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::SignerError;

/// Raw 32-bit signature hash type
///
/// Only the low byte is appended to signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigHashType(u32);

impl SigHashType {
    /// Sign all inputs and all outputs
    pub const ALL: SigHashType = SigHashType(0x01);
    /// Sign all inputs and no output
    pub const NONE: SigHashType = SigHashType(0x02);
    /// Sign all inputs and the output with the same index
    pub const SINGLE: SigHashType = SigHashType(0x03);
    /// Replay-protected digest
    pub const FORKID: SigHashType = SigHashType(0x40);
    /// Sign only the current input
    pub const ANYONECANPAY: SigHashType = SigHashType(0x80);

    const MODIFIERS: u32 = Self::FORKID.0 | Self::ANYONECANPAY.0;

    /// Wrap a raw value, undefined types included
    pub const fn from_u32(raw: u32) -> Self {
        SigHashType(raw)
    }

    /// Read the hash type from the last byte of a serialized signature
    pub fn from_signature(sig: &[u8]) -> Option<Self> {
        sig.last().map(|b| SigHashType(u32::from(*b)))
    }

    /// Raw value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Hash type with the modifier bits cleared
    pub const fn base_type(self) -> u32 {
        self.0 & !Self::MODIFIERS
    }

    /// Whether the fork id bit is set
    pub const fn has_fork_id(self) -> bool {
        self.0 & Self::FORKID.0 != 0
    }

    /// Whether the anyone-can-pay bit is set
    pub const fn has_anyone_can_pay(self) -> bool {
        self.0 & Self::ANYONECANPAY.0 != 0
    }

    /// Same base type with the fork id bit set or cleared
    pub const fn with_fork_id(self, fork_id: bool) -> Self {
        if fork_id {
            SigHashType(self.0 | Self::FORKID.0)
        } else {
            SigHashType(self.0 & !Self::FORKID.0)
        }
    }

    /// Same base type with the anyone-can-pay bit set or cleared
    pub const fn with_anyone_can_pay(self, anyone_can_pay: bool) -> Self {
        if anyone_can_pay {
            SigHashType(self.0 | Self::ANYONECANPAY.0)
        } else {
            SigHashType(self.0 & !Self::ANYONECANPAY.0)
        }
    }

    /// Whether the base type is one of ALL, NONE or SINGLE
    pub const fn is_defined(self) -> bool {
        let base = self.base_type();
        base >= Self::ALL.0 && base <= Self::SINGLE.0
    }

    /// The byte appended to signatures
    pub const fn to_byte(self) -> u8 {
        (self.0 & 0xff) as u8
    }
}

impl Default for SigHashType {
    fn default() -> Self {
        SigHashType(Self::ALL.0 | Self::FORKID.0)
    }
}

impl fmt::Display for SigHashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base_type() {
            1 => "ALL",
            2 => "NONE",
            3 => "SINGLE",
            _ => return write!(f, "0x{:02x}", self.0),
        };
        write!(f, "{}", base)?;
        if self.has_fork_id() {
            write!(f, "|FORKID")?;
        }
        if self.has_anyone_can_pay() {
            write!(f, "|ANYONECANPAY")?;
        }
        Ok(())
    }
}

/// Digest to sign for `input_index`, dispatching on the fork id bit of `sighash_type`
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    amount: Amount,
    sighash_type: SigHashType,
) -> Result<sha256d::Hash, SignerError> {
    if sighash_type.has_fork_id() {
        fork_id_signature_hash(tx, input_index, script_code, amount, sighash_type)
    } else {
        legacy_signature_hash(tx, input_index, script_code, sighash_type)
    }
}

/// Replay-protected digest committing to the spent amount
pub fn fork_id_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    amount: Amount,
    sighash_type: SigHashType,
) -> Result<sha256d::Hash, SignerError> {
    let input = tx
        .input
        .get(input_index)
        .ok_or(SignerError::InputIndexOutOfRange)?;

    let anyone_can_pay = sighash_type.has_anyone_can_pay();
    let base = sighash_type.base_type();
    let zero = [0u8; 32];

    let hash_prevouts = if !anyone_can_pay {
        let mut data = Vec::with_capacity(tx.input.len() * 36);
        for txin in &tx.input {
            data.extend(serialize(&txin.previous_output));
        }
        sha256d::Hash::hash(&data).to_byte_array()
    } else {
        zero
    };

    let hash_sequence = if !anyone_can_pay
        && base != SigHashType::SINGLE.0
        && base != SigHashType::NONE.0
    {
        let mut data = Vec::with_capacity(tx.input.len() * 4);
        for txin in &tx.input {
            data.extend(txin.sequence.0.to_le_bytes());
        }
        sha256d::Hash::hash(&data).to_byte_array()
    } else {
        zero
    };

    let hash_outputs = if base != SigHashType::SINGLE.0 && base != SigHashType::NONE.0 {
        let mut data = Vec::new();
        for txout in &tx.output {
            data.extend(serialize(txout));
        }
        sha256d::Hash::hash(&data).to_byte_array()
    } else if base == SigHashType::SINGLE.0 && input_index < tx.output.len() {
        sha256d::Hash::hash(&serialize(&tx.output[input_index])).to_byte_array()
    } else {
        zero
    };

    let mut preimage = Vec::with_capacity(160 + script_code.len());
    preimage.extend(tx.version.0.to_le_bytes());
    preimage.extend(hash_prevouts);
    preimage.extend(hash_sequence);
    preimage.extend(serialize(&input.previous_output));
    preimage.extend(serialize(&VarInt(script_code.len() as u64)));
    preimage.extend(script_code.as_bytes());
    preimage.extend(amount.to_sat().to_le_bytes());
    preimage.extend(input.sequence.0.to_le_bytes());
    preimage.extend(hash_outputs);
    preimage.extend(tx.lock_time.to_consensus_u32().to_le_bytes());
    preimage.extend(sighash_type.raw().to_le_bytes());

    Ok(sha256d::Hash::hash(&preimage))
}

/// Pre-fork digest
pub fn legacy_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    sighash_type: SigHashType,
) -> Result<sha256d::Hash, SignerError> {
    SighashCache::new(tx)
        .legacy_signature_hash(input_index, script_code, sighash_type.raw())
        .map(|hash| hash.to_raw_hash())
        .map_err(|_| SignerError::InputIndexOutOfRange)
}
