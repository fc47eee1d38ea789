// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Standard template classification

use core::fmt;

use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::*;
use bitcoin::script::{self, Instruction, Script};
use bitcoin::{PubkeyHash, PublicKey, ScriptHash};

use crate::interpreter::{is_push_only, MAX_PUBKEYS_PER_MULTISIG};

/// Kind of a recognized locking script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Not a standard template
    Unknown,
    /// Unspendable data carrier
    NullData,
    /// `<pubkey> OP_CHECKSIG`
    PubKey,
    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
    PubKeyHash,
    /// `OP_HASH160 <hash> OP_EQUAL`
    ScriptHash,
    /// `<m> <pubkey>... <n> OP_CHECKMULTISIG`
    MultiSig,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemplateKind::Unknown => "nonstandard",
            TemplateKind::NullData => "nulldata",
            TemplateKind::PubKey => "pubkey",
            TemplateKind::PubKeyHash => "pubkeyhash",
            TemplateKind::ScriptHash => "scripthash",
            TemplateKind::MultiSig => "multisig",
        };
        write!(f, "{}", name)
    }
}

/// A classified locking script together with the data needed to satisfy it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// Not a standard template
    Unknown,
    /// Unspendable data carrier
    NullData,
    /// Pay to a public key
    PubKey(PublicKey),
    /// Pay to the hash of a public key
    PubKeyHash(PubkeyHash),
    /// Pay to the hash of a redeem script
    ScriptHash(ScriptHash),
    /// Bare `required`-of-`pubkeys.len()` multisig, keys in script order
    MultiSig {
        /// Number of signatures needed
        required: usize,
        /// Candidate keys
        pubkeys: Vec<PublicKey>,
    },
}

impl Template {
    /// Kind of this template
    pub fn kind(&self) -> TemplateKind {
        match self {
            Template::Unknown => TemplateKind::Unknown,
            Template::NullData => TemplateKind::NullData,
            Template::PubKey(_) => TemplateKind::PubKey,
            Template::PubKeyHash(_) => TemplateKind::PubKeyHash,
            Template::ScriptHash(_) => TemplateKind::ScriptHash,
            Template::MultiSig { .. } => TemplateKind::MultiSig,
        }
    }
}

/// Classify `script` into one of the standard templates
///
/// Never fails: anything that is not an exact match is [`Template::Unknown`]. Public keys in
/// pay-to-pubkey and multisig scripts must be valid curve points, not only have the right size and
/// prefix, so scripts embedding off-curve keys are [`Template::Unknown`] as well.
pub fn solve(script: &Script) -> Template {
    let bytes = script.as_bytes();

    if script.is_p2sh() {
        return match <[u8; 20]>::try_from(&bytes[2..22]) {
            Ok(hash) => Template::ScriptHash(ScriptHash::from_byte_array(hash)),
            Err(_) => Template::Unknown,
        };
    }

    if bytes.first() == Some(&OP_RETURN.to_u8())
        && is_push_only(Script::from_bytes(&bytes[1..]))
    {
        return Template::NullData;
    }

    if let Some(pubkey) = match_pay_to_pubkey(bytes) {
        return Template::PubKey(pubkey);
    }

    if script.is_p2pkh() {
        return match <[u8; 20]>::try_from(&bytes[3..23]) {
            Ok(hash) => Template::PubKeyHash(PubkeyHash::from_byte_array(hash)),
            Err(_) => Template::Unknown,
        };
    }

    if let Some((required, pubkeys)) = match_multisig(script) {
        return Template::MultiSig { required, pubkeys };
    }

    Template::Unknown
}

fn match_pay_to_pubkey(bytes: &[u8]) -> Option<PublicKey> {
    let (last, rest) = bytes.split_last()?;
    if *last != OP_CHECKSIG.to_u8() {
        return None;
    }
    let (len, key) = rest.split_first()?;
    match (*len as usize, key.len()) {
        (33, 33) | (65, 65) => PublicKey::from_slice(key).ok(),
        _ => None,
    }
}

fn small_int(instruction: Option<Result<Instruction<'_>, script::Error>>) -> Option<usize> {
    match instruction? {
        Ok(Instruction::Op(op))
            if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&op.to_u8()) =>
        {
            Some((op.to_u8() - OP_PUSHNUM_1.to_u8() + 1) as usize)
        }
        _ => None,
    }
}

fn match_multisig(script: &Script) -> Option<(usize, Vec<PublicKey>)> {
    let mut instructions = script.instructions().peekable();

    let required = small_int(instructions.next())?;

    let mut pubkeys = Vec::new();
    while let Some(Ok(Instruction::PushBytes(data))) = instructions.peek() {
        let key = PublicKey::from_slice(data.as_bytes()).ok()?;
        pubkeys.push(key);
        instructions.next();
    }

    let total = small_int(instructions.next())?;
    if total != pubkeys.len() || required > total || total > MAX_PUBKEYS_PER_MULTISIG {
        return None;
    }

    match instructions.next() {
        Some(Ok(Instruction::Op(OP_CHECKMULTISIG))) => {}
        _ => return None,
    }

    if instructions.next().is_some() {
        return None;
    }

    Some((required, pubkeys))
}
