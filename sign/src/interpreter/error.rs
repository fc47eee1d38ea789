// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Interpreter error type.

use core::fmt;

use bitcoin::opcodes::Opcode;
use bitcoin::script;

/// Reason a script failed to evaluate or verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The script could not be parsed (truncated push, non-minimal push under `MINIMALDATA`)
    Parse(script::Error),
    /// Opcode not supported by this interpreter
    BadOpcode(Opcode),
    /// The script is larger than `MAX_SCRIPT_SIZE`
    ScriptSize,
    /// A push is larger than `MAX_SCRIPT_ELEMENT_SIZE`
    PushSize,
    /// More than `MAX_OPS_PER_SCRIPT` non-push operations
    OpCount,
    /// More than `MAX_STACK_SIZE` stack elements
    StackSize,
    /// OP_RETURN was executed
    OpReturn,
    /// Evaluation ended with an empty stack or a false top element
    EvalFalse,
    /// An opcode required more stack elements than available
    InvalidStackOperation,
    /// OP_VERIFY failed
    Verify,
    /// OP_EQUALVERIFY failed
    EqualVerify,
    /// OP_CHECKSIGVERIFY failed
    CheckSigVerify,
    /// OP_CHECKMULTISIGVERIFY failed
    CheckMultiSigVerify,
    /// Public key count out of range in CHECKMULTISIG
    PubkeyCount,
    /// Signature count out of range in CHECKMULTISIG
    SigCount,
    /// A script number was longer than four bytes
    NumberOverflow,
    /// A script number was not minimally encoded
    MinimalData,
    /// The unlocking script contained non-push operations
    SigPushOnly,
    /// More than one element left on the stack
    CleanStack,
    /// The extra CHECKMULTISIG argument was not empty
    SigNullDummy,
    /// A failed signature check used a non-empty signature
    NullFail,
    /// Signature is not strict DER
    SigDer,
    /// Signature has a high S value
    SigHighS,
    /// Signature hash type is not defined
    SigHashType,
    /// Signature uses the fork id while it is not enabled
    IllegalForkId,
    /// Signature does not use the fork id while it is required
    MustUseForkId,
    /// Public key has an unsupported encoding
    PubkeyType,
}

impl From<script::Error> for ScriptError {
    fn from(e: script::Error) -> Self {
        ScriptError::Parse(e)
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Script parse error: {}", err),
            Self::BadOpcode(op) => write!(f, "Unsupported opcode {}", op),
            Self::ScriptSize => write!(f, "Script is too big"),
            Self::PushSize => write!(f, "Push value size limit exceeded"),
            Self::OpCount => write!(f, "Operation limit exceeded"),
            Self::StackSize => write!(f, "Stack size limit exceeded"),
            Self::OpReturn => write!(f, "OP_RETURN was encountered"),
            Self::EvalFalse => write!(f, "Script evaluated without error but finished with a false/empty top stack element"),
            Self::InvalidStackOperation => write!(f, "Operation not valid with the current stack size"),
            Self::Verify => write!(f, "Script failed an OP_VERIFY operation"),
            Self::EqualVerify => write!(f, "Script failed an OP_EQUALVERIFY operation"),
            Self::CheckSigVerify => write!(f, "Script failed an OP_CHECKSIGVERIFY operation"),
            Self::CheckMultiSigVerify => write!(f, "Script failed an OP_CHECKMULTISIGVERIFY operation"),
            Self::PubkeyCount => write!(f, "Pubkey count negative or limit exceeded"),
            Self::SigCount => write!(f, "Signature count negative or greater than pubkey count"),
            Self::NumberOverflow => write!(f, "Script number overflow"),
            Self::MinimalData => write!(f, "Data push larger than necessary"),
            Self::SigPushOnly => write!(f, "Only push operators allowed in signatures"),
            Self::CleanStack => write!(f, "Stack size must be exactly one after execution"),
            Self::SigNullDummy => write!(f, "Dummy CHECKMULTISIG argument must be zero"),
            Self::NullFail => write!(f, "Signature must be zero for failed CHECK(MULTI)SIG operation"),
            Self::SigDer => write!(f, "Non-canonical DER signature"),
            Self::SigHighS => write!(f, "Non-canonical signature: S value is unnecessarily high"),
            Self::SigHashType => write!(f, "Signature hash type missing or not understood"),
            Self::IllegalForkId => write!(f, "Illegal use of SIGHASH_FORKID"),
            Self::MustUseForkId => write!(f, "Signature must use SIGHASH_FORKID"),
            Self::PubkeyType => write!(f, "Public key is neither compressed or uncompressed"),
        }
    }
}

impl std::error::Error for ScriptError {}
