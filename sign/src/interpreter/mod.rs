// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Script interpreter
//!
//! A small stack machine able to execute every standard locking template (pay-to-pubkey,
//! pay-to-pubkey-hash, bare multisig and pay-to-script-hash wrapping any of them) together with
//! the matching unlocking scripts. Opcodes outside of that set are rejected with
//! [`ScriptError::BadOpcode`].
//!
//! Signature checking is delegated to a [`SignatureChecker`], which lets the same interpreter
//! verify real transactions, accept placeholder signatures during size estimation, or record
//! every successful check while extracting signatures.

mod error;
mod flags;

pub use error::ScriptError;
pub use flags::VerifyFlags;

use bitcoin::hashes::{hash160, sha256, sha256d, Hash};
use bitcoin::opcodes::all::*;
use bitcoin::opcodes::Opcode;
use bitcoin::script::{Instruction, Script};
use bitcoin::secp256k1::ecdsa::Signature;

use crate::sighash::SigHashType;

/// Evaluation stack, bottom element first
pub type Stack = Vec<Vec<u8>>;

/// Maximum number of public keys in a CHECKMULTISIG
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

/// Maximum size of a stack element in bytes
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum size of a script in bytes
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum number of non-push operations per script
pub const MAX_OPS_PER_SCRIPT: usize = 201;

/// Maximum number of elements on the stack
pub const MAX_STACK_SIZE: usize = 1_000;

const MAX_SCRIPT_NUM_LENGTH: usize = 4;

/// Checks one signature for one public key over a script code
pub trait SignatureChecker {
    /// Return `true` if `signature` (DER plus trailing sighash byte) is valid for `pubkey`
    fn check_sig(
        &self,
        signature: &[u8],
        pubkey: &[u8],
        script_code: &Script,
        flags: VerifyFlags,
    ) -> bool;
}

/// Checker that rejects every signature
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseSignatureChecker;

impl SignatureChecker for BaseSignatureChecker {
    fn check_sig(&self, _: &[u8], _: &[u8], _: &Script, _: VerifyFlags) -> bool {
        false
    }
}

/// Whether the script only contains push operations
///
/// Unparseable scripts are not push-only.
pub fn is_push_only(script: &Script) -> bool {
    script.instructions().all(|ins| match ins {
        Ok(Instruction::PushBytes(_)) => true,
        Ok(Instruction::Op(op)) => op.to_u8() <= OP_PUSHNUM_16.to_u8(),
        Err(_) => false,
    })
}

/// Replay a push-only script and return the resulting stack
///
/// Evaluation errors are ignored: the stack built up to the failing instruction is returned.
pub fn eval_push_only(script: &Script) -> Stack {
    let mut stack = Stack::new();
    if let Err(e) = eval_script(&mut stack, script, VerifyFlags::NONE, &BaseSignatureChecker) {
        tracing::trace!(error = %e, "push-only replay stopped early");
    }
    stack
}

/// Verify `script_sig` against `script_pubkey`
pub fn verify_script(
    script_sig: &Script,
    script_pubkey: &Script,
    flags: VerifyFlags,
    checker: &dyn SignatureChecker,
) -> Result<(), ScriptError> {
    if flags.contains(VerifyFlags::SIGPUSHONLY) && !is_push_only(script_sig) {
        return Err(ScriptError::SigPushOnly);
    }

    let mut stack = Stack::new();
    eval_script(&mut stack, script_sig, flags, checker)?;
    let unlocking_stack = stack.clone();

    eval_script(&mut stack, script_pubkey, flags, checker)?;
    if !stack.last().map(|top| cast_to_bool(top)).unwrap_or(false) {
        return Err(ScriptError::EvalFalse);
    }

    if flags.contains(VerifyFlags::P2SH) && script_pubkey.is_p2sh() {
        if !is_push_only(script_sig) {
            return Err(ScriptError::SigPushOnly);
        }

        stack = unlocking_stack;
        let serialized = stack.pop().ok_or(ScriptError::InvalidStackOperation)?;
        let redeem_script = Script::from_bytes(&serialized);

        eval_script(&mut stack, redeem_script, flags, checker)?;
        if !stack.last().map(|top| cast_to_bool(top)).unwrap_or(false) {
            return Err(ScriptError::EvalFalse);
        }
    }

    if flags.contains(VerifyFlags::CLEANSTACK) && stack.len() != 1 {
        return Err(ScriptError::CleanStack);
    }

    Ok(())
}

/// Evaluate `script` on top of `stack`
pub fn eval_script(
    stack: &mut Stack,
    script: &Script,
    flags: VerifyFlags,
    checker: &dyn SignatureChecker,
) -> Result<(), ScriptError> {
    if script.len() > MAX_SCRIPT_SIZE {
        return Err(ScriptError::ScriptSize);
    }

    let instructions = if flags.contains(VerifyFlags::MINIMALDATA) {
        script.instructions_minimal()
    } else {
        script.instructions()
    };

    let mut op_count = 0;
    for instruction in instructions {
        match instruction? {
            Instruction::PushBytes(data) => {
                if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
                    return Err(ScriptError::PushSize);
                }
                stack.push(data.as_bytes().to_vec());
            }
            Instruction::Op(op) => {
                if op.to_u8() > OP_PUSHNUM_16.to_u8() {
                    op_count += 1;
                    if op_count > MAX_OPS_PER_SCRIPT {
                        return Err(ScriptError::OpCount);
                    }
                }
                execute_opcode(op, stack, script, flags, checker)?;
            }
        }

        if stack.len() > MAX_STACK_SIZE {
            return Err(ScriptError::StackSize);
        }
    }

    Ok(())
}

fn execute_opcode(
    op: Opcode,
    stack: &mut Stack,
    script_code: &Script,
    flags: VerifyFlags,
    checker: &dyn SignatureChecker,
) -> Result<(), ScriptError> {
    let code = op.to_u8();
    if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&code) {
        stack.push(vec![code - OP_PUSHNUM_1.to_u8() + 1]);
        return Ok(());
    }

    match op {
        OP_PUSHNUM_NEG1 => stack.push(vec![0x81]),
        OP_NOP => {}
        OP_RETURN => return Err(ScriptError::OpReturn),
        OP_VERIFY => {
            if !cast_to_bool(&pop(stack)?) {
                return Err(ScriptError::Verify);
            }
        }
        OP_DROP => {
            pop(stack)?;
        }
        OP_DUP => {
            let top = top(stack, 1)?.clone();
            stack.push(top);
        }
        OP_EQUAL | OP_EQUALVERIFY => {
            let b = pop(stack)?;
            let a = pop(stack)?;
            let equal = a == b;
            if op == OP_EQUALVERIFY {
                if !equal {
                    return Err(ScriptError::EqualVerify);
                }
            } else {
                stack.push(encode_bool(equal));
            }
        }
        OP_SHA256 => {
            let data = pop(stack)?;
            stack.push(sha256::Hash::hash(&data).to_byte_array().to_vec());
        }
        OP_HASH160 => {
            let data = pop(stack)?;
            stack.push(hash160::Hash::hash(&data).to_byte_array().to_vec());
        }
        OP_HASH256 => {
            let data = pop(stack)?;
            stack.push(sha256d::Hash::hash(&data).to_byte_array().to_vec());
        }
        OP_CHECKSIG | OP_CHECKSIGVERIFY => {
            let pubkey = pop(stack)?;
            let sig = pop(stack)?;

            check_signature_encoding(&sig, flags)?;
            check_pubkey_encoding(&pubkey, flags)?;

            let success = checker.check_sig(&sig, &pubkey, script_code, flags);
            if !success && flags.contains(VerifyFlags::NULLFAIL) && !sig.is_empty() {
                return Err(ScriptError::NullFail);
            }

            if op == OP_CHECKSIGVERIFY {
                if !success {
                    return Err(ScriptError::CheckSigVerify);
                }
            } else {
                stack.push(encode_bool(success));
            }
        }
        OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
            let success = check_multisig(stack, script_code, flags, checker)?;
            if op == OP_CHECKMULTISIGVERIFY {
                if !success {
                    return Err(ScriptError::CheckMultiSigVerify);
                }
            } else {
                stack.push(encode_bool(success));
            }
        }
        _ => return Err(ScriptError::BadOpcode(op)),
    }

    Ok(())
}

// Stack layout, top last:
// <dummy> <sig_1> .. <sig_m> <m> <pubkey_1> .. <pubkey_n> <n>
fn check_multisig(
    stack: &mut Stack,
    script_code: &Script,
    flags: VerifyFlags,
    checker: &dyn SignatureChecker,
) -> Result<bool, ScriptError> {
    let require_minimal = flags.contains(VerifyFlags::MINIMALDATA);

    let mut i = 1;
    let key_count = script_num(top(stack, i)?, require_minimal)?;
    if key_count < 0 || key_count > MAX_PUBKEYS_PER_MULTISIG as i64 {
        return Err(ScriptError::PubkeyCount);
    }
    let mut key_count = key_count as usize;

    i += 1;
    let mut ikey = i;
    i += key_count;

    let sig_count = script_num(top(stack, i)?, require_minimal)?;
    if sig_count < 0 || sig_count > key_count as i64 {
        return Err(ScriptError::SigCount);
    }
    let mut sig_count = sig_count as usize;

    i += 1;
    let first_sig = i;
    let mut isig = i;
    i += sig_count;
    if stack.len() < i {
        return Err(ScriptError::InvalidStackOperation);
    }

    // Signatures are matched against keys from the top of the stack down, so both lists are
    // walked in reverse script order.
    let mut success = true;
    while success && sig_count > 0 {
        let sig = top(stack, isig)?;
        let pubkey = top(stack, ikey)?;

        check_signature_encoding(sig, flags)?;
        check_pubkey_encoding(pubkey, flags)?;

        if checker.check_sig(sig, pubkey, script_code, flags) {
            isig += 1;
            sig_count -= 1;
        }
        ikey += 1;
        key_count -= 1;

        if sig_count > key_count {
            success = false;
        }
    }

    if !success && flags.contains(VerifyFlags::NULLFAIL) {
        for pos in first_sig..i {
            if !top(stack, pos)?.is_empty() {
                return Err(ScriptError::NullFail);
            }
        }
    }

    stack.truncate(stack.len() - (i - 1));

    // The legacy implementation consumes one element more than it uses.
    let dummy = pop(stack)?;
    if flags.contains(VerifyFlags::NULLDUMMY) && !dummy.is_empty() {
        return Err(ScriptError::SigNullDummy);
    }

    Ok(success)
}

/// `pos` counts from the top of the stack, starting at 1
fn top(stack: &Stack, pos: usize) -> Result<&Vec<u8>, ScriptError> {
    stack
        .len()
        .checked_sub(pos)
        .and_then(|idx| stack.get(idx))
        .ok_or(ScriptError::InvalidStackOperation)
}

fn pop(stack: &mut Stack) -> Result<Vec<u8>, ScriptError> {
    stack.pop().ok_or(ScriptError::InvalidStackOperation)
}

fn encode_bool(value: bool) -> Vec<u8> {
    if value {
        vec![1]
    } else {
        vec![]
    }
}

/// Interpret a stack element as a boolean
///
/// Any non-zero byte makes it true, except for a "negative zero" (sign bit in the last byte).
pub fn cast_to_bool(data: &[u8]) -> bool {
    for (i, byte) in data.iter().enumerate() {
        if *byte != 0 {
            return !(i == data.len() - 1 && *byte == 0x80);
        }
    }
    false
}

fn script_num(data: &[u8], require_minimal: bool) -> Result<i64, ScriptError> {
    if data.len() > MAX_SCRIPT_NUM_LENGTH {
        return Err(ScriptError::NumberOverflow);
    }

    if require_minimal {
        if let Some(last) = data.last() {
            // The most significant byte may only be zero (besides the sign bit) when it is
            // needed to hold the sign of the byte before it.
            if last & 0x7f == 0 && (data.len() <= 1 || data[data.len() - 2] & 0x80 == 0) {
                return Err(ScriptError::MinimalData);
            }
        }
    }

    let last = match data.last() {
        Some(last) => last,
        None => return Ok(0),
    };

    let mut result: i64 = 0;
    for (i, byte) in data.iter().enumerate() {
        result |= i64::from(*byte) << (8 * i);
    }

    if last & 0x80 != 0 {
        let mask = !(0x80_i64 << (8 * (data.len() - 1)));
        Ok(-(result & mask))
    } else {
        Ok(result)
    }
}

fn check_signature_encoding(sig: &[u8], flags: VerifyFlags) -> Result<(), ScriptError> {
    // Empty signatures are always allowed: they are how a check is skipped.
    if sig.is_empty() {
        return Ok(());
    }

    if flags.contains_any(&[
        VerifyFlags::DERSIG,
        VerifyFlags::LOW_S,
        VerifyFlags::STRICTENC,
    ]) && !is_valid_signature_encoding(sig)
    {
        return Err(ScriptError::SigDer);
    }

    if flags.contains(VerifyFlags::LOW_S) && !is_low_der_signature(sig) {
        return Err(ScriptError::SigHighS);
    }

    if flags.contains(VerifyFlags::STRICTENC) {
        let sighash_type = SigHashType::from_signature(sig).ok_or(ScriptError::SigHashType)?;
        if !sighash_type.is_defined() {
            return Err(ScriptError::SigHashType);
        }

        let fork_id_enabled = flags.contains(VerifyFlags::ENABLE_SIGHASH_FORKID);
        if !fork_id_enabled && sighash_type.has_fork_id() {
            return Err(ScriptError::IllegalForkId);
        }
        if fork_id_enabled && !sighash_type.has_fork_id() {
            return Err(ScriptError::MustUseForkId);
        }
    }

    Ok(())
}

fn check_pubkey_encoding(pubkey: &[u8], flags: VerifyFlags) -> Result<(), ScriptError> {
    if !flags.contains(VerifyFlags::STRICTENC) {
        return Ok(());
    }

    match (pubkey.len(), pubkey.first()) {
        (33, Some(0x02)) | (33, Some(0x03)) | (65, Some(0x04)) => Ok(()),
        _ => Err(ScriptError::PubkeyType),
    }
}

/// Strict DER check of a signature carrying a trailing sighash byte (BIP66)
///
/// Format: 0x30 [total-length] 0x02 [R-length] [R] 0x02 [S-length] [S] [sighash]
pub fn is_valid_signature_encoding(sig: &[u8]) -> bool {
    if sig.len() < 9 || sig.len() > 73 {
        return false;
    }
    if sig[0] != 0x30 || sig[1] as usize != sig.len() - 3 {
        return false;
    }

    let len_r = sig[3] as usize;
    if 5 + len_r >= sig.len() {
        return false;
    }
    let len_s = sig[5 + len_r] as usize;
    if len_r + len_s + 7 != sig.len() {
        return false;
    }

    if sig[2] != 0x02 || len_r == 0 || sig[4] & 0x80 != 0 {
        return false;
    }
    if len_r > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
        return false;
    }

    if sig[len_r + 4] != 0x02 || len_s == 0 || sig[len_r + 6] & 0x80 != 0 {
        return false;
    }
    if len_s > 1 && sig[len_r + 6] == 0x00 && sig[len_r + 7] & 0x80 == 0 {
        return false;
    }

    true
}

fn is_low_der_signature(sig: &[u8]) -> bool {
    let der = match sig.split_last() {
        Some((_, der)) => der,
        None => return false,
    };
    match Signature::from_der_lax(der) {
        Ok(parsed) => {
            let mut normalized = parsed;
            normalized.normalize_s();
            normalized == parsed
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;
    use bitcoin::script::{Builder, PushBytes};
    use bitcoin::ScriptBuf;

    fn push(data: &[u8]) -> &PushBytes {
        <&PushBytes>::try_from(data).unwrap()
    }

    struct AcceptAll;

    impl SignatureChecker for AcceptAll {
        fn check_sig(&self, _: &[u8], _: &[u8], _: &Script, _: VerifyFlags) -> bool {
            true
        }
    }

    fn dummy_sig() -> Vec<u8> {
        let mut sig = vec![0u8; 71];
        sig[0] = 0x30;
        sig[1] = 68;
        sig[2] = 0x02;
        sig[3] = 32;
        sig[4] = 0x01;
        sig[36] = 0x02;
        sig[37] = 32;
        sig[38] = 0x01;
        sig[70] = 0x41;
        sig
    }

    fn dummy_pubkey() -> Vec<u8> {
        let mut pk = vec![0x11; 33];
        pk[0] = 0x02;
        pk
    }

    #[test]
    fn push_only_replay() {
        let script = Builder::new()
            .push_int(0)
            .push_int(5)
            .push_slice(push(&[0xab, 0xcd]))
            .into_script();
        assert!(is_push_only(&script));
        assert_eq!(eval_push_only(&script), vec![vec![], vec![5], vec![0xab, 0xcd]]);

        let script = Builder::new()
            .push_int(1)
            .push_opcode(OP_DUP)
            .into_script();
        assert!(!is_push_only(&script));
    }

    #[test]
    fn truncated_push_is_not_push_only() {
        let script = ScriptBuf::from_bytes(vec![0x05, 0x01]);
        assert!(!is_push_only(&script));
        assert!(eval_push_only(&script).is_empty());
    }

    #[test]
    fn bool_casting() {
        assert!(!cast_to_bool(&[]));
        assert!(!cast_to_bool(&[0, 0]));
        assert!(!cast_to_bool(&[0, 0x80]));
        assert!(cast_to_bool(&[0x80, 0]));
        assert!(cast_to_bool(&[1]));
    }

    #[test]
    fn script_numbers() {
        assert_eq!(script_num(&[], true), Ok(0));
        assert_eq!(script_num(&[0x10], true), Ok(16));
        assert_eq!(script_num(&[0x81], true), Ok(-1));
        assert_eq!(script_num(&[0xff, 0x00], true), Ok(255));
        assert_eq!(script_num(&[0x05, 0x00], true), Err(ScriptError::MinimalData));
        assert_eq!(script_num(&[0x05, 0x00], false), Ok(5));
        assert_eq!(script_num(&[1, 2, 3, 4, 5], false), Err(ScriptError::NumberOverflow));
    }

    #[test]
    fn signature_encoding() {
        let sig = dummy_sig();
        assert!(is_valid_signature_encoding(&sig));
        assert!(!is_valid_signature_encoding(&sig[..sig.len() - 1]));

        let mut negative_r = sig.clone();
        negative_r[4] = 0x81;
        assert!(!is_valid_signature_encoding(&negative_r));

        assert_eq!(check_signature_encoding(&sig, VerifyFlags::STANDARD), Ok(()));
        assert_eq!(check_signature_encoding(&[], VerifyFlags::STANDARD), Ok(()));

        let mut no_fork_id = sig.clone();
        no_fork_id[70] = 0x01;
        assert_eq!(
            check_signature_encoding(&no_fork_id, VerifyFlags::STANDARD),
            Err(ScriptError::MustUseForkId)
        );
        assert_eq!(
            check_signature_encoding(&sig, VerifyFlags::STRICTENC),
            Err(ScriptError::IllegalForkId)
        );

        let mut undefined = sig;
        undefined[70] = 0x44;
        assert_eq!(
            check_signature_encoding(&undefined, VerifyFlags::STANDARD),
            Err(ScriptError::SigHashType)
        );
    }

    #[test]
    fn pubkey_encoding() {
        assert_eq!(check_pubkey_encoding(&dummy_pubkey(), VerifyFlags::STANDARD), Ok(()));
        assert_eq!(
            check_pubkey_encoding(&[0x05; 33], VerifyFlags::STANDARD),
            Err(ScriptError::PubkeyType)
        );
        assert_eq!(check_pubkey_encoding(&[0x05; 33], VerifyFlags::NONE), Ok(()));
    }

    #[test]
    fn multisig_consumes_dummy_element() {
        let pk = dummy_pubkey();
        let script_pubkey = Builder::new()
            .push_int(1)
            .push_slice(push(&pk))
            .push_int(1)
            .push_opcode(OP_CHECKMULTISIG)
            .into_script();

        let sig = dummy_sig();
        let push_sig = push(&sig);

        let with_dummy = Builder::new().push_int(0).push_slice(push_sig).into_script();
        assert_eq!(
            verify_script(&with_dummy, &script_pubkey, VerifyFlags::STANDARD, &AcceptAll),
            Ok(())
        );

        let without_dummy = Builder::new().push_slice(push_sig).into_script();
        assert_eq!(
            verify_script(&without_dummy, &script_pubkey, VerifyFlags::STANDARD, &AcceptAll),
            Err(ScriptError::InvalidStackOperation)
        );

        let non_null_dummy = Builder::new().push_int(1).push_slice(push_sig).into_script();
        assert_eq!(
            verify_script(&non_null_dummy, &script_pubkey, VerifyFlags::STANDARD, &AcceptAll),
            Err(ScriptError::SigNullDummy)
        );
    }

    #[test]
    fn failed_checks_with_signatures_hit_nullfail() {
        let pk = dummy_pubkey();
        let script_pubkey = Builder::new()
            .push_slice(push(&pk))
            .push_opcode(OP_CHECKSIG)
            .into_script();
        let sig = dummy_sig();
        let script_sig = Builder::new()
            .push_slice(push(&sig))
            .into_script();

        assert_eq!(
            verify_script(&script_sig, &script_pubkey, VerifyFlags::STANDARD, &BaseSignatureChecker),
            Err(ScriptError::NullFail)
        );
        assert_eq!(
            verify_script(&script_sig, &script_pubkey, VerifyFlags::MANDATORY, &BaseSignatureChecker),
            Err(ScriptError::EvalFalse)
        );
    }

    #[test]
    fn unlocking_script_must_be_push_only() {
        let script_pubkey = Builder::new().push_int(1).into_script();
        let script_sig = Builder::new().push_int(1).push_opcode(OP_DROP).into_script();
        assert_eq!(
            verify_script(&script_sig, &script_pubkey, VerifyFlags::STANDARD, &AcceptAll),
            Err(ScriptError::SigPushOnly)
        );
    }

    #[test]
    fn clean_stack_and_unsupported_opcodes() {
        let script_pubkey = Builder::new().push_int(1).into_script();
        let script_sig = Builder::new().push_int(1).into_script();
        assert_eq!(
            verify_script(&script_sig, &script_pubkey, VerifyFlags::STANDARD, &AcceptAll),
            Err(ScriptError::CleanStack)
        );
        assert_eq!(
            verify_script(&script_sig, &script_pubkey, VerifyFlags::MANDATORY, &AcceptAll),
            Ok(())
        );

        let script_pubkey = Builder::new().push_opcode(OP_IF).into_script();
        assert_matches!(
            verify_script(&ScriptBuf::new(), &script_pubkey, VerifyFlags::NONE, &AcceptAll),
            Err(ScriptError::BadOpcode(_))
        );
    }

    #[test]
    fn resource_limits() {
        let eval = |script: ScriptBuf| {
            let mut stack = Stack::new();
            eval_script(&mut stack, &script, VerifyFlags::STANDARD, &AcceptAll)
        };
        let push_of = |len: usize| {
            let data = bitcoin::script::PushBytesBuf::try_from(vec![0x42; len]).unwrap();
            Builder::new().push_slice(data).into_script()
        };

        assert_eq!(eval(push_of(MAX_SCRIPT_ELEMENT_SIZE)), Ok(()));
        assert_eq!(
            eval(push_of(MAX_SCRIPT_ELEMENT_SIZE + 1)),
            Err(ScriptError::PushSize)
        );

        let nops = |n: usize| ScriptBuf::from_bytes(vec![OP_NOP.to_u8(); n]);
        assert_eq!(eval(nops(MAX_OPS_PER_SCRIPT)), Ok(()));
        assert_eq!(eval(nops(MAX_OPS_PER_SCRIPT + 1)), Err(ScriptError::OpCount));
        assert_eq!(eval(nops(MAX_SCRIPT_SIZE + 1)), Err(ScriptError::ScriptSize));

        // small integers are not counted as operations
        let ones = |n: usize| ScriptBuf::from_bytes(vec![OP_PUSHNUM_1.to_u8(); n]);
        assert_eq!(eval(ones(MAX_STACK_SIZE)), Ok(()));
        assert_eq!(eval(ones(MAX_STACK_SIZE + 1)), Err(ScriptError::StackSize));

        // an oversized redeem script cannot be pushed by the unlocking script
        let script_sig = push_of(MAX_SCRIPT_ELEMENT_SIZE + 1);
        let redeem_script = ScriptBuf::from_bytes(vec![0x42; MAX_SCRIPT_ELEMENT_SIZE + 1]);
        let script_pubkey = ScriptBuf::new_p2sh(&redeem_script.script_hash());
        assert_eq!(
            verify_script(&script_sig, &script_pubkey, VerifyFlags::STANDARD, &AcceptAll),
            Err(ScriptError::PushSize)
        );
    }
}
