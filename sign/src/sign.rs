// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Unlocking script production
//!
//! [`produce_signature`] resolves a locking script into an unlocking script, one template at a
//! time with [`sign_step`], recording what it collected and what it could not find in a
//! [`SignatureData`]. The transaction-level drivers ([`sign_signature`],
//! [`sign_signature_from_tx`] and [`sign_transaction`]) bind a [`TransactionSignatureCreator`]
//! to each input and write the result back into the transaction.
//!
//! ```
//! # use bitcoin::secp256k1::{Secp256k1, SecretKey};
//! # use bitcoin::{absolute, transaction, Amount, Network, OutPoint, PrivateKey, ScriptBuf};
//! # use bitcoin::{Transaction, TxIn, TxOut};
//! # use script_sign::*;
//! let secp = Secp256k1::new();
//! let key = PrivateKey::new(SecretKey::from_slice(&[1; 32])?, Network::Regtest);
//!
//! let mut provider = FlatSigningProvider::new();
//! let key_id = provider.add_key(key, &secp);
//!
//! let spent = TxOut {
//!     value: Amount::from_sat(50_000),
//!     script_pubkey: ScriptBuf::new_p2pkh(&key_id),
//! };
//! let mut tx = Transaction {
//!     version: transaction::Version::ONE,
//!     lock_time: absolute::LockTime::ZERO,
//!     input: vec![TxIn {
//!         previous_output: OutPoint::null(),
//!         ..Default::default()
//!     }],
//!     output: vec![],
//! };
//!
//! let complete = sign_transaction(&provider, &mut tx, &[spent], &SignOptions::default(), &secp)?;
//! assert!(complete);
//! assert!(!tx.input[0].script_sig.is_empty());
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

use bitcoin::opcodes::all::OP_PUSHBYTES_0;
use bitcoin::script::{Builder, PushBytes};
use bitcoin::{Amount, PublicKey, Script, ScriptBuf, Transaction, TxIn, TxOut};

use crate::creator::{
    SignatureCreator, TransactionSignatureCreator, DUMMY_CHECKER, DUMMY_SIGNATURE_CREATOR,
};
use crate::error::SignerError;
use crate::extract::data_from_transaction;
use crate::interpreter::{verify_script, Stack, VerifyFlags};
use crate::provider::{KeyId, ScriptId, SigningProvider};
use crate::sigdata::SignatureData;
use crate::sighash::SigHashType;
use crate::solver::{solve, Template, TemplateKind};
use crate::SecpCtx;

/// Options for the transaction-level signing drivers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOptions {
    /// Signature hash type used for new signatures
    ///
    /// Defaults to `ALL|FORKID`.
    pub sighash_type: SigHashType,

    /// Whether we should grind ECDSA signature to ensure signing with low r
    /// or not.
    /// Defaults to `true`, i.e., we always grind ECDSA signature to sign with low r.
    pub allow_grinding: bool,
}

impl Default for SignOptions {
    fn default() -> Self {
        SignOptions {
            sighash_type: SigHashType::default(),
            allow_grinding: true,
        }
    }
}

/// Outcome of resolving a single template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Template the script was classified as
    pub kind: TemplateKind,
    /// Whether every item needed by the template was obtained
    pub solved: bool,
    /// Items to push, bottom first. For a script hash, the single item is the redeem script.
    pub stack: Stack,
}

/// Resolve one locking script into the stack items that satisfy it
///
/// Misses are recorded in `sigdata` (`missing_pubkeys`, `missing_sigs`,
/// `missing_redeem_script`); newly made signatures and discovered key origins are cached there
/// as well.
pub fn sign_step(
    provider: &dyn SigningProvider,
    creator: &dyn SignatureCreator,
    script_pubkey: &Script,
    sigdata: &mut SignatureData,
) -> StepResult {
    let template = solve(script_pubkey);
    let kind = template.kind();
    let mut stack = Stack::new();

    let solved = match template {
        Template::Unknown | Template::NullData => false,
        Template::PubKey(pubkey) => {
            match create_sig(creator, sigdata, provider, &pubkey, script_pubkey) {
                Some(sig) => {
                    stack.push(sig);
                    true
                }
                None => false,
            }
        }
        Template::PubKeyHash(key_id) => match get_pubkey(provider, sigdata, &key_id) {
            Some(pubkey) => match create_sig(creator, sigdata, provider, &pubkey, script_pubkey) {
                Some(sig) => {
                    stack.push(sig);
                    stack.push(pubkey.to_bytes());
                    true
                }
                None => false,
            },
            None => {
                tracing::debug!(key_id = %key_id, "public key not found");
                sigdata.missing_pubkeys.push(key_id);
                false
            }
        },
        Template::ScriptHash(script_id) => match get_script(provider, sigdata, &script_id) {
            Some(redeem_script) => {
                stack.push(redeem_script.into_bytes());
                true
            }
            None => {
                tracing::debug!(script_id = %script_id, "redeem script not found");
                sigdata.missing_redeem_script = Some(script_id);
                false
            }
        },
        Template::MultiSig { required, pubkeys } => {
            // CHECKMULTISIG consumes one extra element
            stack.push(Vec::new());
            for pubkey in &pubkeys {
                if stack.len() < required + 1 {
                    if let Some(sig) = create_sig(creator, sigdata, provider, pubkey, script_pubkey)
                    {
                        stack.push(sig);
                    }
                }
            }
            let solved = stack.len() == required + 1;
            while stack.len() < required + 1 {
                stack.push(Vec::new());
            }
            solved
        }
    };

    StepResult {
        kind,
        solved,
        stack,
    }
}

fn get_script(
    provider: &dyn SigningProvider,
    sigdata: &SignatureData,
    script_id: &ScriptId,
) -> Option<ScriptBuf> {
    if let Some(script) = provider.get_script(script_id) {
        return Some(script);
    }
    if sigdata.redeem_script.script_hash() == *script_id {
        return Some(sigdata.redeem_script.clone());
    }
    None
}

fn get_pubkey(
    provider: &dyn SigningProvider,
    sigdata: &mut SignatureData,
    key_id: &KeyId,
) -> Option<PublicKey> {
    if let Some((pubkey, _)) = sigdata.signatures.get(key_id) {
        return Some(*pubkey);
    }
    if let Some((pubkey, _)) = sigdata.misc_pubkeys.get(key_id) {
        return Some(*pubkey);
    }

    let pubkey = provider.get_pubkey(key_id)?;
    if let Some(origin) = provider.get_key_origin(key_id) {
        sigdata
            .misc_pubkeys
            .entry(*key_id)
            .or_insert((pubkey, origin));
    }
    Some(pubkey)
}

fn create_sig(
    creator: &dyn SignatureCreator,
    sigdata: &mut SignatureData,
    provider: &dyn SigningProvider,
    pubkey: &PublicKey,
    script_code: &Script,
) -> Option<Vec<u8>> {
    let key_id = pubkey.pubkey_hash();
    if let Some((_, sig)) = sigdata.signatures.get(&key_id) {
        return Some(sig.clone());
    }

    if let Some(origin) = provider.get_key_origin(&key_id) {
        sigdata
            .misc_pubkeys
            .entry(key_id)
            .or_insert((*pubkey, origin));
    }

    match creator.create_sig(provider, &key_id, script_code) {
        Some(sig) => {
            sigdata.signatures.insert(key_id, (*pubkey, sig.clone()));
            Some(sig)
        }
        None => {
            tracing::trace!(key_id = %key_id, "cannot create signature");
            sigdata.missing_sigs.push(key_id);
            None
        }
    }
}

/// Serialize stack items as a script of pushes
///
/// Empty items become `OP_0` and single bytes 1 to 16 become `OP_1` to `OP_16`; everything
/// else is a length-prefixed push.
pub fn push_all(values: &[Vec<u8>]) -> ScriptBuf {
    let mut builder = Builder::new();
    for value in values {
        builder = match value.as_slice() {
            [] => builder.push_opcode(OP_PUSHBYTES_0),
            [n @ 1..=16] => builder.push_int(i64::from(*n)),
            data => match <&PushBytes>::try_from(data) {
                Ok(push) => builder.push_slice(push),
                Err(_) => {
                    tracing::debug!(len = data.len(), "stack item too large to push, skipped");
                    builder
                }
            },
        };
    }
    builder.into_script()
}

/// Produce the unlocking script for `script_pubkey`
///
/// Does nothing if `sigdata` is already complete. Otherwise the locking script is resolved,
/// following one level of pay-to-script-hash, and the result is stored in
/// `sigdata.script_sig`. The data is marked complete only if that script verifies with the
/// creator's checker under [`VerifyFlags::STANDARD`]. Returns the completeness.
pub fn produce_signature(
    provider: &dyn SigningProvider,
    creator: &dyn SignatureCreator,
    script_pubkey: &Script,
    sigdata: &mut SignatureData,
) -> bool {
    if sigdata.complete {
        return true;
    }

    let StepResult {
        kind,
        mut solved,
        mut stack,
    } = sign_step(provider, creator, script_pubkey, sigdata);

    if solved && kind == TemplateKind::ScriptHash {
        let redeem_script = ScriptBuf::from_bytes(stack.pop().unwrap_or_default());
        sigdata.redeem_script = redeem_script.clone();

        let inner = sign_step(provider, creator, &redeem_script, sigdata);
        solved = inner.solved && inner.kind != TemplateKind::ScriptHash;
        stack = inner.stack;
        stack.push(redeem_script.into_bytes());
    }

    sigdata.script_sig = push_all(&stack);

    sigdata.complete = solved
        && match verify_script(
            &sigdata.script_sig,
            script_pubkey,
            VerifyFlags::STANDARD,
            creator.checker(),
        ) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "produced unlocking script does not verify");
                false
            }
        };

    tracing::trace!(kind = %kind, complete = sigdata.complete, "produced unlocking script");
    sigdata.complete
}

/// Copy the unlocking script of `sigdata` into `txin`
pub fn update_input(txin: &mut TxIn, sigdata: &SignatureData) {
    txin.script_sig = sigdata.script_sig.clone();
}

/// Sign input `input_index` of `tx`, which spends `amount` locked by `script_pubkey`
///
/// The unlocking script is written into the input even when incomplete. Returns whether it is
/// complete.
pub fn sign_signature(
    provider: &dyn SigningProvider,
    script_pubkey: &Script,
    tx: &mut Transaction,
    input_index: usize,
    amount: Amount,
    options: &SignOptions,
    secp: &SecpCtx,
) -> Result<bool, SignerError> {
    if input_index >= tx.input.len() {
        return Err(SignerError::InputIndexOutOfRange);
    }

    let mut sigdata = SignatureData::default();
    let complete = {
        let creator = TransactionSignatureCreator::new(tx, input_index, amount, options, secp);
        produce_signature(provider, &creator, script_pubkey, &mut sigdata)
    };

    update_input(&mut tx.input[input_index], &sigdata);
    Ok(complete)
}

/// Sign input `input_index` of `tx`, looking up the spent output in `tx_from`
pub fn sign_signature_from_tx(
    provider: &dyn SigningProvider,
    tx_from: &Transaction,
    tx: &mut Transaction,
    input_index: usize,
    options: &SignOptions,
    secp: &SecpCtx,
) -> Result<bool, SignerError> {
    let txin = tx
        .input
        .get(input_index)
        .ok_or(SignerError::InputIndexOutOfRange)?;
    let txout = tx_from
        .output
        .get(txin.previous_output.vout as usize)
        .ok_or(SignerError::PrevoutIndexOutOfRange)?;

    sign_signature(
        provider,
        &txout.script_pubkey,
        tx,
        input_index,
        txout.value,
        options,
        secp,
    )
}

/// Sign every input of `tx`, keeping the signatures other parties already put there
///
/// `spent_outputs[i]` is the output spent by input `i`. Returns whether every input is
/// complete.
pub fn sign_transaction(
    provider: &dyn SigningProvider,
    tx: &mut Transaction,
    spent_outputs: &[TxOut],
    options: &SignOptions,
    secp: &SecpCtx,
) -> Result<bool, SignerError> {
    if spent_outputs.len() < tx.input.len() {
        return Err(SignerError::MissingSpentOutput(spent_outputs.len()));
    }

    let mut complete = true;
    for (input_index, spent) in spent_outputs.iter().enumerate().take(tx.input.len()) {
        let sigdata = {
            let mut sigdata = data_from_transaction(tx, input_index, spent, secp)?;
            let creator =
                TransactionSignatureCreator::new(tx, input_index, spent.value, options, secp);
            produce_signature(provider, &creator, &spent.script_pubkey, &mut sigdata);
            sigdata
        };

        tracing::debug!(
            input = input_index,
            complete = sigdata.complete,
            signatures = sigdata.signatures.len(),
            "signed input"
        );
        complete &= sigdata.complete;
        update_input(&mut tx.input[input_index], &sigdata);
    }

    Ok(complete)
}

/// Whether `provider` knows enough to satisfy `script`, private keys aside
pub fn is_solvable(provider: &dyn SigningProvider, script: &Script) -> bool {
    let mut sigdata = SignatureData::default();
    if produce_signature(provider, &DUMMY_SIGNATURE_CREATOR, script, &mut sigdata) {
        debug_assert!(verify_script(
            &sigdata.script_sig,
            script,
            VerifyFlags::STANDARD,
            &DUMMY_CHECKER
        )
        .is_ok());
        return true;
    }
    false
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::creator::DUMMY_MAXIMUM_SIGNATURE_CREATOR;
    use crate::interpreter::eval_push_only;
    use crate::provider::{FlatSigningProvider, DUMMY_SIGNING_PROVIDER};
    use crate::test_utils::{funding_tx, multisig_script, spending_tx, test_keys};
    use bitcoin::opcodes::all::*;

    #[test]
    fn push_all_encoding() {
        let script = push_all(&[vec![], vec![1], vec![16], vec![17], vec![0], vec![0xab; 3]]);
        assert_eq!(
            script.as_bytes(),
            &[
                OP_PUSHBYTES_0.to_u8(),
                OP_PUSHNUM_1.to_u8(),
                OP_PUSHNUM_16.to_u8(),
                0x01,
                17,
                0x01,
                0x00,
                0x03,
                0xab,
                0xab,
                0xab
            ]
        );
        assert_eq!(push_all(&[]), ScriptBuf::new());

        let items = vec![vec![], vec![0x42; 80], vec![7]];
        assert_eq!(eval_push_only(&push_all(&items)), items);
    }

    #[test]
    fn step_unknown_and_null_data() {
        let mut sigdata = SignatureData::default();
        let result = sign_step(
            &DUMMY_SIGNING_PROVIDER,
            &DUMMY_SIGNATURE_CREATOR,
            &ScriptBuf::from_bytes(vec![OP_PUSHNUM_1.to_u8()]),
            &mut sigdata,
        );
        assert_eq!(result.kind, TemplateKind::Unknown);
        assert!(!result.solved);
        assert!(result.stack.is_empty());

        let null_data = Builder::new().push_opcode(OP_RETURN).into_script();
        let result = sign_step(
            &DUMMY_SIGNING_PROVIDER,
            &DUMMY_SIGNATURE_CREATOR,
            &null_data,
            &mut sigdata,
        );
        assert_eq!(result.kind, TemplateKind::NullData);
        assert!(!result.solved);
        assert_eq!(sigdata, SignatureData::default());
    }

    #[test]
    fn step_pubkey_hash_without_pubkey() {
        let (_, pk) = test_keys(1)[0];
        let mut sigdata = SignatureData::default();

        let result = sign_step(
            &DUMMY_SIGNING_PROVIDER,
            &DUMMY_SIGNATURE_CREATOR,
            &ScriptBuf::new_p2pkh(&pk.pubkey_hash()),
            &mut sigdata,
        );
        assert_eq!(result.kind, TemplateKind::PubKeyHash);
        assert!(!result.solved);
        assert_eq!(sigdata.missing_pubkeys, vec![pk.pubkey_hash()]);
        assert!(sigdata.missing_sigs.is_empty());
    }

    #[test]
    fn step_multisig_padding() {
        let keys = test_keys(3);
        let pubkeys: Vec<_> = keys.iter().map(|(_, pk)| *pk).collect();
        let script = multisig_script(2, &pubkeys);

        // one real signature out of two
        let mut sigdata = SignatureData::default();
        sigdata.signatures.insert(
            pubkeys[1].pubkey_hash(),
            (pubkeys[1], vec![0x30, 0x01, 0x41]),
        );
        let secp = SecpCtx::new();
        let funding = funding_tx(script.clone(), Amount::from_sat(10_000));
        let tx = spending_tx(&funding, 0);
        let creator = TransactionSignatureCreator::new(
            &tx,
            0,
            Amount::from_sat(10_000),
            &SignOptions::default(),
            &secp,
        );
        let result = sign_step(&DUMMY_SIGNING_PROVIDER, &creator, &script, &mut sigdata);
        assert!(!result.solved);
        assert_eq!(result.stack, vec![vec![], vec![0x30, 0x01, 0x41], vec![]]);
        assert_eq!(
            sigdata.missing_sigs,
            vec![pubkeys[0].pubkey_hash(), pubkeys[2].pubkey_hash()]
        );

        // stops asking once enough signatures are collected
        let mut sigdata = SignatureData::default();
        let result = sign_step(
            &DUMMY_SIGNING_PROVIDER,
            &DUMMY_SIGNATURE_CREATOR,
            &script,
            &mut sigdata,
        );
        assert!(result.solved);
        assert_eq!(result.stack.len(), 3);
        assert_eq!(sigdata.signatures.len(), 2);
        assert!(!sigdata.signatures.contains_key(&pubkeys[2].pubkey_hash()));
    }

    #[test]
    fn nested_script_hash_is_rejected() {
        let (_, pk) = test_keys(1)[0];
        let inner = ScriptBuf::new_p2pk(&pk);
        let middle = ScriptBuf::new_p2sh(&inner.script_hash());
        let outer = ScriptBuf::new_p2sh(&middle.script_hash());

        let mut provider = FlatSigningProvider::new();
        provider.add_script(inner.clone());
        provider.add_script(middle.clone());

        let mut sigdata = SignatureData::default();
        assert!(!produce_signature(
            &provider,
            &DUMMY_SIGNATURE_CREATOR,
            &outer,
            &mut sigdata
        ));
        assert_eq!(sigdata.redeem_script, middle);

        let mut sigdata = SignatureData::default();
        assert!(produce_signature(
            &provider,
            &DUMMY_SIGNATURE_CREATOR,
            &middle,
            &mut sigdata
        ));
        assert_eq!(sigdata.redeem_script, inner);
    }

    #[test]
    fn missing_redeem_script() {
        let (_, pk) = test_keys(1)[0];
        let redeem = ScriptBuf::new_p2pk(&pk);
        let script_pubkey = ScriptBuf::new_p2sh(&redeem.script_hash());

        let mut sigdata = SignatureData::default();
        assert!(!produce_signature(
            &DUMMY_SIGNING_PROVIDER,
            &DUMMY_SIGNATURE_CREATOR,
            &script_pubkey,
            &mut sigdata
        ));
        assert_eq!(sigdata.missing_redeem_script, Some(redeem.script_hash()));
        assert!(sigdata.script_sig.is_empty());

        // a redeem script already known from another signer is enough
        let mut sigdata = SignatureData {
            redeem_script: redeem.clone(),
            ..Default::default()
        };
        assert!(produce_signature(
            &DUMMY_SIGNING_PROVIDER,
            &DUMMY_SIGNATURE_CREATOR,
            &script_pubkey,
            &mut sigdata
        ));
    }

    #[test]
    fn maximum_size_placeholders() {
        let (_, pk) = test_keys(1)[0];

        let mut sigdata = SignatureData::default();
        assert!(produce_signature(
            &DUMMY_SIGNING_PROVIDER,
            &DUMMY_MAXIMUM_SIGNATURE_CREATOR,
            &ScriptBuf::new_p2pk(&pk),
            &mut sigdata
        ));
        // one length byte and a 72-byte signature
        assert_eq!(sigdata.script_sig.len(), 73);

        let mut sigdata = SignatureData::default();
        assert!(produce_signature(
            &DUMMY_SIGNING_PROVIDER,
            &DUMMY_MAXIMUM_SIGNATURE_CREATOR,
            &multisig_script(1, &[pk]),
            &mut sigdata
        ));
        assert_eq!(sigdata.script_sig.len(), 74);
    }

    #[test]
    fn oversized_redeem_script_is_not_complete() {
        let secp = SecpCtx::new();
        let keys = test_keys(16);
        let pubkeys: Vec<_> = keys.iter().map(|(_, pk)| *pk).collect();
        let redeem_script = multisig_script(1, &pubkeys);
        assert_eq!(redeem_script.len(), 547);

        let mut provider = FlatSigningProvider::new();
        provider.add_key(keys[0].0, &secp);
        let script_pubkey = ScriptBuf::new_p2sh(&provider.add_script(redeem_script.clone()));

        let mut sigdata = SignatureData::default();
        assert!(!produce_signature(
            &provider,
            &DUMMY_SIGNATURE_CREATOR,
            &script_pubkey,
            &mut sigdata
        ));
        assert_eq!(sigdata.redeem_script, redeem_script);
        assert!(!is_solvable(&provider, &script_pubkey));

        let funding = funding_tx(script_pubkey.clone(), Amount::from_sat(10_000));
        let mut tx = spending_tx(&funding, 0);
        let complete = sign_signature(
            &provider,
            &script_pubkey,
            &mut tx,
            0,
            Amount::from_sat(10_000),
            &SignOptions::default(),
            &secp,
        )
        .unwrap();
        assert!(!complete);
    }

    #[test]
    fn driver_preconditions() {
        let secp = SecpCtx::new();
        let (_, pk) = test_keys(1)[0];
        let script_pubkey = ScriptBuf::new_p2pk(&pk);
        let funding = funding_tx(script_pubkey.clone(), Amount::ONE_BTC);
        let mut tx = spending_tx(&funding, 0);
        let options = SignOptions::default();

        assert!(matches!(
            sign_signature(
                &DUMMY_SIGNING_PROVIDER,
                &script_pubkey,
                &mut tx,
                1,
                Amount::ONE_BTC,
                &options,
                &secp
            ),
            Err(SignerError::InputIndexOutOfRange)
        ));

        tx.input[0].previous_output.vout = 3;
        assert!(matches!(
            sign_signature_from_tx(&DUMMY_SIGNING_PROVIDER, &funding, &mut tx, 0, &options, &secp),
            Err(SignerError::PrevoutIndexOutOfRange)
        ));

        assert!(matches!(
            sign_transaction(&DUMMY_SIGNING_PROVIDER, &mut tx, &[], &options, &secp),
            Err(SignerError::MissingSpentOutput(0))
        ));
    }
}
