// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Signature extraction from partially signed inputs

use alloc::collections::BTreeMap;
use core::cell::RefCell;

use bitcoin::{PublicKey, Script, ScriptBuf, Transaction, TxOut};

use crate::creator::TransactionSignatureChecker;
use crate::error::SignerError;
use crate::interpreter::{
    eval_push_only, is_push_only, verify_script, SignatureChecker, Stack, VerifyFlags,
};
use crate::provider::KeyId;
use crate::sigdata::{SigPair, SignatureData};
use crate::solver::{solve, Template};
use crate::SecpCtx;

/// Checker that records every signature accepted by the wrapped checker
pub struct SignatureExtractorChecker<'a> {
    checker: &'a dyn SignatureChecker,
    signatures: RefCell<BTreeMap<KeyId, SigPair>>,
}

impl<'a> SignatureExtractorChecker<'a> {
    /// Wrap `checker`
    pub fn new(checker: &'a dyn SignatureChecker) -> Self {
        SignatureExtractorChecker {
            checker,
            signatures: RefCell::new(BTreeMap::new()),
        }
    }

    /// Whether a signature has been recorded for `key_id`
    pub fn has_signature(&self, key_id: &KeyId) -> bool {
        self.signatures.borrow().contains_key(key_id)
    }

    /// Signatures recorded so far
    pub fn into_signatures(self) -> BTreeMap<KeyId, SigPair> {
        self.signatures.into_inner()
    }
}

impl SignatureChecker for SignatureExtractorChecker<'_> {
    fn check_sig(
        &self,
        signature: &[u8],
        pubkey: &[u8],
        script_code: &Script,
        flags: VerifyFlags,
    ) -> bool {
        if !self.checker.check_sig(signature, pubkey, script_code, flags) {
            return false;
        }
        if let Ok(pubkey) = PublicKey::from_slice(pubkey) {
            self.signatures
                .borrow_mut()
                .entry(pubkey.pubkey_hash())
                .or_insert_with(|| (pubkey, signature.to_vec()));
        }
        true
    }
}

/// Recover the signing state of input `input_index` of `tx`, which spends `txout`
///
/// If the unlocking script already verifies, the result is complete and holds every signature
/// it checked. Otherwise the redeem script of a pay-to-script-hash output is recovered from the
/// top of the stack, and the signatures of a (possibly wrapped) multisig are matched to its
/// public keys. Signatures are expected in public key order; others are left out.
///
/// Never fails because of the script content, only if `input_index` is out of range.
pub fn data_from_transaction(
    tx: &Transaction,
    input_index: usize,
    txout: &TxOut,
    secp: &SecpCtx,
) -> Result<SignatureData, SignerError> {
    let txin = tx
        .input
        .get(input_index)
        .ok_or(SignerError::InputIndexOutOfRange)?;

    let mut data = SignatureData {
        script_sig: txin.script_sig.clone(),
        ..Default::default()
    };
    let mut stack = if is_push_only(&data.script_sig) {
        eval_push_only(&data.script_sig)
    } else {
        Stack::new()
    };

    let tx_checker = TransactionSignatureChecker::new(tx, input_index, txout.value, secp);
    let extractor = SignatureExtractorChecker::new(&tx_checker);

    match verify_script(
        &data.script_sig,
        &txout.script_pubkey,
        VerifyFlags::STANDARD,
        &extractor,
    ) {
        Ok(()) => {
            data.signatures = extractor.into_signatures();
            data.complete = true;
            tracing::trace!(input = input_index, "input already complete");
            return Ok(data);
        }
        Err(e) => tracing::trace!(input = input_index, error = %e, "input incomplete"),
    }

    let mut template = solve(&txout.script_pubkey);
    let mut next_script = txout.script_pubkey.clone();

    if let Template::ScriptHash(_) = template {
        if let Some(serialized) = stack.pop() {
            if serialized.is_empty() {
                stack.push(serialized);
            } else {
                let redeem_script = ScriptBuf::from_bytes(serialized);
                data.redeem_script = redeem_script.clone();
                template = solve(&redeem_script);
                next_script = redeem_script;
            }
        }
    }

    if let Template::MultiSig { pubkeys, .. } = &template {
        let mut next_key = 0;
        for sig in &stack {
            for (i, pubkey) in pubkeys.iter().enumerate().skip(next_key) {
                if extractor.has_signature(&pubkey.pubkey_hash())
                    || extractor.check_sig(
                        sig,
                        &pubkey.to_bytes(),
                        &next_script,
                        VerifyFlags::STANDARD,
                    )
                {
                    next_key = i + 1;
                    break;
                }
            }
        }
    }

    data.signatures = extractor.into_signatures();
    tracing::debug!(
        input = input_index,
        signatures = data.signatures.len(),
        "extracted partial signatures"
    );
    Ok(data)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::creator::{DUMMY_CHECKER, DUMMY_SIGNATURE_CREATOR};
    use crate::interpreter::BaseSignatureChecker;
    use crate::provider::DUMMY_SIGNING_PROVIDER;
    use crate::test_utils::{funding_tx, spending_tx, test_keys};
    use crate::{produce_signature, SignOptions, TransactionSignatureCreator};
    use bitcoin::Amount;

    #[test]
    fn extractor_records_accepted_signatures() {
        let (_, pk) = test_keys(1)[0];
        let script = ScriptBuf::new();

        let extractor = SignatureExtractorChecker::new(&DUMMY_CHECKER);
        assert!(extractor.check_sig(&[0x30, 0x01], &pk.to_bytes(), &script, VerifyFlags::NONE));
        // unparseable keys are accepted but not recorded
        assert!(extractor.check_sig(&[0x30, 0x02], &[0x02; 5], &script, VerifyFlags::NONE));
        // first signature wins
        assert!(extractor.check_sig(&[0x30, 0x03], &pk.to_bytes(), &script, VerifyFlags::NONE));
        assert!(extractor.has_signature(&pk.pubkey_hash()));

        let signatures = extractor.into_signatures();
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[&pk.pubkey_hash()], (pk, vec![0x30, 0x01]));

        let extractor = SignatureExtractorChecker::new(&BaseSignatureChecker);
        assert!(!extractor.check_sig(&[0x30, 0x01], &pk.to_bytes(), &script, VerifyFlags::NONE));
        assert!(extractor.into_signatures().is_empty());
    }

    #[test]
    fn unsigned_and_non_push_inputs() {
        let secp = SecpCtx::new();
        let (_, pk) = test_keys(1)[0];
        let script_pubkey = ScriptBuf::new_p2pkh(&pk.pubkey_hash());
        let funding = funding_tx(script_pubkey, Amount::from_sat(1_000));
        let mut tx = spending_tx(&funding, 0);

        let data = data_from_transaction(&tx, 0, &funding.output[0], &secp).unwrap();
        assert!(!data.complete);
        assert!(data.signatures.is_empty());
        assert!(data.script_sig.is_empty());

        tx.input[0].script_sig = ScriptBuf::from_bytes(vec![0x51, 0x76]);
        let data = data_from_transaction(&tx, 0, &funding.output[0], &secp).unwrap();
        assert!(!data.complete);
        assert_eq!(data.script_sig, tx.input[0].script_sig);

        assert!(matches!(
            data_from_transaction(&tx, 1, &funding.output[0], &secp),
            Err(SignerError::InputIndexOutOfRange)
        ));
    }

    #[test]
    fn empty_redeem_script_is_ignored() {
        let secp = SecpCtx::new();
        let (_, pk) = test_keys(1)[0];
        let redeem = ScriptBuf::new_p2pk(&pk);
        let script_pubkey = ScriptBuf::new_p2sh(&redeem.script_hash());
        let funding = funding_tx(script_pubkey, Amount::from_sat(1_000));
        let mut tx = spending_tx(&funding, 0);
        tx.input[0].script_sig = ScriptBuf::from_bytes(vec![0x00]);

        let data = data_from_transaction(&tx, 0, &funding.output[0], &secp).unwrap();
        assert!(data.redeem_script.is_empty());
        assert!(!data.complete);
    }

    #[test]
    fn dummy_signed_input_is_not_complete() {
        let secp = SecpCtx::new();
        let (_, pk) = test_keys(1)[0];
        let script_pubkey = ScriptBuf::new_p2pk(&pk);
        let funding = funding_tx(script_pubkey.clone(), Amount::from_sat(1_000));
        let mut tx = spending_tx(&funding, 0);

        let mut sigdata = SignatureData::default();
        assert!(produce_signature(
            &DUMMY_SIGNING_PROVIDER,
            &DUMMY_SIGNATURE_CREATOR,
            &script_pubkey,
            &mut sigdata
        ));
        crate::update_input(&mut tx.input[0], &sigdata);

        let data = data_from_transaction(&tx, 0, &funding.output[0], &secp).unwrap();
        assert!(!data.complete);
        assert!(data.signatures.is_empty());

        // a real signature for the same input does verify
        let mut provider = crate::FlatSigningProvider::new();
        provider.add_key(test_keys(1)[0].0, &secp);
        let signed = {
            let creator = TransactionSignatureCreator::new(
                &tx,
                0,
                Amount::from_sat(1_000),
                &SignOptions::default(),
                &secp,
            );
            let mut sigdata = SignatureData::default();
            assert!(produce_signature(&provider, &creator, &script_pubkey, &mut sigdata));
            sigdata
        };
        crate::update_input(&mut tx.input[0], &signed);
        let data = data_from_transaction(&tx, 0, &funding.output[0], &secp).unwrap();
        assert!(data.complete);
        assert_eq!(data.signatures, signed.signatures);
    }
}
