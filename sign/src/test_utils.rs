#![allow(unused)]
//! Test utilities

use alloc::vec::Vec;

use bitcoin::opcodes::all::OP_CHECKMULTISIG;
use bitcoin::script::Builder;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{
    absolute, transaction, Amount, Network, OutPoint, PrivateKey, PublicKey, ScriptBuf, Sequence,
    Transaction, TxIn, TxOut, Witness,
};

use crate::provider::FlatSigningProvider;

/// Deterministic compressed key pair, `seed` must be non-zero
pub fn test_key(seed: u8) -> (PrivateKey, PublicKey) {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[seed; 32]).expect("valid secret key");
    let private_key = PrivateKey::new(secret, Network::Regtest);
    (private_key, private_key.public_key(&secp))
}

/// `n` distinct key pairs, seeded `1..=n`
pub fn test_keys(n: u8) -> Vec<(PrivateKey, PublicKey)> {
    (1..=n).map(test_key).collect()
}

/// Provider holding the given private keys
pub fn provider_with_keys(keys: &[PrivateKey]) -> FlatSigningProvider {
    let secp = Secp256k1::new();
    let mut provider = FlatSigningProvider::new();
    for key in keys {
        provider.add_key(*key, &secp);
    }
    provider
}

/// Bare `required`-of-`pubkeys.len()` multisig locking script
pub fn multisig_script(required: i64, pubkeys: &[PublicKey]) -> ScriptBuf {
    let mut builder = Builder::new().push_int(required);
    for pubkey in pubkeys {
        builder = builder.push_key(pubkey);
    }
    builder
        .push_int(pubkeys.len() as i64)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script()
}

/// Transaction paying `amount` to `script_pubkey` in its only output
pub fn funding_tx(script_pubkey: ScriptBuf, amount: Amount) -> Transaction {
    let mut tx = new_tx(0);
    tx.input.push(TxIn {
        previous_output: OutPoint::null(),
        script_sig: ScriptBuf::new(),
        sequence: Sequence::MAX,
        witness: Witness::new(),
    });
    tx.output.push(TxOut {
        value: amount,
        script_pubkey,
    });
    tx
}

/// Unsigned transaction spending output `vout` of `funding`
pub fn spending_tx(funding: &Transaction, vout: u32) -> Transaction {
    let mut tx = new_tx(0);
    tx.input.push(TxIn {
        previous_output: OutPoint::new(funding.compute_txid(), vout),
        script_sig: ScriptBuf::new(),
        sequence: Sequence::MAX,
        witness: Witness::new(),
    });
    tx.output.push(TxOut {
        value: Amount::from_sat(500),
        script_pubkey: ScriptBuf::new_p2pkh(&test_key(0x7f).1.pubkey_hash()),
    });
    tx
}

/// `pkh` descriptor with a single private key
pub fn get_test_pkh() -> &'static str {
    "pkh(cNJFgo1driFnPcBdBX8BrJrpxchBWXwXCvNH5SoSkdcF6JXXwHMm)"
}

/// `pkh` descriptor with an extended private key
pub fn get_test_xprv_pkh() -> &'static str {
    "pkh(tprv8ZgxMBicQKsPdy6LMhUtFHAgpocR8GC6QmwMSFpZs7h6Eziw3SpThFfczTDh5rW2krkqffa11UpX3XkeTTB2FvzZKWXqPY54Y6Rq4AQ5R8L/84'/1'/0'/0/*)"
}

/// `sh(multi(2, ..))` descriptor with three private keys
pub fn get_test_sh_multi() -> &'static str {
    "sh(multi(2,cNJFgo1driFnPcBdBX8BrJrpxchBWXwXCvNH5SoSkdcF6JXXwHMm,cVpPVruEDdmutPzisEsYvtST1usBR3ntr8pXSyt6D2YYqXRyPcFW,cRjo6jqfVNP33HhSS76UhXETZsGTZYx8FMFvR9kpbtCSV1PmdZdu))"
}

/// Construct a new [`Transaction`] with the given locktime
pub fn new_tx(locktime: u32) -> Transaction {
    Transaction {
        version: transaction::Version::ONE,
        lock_time: absolute::LockTime::from_consensus(locktime),
        input: vec![],
        output: vec![],
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixtures_are_valid() {
        let keys = test_keys(16);
        assert_eq!(keys.len(), 16);

        let funding = funding_tx(multisig_script(2, &[keys[0].1, keys[1].1]), Amount::ONE_BTC);
        let tx = spending_tx(&funding, 0);
        assert_eq!(tx.input[0].previous_output.txid, funding.compute_txid());
        assert!(tx.output[0].script_pubkey.is_p2pkh());
    }
}
