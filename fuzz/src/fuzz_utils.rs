use script_sign::bitcoin::{
    absolute::LockTime,
    hashes::Hash,
    opcodes::all::OP_CHECKMULTISIG,
    script::{Builder, PushBytesBuf},
    secp256k1::SecretKey,
    transaction::Version,
    Amount, Network, OutPoint, PrivateKey, PublicKey, ScriptBuf, Sequence, Transaction, TxIn,
    TxOut, Txid, Witness,
};
use script_sign::{FlatSigningProvider, SecpCtx};

use crate::fuzzed_data_provider::{consume_bool, consume_bytes, consume_u32, consume_u64, consume_u8};

pub fn consume_txid(data: &mut &[u8]) -> Txid {
    let bytes: [u8; 32] = consume_bytes(data, 32).try_into().unwrap_or_default();

    Txid::from_byte_array(bytes)
}

pub fn consume_amount(data: &mut &[u8]) -> Amount {
    let sats = consume_u64(data).unwrap_or_default() % Amount::MAX_MONEY.to_sat();
    Amount::from_sat(sats)
}

/// Up to 16 valid private keys, invalid scalars are skipped
pub fn consume_keys(data: &mut &[u8]) -> Vec<PrivateKey> {
    let count = consume_u8(data) % 16;
    let mut keys = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let bytes = consume_bytes(data, 32);
        if let Ok(secret) = SecretKey::from_slice(&bytes) {
            let mut key = PrivateKey::new(secret, Network::Regtest);
            key.compressed = consume_bool(data);
            keys.push(key);
        }
    }
    keys
}

/// Either a standard template over `pubkeys` or raw script bytes
///
/// Pay-to-script-hash outputs return their redeem script as well.
pub fn consume_script_pubkey(
    data: &mut &[u8],
    pubkeys: &[PublicKey],
) -> (ScriptBuf, Option<ScriptBuf>) {
    let selector = consume_u8(data);
    if pubkeys.is_empty() || selector >= 8 {
        let len = consume_u8(data) as usize;
        return (ScriptBuf::from_bytes(consume_bytes(data, len)), None);
    }

    let pick = |data: &mut &[u8]| pubkeys[consume_u8(data) as usize % pubkeys.len()];
    match selector % 4 {
        0 => (ScriptBuf::new_p2pk(&pick(data)), None),
        1 => (ScriptBuf::new_p2pkh(&pick(data).pubkey_hash()), None),
        2 => (consume_multisig(data, pubkeys), None),
        _ => {
            let (redeem_script, _) = consume_script_pubkey(data, pubkeys);
            (ScriptBuf::new_p2sh(&redeem_script.script_hash()), Some(redeem_script))
        }
    }
}

fn consume_multisig(data: &mut &[u8], pubkeys: &[PublicKey]) -> ScriptBuf {
    let required = 1 + consume_u8(data) as usize % pubkeys.len();
    let mut builder = Builder::new().push_int(required as i64);
    for pubkey in pubkeys {
        builder = builder.push_key(pubkey);
    }
    builder
        .push_int(pubkeys.len() as i64)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script()
}

/// Push-only script of fuzzed stack items, or raw bytes
pub fn consume_script_sig(data: &mut &[u8]) -> ScriptBuf {
    if consume_bool(data) {
        let len = consume_u8(data) as usize;
        return ScriptBuf::from_bytes(consume_bytes(data, len));
    }

    let count = consume_u8(data) % 8;
    let mut builder = Builder::new();
    for _ in 0..count {
        let len = consume_u8(data) as usize;
        if let Ok(push) = PushBytesBuf::try_from(consume_bytes(data, len)) {
            builder = builder.push_slice(push);
        }
    }
    builder.into_script()
}

pub fn consume_tx(data: &mut &[u8]) -> Transaction {
    let version = Version(consume_u32(data).unwrap_or(1) as i32);
    let lock_time = LockTime::from_consensus(consume_u32(data).unwrap_or_default());

    let txin_count = 1 + consume_u8(data) % 4;
    let mut input = Vec::with_capacity(txin_count as usize);
    for _ in 0..txin_count {
        input.push(TxIn {
            previous_output: OutPoint::new(consume_txid(data), consume_u32(data).unwrap_or_default()),
            script_sig: ScriptBuf::new(),
            sequence: Sequence(consume_u32(data).unwrap_or(u32::MAX)),
            witness: Witness::new(),
        });
    }

    let txout_count = consume_u8(data) % 4;
    let mut output = Vec::with_capacity(txout_count as usize);
    for _ in 0..txout_count {
        let len = consume_u8(data) as usize % 64;
        output.push(TxOut {
            value: consume_amount(data),
            script_pubkey: ScriptBuf::from_bytes(consume_bytes(data, len)),
        });
    }

    Transaction {
        version,
        lock_time,
        input,
        output,
    }
}

pub fn provider_from_keys(keys: &[PrivateKey], secp: &SecpCtx) -> FlatSigningProvider {
    let mut provider = FlatSigningProvider::new();
    for key in keys {
        provider.add_key(*key, secp);
    }
    provider
}
