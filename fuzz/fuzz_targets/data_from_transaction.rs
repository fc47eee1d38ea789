#![no_main]

use libfuzzer_sys::fuzz_target;

use script_sign::bitcoin::secp256k1::Secp256k1;
use script_sign::bitcoin::TxOut;
use script_sign::{data_from_transaction, SignatureData};
use script_sign_fuzz::fuzz_utils::*;

fuzz_target!(|data: &[u8]| {
    let secp = Secp256k1::new();
    let mut new_data = data;

    let keys = consume_keys(&mut new_data);
    let pubkeys: Vec<_> = keys.iter().map(|key| key.public_key(&secp)).collect();
    let (script_pubkey, _) = consume_script_pubkey(&mut new_data, &pubkeys);
    let spent = TxOut {
        value: consume_amount(&mut new_data),
        script_pubkey,
    };

    let mut tx = consume_tx(&mut new_data);
    tx.input[0].script_sig = consume_script_sig(&mut new_data);

    // extraction never fails on script content
    let sigdata = match data_from_transaction(&tx, 0, &spent, &secp) {
        Ok(sigdata) => sigdata,
        Err(e) => panic!("extraction failed: {}", e),
    };
    assert_eq!(sigdata.script_sig, tx.input[0].script_sig);

    // merging with itself changes nothing
    assert_eq!(sigdata.clone().merge(sigdata.clone()), sigdata);
    assert_eq!(SignatureData::default().merge(sigdata.clone()).signatures, sigdata.signatures);

    for (key_id, (pubkey, _)) in &sigdata.signatures {
        assert_eq!(*key_id, pubkey.pubkey_hash());
    }
});
