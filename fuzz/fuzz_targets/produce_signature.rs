#![no_main]

use libfuzzer_sys::fuzz_target;

use script_sign::bitcoin::secp256k1::Secp256k1;
use script_sign::bitcoin::TxOut;
use script_sign::interpreter::{verify_script, VerifyFlags};
use script_sign::{
    data_from_transaction, is_solvable, produce_signature, update_input, SignOptions,
    SignatureData, TransactionSignatureCreator,
};
use script_sign_fuzz::fuzz_utils::*;
use script_sign_fuzz::fuzzed_data_provider::consume_bool;

fuzz_target!(|data: &[u8]| {
    let secp = Secp256k1::new();
    let mut new_data = data;

    let keys = consume_keys(&mut new_data);
    let pubkeys: Vec<_> = keys.iter().map(|key| key.public_key(&secp)).collect();
    let (script_pubkey, redeem_script) = consume_script_pubkey(&mut new_data, &pubkeys);

    let mut provider = provider_from_keys(&keys, &secp);
    if let Some(redeem_script) = redeem_script {
        if consume_bool(&mut new_data) {
            provider.add_script(redeem_script);
        }
    }

    let spent = TxOut {
        value: consume_amount(&mut new_data),
        script_pubkey,
    };
    let mut tx = consume_tx(&mut new_data);
    let options = SignOptions {
        allow_grinding: consume_bool(&mut new_data),
        ..Default::default()
    };

    let mut sigdata = SignatureData::default();
    let complete = {
        let creator = TransactionSignatureCreator::new(&tx, 0, spent.value, &options, &secp);
        let complete = produce_signature(&provider, &creator, &spent.script_pubkey, &mut sigdata);
        if complete {
            assert!(verify_script(
                &sigdata.script_sig,
                &spent.script_pubkey,
                VerifyFlags::STANDARD,
                &script_sign::TransactionSignatureChecker::new(&tx, 0, spent.value, &secp),
            )
            .is_ok());
        }
        complete
    };

    // a provider able to sign can also satisfy the script with placeholders
    if complete {
        assert!(is_solvable(&provider, &spent.script_pubkey));
    }

    update_input(&mut tx.input[0], &sigdata);
    let extracted = match data_from_transaction(&tx, 0, &spent, &secp) {
        Ok(extracted) => extracted,
        Err(e) => panic!("extraction failed: {}", e),
    };
    // anyone-can-spend scripts may verify without being solved
    if complete {
        assert!(extracted.complete);
        assert_eq!(extracted.signatures, sigdata.signatures);
    }
});
