// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Signing providers
//!
//! A [`SigningProvider`] answers lookups for the material needed to satisfy a locking script:
//! redeem scripts by script hash, and public keys, private keys and key origins by key hash.
//! Every lookup may come up empty, which is how a provider signals that it does not know
//! something.

use alloc::collections::BTreeMap;

use bitcoin::bip32::KeySource;
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{PrivateKey, PubkeyHash, PublicKey, ScriptBuf, ScriptHash};

/// HASH160 of a serialized public key
pub type KeyId = PubkeyHash;

/// HASH160 of a serialized script
pub type ScriptId = ScriptHash;

/// Master key fingerprint and derivation path of a key
pub type KeyOriginInfo = KeySource;

/// Source of scripts and keys
///
/// All methods default to answering nothing.
pub trait SigningProvider {
    /// Redeem script with the given hash
    fn get_script(&self, _script_id: &ScriptId) -> Option<ScriptBuf> {
        None
    }

    /// Public key with the given hash
    fn get_pubkey(&self, _key_id: &KeyId) -> Option<PublicKey> {
        None
    }

    /// Private key for the public key with the given hash
    fn get_key(&self, _key_id: &KeyId) -> Option<PrivateKey> {
        None
    }

    /// Origin of the public key with the given hash
    fn get_key_origin(&self, _key_id: &KeyId) -> Option<KeyOriginInfo> {
        None
    }
}

/// Provider that knows nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DummySigningProvider;

impl SigningProvider for DummySigningProvider {}

/// Shared provider that knows nothing
pub static DUMMY_SIGNING_PROVIDER: DummySigningProvider = DummySigningProvider;

/// Provider backed by in-memory maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatSigningProvider {
    /// Redeem scripts by script hash
    pub scripts: BTreeMap<ScriptId, ScriptBuf>,
    /// Public keys by key hash
    pub pubkeys: BTreeMap<KeyId, PublicKey>,
    /// Public keys and their origin by key hash
    pub origins: BTreeMap<KeyId, (PublicKey, KeyOriginInfo)>,
    /// Private keys by key hash of their public key
    pub keys: BTreeMap<KeyId, PrivateKey>,
}

impl FlatSigningProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a private key, together with its public key
    pub fn add_key(&mut self, key: PrivateKey, secp: &Secp256k1<All>) -> KeyId {
        let pubkey = key.public_key(secp);
        let key_id = self.add_pubkey(pubkey);
        self.keys.insert(key_id, key);
        key_id
    }

    /// Add a public key
    pub fn add_pubkey(&mut self, pubkey: PublicKey) -> KeyId {
        let key_id = pubkey.pubkey_hash();
        self.pubkeys.insert(key_id, pubkey);
        key_id
    }

    /// Add a redeem script
    pub fn add_script(&mut self, script: ScriptBuf) -> ScriptId {
        let script_id = script.script_hash();
        self.scripts.insert(script_id, script);
        script_id
    }

    /// Add the origin of a public key. The public key is added too.
    pub fn add_key_origin(&mut self, pubkey: PublicKey, origin: KeyOriginInfo) -> KeyId {
        let key_id = self.add_pubkey(pubkey);
        self.origins.insert(key_id, (pubkey, origin));
        key_id
    }

    /// Union of both providers
    ///
    /// When both know an entry under the same identifier, the one from `self` is kept.
    pub fn merge(&self, other: &FlatSigningProvider) -> FlatSigningProvider {
        let mut merged = self.clone();
        for (id, script) in &other.scripts {
            merged.scripts.entry(*id).or_insert_with(|| script.clone());
        }
        for (id, pubkey) in &other.pubkeys {
            merged.pubkeys.entry(*id).or_insert(*pubkey);
        }
        for (id, origin) in &other.origins {
            merged.origins.entry(*id).or_insert_with(|| origin.clone());
        }
        for (id, key) in &other.keys {
            merged.keys.entry(*id).or_insert(*key);
        }
        merged
    }
}

impl SigningProvider for FlatSigningProvider {
    fn get_script(&self, script_id: &ScriptId) -> Option<ScriptBuf> {
        self.scripts.get(script_id).cloned()
    }

    fn get_pubkey(&self, key_id: &KeyId) -> Option<PublicKey> {
        self.pubkeys.get(key_id).copied()
    }

    fn get_key(&self, key_id: &KeyId) -> Option<PrivateKey> {
        self.keys.get(key_id).copied()
    }

    fn get_key_origin(&self, key_id: &KeyId) -> Option<KeyOriginInfo> {
        self.origins.get(key_id).map(|(_, origin)| origin.clone())
    }
}

/// Wrapper that can hide private keys and key origins of another provider
///
/// Scripts and public keys are always forwarded.
#[derive(Debug)]
pub struct HidingSigningProvider<'a, P: SigningProvider + ?Sized> {
    provider: &'a P,
    hide_secret: bool,
    hide_origin: bool,
}

impl<'a, P: SigningProvider + ?Sized> HidingSigningProvider<'a, P> {
    /// Wrap `provider`
    pub fn new(provider: &'a P, hide_secret: bool, hide_origin: bool) -> Self {
        HidingSigningProvider {
            provider,
            hide_secret,
            hide_origin,
        }
    }
}

impl<'a, P: SigningProvider + ?Sized> SigningProvider for HidingSigningProvider<'a, P> {
    fn get_script(&self, script_id: &ScriptId) -> Option<ScriptBuf> {
        self.provider.get_script(script_id)
    }

    fn get_pubkey(&self, key_id: &KeyId) -> Option<PublicKey> {
        self.provider.get_pubkey(key_id)
    }

    fn get_key(&self, key_id: &KeyId) -> Option<PrivateKey> {
        if self.hide_secret {
            return None;
        }
        self.provider.get_key(key_id)
    }

    fn get_key_origin(&self, key_id: &KeyId) -> Option<KeyOriginInfo> {
        if self.hide_origin {
            return None;
        }
        self.provider.get_key_origin(key_id)
    }
}
