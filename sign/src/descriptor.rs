// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Signing providers from output descriptors
//!
//! A descriptor parsed together with its private keys (see
//! [`Descriptor::parse_descriptor`]) can be expanded at a derivation index into a
//! [`FlatSigningProvider`] holding every public key of the descriptor with its origin, the
//! private keys the [`KeyMap`] can produce for them, and the redeem script of `sh(..)`
//! descriptors.
//!
//! ```
//! # use bitcoin::secp256k1::Secp256k1;
//! # use miniscript::Descriptor;
//! # use script_sign::*;
//! let secp = Secp256k1::new();
//! let (descriptor, keymap) = Descriptor::parse_descriptor(
//!     &secp,
//!     "pkh(cNJFgo1driFnPcBdBX8BrJrpxchBWXwXCvNH5SoSkdcF6JXXwHMm)",
//! )?;
//!
//! let provider = FlatSigningProvider::from_descriptor(&descriptor, &keymap, 0, &secp)?;
//! assert_eq!(provider.keys.len(), 1);
//!
//! let script_pubkey = descriptor.at_derivation_index(0)?.script_pubkey();
//! assert!(is_solvable(&provider, &script_pubkey));
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

use bitcoin::bip32::KeySource;
use bitcoin::psbt::{GetKey, GetKeyError, KeyRequest};
use bitcoin::secp256k1::{Secp256k1, Signing};
use bitcoin::{PrivateKey, PublicKey};

use miniscript::descriptor::{Descriptor, DescriptorPublicKey, DescriptorSecretKey, KeyMap};
use miniscript::ForEachKey;

use crate::error::SignerError;
use crate::provider::FlatSigningProvider;
use crate::SecpCtx;

/// Wrapper for [`DescriptorSecretKey`] that implements the [`GetKey`] trait for signing.
struct DescriptorSecretKeyWrapper<'a>(&'a DescriptorSecretKey);

impl GetKey for DescriptorSecretKeyWrapper<'_> {
    type Error = GetKeyError;

    fn get_key<C: Signing>(
        &self,
        key_request: KeyRequest,
        secp: &Secp256k1<C>,
    ) -> Result<Option<PrivateKey>, Self::Error> {
        match (self.0, key_request) {
            (DescriptorSecretKey::Single(single_priv), KeyRequest::Pubkey(public_key)) => {
                let private_key = single_priv.key;
                if private_key.public_key(secp) == public_key {
                    return Ok(Some(private_key));
                }
            }
            (
                DescriptorSecretKey::XPrv(descriptor_xkey),
                ref key_request @ KeyRequest::Bip32(ref key_source),
            ) => {
                if let Some(key) = descriptor_xkey.xkey.get_key(key_request.clone(), secp)? {
                    return Ok(Some(key));
                }

                if descriptor_xkey.matches(key_source, secp).is_some() {
                    let (_, derivation_path) = key_source;
                    let skip = descriptor_xkey
                        .origin
                        .as_ref()
                        .map(|(_, origin_path)| origin_path.len())
                        .unwrap_or(0);

                    if let Some(derivation_path) = derivation_path[..].get(skip..) {
                        return Ok(Some(
                            descriptor_xkey
                                .xkey
                                .derive_priv(secp, &derivation_path)
                                .map_err(GetKeyError::Bip32)?
                                .to_priv(),
                        ));
                    }
                }
            }
            // multipath keys are never left in a descriptor derived at an index
            _ => {}
        }
        Ok(None)
    }
}

fn find_secret_key(
    keymap: &KeyMap,
    pubkey: &PublicKey,
    key_source: Option<&KeySource>,
    secp: &SecpCtx,
) -> Option<PrivateKey> {
    let mut requests = vec![KeyRequest::Pubkey(*pubkey)];
    if let Some(key_source) = key_source {
        requests.push(KeyRequest::Bip32(key_source.clone()));
    }

    keymap.values().find_map(|secret| {
        let wrapper = DescriptorSecretKeyWrapper(secret);
        requests.iter().find_map(|request| {
            match wrapper.get_key(request.clone(), secp) {
                Ok(Some(key)) if key.public_key(secp) == *pubkey => Some(key),
                Ok(_) => None,
                // the right key may belong to another entry of the map
                Err(e) => {
                    tracing::trace!(error = %e, "secret key lookup failed");
                    None
                }
            }
        })
    })
}

impl FlatSigningProvider {
    /// Expand `descriptor` at derivation `index`
    ///
    /// Records every derived public key and its origin, the private keys `keymap` can produce
    /// for them, and for `sh(..)` descriptors the redeem script.
    pub fn from_descriptor(
        descriptor: &Descriptor<DescriptorPublicKey>,
        keymap: &KeyMap,
        index: u32,
        secp: &SecpCtx,
    ) -> Result<Self, SignerError> {
        let definite = descriptor.at_derivation_index(index)?;

        let mut provider = FlatSigningProvider::new();
        let mut error = None;
        definite.for_each_key(|key| {
            let pubkey = match key.derive_public_key(secp) {
                Ok(pubkey) => pubkey,
                Err(e) => {
                    error = Some(e);
                    return false;
                }
            };

            let descriptor_key = key.as_descriptor_public_key();
            let key_source = descriptor_key
                .full_derivation_path()
                .map(|path| (descriptor_key.master_fingerprint(), path));

            match &key_source {
                Some(key_source) => provider.add_key_origin(pubkey, key_source.clone()),
                None => provider.add_pubkey(pubkey),
            };

            if let Some(secret) = find_secret_key(keymap, &pubkey, key_source.as_ref(), secp) {
                provider.keys.insert(pubkey.pubkey_hash(), secret);
            }
            true
        });
        if let Some(e) = error {
            return Err(e.into());
        }

        if let Descriptor::Sh(sh) = definite.derived_descriptor(secp)? {
            provider.add_script(sh.inner_script());
        }

        tracing::debug!(
            index,
            pubkeys = provider.pubkeys.len(),
            keys = provider.keys.len(),
            scripts = provider.scripts.len(),
            "expanded descriptor"
        );
        Ok(provider)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::provider::SigningProvider;
    use crate::test_utils::{get_test_pkh, get_test_sh_multi, get_test_xprv_pkh};

    #[test]
    fn single_key() {
        let secp = SecpCtx::new();
        let (descriptor, keymap) = Descriptor::parse_descriptor(&secp, get_test_pkh()).unwrap();
        let provider = FlatSigningProvider::from_descriptor(&descriptor, &keymap, 0, &secp).unwrap();

        assert_eq!(provider.pubkeys.len(), 1);
        assert_eq!(provider.keys.len(), 1);
        assert!(provider.scripts.is_empty());

        let (key_id, pubkey) = provider.pubkeys.iter().next().unwrap();
        assert_eq!(provider.get_key(key_id).unwrap().public_key(&secp), *pubkey);
    }

    #[test]
    fn extended_key_with_origin() {
        let secp = SecpCtx::new();
        let (descriptor, keymap) =
            Descriptor::parse_descriptor(&secp, get_test_xprv_pkh()).unwrap();

        let first = FlatSigningProvider::from_descriptor(&descriptor, &keymap, 0, &secp).unwrap();
        let second = FlatSigningProvider::from_descriptor(&descriptor, &keymap, 1, &secp).unwrap();
        assert_ne!(first.pubkeys, second.pubkeys);

        let (key_id, pubkey) = first.pubkeys.iter().next().unwrap();
        let (_, path) = first.get_key_origin(key_id).unwrap();
        assert_eq!(path.to_string(), "84'/1'/0'/0/0");
        assert_eq!(first.get_key(key_id).unwrap().public_key(&secp), *pubkey);
    }

    #[test]
    fn watch_only() {
        let secp = SecpCtx::new();
        let (descriptor, _) = Descriptor::parse_descriptor(&secp, get_test_sh_multi()).unwrap();
        let provider =
            FlatSigningProvider::from_descriptor(&descriptor, &KeyMap::new(), 0, &secp).unwrap();

        assert_eq!(provider.pubkeys.len(), 3);
        assert!(provider.keys.is_empty());
        assert_eq!(provider.scripts.len(), 1);
    }
}
