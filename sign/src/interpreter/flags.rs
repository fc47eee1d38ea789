// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Script verification flags.

use core::ops::{BitAnd, BitOr, BitOrAssign};

/// Script verification flags controlling interpreter behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VerifyFlags(pub u32);

impl VerifyFlags {
    /// No checks beyond plain evaluation
    pub const NONE: VerifyFlags = VerifyFlags(0);
    /// Evaluate pay-to-script-hash subscripts (BIP16)
    pub const P2SH: VerifyFlags = VerifyFlags(1 << 0);
    /// Enforce strict signature, hash type and public key encodings
    pub const STRICTENC: VerifyFlags = VerifyFlags(1 << 1);
    /// Enforce strict DER signatures (BIP66)
    pub const DERSIG: VerifyFlags = VerifyFlags(1 << 2);
    /// Enforce low-S signatures
    pub const LOW_S: VerifyFlags = VerifyFlags(1 << 3);
    /// Require the extra CHECKMULTISIG argument to be empty
    pub const NULLDUMMY: VerifyFlags = VerifyFlags(1 << 4);
    /// Require the unlocking script to contain only pushes
    pub const SIGPUSHONLY: VerifyFlags = VerifyFlags(1 << 5);
    /// Require minimal push encodings and minimal script numbers
    pub const MINIMALDATA: VerifyFlags = VerifyFlags(1 << 6);
    /// Require exactly one stack element after evaluation
    pub const CLEANSTACK: VerifyFlags = VerifyFlags(1 << 8);
    /// Require failed signature checks to use empty signatures
    pub const NULLFAIL: VerifyFlags = VerifyFlags(1 << 14);
    /// Replay-protected signature hashing
    pub const ENABLE_SIGHASH_FORKID: VerifyFlags = VerifyFlags(1 << 16);

    /// Flags every valid block must satisfy
    pub const MANDATORY: VerifyFlags =
        VerifyFlags(Self::P2SH.0 | Self::STRICTENC.0 | Self::ENABLE_SIGHASH_FORKID.0);

    /// The standard verification bundle used to decide whether a produced unlocking script is
    /// complete
    pub const STANDARD: VerifyFlags = VerifyFlags(
        Self::MANDATORY.0
            | Self::DERSIG.0
            | Self::LOW_S.0
            | Self::NULLDUMMY.0
            | Self::SIGPUSHONLY.0
            | Self::MINIMALDATA.0
            | Self::CLEANSTACK.0
            | Self::NULLFAIL.0,
    );

    /// Whether every bit of `flag` is set
    pub fn contains(self, flag: VerifyFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Whether at least one of `flags` is set
    pub fn contains_any(self, flags: &[VerifyFlags]) -> bool {
        flags.iter().any(|f| self.contains(*f))
    }
}

impl BitOr for VerifyFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        VerifyFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for VerifyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for VerifyFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        VerifyFlags(self.0 & rhs.0)
    }
}
