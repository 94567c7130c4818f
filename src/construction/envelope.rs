// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire formats used by the construction endpoints.
//!
//! - [`UnsignedEnvelope`]: `rlp([from, to, value, input, nonce, gas_price,
//!   gas_limit, chain_id])`, carried between `/payloads` and `/combine`.
//! - [`SignedTransaction`]: legacy transaction
//!   `rlp([nonce, gas_price, gas, to, value, input, v, r, s])` with EIP-155
//!   replay protection. Pre-EIP-155 signatures (`v` = 27/28) still decode.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::rlp::Encodable;

use crate::chain::recovery::{recover_address, RecoveryError};
use crate::codec::{rlp_list, RlpReader};

/// Decode failures for either wire format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("rlp: {0}")]
    Rlp(String),

    #[error("invalid v value {0}")]
    InvalidV(u64),
}

impl From<alloy::rlp::Error> for EnvelopeError {
    fn from(e: alloy::rlp::Error) -> Self {
        Self::Rlp(e.to_string())
    }
}

fn optional_address(to: &Option<Address>) -> Box<dyn Encodable + '_> {
    match to {
        Some(address) => Box::new(address),
        None => Box::new(Bytes::new()),
    }
}

// =============================================================================
// Unsigned
// =============================================================================

/// A transfer waiting for its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEnvelope {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub chain_id: u64,
}

impl UnsignedEnvelope {
    pub fn encode(&self) -> Vec<u8> {
        rlp_list(&[
            &self.from,
            &self.to,
            &self.value,
            &self.input,
            &self.nonce,
            &self.gas_price,
            &self.gas_limit,
            &self.chain_id,
        ])
    }

    pub fn decode(buf: &[u8]) -> Result<Self, EnvelopeError> {
        let mut reader = RlpReader::new(buf)?;
        let envelope = Self {
            from: reader.next()?,
            to: reader.next()?,
            value: reader.next()?,
            input: reader.next()?,
            nonce: reader.next()?,
            gas_price: reader.next()?,
            gas_limit: reader.next()?,
            chain_id: reader.next()?,
        };
        reader.finish()?;
        Ok(envelope)
    }

    /// EIP-155 hash the sender signs.
    pub fn signing_hash(&self) -> B256 {
        legacy_signing_hash(
            self.nonce,
            &self.gas_price,
            self.gas_limit,
            &Some(self.to),
            &self.value,
            &self.input,
            Some(self.chain_id),
        )
    }
}

fn legacy_signing_hash(
    nonce: u64,
    gas_price: &U256,
    gas_limit: u64,
    to: &Option<Address>,
    value: &U256,
    input: &Bytes,
    chain_id: Option<u64>,
) -> B256 {
    let to = optional_address(to);
    let encoded = match chain_id {
        Some(chain_id) => rlp_list(&[
            &nonce, gas_price, &gas_limit, &*to, value, input, &chain_id, &0u8, &0u8,
        ]),
        None => rlp_list(&[&nonce, gas_price, &gas_limit, &*to, value, input]),
    };
    keccak256(encoded)
}

// =============================================================================
// Signed
// =============================================================================

/// Legacy transaction with its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl SignedTransaction {
    /// Attach a 65-byte `r | s | v` signature to `envelope`.
    ///
    /// The recovery byte may be 0/1 or 27/28.
    pub fn from_envelope(
        envelope: &UnsignedEnvelope,
        signature: &[u8],
    ) -> Result<Self, RecoveryError> {
        if signature.len() != 65 {
            return Err(RecoveryError::InvalidSignatureLength(signature.len()));
        }
        let recovery = match signature[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            other => return Err(RecoveryError::InvalidRecoveryId(other)),
        };
        Ok(Self {
            nonce: envelope.nonce,
            gas_price: envelope.gas_price,
            gas_limit: envelope.gas_limit,
            to: Some(envelope.to),
            value: envelope.value,
            input: envelope.input.clone(),
            v: envelope.chain_id * 2 + 35 + recovery as u64,
            r: U256::from_be_slice(&signature[..32]),
            s: U256::from_be_slice(&signature[32..64]),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let to = optional_address(&self.to);
        rlp_list(&[
            &self.nonce,
            &self.gas_price,
            &self.gas_limit,
            &*to,
            &self.value,
            &self.input,
            &self.v,
            &self.r,
            &self.s,
        ])
    }

    pub fn decode(buf: &[u8]) -> Result<Self, EnvelopeError> {
        let mut reader = RlpReader::new(buf)?;
        let tx = Self {
            nonce: reader.next()?,
            gas_price: reader.next()?,
            gas_limit: reader.next()?,
            to: reader.next_optional()?,
            value: reader.next()?,
            input: reader.next()?,
            v: reader.next()?,
            r: reader.next()?,
            s: reader.next()?,
        };
        reader.finish()?;
        tx.recovery_id()?;
        Ok(tx)
    }

    /// Chain id bound into `v`, `None` for pre-EIP-155 signatures.
    pub fn chain_id(&self) -> Option<u64> {
        (self.v >= 35).then(|| (self.v - 35) / 2)
    }

    fn recovery_id(&self) -> Result<u8, EnvelopeError> {
        match self.v {
            27 | 28 => Ok((self.v - 27) as u8),
            v if v >= 35 => Ok(((v - 35) % 2) as u8),
            v => Err(EnvelopeError::InvalidV(v)),
        }
    }

    /// Transaction hash: keccak256 of the canonical encoding.
    pub fn hash(&self) -> B256 {
        keccak256(self.encode())
    }

    pub fn signing_hash(&self) -> B256 {
        legacy_signing_hash(
            self.nonce,
            &self.gas_price,
            self.gas_limit,
            &self.to,
            &self.value,
            &self.input,
            self.chain_id(),
        )
    }

    /// Recover the sender from the embedded signature.
    pub fn sender(&self) -> Result<Address, RecoveryError> {
        let recovery = self
            .recovery_id()
            .map_err(|e| RecoveryError::InvalidSignature(e.to_string()))?;
        let mut signature = [0u8; 65];
        signature[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        signature[32..64].copy_from_slice(&self.s.to_be_bytes::<32>());
        signature[64] = recovery;
        recover_address(&self.signing_hash(), &signature)
    }
}
