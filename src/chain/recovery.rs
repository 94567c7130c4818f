// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sealer and sender recovery.
//!
//! PoSV blocks do not carry the sealer in the `miner` field. The sealer signs
//! the header hash with the signature itself excluded, and appends the 65-byte
//! signature to `extraData`. Recovering the public key from that signature
//! gives the sealer's address.

use alloy::primitives::{keccak256, Address, Bytes, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use super::types::RpcHeader;
use crate::codec::rlp_list;

/// Length of the seal appended to `extraData`: r (32) | s (32) | v (1).
pub const EXTRA_SEAL: usize = 65;

/// Errors raised by signature handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecoveryError {
    #[error("extra-data {0} byte suffix signature missing")]
    MissingSignature(usize),

    #[error("signature must be {EXTRA_SEAL} bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Hash the sealer signs: the header without the trailing seal.
pub fn seal_hash(header: &RpcHeader) -> Result<B256, RecoveryError> {
    let extra = header.extra_data.as_ref();
    if extra.len() < EXTRA_SEAL {
        return Err(RecoveryError::MissingSignature(EXTRA_SEAL));
    }
    let unsealed_extra = Bytes::copy_from_slice(&extra[..extra.len() - EXTRA_SEAL]);

    let encoded = rlp_list(&[
        &header.parent_hash,
        &header.sha3_uncles,
        &header.miner,
        &header.state_root,
        &header.transactions_root,
        &header.receipts_root,
        &header.logs_bloom,
        &header.difficulty,
        &header.number,
        &header.gas_limit,
        &header.gas_used,
        &header.timestamp,
        &unsealed_extra,
        &header.mix_hash,
        &header.nonce,
    ]);
    Ok(keccak256(encoded))
}

/// Recover the address that sealed `header`.
pub fn recover_sealer(header: &RpcHeader) -> Result<Address, RecoveryError> {
    let hash = seal_hash(header)?;
    let extra = header.extra_data.as_ref();
    recover_address(&hash, &extra[extra.len() - EXTRA_SEAL..])
}

/// Recover the signer of `prehash` from a 65-byte `r | s | v` signature.
///
/// `v` may be 0/1 or 27/28.
pub fn recover_address(prehash: &B256, signature: &[u8]) -> Result<Address, RecoveryError> {
    let key = recover_key(prehash, signature)?;
    Ok(public_key_to_address(&key))
}

pub(crate) fn recover_key(prehash: &B256, signature: &[u8]) -> Result<VerifyingKey, RecoveryError> {
    if signature.len() != EXTRA_SEAL {
        return Err(RecoveryError::InvalidSignatureLength(signature.len()));
    }
    let v = signature[64];
    let recovery_byte = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => return Err(RecoveryError::InvalidRecoveryId(other)),
    };
    let recovery_id =
        RecoveryId::from_byte(recovery_byte).ok_or(RecoveryError::InvalidRecoveryId(v))?;
    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| RecoveryError::InvalidSignature(e.to_string()))?;

    VerifyingKey::recover_from_prehash(prehash.as_slice(), &sig, recovery_id)
        .map_err(|e| RecoveryError::InvalidSignature(e.to_string()))
}

/// Address of a secp256k1 public key: the low 20 bytes of keccak256(X | Y).
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    Address::from_slice(&keccak256(&point.as_bytes()[1..])[12..])
}

/// Address for a SEC1-encoded public key (compressed or uncompressed).
pub fn recover_sender(public_key: &[u8]) -> Result<Address, RecoveryError> {
    let key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| RecoveryError::InvalidPublicKey(e.to_string()))?;
    Ok(public_key_to_address(&key))
}
