// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transaction Construction
//!
//! Stateless steps of the construction workflow. Nothing is persisted between
//! calls; every step works from its inputs plus, for `metadata` and `submit`,
//! the chain [`Client`].
//!
//! | Step | Online | Output |
//! |------|--------|--------|
//! | [`derive`] | no | address of a secp256k1 public key |
//! | [`preprocess`] | no | [`Options`] for `metadata` |
//! | [`metadata`] | yes | [`Metadata`] plus the suggested fee |
//! | [`payloads`] | no | hex [`UnsignedEnvelope`] and its signing payload |
//! | [`combine`] | no | hex signed transaction |
//! | [`parse`] | no | operations, signers and metadata |
//! | [`hash`] | no | transaction identifier |
//! | [`submit`] | yes | transaction identifier reported by the node |
//!
//! Only native transfers are supported: one `CALL` debit followed by one
//! `CALL` credit of the same amount.

pub mod envelope;

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use envelope::{EnvelopeError, SignedTransaction, UnsignedEnvelope};

use crate::chain::recovery::{recover_sender, RecoveryError};
use crate::chain::types::{quantity, CallArgs};
use crate::chain::{credit, debit, op_types, DECIMALS, SYMBOL};
use crate::client::{Client, ClientError};
use crate::codec::{from_hex, to_hex};
use crate::models::{
    AccountIdentifier, Amount, ConstructionParseResponse, JsonMap, Operation,
    OperationIdentifier, PublicKey, Signature, SigningPayload, TransactionIdentifier,
};

/// Gas limit of a plain transfer, used when the caller supplies none.
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;

pub const CURVE_SECP256K1: &str = "secp256k1";
pub const SIGNATURE_ECDSA_RECOVERY: &str = "ecdsa_recovery";

/// Errors of the construction workflow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    #[error("unsupported public key: {0}")]
    UnsupportedKeyType(String),

    #[error("malformed operations: {0}")]
    MalformedOperations(String),

    #[error("invalid options or metadata: {0}")]
    InvalidMetadata(String),

    #[error("transaction could not be parsed: {0}")]
    InvalidTransaction(String),

    #[error("expected exactly one signature, got {0}")]
    SignatureCount(usize),

    #[error("signature must be 65 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("signature was produced by {recovered}, expected {expected}")]
    SignerMismatch { expected: Address, recovered: Address },

    #[error("signature recovery failed: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("gas estimation failed: {0}")]
    EstimationFailed(ClientError),

    #[error("account lookup failed: {0}")]
    AccountLookupFailed(ClientError),

    #[error("transaction rejected: {0}")]
    SubmissionRejected(ClientError),
}

// =============================================================================
// Options / Metadata
// =============================================================================

/// Output of `preprocess`, input of `metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    pub sender: String,
    pub recipient: String,
    /// Decimal amount in the smallest unit.
    pub amount: String,
    pub symbol: String,
    pub decimals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
}

/// Output of `metadata`, input of `payloads`. Quantities are `0x` hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub nonce: String,
    pub gas_price: String,
    pub gas_limit: String,
}

fn hex_quantity(value: u64) -> String {
    format!("{value:#x}")
}

fn parse_u64(field: &str, value: &str) -> Result<u64, ConstructionError> {
    quantity::parse(value).map_err(|e| ConstructionError::InvalidMetadata(format!("{field}: {e}")))
}

fn parse_u256(field: &str, value: &str) -> Result<U256, ConstructionError> {
    U256::from_str(value).map_err(|e| ConstructionError::InvalidMetadata(format!("{field}: {e}")))
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConstructionError> {
    Address::from_str(value)
        .map_err(|e| ConstructionError::MalformedOperations(format!("{field} {value}: {e}")))
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, ConstructionError> {
    from_hex(value).map_err(|e| ConstructionError::InvalidTransaction(format!("{field}: {e}")))
}

/// Serialize a typed options/metadata struct into a JSON object.
pub fn to_json_map<T: Serialize>(value: &T) -> Result<JsonMap, ConstructionError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(ConstructionError::InvalidMetadata(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(ConstructionError::InvalidMetadata(e.to_string())),
    }
}

/// Deserialize a JSON object into a typed options/metadata struct.
pub fn from_json_map<T: DeserializeOwned>(map: JsonMap) -> Result<T, ConstructionError> {
    serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|e| ConstructionError::InvalidMetadata(e.to_string()))
}

// =============================================================================
// Operations
// =============================================================================

/// A native transfer described by a debit/credit operation pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

fn operation_account(op: &Operation) -> Result<Address, ConstructionError> {
    let account = op.account.as_ref().ok_or_else(|| {
        ConstructionError::MalformedOperations(format!("operation {} has no account", op.index()))
    })?;
    parse_address("account", &account.address)
}

/// Validate a `[debit, credit]` pair and extract the transfer it describes.
pub fn transfer_from_operations(operations: &[Operation]) -> Result<Transfer, ConstructionError> {
    let [debit_op, credit_op] = operations else {
        return Err(ConstructionError::MalformedOperations(format!(
            "expected 2 operations, got {}",
            operations.len()
        )));
    };
    for op in [debit_op, credit_op] {
        if op.kind != op_types::CALL {
            return Err(ConstructionError::MalformedOperations(format!(
                "unsupported operation type {}",
                op.kind
            )));
        }
        if let Some(amount) = &op.amount {
            if amount.currency.symbol != SYMBOL || amount.currency.decimals != DECIMALS {
                return Err(ConstructionError::MalformedOperations(format!(
                    "unsupported currency {}",
                    amount.currency.symbol
                )));
            }
        }
    }

    let debited = debit_op.signed_value().ok_or_else(|| {
        ConstructionError::MalformedOperations("unparseable debit amount".to_string())
    })?;
    let credited = credit_op.signed_value().ok_or_else(|| {
        ConstructionError::MalformedOperations("unparseable credit amount".to_string())
    })?;
    if debited.is_positive() || credited.is_negative() || !(debited + credited).is_zero() {
        return Err(ConstructionError::MalformedOperations(
            "operations must debit the sender and credit the recipient the same amount"
                .to_string(),
        ));
    }

    Ok(Transfer {
        from: operation_account(debit_op)?,
        to: operation_account(credit_op)?,
        value: credited.into_raw(),
    })
}

/// The debit/credit pair for a transfer; statuses are left unset.
pub fn transfer_operations(from: Address, to: Option<Address>, value: U256) -> Vec<Operation> {
    let mut operations = vec![Operation {
        operation_identifier: OperationIdentifier { index: 0 },
        related_operations: None,
        kind: op_types::CALL.to_string(),
        status: None,
        account: Some(AccountIdentifier::new(from.to_checksum(None))),
        amount: Some(debit(value)),
        metadata: None,
    }];
    if let Some(to) = to {
        operations.push(Operation {
            operation_identifier: OperationIdentifier { index: 1 },
            related_operations: Some(vec![OperationIdentifier { index: 0 }]),
            kind: op_types::CALL.to_string(),
            status: None,
            account: Some(AccountIdentifier::new(to.to_checksum(None))),
            amount: Some(credit(value)),
            metadata: None,
        });
    }
    operations
}

// =============================================================================
// Steps
// =============================================================================

/// Address of a secp256k1 public key.
pub fn derive(public_key: &PublicKey) -> Result<AccountIdentifier, ConstructionError> {
    if public_key.curve_type != CURVE_SECP256K1 {
        return Err(ConstructionError::UnsupportedKeyType(format!(
            "curve {}",
            public_key.curve_type
        )));
    }
    let bytes = from_hex(&public_key.hex_bytes)
        .map_err(|e| ConstructionError::UnsupportedKeyType(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ConstructionError::UnsupportedKeyType("empty key".to_string()));
    }
    let address = recover_sender(&bytes)
        .map_err(|e| ConstructionError::UnsupportedKeyType(e.to_string()))?;
    Ok(AccountIdentifier::new(address.to_checksum(None)))
}

/// Turn the operation pair into [`Options`]. Gas overrides are taken from
/// `metadata.gas_price` and `metadata.gas_limit` when present.
pub fn preprocess(
    operations: &[Operation],
    metadata: Option<&JsonMap>,
) -> Result<Options, ConstructionError> {
    let transfer = transfer_from_operations(operations)?;
    let override_field = |name: &str| -> Result<Option<String>, ConstructionError> {
        match metadata.and_then(|m| m.get(name)) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
            Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(ConstructionError::InvalidMetadata(format!("{name}: {other}"))),
        }
    };

    let options = Options {
        sender: transfer.from.to_checksum(None),
        recipient: transfer.to.to_checksum(None),
        amount: transfer.value.to_string(),
        symbol: SYMBOL.to_string(),
        decimals: DECIMALS,
        gas_price: override_field("gas_price")?,
        gas_limit: override_field("gas_limit")?,
    };
    if let Some(gas_price) = &options.gas_price {
        parse_u256("gas_price", gas_price)?;
    }
    if let Some(gas_limit) = &options.gas_limit {
        parse_u64("gas_limit", gas_limit)?;
    }
    Ok(options)
}

/// Fetch the nonce and gas price for `options` and estimate the fee.
pub async fn metadata<C: Client>(
    client: &C,
    options: &Options,
) -> Result<(Metadata, Amount), ConstructionError> {
    let sender = parse_address("sender", &options.sender)?;
    let recipient = parse_address("recipient", &options.recipient)?;
    let amount = parse_u256("amount", &options.amount)?;

    let nonce = client
        .pending_nonce_at(sender)
        .await
        .map_err(ConstructionError::AccountLookupFailed)?;
    let gas_price = match &options.gas_price {
        Some(price) => parse_u256("gas_price", price)?,
        None => client
            .suggest_gas_price()
            .await
            .map_err(ConstructionError::EstimationFailed)?,
    };
    let gas_limit = match &options.gas_limit {
        Some(limit) => parse_u64("gas_limit", limit)?,
        None => DEFAULT_GAS_LIMIT,
    };
    let estimate = client
        .estimate_gas(CallArgs {
            from: sender,
            to: Some(recipient),
            value: Some(amount),
            data: None,
        })
        .await
        .map_err(ConstructionError::EstimationFailed)?;

    tracing::debug!(sender = %sender, nonce, gas_limit, estimate, "construction metadata");
    let fee = U256::from(estimate) * gas_price;
    Ok((
        Metadata {
            nonce: hex_quantity(nonce),
            gas_price: format!("0x{gas_price:x}"),
            gas_limit: hex_quantity(gas_limit),
        },
        credit(fee),
    ))
}

/// Build the unsigned envelope and the single payload its sender must sign.
pub fn payloads(
    operations: &[Operation],
    metadata: &Metadata,
    chain_id: u64,
) -> Result<(String, SigningPayload), ConstructionError> {
    let transfer = transfer_from_operations(operations)?;
    let envelope = UnsignedEnvelope {
        from: transfer.from,
        to: transfer.to,
        value: transfer.value,
        input: Bytes::new(),
        nonce: parse_u64("nonce", &metadata.nonce)?,
        gas_price: parse_u256("gas_price", &metadata.gas_price)?,
        gas_limit: parse_u64("gas_limit", &metadata.gas_limit)?,
        chain_id,
    };
    let payload = SigningPayload {
        account_identifier: AccountIdentifier::new(transfer.from.to_checksum(None)),
        hex_bytes: to_hex(envelope.signing_hash()),
        signature_type: SIGNATURE_ECDSA_RECOVERY.to_string(),
    };
    Ok((to_hex(envelope.encode()), payload))
}

/// Attach the signature to the envelope and return the hex signed transaction.
pub fn combine(
    unsigned_transaction: &str,
    signatures: &[Signature],
    chain_id: u64,
) -> Result<String, ConstructionError> {
    let envelope = UnsignedEnvelope::decode(&decode_hex("unsigned_transaction", unsigned_transaction)?)
        .map_err(|e| ConstructionError::InvalidTransaction(e.to_string()))?;
    let [signature] = signatures else {
        return Err(ConstructionError::SignatureCount(signatures.len()));
    };
    let bytes = from_hex(&signature.hex_bytes)
        .map_err(|e| ConstructionError::InvalidTransaction(format!("signature: {e}")))?;
    if bytes.len() != 65 {
        return Err(ConstructionError::InvalidSignatureLength(bytes.len()));
    }
    check_chain(envelope.chain_id, chain_id)?;

    let signed = SignedTransaction::from_envelope(&envelope, &bytes)?;
    let recovered = signed.sender()?;
    if recovered != envelope.from {
        return Err(ConstructionError::SignerMismatch {
            expected: envelope.from,
            recovered,
        });
    }
    Ok(to_hex(signed.encode()))
}

fn check_chain(transaction_chain: u64, chain_id: u64) -> Result<(), ConstructionError> {
    if transaction_chain != chain_id {
        return Err(ConstructionError::InvalidNetwork(format!(
            "transaction is for chain {transaction_chain}, network is {chain_id}"
        )));
    }
    Ok(())
}

fn parse_metadata(
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    chain_id: Option<u64>,
) -> JsonMap {
    let mut metadata = JsonMap::new();
    metadata.insert("nonce".to_string(), hex_quantity(nonce).into());
    metadata.insert("gas_price".to_string(), format!("0x{gas_price:x}").into());
    metadata.insert("gas_limit".to_string(), hex_quantity(gas_limit).into());
    if let Some(chain_id) = chain_id {
        metadata.insert("chain_id".to_string(), hex_quantity(chain_id).into());
    }
    metadata
}

/// Describe a signed or unsigned transaction.
///
/// For signed transactions the sender is recovered from the signature.
pub fn parse(
    transaction: &str,
    signed: bool,
    chain_id: u64,
) -> Result<ConstructionParseResponse, ConstructionError> {
    let bytes = decode_hex("transaction", transaction)?;
    if !signed {
        let envelope = UnsignedEnvelope::decode(&bytes)
            .map_err(|e| ConstructionError::InvalidTransaction(e.to_string()))?;
        check_chain(envelope.chain_id, chain_id)?;
        return Ok(ConstructionParseResponse {
            operations: transfer_operations(envelope.from, Some(envelope.to), envelope.value),
            account_identifier_signers: Vec::new(),
            metadata: Some(parse_metadata(
                envelope.nonce,
                envelope.gas_price,
                envelope.gas_limit,
                Some(envelope.chain_id),
            )),
        });
    }

    let tx = SignedTransaction::decode(&bytes)
        .map_err(|e| ConstructionError::InvalidTransaction(e.to_string()))?;
    if let Some(tx_chain) = tx.chain_id() {
        check_chain(tx_chain, chain_id)?;
    }
    let sender = tx.sender()?;
    Ok(ConstructionParseResponse {
        operations: transfer_operations(sender, tx.to, tx.value),
        account_identifier_signers: vec![AccountIdentifier::new(sender.to_checksum(None))],
        metadata: Some(parse_metadata(tx.nonce, tx.gas_price, tx.gas_limit, tx.chain_id())),
    })
}

/// Identifier of a signed transaction, computed from its decoded form.
pub fn hash(signed_transaction: &str) -> Result<TransactionIdentifier, ConstructionError> {
    let tx = SignedTransaction::decode(&decode_hex("signed_transaction", signed_transaction)?)
        .map_err(|e| ConstructionError::InvalidTransaction(e.to_string()))?;
    Ok(TransactionIdentifier {
        hash: tx.hash().to_string(),
    })
}

/// Relay a signed transaction to the node.
pub async fn submit<C: Client>(
    client: &C,
    signed_transaction: &str,
) -> Result<TransactionIdentifier, ConstructionError> {
    let bytes = decode_hex("signed_transaction", signed_transaction)?;
    let hash = client
        .submit_tx(bytes)
        .await
        .map_err(ConstructionError::SubmissionRejected)?;
    Ok(TransactionIdentifier {
        hash: hash.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::currency;
    use crate::testing::{addr, sign_prehash, test_key, InMemoryClient};
    use alloy::primitives::B256;
    use serde_json::json;

    const CHAIN_ID: u64 = 88;

    fn signer() -> Address {
        "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse().unwrap()
    }

    fn transfer_ops(from: Address, to: Address, value: &str) -> Vec<Operation> {
        let mut ops = transfer_operations(from, Some(to), U256::ZERO);
        ops[0].amount = Some(Amount {
            value: format!("-{value}"),
            currency: currency(),
        });
        ops[1].amount = Some(Amount {
            value: value.to_string(),
            currency: currency(),
        });
        ops
    }

    fn signature(hex_bytes: String, payload: SigningPayload) -> Signature {
        Signature {
            signing_payload: payload,
            public_key: PublicKey {
                hex_bytes: String::new(),
                curve_type: CURVE_SECP256K1.to_string(),
            },
            signature_type: SIGNATURE_ECDSA_RECOVERY.to_string(),
            hex_bytes,
        }
    }

    #[test]
    fn derive_returns_checksummed_address() {
        let key = test_key(1);
        let compressed = key.verifying_key().to_encoded_point(true);
        let public_key = PublicKey {
            hex_bytes: to_hex(compressed.as_bytes()),
            curve_type: CURVE_SECP256K1.to_string(),
        };
        assert_eq!(derive(&public_key).unwrap().address, signer().to_checksum(None));
    }

    #[test]
    fn derive_rejects_other_curves_and_empty_keys() {
        let edwards = PublicKey {
            hex_bytes: "0x01".to_string(),
            curve_type: "edwards25519".to_string(),
        };
        assert!(matches!(derive(&edwards), Err(ConstructionError::UnsupportedKeyType(_))));

        let empty = PublicKey {
            hex_bytes: String::new(),
            curve_type: CURVE_SECP256K1.to_string(),
        };
        assert!(matches!(derive(&empty), Err(ConstructionError::UnsupportedKeyType(_))));
    }

    #[test]
    fn preprocess_requires_exactly_two_operations() {
        let ops = transfer_ops(signer(), addr(2), "100");
        for count in [0, 1, 3] {
            let mut input = ops.clone();
            input.resize(count, ops[0].clone());
            assert!(matches!(
                preprocess(&input, None),
                Err(ConstructionError::MalformedOperations(_))
            ));
        }
    }

    #[test]
    fn preprocess_rejects_unbalanced_amounts() {
        let mut ops = transfer_ops(signer(), addr(2), "100");
        ops[1].amount.as_mut().unwrap().value = "99".to_string();
        assert!(matches!(
            preprocess(&ops, None),
            Err(ConstructionError::MalformedOperations(_))
        ));
    }

    #[test]
    fn preprocess_carries_gas_overrides() {
        let ops = transfer_ops(signer(), addr(2), "100");
        let mut metadata = JsonMap::new();
        metadata.insert("gas_limit".to_string(), json!(50_000));
        metadata.insert("gas_price".to_string(), json!("0x3b9aca00"));

        let options = preprocess(&ops, Some(&metadata)).unwrap();
        assert_eq!(options.sender, signer().to_checksum(None));
        assert_eq!(options.recipient, addr(2).to_checksum(None));
        assert_eq!(options.amount, "100");
        assert_eq!(options.gas_limit.as_deref(), Some("50000"));
        assert_eq!(options.gas_price.as_deref(), Some("0x3b9aca00"));

        let map = to_json_map(&options).unwrap();
        assert_eq!(map["symbol"], "TOMO");
        assert_eq!(from_json_map::<Options>(map).unwrap(), options);
    }

    #[tokio::test]
    async fn metadata_queries_nonce_price_and_estimate() {
        let mut client = InMemoryClient::new(CHAIN_ID);
        client.nonce = 7;
        client.gas_estimate = 21_000;
        let options = preprocess(&transfer_ops(signer(), addr(2), "100"), None).unwrap();

        let (metadata, fee) = metadata(&client, &options).await.unwrap();
        assert_eq!(metadata.nonce, "0x7");
        assert_eq!(metadata.gas_limit, "0x5208");
        assert_eq!(metadata.gas_price, format!("0x{:x}", client.gas_price));
        assert_eq!(fee.value, (U256::from(21_000u64) * client.gas_price).to_string());

        let estimates = client.estimates.lock().unwrap();
        assert_eq!(estimates[0].from, signer());
        assert_eq!(estimates[0].value, Some(U256::from(100u64)));
    }

    #[tokio::test]
    async fn metadata_prefers_supplied_gas_price() {
        let client = InMemoryClient::new(CHAIN_ID);
        let mut options = preprocess(&transfer_ops(signer(), addr(2), "1"), None).unwrap();
        options.gas_price = Some("10".to_string());

        let (metadata, fee) = metadata(&client, &options).await.unwrap();
        assert_eq!(metadata.gas_price, "0xa");
        assert_eq!(fee.value, "210000");
    }

    #[test]
    fn construction_round_trip_reproduces_the_transfer() {
        let key = test_key(1);
        let recipient = addr(2);
        let ops = transfer_ops(signer(), recipient, "100");
        let metadata = Metadata {
            nonce: "0x5".to_string(),
            gas_price: "0x3b9aca00".to_string(),
            gas_limit: hex_quantity(DEFAULT_GAS_LIMIT),
        };

        let (unsigned, payload) = payloads(&ops, &metadata, CHAIN_ID).unwrap();
        assert_eq!(payload.account_identifier.address, signer().to_checksum(None));

        let unsigned_view = parse(&unsigned, false, CHAIN_ID).unwrap();
        assert!(unsigned_view.account_identifier_signers.is_empty());
        assert_eq!(unsigned_view.operations[0].account.as_ref().unwrap().address, signer().to_checksum(None));

        let prehash: B256 = payload.hex_bytes.parse().unwrap();
        let sig = sign_prehash(&key, &prehash);
        let signed = combine(&unsigned, &[signature(to_hex(sig), payload)], CHAIN_ID).unwrap();

        let parsed = parse(&signed, true, CHAIN_ID).unwrap();
        assert_eq!(parsed.operations, unsigned_view.operations);
        assert_eq!(parsed.operations[0].amount.as_ref().unwrap().value, "-100");
        assert_eq!(parsed.operations[1].amount.as_ref().unwrap().value, "100");
        assert_eq!(parsed.operations[1].account.as_ref().unwrap().address, recipient.to_checksum(None));
        assert_eq!(
            parsed.account_identifier_signers,
            vec![AccountIdentifier::new(signer().to_checksum(None))]
        );
        let meta = parsed.metadata.unwrap();
        assert_eq!(meta["nonce"], "0x5");
        assert_eq!(meta["gas_price"], "0x3b9aca00");
        assert_eq!(meta["chain_id"], "0x58");

        let id = hash(&signed).unwrap();
        let raw = from_hex(&signed).unwrap();
        assert_eq!(id.hash, alloy::primitives::keccak256(&raw).to_string());
    }

    #[test]
    fn combine_validates_signature_shape_and_network() {
        let ops = transfer_ops(signer(), addr(2), "1");
        let metadata = Metadata {
            nonce: "0x0".to_string(),
            gas_price: "0x1".to_string(),
            gas_limit: "0x5208".to_string(),
        };
        let (unsigned, payload) = payloads(&ops, &metadata, CHAIN_ID).unwrap();
        let prehash: B256 = payload.hex_bytes.parse().unwrap();
        let sig = sign_prehash(&test_key(1), &prehash);

        for len in [0usize, 64, 66] {
            let mut bytes = sig.to_vec();
            bytes.resize(len, 0);
            let err = combine(&unsigned, &[signature(to_hex(&bytes), payload.clone())], CHAIN_ID)
                .unwrap_err();
            assert_eq!(err, ConstructionError::InvalidSignatureLength(len));
        }

        let err = combine(&unsigned, &[], CHAIN_ID).unwrap_err();
        assert_eq!(err, ConstructionError::SignatureCount(0));

        let err = combine(&unsigned, &[signature(to_hex(sig), payload.clone())], 89).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidNetwork(_)));

        let wrong_key = sign_prehash(&test_key(9), &prehash);
        let err = combine(&unsigned, &[signature(to_hex(wrong_key), payload)], CHAIN_ID)
            .unwrap_err();
        assert!(matches!(err, ConstructionError::SignerMismatch { .. }));
    }

    #[test]
    fn parse_rejects_transactions_for_another_chain() {
        let ops = transfer_ops(signer(), addr(2), "1");
        let metadata = Metadata {
            nonce: "0x0".to_string(),
            gas_price: "0x1".to_string(),
            gas_limit: "0x5208".to_string(),
        };
        let (unsigned, payload) = payloads(&ops, &metadata, CHAIN_ID).unwrap();
        assert!(matches!(
            parse(&unsigned, false, 89),
            Err(ConstructionError::InvalidNetwork(_))
        ));

        let prehash: B256 = payload.hex_bytes.parse().unwrap();
        let sig = sign_prehash(&test_key(1), &prehash);
        let signed = combine(&unsigned, &[signature(to_hex(sig), payload)], CHAIN_ID).unwrap();
        assert!(matches!(
            parse(&signed, true, 89),
            Err(ConstructionError::InvalidNetwork(_))
        ));
    }

    #[test]
    fn hash_rejects_garbage() {
        assert!(matches!(hash("0xzz"), Err(ConstructionError::InvalidTransaction(_))));
        assert!(matches!(hash("0xc0"), Err(ConstructionError::InvalidTransaction(_))));
    }

    #[tokio::test]
    async fn submit_relays_bytes_and_maps_rejections() {
        let client = InMemoryClient::new(CHAIN_ID);
        let id = submit(&client, "0xdeadbeef").await.unwrap();
        assert_eq!(id.hash, alloy::primitives::keccak256([0xde, 0xad, 0xbe, 0xef]).to_string());
        assert_eq!(client.submitted.lock().unwrap()[0], vec![0xde, 0xad, 0xbe, 0xef]);

        let mut rejecting = InMemoryClient::new(CHAIN_ID);
        rejecting.submit_error = Some(ClientError::InvalidInput("nonce too low".to_string()));
        let err = submit(&rejecting, "0x01").await.unwrap_err();
        assert!(matches!(err, ConstructionError::SubmissionRejected(_)));
    }
}
