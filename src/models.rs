// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Rosetta Data Models
//!
//! Request and response structures for the Rosetta Data and Construction
//! APIs, plus the block/transaction/operation types produced by the chain
//! module. Everything here is plain serde data: big integers travel as
//! decimal strings (amounts) or `0x` quantities (metadata).
//!
//! ## Model Categories
//!
//! - **Identifiers**: network, block, transaction, account, operation
//! - **Data**: blocks, transactions, operations, amounts
//! - **Requests/Responses**: one pair per endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form metadata object.
pub type JsonMap = serde_json::Map<String, Value>;

// =============================================================================
// Identifiers
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkIdentifier {
    pub blockchain: String,
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_network_identifier: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockIdentifier {
    pub index: i64,
    pub hash: String,
}

/// Block selector as sent by clients: hash wins over index, neither means latest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartialBlockIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionIdentifier {
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountIdentifier {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

impl AccountIdentifier {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationIdentifier {
    pub index: i64,
}

// =============================================================================
// Amounts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Currency {
    pub symbol: String,
    pub decimals: u32,
}

/// Signed decimal amount in the smallest unit of `currency`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Amount {
    pub value: String,
    pub currency: Currency,
}

// =============================================================================
// Blocks, Transactions, Operations
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    pub operation_identifier: OperationIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_operations: Option<Vec<OperationIdentifier>>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

impl Operation {
    pub fn index(&self) -> i64 {
        self.operation_identifier.index
    }

    /// Amount value parsed back into a signed integer, zero when absent.
    pub fn signed_value(&self) -> Option<alloy::primitives::I256> {
        match &self.amount {
            Some(amount) => alloy::primitives::I256::from_dec_str(&amount.value).ok(),
            None => Some(alloy::primitives::I256::ZERO),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_identifier: TransactionIdentifier,
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub block_identifier: BlockIdentifier,
    pub parent_block_identifier: BlockIdentifier,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Peer {
    pub peer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

// =============================================================================
// Construction Primitives
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKey {
    pub hex_bytes: String,
    pub curve_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SigningPayload {
    pub account_identifier: AccountIdentifier,
    pub hex_bytes: String,
    pub signature_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    pub signing_payload: SigningPayload,
    pub public_key: PublicKey,
    pub signature_type: String,
    pub hex_bytes: String,
}

// =============================================================================
// Network Endpoints
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub network_identifier: NetworkIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkListResponse {
    pub network_identifiers: Vec<NetworkIdentifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStatusResponse {
    pub current_block_identifier: BlockIdentifier,
    pub current_block_timestamp: i64,
    pub genesis_block_identifier: BlockIdentifier,
    pub sync_status: SyncStatus,
    pub peers: Vec<Peer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub rosetta_version: String,
    pub node_version: String,
    pub middleware_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationStatus {
    pub status: String,
    pub successful: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allow {
    pub operation_statuses: Vec<OperationStatus>,
    pub operation_types: Vec<String>,
    pub errors: Vec<crate::error::ApiError>,
    pub historical_balance_lookup: bool,
    pub call_methods: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkOptionsResponse {
    pub version: Version,
    pub allow: Allow,
}

// =============================================================================
// Account, Block, Mempool Endpoints
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalanceRequest {
    pub network_identifier: NetworkIdentifier,
    pub account_identifier: AccountIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_identifier: Option<PartialBlockIdentifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountBalanceResponse {
    pub block_identifier: BlockIdentifier,
    pub balances: Vec<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRequest {
    pub network_identifier: NetworkIdentifier,
    #[serde(default)]
    pub block_identifier: PartialBlockIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResponse {
    pub block: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockTransactionRequest {
    pub network_identifier: NetworkIdentifier,
    pub block_identifier: BlockIdentifier,
    pub transaction_identifier: TransactionIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolResponse {
    pub transaction_identifiers: Vec<TransactionIdentifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolTransactionRequest {
    pub network_identifier: NetworkIdentifier,
    pub transaction_identifier: TransactionIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolTransactionResponse {
    pub transaction: Transaction,
}

// =============================================================================
// Construction Endpoints
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionDeriveRequest {
    pub network_identifier: NetworkIdentifier,
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionDeriveResponse {
    pub account_identifier: AccountIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionPreprocessRequest {
    pub network_identifier: NetworkIdentifier,
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionPreprocessResponse {
    pub options: JsonMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionMetadataRequest {
    pub network_identifier: NetworkIdentifier,
    #[serde(default)]
    pub options: JsonMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionMetadataResponse {
    pub metadata: JsonMap,
    pub suggested_fee: Vec<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionPayloadsRequest {
    pub network_identifier: NetworkIdentifier,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub metadata: JsonMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionPayloadsResponse {
    pub unsigned_transaction: String,
    pub payloads: Vec<SigningPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionCombineRequest {
    pub network_identifier: NetworkIdentifier,
    pub unsigned_transaction: String,
    pub signatures: Vec<Signature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionCombineResponse {
    pub signed_transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionParseRequest {
    pub network_identifier: NetworkIdentifier,
    pub signed: bool,
    pub transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionParseResponse {
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub account_identifier_signers: Vec<AccountIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

/// Shared by `/construction/hash` and `/construction/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransactionRequest {
    pub network_identifier: NetworkIdentifier,
    pub signed_transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionIdentifierResponse {
    pub transaction_identifier: TransactionIdentifier,
}

// =============================================================================
// Call Endpoint
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub network_identifier: NetworkIdentifier,
    pub method: String,
    #[serde(default)]
    pub parameters: JsonMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallResponse {
    pub result: JsonMap,
    pub idempotent: bool,
}
