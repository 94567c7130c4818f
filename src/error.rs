// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rosetta error objects.
//!
//! Every failure leaves the HTTP layer as an [`ApiError`] carrying one of the
//! fixed [`ErrorCode`]s. The catalogue is published through
//! `/network/options`, so codes are never renumbered.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chain::GatewayError;
use crate::client::ClientError;
use crate::construction::ConstructionError;
use crate::models::JsonMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnavailableOffline = 1,
    NodeNotReady = 2,
    Transport = 3,
    NotFound = 4,
    MalformedNodeResponse = 5,
    NodeRejected = 6,
    InvalidNetwork = 7,
    InvalidInput = 8,
    NotImplemented = 9,
    UnsupportedKeyType = 10,
    MalformedOperations = 11,
    InvalidMetadata = 12,
    UnableToParseTransaction = 13,
    InvalidSignature = 14,
    SignerMismatch = 15,
    EstimationFailed = 16,
    AccountLookupFailed = 17,
    SubmissionRejected = 18,
    CallParametersInvalid = 19,
    CallMethodInvalid = 20,
    CallOutputMarshal = 21,
    Consistency = 22,
    SealerRecovery = 23,
    Internal = 24,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 24] = [
        Self::UnavailableOffline,
        Self::NodeNotReady,
        Self::Transport,
        Self::NotFound,
        Self::MalformedNodeResponse,
        Self::NodeRejected,
        Self::InvalidNetwork,
        Self::InvalidInput,
        Self::NotImplemented,
        Self::UnsupportedKeyType,
        Self::MalformedOperations,
        Self::InvalidMetadata,
        Self::UnableToParseTransaction,
        Self::InvalidSignature,
        Self::SignerMismatch,
        Self::EstimationFailed,
        Self::AccountLookupFailed,
        Self::SubmissionRejected,
        Self::CallParametersInvalid,
        Self::CallMethodInvalid,
        Self::CallOutputMarshal,
        Self::Consistency,
        Self::SealerRecovery,
        Self::Internal,
    ];

    pub fn message(self) -> &'static str {
        match self {
            Self::UnavailableOffline => "Endpoint unavailable offline",
            Self::NodeNotReady => "Node is not ready",
            Self::Transport => "Unable to reach the node",
            Self::NotFound => "Not found",
            Self::MalformedNodeResponse => "Malformed node response",
            Self::NodeRejected => "Node returned an error",
            Self::InvalidNetwork => "Invalid network identifier",
            Self::InvalidInput => "Invalid input",
            Self::NotImplemented => "Endpoint not implemented",
            Self::UnsupportedKeyType => "Unsupported public key",
            Self::MalformedOperations => "Malformed operations",
            Self::InvalidMetadata => "Invalid options or metadata",
            Self::UnableToParseTransaction => "Unable to parse transaction",
            Self::InvalidSignature => "Invalid signature",
            Self::SignerMismatch => "Signature does not match the sender",
            Self::EstimationFailed => "Unable to estimate gas",
            Self::AccountLookupFailed => "Unable to look up account",
            Self::SubmissionRejected => "Transaction submission rejected",
            Self::CallParametersInvalid => "Call parameters invalid",
            Self::CallMethodInvalid => "Call method invalid",
            Self::CallOutputMarshal => "Call output marshal failed",
            Self::Consistency => "Operation derivation inconsistent",
            Self::SealerRecovery => "Unable to recover block sealer",
            Self::Internal => "Internal error",
        }
    }

    pub fn retriable(self) -> bool {
        matches!(
            self,
            Self::NodeNotReady
                | Self::Transport
                | Self::EstimationFailed
                | Self::AccountLookupFailed
                | Self::Internal
        )
    }
}

/// Rosetta error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i32,
    pub message: String,
    pub retriable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonMap>,
}

impl ApiError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code: code as i32,
            message: code.message().to_string(),
            retriable: code.retriable(),
            details: None,
        }
    }

    /// Attach the underlying error text as `details.error`.
    pub fn with_error(code: ErrorCode, error: impl std::fmt::Display) -> Self {
        let mut details = JsonMap::new();
        details.insert("error".to_string(), json!(error.to_string()));
        Self {
            details: Some(details),
            ..Self::new(code)
        }
    }

    /// The full catalogue, as listed by `/network/options`.
    pub fn all() -> Vec<ApiError> {
        ErrorCode::ALL.into_iter().map(Self::new).collect()
    }
}

impl From<ClientError> for ApiError {
    fn from(e: ClientError) -> Self {
        match &e {
            ClientError::Gateway(GatewayError::Transport(_)) => {
                Self::with_error(ErrorCode::Transport, &e)
            }
            ClientError::Gateway(GatewayError::NotFound(_)) => {
                Self::with_error(ErrorCode::NotFound, &e)
            }
            ClientError::Gateway(GatewayError::Decode(_)) => {
                Self::with_error(ErrorCode::MalformedNodeResponse, &e)
            }
            ClientError::Gateway(GatewayError::Remote { code, message }) => {
                let mut details = JsonMap::new();
                details.insert("code".to_string(), json!(code));
                details.insert("message".to_string(), json!(message));
                Self {
                    details: Some(details),
                    ..Self::new(ErrorCode::NodeRejected)
                }
            }
            ClientError::Recovery(_) => Self::with_error(ErrorCode::SealerRecovery, &e),
            ClientError::Trace(_) => Self::with_error(ErrorCode::Consistency, &e),
            ClientError::NodeNotReady(_) => Self::with_error(ErrorCode::NodeNotReady, &e),
            ClientError::InvalidInput(_) => Self::with_error(ErrorCode::InvalidInput, &e),
            ClientError::CallParametersInvalid(_) => {
                Self::with_error(ErrorCode::CallParametersInvalid, &e)
            }
            ClientError::CallMethodInvalid(_) => Self::with_error(ErrorCode::CallMethodInvalid, &e),
            ClientError::CallOutputMarshal(_) => Self::with_error(ErrorCode::CallOutputMarshal, &e),
            ClientError::Task(_) => Self::with_error(ErrorCode::Internal, &e),
        }
    }
}

impl From<ConstructionError> for ApiError {
    fn from(e: ConstructionError) -> Self {
        let code = match &e {
            ConstructionError::UnsupportedKeyType(_) => ErrorCode::UnsupportedKeyType,
            ConstructionError::MalformedOperations(_) => ErrorCode::MalformedOperations,
            ConstructionError::InvalidMetadata(_) => ErrorCode::InvalidMetadata,
            ConstructionError::InvalidTransaction(_) => ErrorCode::UnableToParseTransaction,
            ConstructionError::SignatureCount(_)
            | ConstructionError::InvalidSignatureLength(_)
            | ConstructionError::Recovery(_) => ErrorCode::InvalidSignature,
            ConstructionError::InvalidNetwork(_) => ErrorCode::InvalidNetwork,
            ConstructionError::SignerMismatch { .. } => ErrorCode::SignerMismatch,
            ConstructionError::EstimationFailed(_) => ErrorCode::EstimationFailed,
            ConstructionError::AccountLookupFailed(_) => ErrorCode::AccountLookupFailed,
            ConstructionError::SubmissionRejected(_) => ErrorCode::SubmissionRejected,
        };
        Self::with_error(code, e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}
