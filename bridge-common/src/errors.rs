// bridge-common/src/errors.rs

use crate::contract::ContractViolation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that are raised by the bridge.
///
/// Terminal rejections and lost connections are *not* in here: those surface
/// as `false`/absent results plus a [`TerminalError`] readable through
/// `last_error`.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The transport cannot even be attempted (e.g. malformed endpoint).
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout: {operation} did not answer within {timeout_ms} ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl BridgeError {
    pub fn serialization(msg: impl Into<String>) -> Self {
        BridgeError::Serialization(msg.into())
    }
}

// ====================================================================
// TERMINAL ERROR STATE
// ====================================================================

pub mod codes {
    pub const RES_S_OK: i32 = 1;
    pub const RES_E_FAIL: i32 = -1;
    pub const RES_E_INVALID_PARAMS: i32 = -2;
    pub const RES_E_NO_MEMORY: i32 = -3;
    pub const RES_E_NOT_FOUND: i32 = -4;
    pub const RES_E_INVALID_VERSION: i32 = -5;
    pub const RES_E_AUTH_FAILED: i32 = -6;
    pub const RES_E_UNSUPPORTED: i32 = -7;
    pub const RES_E_AUTO_TRADING_DISABLED: i32 = -8;
    pub const RES_E_INTERNAL_FAIL: i32 = -10000;
    pub const RES_E_INTERNAL_FAIL_SEND: i32 = -10001;
    pub const RES_E_INTERNAL_FAIL_RECEIVE: i32 = -10002;
    pub const RES_E_INTERNAL_FAIL_INIT: i32 = -10003;
    pub const RES_E_INTERNAL_FAIL_CONNECT: i32 = -10004;
    pub const RES_E_INTERNAL_FAIL_TIMEOUT: i32 = -10005;
}

/// Codes for which a caller-side retry is reasonable.
const RETRYABLE_CODES: &[i32] = &[
    codes::RES_E_INTERNAL_FAIL_CONNECT,
    codes::RES_E_INTERNAL_FAIL_TIMEOUT,
    128, // trade timeout
    129, // invalid price
    136, // off quotes
    137, // broker busy
    138, // requote
    141, // too many requests
    146, // trade context busy
];

/// Codes that will fail again no matter how often they are retried.
const PERMANENT_CODES: &[i32] = &[
    10016, // invalid stops
    10019, // no money
    10020, // price changed
    10021, // no quotes
    10024, // too many requests / invalid params
    10027, // autotrading disabled in client
    10030, // invalid filling
];

/// The `(code, message)` pair the terminal reports through `lastError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalError {
    pub code: i32,
    pub message: String,
}

impl TerminalError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The "nothing pending" sentinel.
    pub fn none() -> Self {
        Self::new(0, "")
    }

    pub fn not_connected() -> Self {
        Self::new(codes::RES_E_INTERNAL_FAIL_CONNECT, "No IPC connection")
    }

    pub fn transport_lost(detail: &str) -> Self {
        Self::new(
            codes::RES_E_INTERNAL_FAIL_CONNECT,
            format!("Connection lost: {}", detail),
        )
    }

    pub fn timeout(operation: &str) -> Self {
        Self::new(
            codes::RES_E_INTERNAL_FAIL_TIMEOUT,
            format!("IPC timeout in {}", operation),
        )
    }

    pub fn book_not_subscribed(symbol: &str) -> Self {
        Self::new(
            codes::RES_E_NOT_FOUND,
            format!("No market book subscription for {}", symbol),
        )
    }

    /// `0` and `RES_S_OK` both mean "no error".
    pub fn is_ok(&self) -> bool {
        self.code == 0 || self.code == codes::RES_S_OK
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.code,
            codes::RES_E_INTERNAL_FAIL_CONNECT
                | codes::RES_E_INTERNAL_FAIL_TIMEOUT
                | codes::RES_E_INTERNAL_FAIL_INIT
        )
    }

    pub fn is_retryable(&self) -> bool {
        RETRYABLE_CODES.contains(&self.code)
    }

    pub fn is_permanent(&self) -> bool {
        PERMANENT_CODES.contains(&self.code)
    }
}

impl Default for TerminalError {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Display for TerminalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {:?})", self.code, self.message)
    }
}
