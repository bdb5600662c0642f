//! Error code definitions for the support pipeline.
//!
//! Codes follow the format `X-YYYY` where `X` identifies the originating
//! layer and `YYYY` the specific failure mode. The set of codes is a closed
//! enumeration: every code is a compile-time constant, and the registry built
//! here is immutable after startup. Constructing an error with a code outside
//! the registry is allowed (the registry is advisory for validation) but
//! emits a diagnostic warning; HTTP mapping treats the registry as
//! authoritative and falls back to 500 for anything unknown.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Opaque error code token, e.g. `E-5001`.
///
/// Codes are globally unique and immutable once defined. No dynamic codes are
/// created at runtime; the constants in this module are the full set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// Define a code constant. Only used for the constants in this module and
    /// in tests exercising the unregistered-code path.
    pub const fn new(token: &'static str) -> Self {
        Self(token)
    }

    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Originating tier of a failure, encoded as the code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Input validation (`U`).
    Validation,
    /// API / transport (`A`).
    Api,
    /// Business / retrieval logic (`B`).
    Business,
    /// Infrastructure (`I`).
    Infra,
    /// External model service (`E`).
    External,
}

impl Layer {
    pub fn prefix(self) -> char {
        match self {
            Self::Validation => 'U',
            Self::Api => 'A',
            Self::Business => 'B',
            Self::Infra => 'I',
            Self::External => 'E',
        }
    }

    /// Infer the layer from a code's prefix character. Unknown prefixes map
    /// to the API layer, matching the fallback wrapping behavior.
    pub fn from_code(code: ErrorCode) -> Self {
        match code.as_str().chars().next() {
            Some('U') => Self::Validation,
            Some('B') => Self::Business,
            Some('I') => Self::Infra,
            Some('E') => Self::External,
            _ => Self::Api,
        }
    }
}

// Validation layer (U-1xxx)
pub const VALIDATION_FAILED: ErrorCode = ErrorCode::new("U-1001");

// API layer (A-2xxx)
pub const AUTHENTICATION_FAILED: ErrorCode = ErrorCode::new("A-2001");
pub const AUTHORIZATION_FAILED: ErrorCode = ErrorCode::new("A-2002");
pub const INVALID_REQUEST: ErrorCode = ErrorCode::new("A-2003");
pub const RESOURCE_NOT_FOUND: ErrorCode = ErrorCode::new("A-2004");
pub const METHOD_NOT_ALLOWED: ErrorCode = ErrorCode::new("A-2005");
pub const RATE_LIMIT_EXCEEDED: ErrorCode = ErrorCode::new("A-2006");
pub const API_INTERNAL_ERROR: ErrorCode = ErrorCode::new("A-2999");

// Business / retrieval layer (B-3xxx)
pub const RETRIEVAL_EMPTY: ErrorCode = ErrorCode::new("B-3001");
pub const HALLUCINATION_DETECTED: ErrorCode = ErrorCode::new("B-3002");
pub const CONTEXT_MISMATCH: ErrorCode = ErrorCode::new("B-3003");
pub const PROCESSING_FAILED: ErrorCode = ErrorCode::new("B-3004");

// Infrastructure layer (I-4xxx)
pub const DB_CONNECTION_EXHAUSTED: ErrorCode = ErrorCode::new("I-4001");
pub const DB_QUERY_FAILED: ErrorCode = ErrorCode::new("I-4002");
pub const CACHE_UNAVAILABLE: ErrorCode = ErrorCode::new("I-4003");
pub const INFRA_INTERNAL_ERROR: ErrorCode = ErrorCode::new("I-4004");
pub const DEADLOCK_DETECTED: ErrorCode = ErrorCode::new("I-4005");

// External model layer (E-5xxx)
pub const MODEL_TIMEOUT: ErrorCode = ErrorCode::new("E-5001");
pub const MODEL_RATE_LIMITED: ErrorCode = ErrorCode::new("E-5002");
pub const CONTENT_FILTERED: ErrorCode = ErrorCode::new("E-5003");
pub const INVALID_MODEL_RESPONSE: ErrorCode = ErrorCode::new("E-5004");
pub const MODEL_UNAVAILABLE: ErrorCode = ErrorCode::new("E-5005");

/// Registry entry: the layer a code belongs to and its default user-facing
/// message (Japanese, matching the support UI locale).
#[derive(Debug, Clone, Copy)]
pub struct CodeInfo {
    pub layer: Layer,
    pub default_message: &'static str,
}

static REGISTRY: Lazy<HashMap<ErrorCode, CodeInfo>> = Lazy::new(|| {
    let entries: [(ErrorCode, Layer, &'static str); 22] = [
        (VALIDATION_FAILED, Layer::Validation, "入力内容に誤りがあります"),
        (AUTHENTICATION_FAILED, Layer::Api, "認証に失敗しました"),
        (AUTHORIZATION_FAILED, Layer::Api, "権限がありません"),
        (INVALID_REQUEST, Layer::Api, "リクエストが不正です"),
        (RESOURCE_NOT_FOUND, Layer::Api, "リソースが見つかりません"),
        (METHOD_NOT_ALLOWED, Layer::Api, "メソッドが許可されていません"),
        (RATE_LIMIT_EXCEEDED, Layer::Api, "レート制限を超過しました"),
        (API_INTERNAL_ERROR, Layer::Api, "APIエラーが発生しました"),
        (RETRIEVAL_EMPTY, Layer::Business, "関連する情報が見つかりませんでした"),
        (
            HALLUCINATION_DETECTED,
            Layer::Business,
            "回答の整合性を確認できませんでした",
        ),
        (CONTEXT_MISMATCH, Layer::Business, "コンテキストが質問と一致しません"),
        (PROCESSING_FAILED, Layer::Business, "処理に失敗しました"),
        (DB_CONNECTION_EXHAUSTED, Layer::Infra, "現在サービスが混雑しています"),
        (DB_QUERY_FAILED, Layer::Infra, "データの取得に失敗しました"),
        (CACHE_UNAVAILABLE, Layer::Infra, "キャッシュサービスが利用できません"),
        (INFRA_INTERNAL_ERROR, Layer::Infra, "内部エラーが発生しました"),
        (
            DEADLOCK_DETECTED,
            Layer::Infra,
            "処理が競合しました。再度お試しください",
        ),
        (MODEL_TIMEOUT, Layer::External, "AI応答がタイムアウトしました"),
        (
            MODEL_RATE_LIMITED,
            Layer::External,
            "AIサービスのレート制限に達しました",
        ),
        (
            CONTENT_FILTERED,
            Layer::External,
            "コンテンツがAIプロバイダによってフィルタリングされました",
        ),
        (
            INVALID_MODEL_RESPONSE,
            Layer::External,
            "AIから無効な応答を受け取りました",
        ),
        (
            MODEL_UNAVAILABLE,
            Layer::External,
            "AIサービスが一時的に利用できません",
        ),
    ];
    let mut map = HashMap::with_capacity(entries.len());
    for (code, layer, default_message) in entries {
        map.insert(
            code,
            CodeInfo {
                layer,
                default_message,
            },
        );
    }
    map
});

/// Look up registry metadata for a code. `None` for unregistered codes.
pub fn lookup(code: ErrorCode) -> Option<&'static CodeInfo> {
    REGISTRY.get(&code)
}

pub fn is_registered(code: ErrorCode) -> bool {
    REGISTRY.contains_key(&code)
}

/// Default user-facing message for a code, or a generic fallback for
/// unregistered codes.
pub fn default_message(code: ErrorCode) -> &'static str {
    lookup(code)
        .map(|info| info.default_message)
        .unwrap_or("エラーが発生しました")
}

/// All registered codes, for exhaustive checks over the taxonomy.
pub fn registered_codes() -> impl Iterator<Item = ErrorCode> {
    REGISTRY.keys().copied()
}
