//! `ApiVersions` (key 18) response.
//!
//! The request body is never read: clients only need the header to be
//! answered.

use crate::api::{ApiKey, ErrorCode};
use crate::encoder::Encoder;

/// One advertised API with its version range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

impl From<ApiKey> for ApiVersion {
    fn from(key: ApiKey) -> Self {
        let range = key.advertised_versions();
        Self {
            api_key: key.as_i16(),
            min_version: range.min,
            max_version: range.max,
        }
    }
}

/// `ApiVersions` response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersionsResponse {
    pub error_code: ErrorCode,
    pub api_keys: Vec<ApiVersion>,
    pub throttle_time_ms: i32,
}

impl ApiVersionsResponse {
    /// Response advertising every supported API.
    #[must_use]
    pub fn supported() -> Self {
        Self {
            error_code: ErrorCode::None,
            api_keys: ApiKey::ALL.into_iter().map(ApiVersion::from).collect(),
            throttle_time_ms: 0,
        }
    }

    /// Error-only response.
    #[must_use]
    pub const fn error(error_code: ErrorCode) -> Self {
        Self {
            error_code,
            api_keys: Vec::new(),
            throttle_time_ms: 0,
        }
    }

    /// Encodes the body. An error response carries only the error code.
    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_i16(self.error_code.as_i16());
        if self.error_code != ErrorCode::None {
            return;
        }

        enc.put_compact_array_len(self.api_keys.len());
        for api in &self.api_keys {
            enc.put_i16(api.api_key);
            enc.put_i16(api.min_version);
            enc.put_i16(api.max_version);
            enc.put_empty_tagged_fields();
        }
        enc.put_i32(self.throttle_time_ms);
        enc.put_empty_tagged_fields();
    }
}
