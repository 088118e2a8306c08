//! API keys, error codes and version ranges.
//!
//! See: <https://kafka.apache.org/protocol#protocol_api_keys> and
//! <https://kafka.apache.org/protocol#protocol_error_codes>

use std::fmt;

/// Request kinds this broker recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum ApiKey {
    /// Fetch records from partitions.
    Fetch = 1,
    /// Discover supported APIs and versions.
    ApiVersions = 18,
    /// Describe topics and their partitions.
    DescribeTopicPartitions = 75,
}

impl ApiKey {
    /// Every recognised key, in advertisement order.
    pub const ALL: [Self; 3] = [Self::ApiVersions, Self::DescribeTopicPartitions, Self::Fetch];

    /// Maps a wire api key to a known request kind.
    #[must_use]
    pub const fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Fetch),
            18 => Some(Self::ApiVersions),
            75 => Some(Self::DescribeTopicPartitions),
            _ => None,
        }
    }

    /// Wire value of this key.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        self as i16
    }

    /// Version range advertised in `ApiVersions` responses.
    #[must_use]
    pub const fn advertised_versions(self) -> VersionRange {
        match self {
            Self::ApiVersions => VersionRange::new(0, 5),
            Self::DescribeTopicPartitions => VersionRange::new(0, 11),
            Self::Fetch => VersionRange::new(0, 17),
        }
    }

    /// Human-readable API name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fetch => "Fetch",
            Self::ApiVersions => "ApiVersions",
            Self::DescribeTopicPartitions => "DescribeTopicPartitions",
        }
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.as_i16())
    }
}

/// Inclusive range of protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    /// Lowest version.
    pub min: i16,
    /// Highest version.
    pub max: i16,
}

impl VersionRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: i16, max: i16) -> Self {
        Self { min, max }
    }

    /// Returns true if `version` lies within the range.
    #[must_use]
    pub const fn contains(self, version: i16) -> bool {
        version >= self.min && version <= self.max
    }
}

/// Request versions the dispatcher accepts, for every request kind.
pub const SUPPORTED_REQUEST_VERSIONS: VersionRange = VersionRange::new(0, 4);

/// Protocol error codes carried in response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum ErrorCode {
    /// NONE (0).
    None = 0,
    /// `UNKNOWN_TOPIC_OR_PARTITION` (3).
    UnknownTopicOrPartition = 3,
    /// `UNSUPPORTED_VERSION` (35).
    UnsupportedVersion = 35,
    /// `UNKNOWN_TOPIC_ID` (100).
    UnknownTopic = 100,
}

impl ErrorCode {
    /// Wire value of this code.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        self as i16
    }

    /// Maps a wire value back to a known code.
    #[must_use]
    pub const fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            3 => Some(Self::UnknownTopicOrPartition),
            35 => Some(Self::UnsupportedVersion),
            100 => Some(Self::UnknownTopic),
            _ => None,
        }
    }
}

/// `topic_authorized_operations` bitfield reported for every topic.
pub const TOPIC_AUTHORIZED_OPERATIONS: i32 = 3576;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_roundtrip() {
        for key in ApiKey::ALL {
            assert_eq!(ApiKey::from_i16(key.as_i16()), Some(key));
        }
        assert_eq!(ApiKey::from_i16(3), None);
    }

    #[test]
    fn test_api_key_display() {
        assert_eq!(format!("{}", ApiKey::Fetch), "Fetch(1)");
    }

    #[test]
    fn test_supported_versions() {
        assert!(SUPPORTED_REQUEST_VERSIONS.contains(0));
        assert!(SUPPORTED_REQUEST_VERSIONS.contains(4));
        assert!(!SUPPORTED_REQUEST_VERSIONS.contains(5));
        assert!(!SUPPORTED_REQUEST_VERSIONS.contains(-1));
    }

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::UnsupportedVersion.as_i16(), 35);
        assert_eq!(ErrorCode::from_i16(100), Some(ErrorCode::UnknownTopic));
        assert_eq!(ErrorCode::from_i16(7), None);
    }
}
