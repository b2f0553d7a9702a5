//! Failure kinds for synthesis requests.
//!
//! Every [`crate::Error::Synthesis`] carries a [`FailureKind`] so callers can
//! tell a bad voice apart from a throttled provider without parsing messages.
//!
//! | Code  | Kind             | Category   |
//! |-------|------------------|------------|
//! | S1001 | empty_text       | request    |
//! | S1002 | invalid_voice    | request    |
//! | S1003 | invalid_request  | request    |
//! | S1004 | authentication   | request    |
//! | S2001 | rate_limited     | rate       |
//! | S3001 | provider         | provider   |
//! | S3002 | timeout          | provider   |
//! | S3003 | network          | transport  |
//! | S9999 | unknown          | unknown    |
//!
//! ## Example
//!
//! ```rust
//! use speechgen::error_code::FailureKind;
//!
//! let kind = FailureKind::from_http_status(429);
//! assert_eq!(kind.code(), "S2001");
//! assert_eq!(kind.category(), "rate");
//! ```

use std::fmt;

/// Why a synthesis request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// S1001: Text is empty or whitespace only
    EmptyText,
    /// S1002: Voice id is not in the provider's voice list, or does not speak the locale
    InvalidVoice,
    /// S1003: Provider rejected the request payload
    InvalidRequest,
    /// S1004: Missing or rejected credentials
    Authentication,
    /// S2001: Provider-side rate limiting
    RateLimited,
    /// S3001: Provider error or unusable response
    Provider,
    /// S3002: Request timed out
    Timeout,
    /// S3003: Connection or transfer failure
    Network,
    /// S9999: Anything else
    Unknown,
}

impl FailureKind {
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyText => "S1001",
            Self::InvalidVoice => "S1002",
            Self::InvalidRequest => "S1003",
            Self::Authentication => "S1004",
            Self::RateLimited => "S2001",
            Self::Provider => "S3001",
            Self::Timeout => "S3002",
            Self::Network => "S3003",
            Self::Unknown => "S9999",
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EmptyText => "empty_text",
            Self::InvalidVoice => "invalid_voice",
            Self::InvalidRequest => "invalid_request",
            Self::Authentication => "authentication",
            Self::RateLimited => "rate_limited",
            Self::Provider => "provider",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }

    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyText | Self::InvalidVoice | Self::InvalidRequest | Self::Authentication => {
                "request"
            }
            Self::RateLimited => "rate",
            Self::Provider | Self::Timeout => "provider",
            Self::Network => "transport",
            Self::Unknown => "unknown",
        }
    }

    /// Whether sending the same request later could succeed.
    ///
    /// Informational only: the synthesizer never retries on its own.
    #[inline]
    pub fn transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Provider | Self::Timeout | Self::Network
        )
    }

    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 404 | 413 | 422 => Self::InvalidRequest,
            401 | 403 => Self::Authentication,
            408 | 504 => Self::Timeout,
            429 => Self::RateLimited,
            500..=599 => Self::Provider,
            _ => Self::Unknown,
        }
    }

    /// Classify a transport-level failure from reqwest.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::from_http_status(status.as_u16())
        } else {
            Self::Network
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(FailureKind::from_http_status(429), FailureKind::RateLimited);
        assert_eq!(FailureKind::from_http_status(401), FailureKind::Authentication);
        assert_eq!(FailureKind::from_http_status(403), FailureKind::Authentication);
        assert_eq!(FailureKind::from_http_status(400), FailureKind::InvalidRequest);
        assert_eq!(FailureKind::from_http_status(422), FailureKind::InvalidRequest);
        assert_eq!(FailureKind::from_http_status(504), FailureKind::Timeout);
        assert_eq!(FailureKind::from_http_status(502), FailureKind::Provider);
        assert_eq!(FailureKind::from_http_status(302), FailureKind::Unknown);
    }

    #[test]
    fn codes_are_unique() {
        let all = [
            FailureKind::EmptyText,
            FailureKind::InvalidVoice,
            FailureKind::InvalidRequest,
            FailureKind::Authentication,
            FailureKind::RateLimited,
            FailureKind::Provider,
            FailureKind::Timeout,
            FailureKind::Network,
            FailureKind::Unknown,
        ];
        let mut codes: Vec<_> = all.iter().map(|k| k.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn transient_kinds() {
        assert!(FailureKind::RateLimited.transient());
        assert!(FailureKind::Network.transient());
        assert!(!FailureKind::InvalidVoice.transient());
        assert!(!FailureKind::EmptyText.transient());
    }
}
