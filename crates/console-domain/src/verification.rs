//! Verification code purposes and delivery channels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;

/// What a verification code proves control of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPurpose {
    EmailVerification,
    PhoneVerification,
}

impl VerificationPurpose {
    /// Purposes in the order a submitted code is matched against them.
    pub const LOOKUP_ORDER: [Self; 2] = [Self::EmailVerification, Self::PhoneVerification];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PhoneVerification => "phone_verification",
        }
    }

    pub fn channel(self) -> DeliveryChannel {
        match self {
            Self::EmailVerification => DeliveryChannel::Email,
            Self::PhoneVerification => DeliveryChannel::Sms,
        }
    }
}

impl fmt::Display for VerificationPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationPurpose {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(Self::EmailVerification),
            "phone_verification" => Ok(Self::PhoneVerification),
            other => Err(UnknownVariant {
                kind: "verification purpose",
                value: other.to_owned(),
            }),
        }
    }
}

/// Channel a verification code is sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    Email,
    Sms,
}

impl DeliveryChannel {
    pub fn purpose(self) -> VerificationPurpose {
        match self {
            Self::Email => VerificationPurpose::EmailVerification,
            Self::Sms => VerificationPurpose::PhoneVerification,
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("email"),
            Self::Sms => f.write_str("sms"),
        }
    }
}
