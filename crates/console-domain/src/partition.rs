//! Logical data partitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;

/// The data partition a request operates on.
///
/// The sandbox partition mirrors the live schema and holds data created by
/// test-mode API credentials. The value is chosen once per request and passed
/// to every repository; there is no process-wide "current" partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    #[default]
    Live,
    Sandbox,
}

impl Partition {
    pub fn from_sandbox_flag(is_sandbox: bool) -> Self {
        if is_sandbox { Self::Sandbox } else { Self::Live }
    }

    pub fn is_sandbox(self) -> bool {
        matches!(self, Self::Sandbox)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Sandbox => "sandbox",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Partition {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(Self::Live),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(UnknownVariant {
                kind: "partition",
                value: other.to_owned(),
            }),
        }
    }
}
