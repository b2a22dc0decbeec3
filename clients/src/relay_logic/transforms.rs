use std::str::FromStr;

use lib_sense::{EndpointError, MessageTransform};

/// The message transforms the relay can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Identity,
    Upper,
    Lower,
    Trim,
}

impl FromStr for TransformKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "identity" | "none" => Ok(TransformKind::Identity),
            "upper" => Ok(TransformKind::Upper),
            "lower" => Ok(TransformKind::Lower),
            "trim" => Ok(TransformKind::Trim),
            other => anyhow::bail!("unknown transform '{}' (expected identity, upper, lower or trim)", other),
        }
    }
}

impl MessageTransform for TransformKind {
    fn apply(&self, input: String) -> Result<String, EndpointError> {
        Ok(match self {
            TransformKind::Identity => input,
            TransformKind::Upper => input.to_uppercase(),
            TransformKind::Lower => input.to_lowercase(),
            TransformKind::Trim => input.trim().to_string(),
        })
    }
}
