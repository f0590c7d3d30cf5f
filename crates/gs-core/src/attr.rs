use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Reference to a named attribute of a model, written `"<model>.<attr>"`.
///
/// Model names never contain `.`, so the first dot separates the parts and
/// attribute names may contain further dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrRef {
    pub model: String,
    pub attr: String,
}

impl AttrRef {
    pub fn new(model: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            attr: attr.into(),
        }
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model, self.attr)
    }
}

impl FromStr for AttrRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('.') {
            Some((model, attr)) if !model.is_empty() && !attr.is_empty() => {
                Ok(Self::new(model, attr))
            }
            _ => Err(CoreError::InvalidAttrRef {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for AttrRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AttrRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let r: AttrRef = "battery.soc".parse().unwrap();
        assert_eq!(r.model, "battery");
        assert_eq!(r.attr, "soc");
        assert_eq!(r.to_string(), "battery.soc");
    }

    #[test]
    fn attr_may_contain_dots() {
        let r: AttrRef = "grid.p.net".parse().unwrap();
        assert_eq!(r.model, "grid");
        assert_eq!(r.attr, "p.net");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["battery", ".soc", "battery.", ""] {
            assert!(bad.parse::<AttrRef>().is_err(), "{bad} should fail");
        }
    }
}
