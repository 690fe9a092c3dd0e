use crate::Error;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::{
    convert::TryFrom,
    fmt::{self, Display},
    str::FromStr,
};

const META: &str = "meta";
const GPM_PREFIX: &str = "gpm:";
const IPM: &str = "ipm";

/// Owner of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamScope {
    /// Attribute required by the named stratum.
    Stratum(String),
    /// Attribute required by cross-strata edges.
    Meta,
}

/// Key of a model parameter.
///
/// The canonical textual form is `<stratum>::<name>` or `meta::<name>`. The
/// longer paths `gpm:<stratum>::ipm::<name>` and `meta::ipm::<name>` are also
/// accepted when parsing.
///
/// ```
/// use atv::params::ParamKey;
///
/// let key: ParamKey = "gpm:offspring::ipm::beta".parse().unwrap();
/// assert_eq!(key, ParamKey::stratum("offspring", "beta"));
/// assert_eq!(key.to_string(), "offspring::beta");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Getters, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[getset(get = "pub")]
pub struct ParamKey {
    scope: ParamScope,
    name: String,
}

impl ParamKey {
    pub fn stratum(stratum: &str, name: &str) -> Self {
        ParamKey {
            scope: ParamScope::Stratum(stratum.to_string()),
            name: name.to_string(),
        }
    }

    pub fn meta(name: &str) -> Self {
        ParamKey {
            scope: ParamScope::Meta,
            name: name.to_string(),
        }
    }
}

impl Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            ParamScope::Stratum(s) => write!(f, "{}::{}", s, self.name),
            ParamScope::Meta => write!(f, "{}::{}", META, self.name),
        }
    }
}

impl FromStr for ParamKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidParamKey(s.to_string());
        let parts: Vec<&str> = s.trim().split("::").collect();
        let (owner, name) = match parts.as_slice() {
            [owner, name] => (*owner, *name),
            [owner, IPM, name] => (*owner, *name),
            _ => return Err(invalid()),
        };
        let owner = owner.strip_prefix(GPM_PREFIX).unwrap_or(owner);
        if owner.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        if owner == META {
            Ok(ParamKey::meta(name))
        } else {
            Ok(ParamKey::stratum(owner, name))
        }
    }
}

impl TryFrom<String> for ParamKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParamKey> for String {
    fn from(key: ParamKey) -> Self {
        key.to_string()
    }
}
