// ── Vendor keys ──
//
// A vendor key is the lowercase dialect name a client is bound to. Every
// vendor string, whether typed by a user or reported by a BMC, goes through
// the same alias table so "Dell Inc." and "iDRAC" land on the same key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Case-insensitive substrings that identify a vendor, checked in order.
const VENDOR_ALIASES: &[(&str, &[&str])] = &[
    (VendorKey::DELL, &["dell", "poweredge", "idrac"]),
    (VendorKey::SUPERMICRO, &["supermicro", "smc"]),
    (VendorKey::HPE, &["hpe", "hewlett", "proliant", "ilo"]),
    (VendorKey::LENOVO, &["lenovo", "thinkserver", "thinksystem", "xclarity", "xcc"]),
    (VendorKey::ASROCKRACK, &["asrockrack", "asrock"]),
];

/// Normalized lowercase vendor identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct VendorKey(String);

impl VendorKey {
    pub const DELL: &'static str = "dell";
    pub const SUPERMICRO: &'static str = "supermicro";
    pub const HPE: &'static str = "hpe";
    pub const LENOVO: &'static str = "lenovo";
    pub const ASROCKRACK: &'static str = "asrockrack";
    /// Redfish-compliant but unidentified.
    pub const GENERIC: &'static str = "generic";

    /// Normalize any vendor string into a key.
    ///
    /// Known aliases collapse onto their canonical key; anything else is
    /// kept, trimmed and lowercased.
    pub fn new(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if lowered == "hp" {
            return Self(Self::HPE.into());
        }
        match match_alias(&lowered) {
            Some(key) => Self(key.into()),
            None => Self(lowered),
        }
    }

    pub fn generic() -> Self {
        Self(Self::GENERIC.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_generic(&self) -> bool {
        self.0 == Self::GENERIC
    }
}

/// The canonical key whose alias occurs in `text`, if any.
///
/// Matching is case-insensitive and substring-based, in table order.
pub fn match_alias(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    VENDOR_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|alias| lowered.contains(alias)))
        .map(|(key, _)| *key)
}

/// Normalize a vendor string. Idempotent: normalizing a key returns it.
pub fn normalize_vendor(raw: &str) -> VendorKey {
    VendorKey::new(raw)
}

impl fmt::Display for VendorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VendorKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for VendorKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VendorKey {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<VendorKey> for String {
    fn from(key: VendorKey) -> Self {
        key.0
    }
}

impl AsRef<str> for VendorKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for VendorKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VendorKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
