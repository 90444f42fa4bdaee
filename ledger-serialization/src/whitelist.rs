//! Type whitelist.

use std::collections::BTreeSet;
use std::fmt;

use crate::descriptor::TypeName;

/// Which whitelist applies to a call. Chosen by the caller, never by the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WhitelistMode {
    /// Trusted local data: every registered type is permitted.
    InternalStorage,
    /// Bytes from peers: only explicitly allowed types are permitted.
    ExternalNetwork,
}

impl fmt::Display for WhitelistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhitelistMode::InternalStorage => f.write_str("internal-storage"),
            WhitelistMode::ExternalNetwork => f.write_str("external-network"),
        }
    }
}

/// Types permitted on the network.
///
/// Only registered types can be added, and only through a
/// [`Registrar`](crate::Registrar).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Whitelist {
    allowed: BTreeSet<TypeName>,
}

impl Whitelist {
    pub(crate) fn insert(&mut self, type_name: TypeName) -> bool {
        self.allowed.insert(type_name)
    }

    /// Whether a registered type is permitted in `mode`.
    pub fn permits(&self, type_name: &TypeName, mode: WhitelistMode) -> bool {
        match mode {
            WhitelistMode::InternalStorage => true,
            WhitelistMode::ExternalNetwork => self.allowed.contains(type_name),
        }
    }

    /// Whether the type is on the network whitelist.
    pub fn contains(&self, type_name: &TypeName) -> bool {
        self.allowed.contains(type_name)
    }

    /// Allowed types in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeName> {
        self.allowed.iter()
    }

    /// Number of allowed types.
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    /// Whether nothing is allowed.
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes() {
        let party = TypeName::new("ledger.identity.Party", 1);
        let key = TypeName::new("ledger.crypto.PrivateKey", 1);
        let mut whitelist = Whitelist::default();
        assert!(whitelist.insert(party));
        assert!(!whitelist.insert(party));

        assert!(whitelist.permits(&party, WhitelistMode::ExternalNetwork));
        assert!(!whitelist.permits(&key, WhitelistMode::ExternalNetwork));
        assert!(whitelist.permits(&key, WhitelistMode::InternalStorage));
        assert_eq!(whitelist.len(), 1);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(WhitelistMode::InternalStorage.to_string(), "internal-storage");
    }
}
