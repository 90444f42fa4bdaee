//! Well-known parties.

use std::fmt;

use super::name::X500Name;
use crate::crypto::PublicKey;

/// A legal entity identified by name and owning key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Party {
    /// The well-known name of the party.
    pub name: X500Name,
    /// The key that signs on behalf of the party.
    pub owning_key: PublicKey,
}

impl Party {
    /// Create a party.
    pub fn new(name: X500Name, owning_key: PublicKey) -> Self {
        Party { name, owning_key }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_party_display_uses_name() {
        let name = X500Name::parse("O=Notary Service, L=Zurich, C=CH").unwrap();
        let party = Party::new(name, KeyPair::generate().public_key());
        assert_eq!(party.to_string(), "O=Notary Service, L=Zurich, C=CH");
    }

    #[test]
    fn test_party_equality_includes_key() {
        let name = X500Name::parse("O=Bank A, L=London, C=GB").unwrap();
        let a = Party::new(name.clone(), KeyPair::generate().public_key());
        let b = Party::new(name, KeyPair::generate().public_key());
        assert_ne!(a, b);
    }
}
