//! X.500 distinguished names.

use std::fmt;
use std::str::FromStr;

use crate::error::NameError;

/// Supported relative distinguished name attributes, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    /// Common name.
    CommonName,
    /// Organisation unit.
    OrganisationUnit,
    /// Organisation.
    Organisation,
    /// Locality.
    Locality,
    /// State or province.
    State,
    /// Two-letter country code.
    Country,
}

impl Attribute {
    /// The short key used in the string form.
    pub fn key(&self) -> &'static str {
        match self {
            Attribute::CommonName => "CN",
            Attribute::OrganisationUnit => "OU",
            Attribute::Organisation => "O",
            Attribute::Locality => "L",
            Attribute::State => "ST",
            Attribute::Country => "C",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "CN" => Some(Attribute::CommonName),
            "OU" => Some(Attribute::OrganisationUnit),
            "O" => Some(Attribute::Organisation),
            "L" => Some(Attribute::Locality),
            "ST" => Some(Attribute::State),
            "C" => Some(Attribute::Country),
            _ => None,
        }
    }
}

/// A parsed distinguished name.
///
/// Attributes are held in canonical order, so two names that differ only in
/// attribute order or whitespace compare equal and print identically.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct X500Name {
    attributes: Vec<(Attribute, String)>,
}

impl X500Name {
    /// Parse a name such as `"O=Bank A, L=London, C=GB"`.
    pub fn parse(input: &str) -> Result<Self, NameError> {
        let mut attributes: Vec<(Attribute, String)> = Vec::new();

        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| NameError::MalformedAttribute(part.to_string()))?;
            let key = key.trim();
            let value = value.trim();

            let attribute = Attribute::from_key(key)
                .ok_or_else(|| NameError::UnsupportedAttribute(key.to_string()))?;
            if attributes.iter().any(|(a, _)| *a == attribute) {
                return Err(NameError::DuplicateAttribute(key.to_string()));
            }
            if value.is_empty() || value.contains('=') {
                return Err(NameError::InvalidValue(key.to_string()));
            }
            if attribute == Attribute::Country
                && !(value.len() == 2 && value.chars().all(|c| c.is_ascii_uppercase()))
            {
                return Err(NameError::InvalidValue(key.to_string()));
            }
            attributes.push((attribute, value.to_string()));
        }

        if attributes.is_empty() {
            return Err(NameError::Empty);
        }
        attributes.sort_by_key(|(attribute, _)| *attribute);
        Ok(X500Name { attributes })
    }

    /// Value of an attribute, if present.
    pub fn get(&self, attribute: Attribute) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(a, _)| *a == attribute)
            .map(|(_, v)| v.as_str())
    }

    /// Organisation name, if present.
    pub fn organisation(&self) -> Option<&str> {
        self.get(Attribute::Organisation)
    }

    /// The canonical string form.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for X500Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (attribute, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", attribute.key(), value)?;
        }
        Ok(())
    }
}

impl FromStr for X500Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        X500Name::parse(s)
    }
}
