//! Legal identities on the ledger.
//!
//! A [`Party`] couples a well-known X.500 name with the key that signs on
//! its behalf.

mod name;
mod party;

pub use name::{Attribute, X500Name};
pub use party::Party;
