//! Identity injection for authentication.
//!
//! The Feltwire core never reaches into ambient global state to find out
//! who the player is — wallet integration, key custody, and connect
//! flows all live in the surrounding application. The core only depends
//! on the [`IdentityProvider`] trait: a capability the caller injects,
//! answering "is an identity available?" and "what address is it?".

/// Supplies the caller's current identity for authentication.
///
/// `Send + Sync + 'static` because the provider may be consulted from
/// the client's async context and must outlive individual operations.
///
/// # Example
///
/// ```rust
/// use feltwire_session::{IdentityProvider, StaticIdentity};
///
/// let wallet = StaticIdentity::new("ADDR1");
/// assert!(wallet.is_connected());
/// assert_eq!(wallet.address().as_deref(), Some("ADDR1"));
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Whether an identity is currently available (e.g. the wallet is
    /// unlocked and connected).
    fn is_connected(&self) -> bool;

    /// The public address to authenticate with, if one is available.
    fn address(&self) -> Option<String>;
}

/// An [`IdentityProvider`] with a fixed, always-available address.
///
/// Useful for demos and tests; a real application injects its wallet
/// adapter instead.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    address: String,
}

impl StaticIdentity {
    /// Creates a provider that always reports the given address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn is_connected(&self) -> bool {
        true
    }

    fn address(&self) -> Option<String> {
        Some(self.address.clone())
    }
}
