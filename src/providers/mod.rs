//! External collaborators consumed through narrow interfaces.

pub mod identity;

pub use identity::{
    IdentityProvider, ProviderClaims, ProviderError, RemoteIdentityProvider,
};
