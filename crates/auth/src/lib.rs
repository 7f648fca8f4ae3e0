//! `stockroom-auth`: authentication and authorization boundary.
//!
//! No HTTP or storage here. The identity provider is reached through the
//! [`IdentityProvider`] trait, role lookups happen in the caller, and the
//! access matrix is a pure function.

pub mod authorize;
pub mod context;
pub mod credential;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod verifier;

pub use authorize::{authorize, Decision, DenyReason};
pub use context::RequestContext;
pub use credential::extract_bearer;
pub use permissions::Operation;
pub use principal::Principal;
pub use roles::{Role, RoleParseError};
pub use verifier::{
    AuthError, IdentityProvider, IdentityVerifier, InvalidCredentialKind, ProviderError,
    ProviderRejection, ProviderUser,
};
