//! IdentityResolver port - legacy owner references to identities.

use uuid::Uuid;

use crate::domain::{IdentityError, OwnerIdentity};

/// Resolves a legacy owner reference.
///
/// Synchronous on purpose: implementations may block on disk or network (a
/// name cache, a profile service). Callers run it off the async executor.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, reference: Uuid) -> Result<OwnerIdentity, IdentityError>;
}
