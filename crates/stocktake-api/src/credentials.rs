//! Shared rotating credential state for in-flight requests.
//!
//! The service invalidates sessions server-side; when that happens every
//! worker starts seeing 401s at once. The store guarantees that exactly one
//! of them performs the replacement and that the new pair becomes visible
//! atomically to all requests dispatched afterwards. Replacement is bounded
//! per run — exhausting the budget is fatal for the whole run.

use tokio::sync::RwLock;

use crate::error::ApiError;

/// A login/secret pair for HTTP basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub login: String,
    pub secret: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("login", &self.login)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Supplies replacement credentials after an authorization failure.
///
/// Implementations may prompt an operator, read a vault, or return `None`
/// to signal that no further credentials are available.
pub trait CredentialSource: Send + Sync {
    fn next_credential(&self) -> Option<Credential>;
}

/// A [`CredentialSource`] that never supplies a replacement. Headless runs
/// use this: the first 401 after the initial pair is rejected becomes fatal.
pub struct NoReplacement;

impl CredentialSource for NoReplacement {
    fn next_credential(&self) -> Option<Credential> {
        None
    }
}

struct CredentialState {
    generation: u64,
    credential: Credential,
    rotations: u32,
}

/// Generation-counted credential holder shared by all workers.
///
/// `current` returns the generation alongside the pair; `rotate` replaces
/// the pair only if the caller's generation is still current, so concurrent
/// 401s from the same stale pair trigger a single replacement instead of
/// burning the whole budget at once.
pub struct CredentialStore {
    state: RwLock<CredentialState>,
    source: Box<dyn CredentialSource>,
    max_rotations: u32,
}

impl CredentialStore {
    #[must_use]
    pub fn new(initial: Credential, source: Box<dyn CredentialSource>, max_rotations: u32) -> Self {
        Self {
            state: RwLock::new(CredentialState {
                generation: 0,
                credential: initial,
                rotations: 0,
            }),
            source,
            max_rotations,
        }
    }

    /// Snapshot of the current generation and credential.
    pub async fn current(&self) -> (u64, Credential) {
        let state = self.state.read().await;
        (state.generation, state.credential.clone())
    }

    /// Replace the credential the caller observed as `seen_generation`.
    ///
    /// A no-op when another worker already rotated past that generation —
    /// the caller simply retries with the fresh pair.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::CredentialsExhausted`] when the replacement
    /// budget is spent or the source has nothing further to offer.
    pub async fn rotate(&self, seen_generation: u64) -> Result<(), ApiError> {
        let mut state = self.state.write().await;
        if state.generation != seen_generation {
            return Ok(());
        }
        if state.rotations >= self.max_rotations {
            return Err(ApiError::CredentialsExhausted {
                attempts: state.rotations,
            });
        }
        let Some(replacement) = self.source.next_credential() else {
            return Err(ApiError::CredentialsExhausted {
                attempts: state.rotations,
            });
        };
        state.rotations += 1;
        state.generation += 1;
        state.credential = replacement;
        tracing::info!(
            generation = state.generation,
            rotations = state.rotations,
            max_rotations = self.max_rotations,
            "credentials replaced"
        );
        Ok(())
    }
}
