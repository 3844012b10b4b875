//! Session state: the current authenticated identity and its profile.
//!
//! Owns the only mutable reference to the identity; every other component
//! reads through it. Dependents register as observers and are notified -
//! and awaited - before `sign_in`/`sign_out` return, so the cart can refetch
//! or clear immediately on every identity transition.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::instrument;

use greengrocer_core::{Email, LoginId, UserId};

use crate::remote::types::ProfileRow;
use crate::remote::{RemoteError, RemoteStore};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email/password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No account exists under the given identifier. Raised for mobile-number
    /// sign-in before any credential check is attempted.
    #[error("no account found for that identifier")]
    IdentifierNotFound,

    /// An account with this email already exists.
    #[error("account already registered")]
    AlreadyRegistered,

    /// Malformed email (or empty identifier).
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] greengrocer_core::EmailError),

    /// Hosted backend failure outside the credential path.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),
}

/// The authenticated user, as issued by the remote auth service.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
}

/// Extended user attributes, fetched separately from the `profiles`
/// collection. May lag behind the identity or be missing entirely; callers
/// must treat "identity present, profile absent" as a legal transient state.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub mobile: Option<String>,
    pub is_admin: bool,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            name: row.name,
            mobile: row.mobile,
            is_admin: row.is_admin,
        }
    }
}

/// A component that reacts to identity transitions.
///
/// Registered as `Weak` references: an observer that has been dropped is
/// silently skipped and pruned, so a notification can never land on freed
/// state.
#[async_trait]
pub trait SessionObserver: Send + Sync {
    async fn signed_in(&self, identity: &Identity);
    async fn signed_out(&self);
}

/// Tracks the current identity and profile; notifies dependents on change.
pub struct SessionService {
    store: Arc<dyn RemoteStore>,
    identity: RwLock<Option<Identity>>,
    profile: RwLock<Option<Profile>>,
    observers: Mutex<Vec<Weak<dyn SessionObserver>>>,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            identity: RwLock::new(None),
            profile: RwLock::new(None),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// The current identity, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity.read().clone()
    }

    /// The current profile, if signed in and already fetched.
    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        self.profile.read().clone()
    }

    /// Whether the current user may access the admin surface.
    ///
    /// An absent profile denies, exactly like `is_admin = false`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile.read().as_ref().is_some_and(|p| p.is_admin)
    }

    /// Register a dependent for identity-change notifications.
    pub fn subscribe(&self, observer: Weak<dyn SessionObserver>) {
        self.observers.lock().push(observer);
    }

    /// Sign in with an email or mobile number plus password.
    ///
    /// Identifiers without an `@` are resolved to an email via a profile
    /// lookup first; a lookup miss fails with `IdentifierNotFound` before any
    /// credential check. The profile is a secondary fetch - its failure is
    /// tolerated, leaving the profile absent.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IdentifierNotFound`, `InvalidCredentials`,
    /// `InvalidEmail`, or `Remote` for other backend failures.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, identifier: &str, password: &str) -> Result<Identity, AuthError> {
        let email = match LoginId::parse(identifier)? {
            LoginId::Email(email) => email,
            LoginId::Mobile(mobile) => self.resolve_mobile(&mobile).await?,
        };

        let session = self
            .store
            .sign_in(&email, password)
            .await
            .map_err(credential_error)?;

        let identity = Identity {
            id: session.user.id,
            email,
        };

        let profile = match self.store.profile(identity.id).await {
            Ok(row) => row.map(Profile::from),
            Err(e) => {
                tracing::warn!(error = %e, "profile fetch failed after sign-in");
                None
            }
        };

        *self.profile.write() = profile;
        *self.identity.write() = Some(identity.clone());

        self.notify_signed_in(&identity).await;
        tracing::info!(user_id = %identity.id, "signed in");
        Ok(identity)
    }

    /// Sign out.
    ///
    /// Local state clears first - a signed-out user must not keep seeing
    /// identity-scoped data while the remote call is still in flight. The
    /// remote failure, if any, is reported after the fact.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Remote` if the backend rejects the sign-out.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        *self.identity.write() = None;
        *self.profile.write() = None;
        self.notify_signed_out().await;

        self.store.sign_out().await?;
        Ok(())
    }

    /// Register a new account: sign-up, create the profile row, then sign
    /// out again. Freshly registered users log in explicitly afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadyRegistered`, `InvalidEmail`, or `Remote`.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        mobile: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;

        let session = self
            .store
            .sign_up(&email, password)
            .await
            .map_err(signup_error)?;

        let mobile = mobile.trim();
        self.store
            .insert_profile(&ProfileRow {
                id: session.user.id,
                name: name.trim().to_owned(),
                email: email.as_str().to_owned(),
                mobile: (!mobile.is_empty()).then(|| mobile.to_owned()),
                is_admin: false,
            })
            .await?;

        self.store.sign_out().await?;
        Ok(())
    }

    async fn resolve_mobile(&self, mobile: &str) -> Result<Email, AuthError> {
        let found = self
            .store
            .email_for_mobile(mobile)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "mobile lookup failed");
                AuthError::IdentifierNotFound
            })?
            .ok_or(AuthError::IdentifierNotFound)?;

        Email::parse(&found).map_err(|_| AuthError::IdentifierNotFound)
    }

    fn live_observers(&self) -> Vec<Arc<dyn SessionObserver>> {
        let mut observers = self.observers.lock();
        observers.retain(|w| w.strong_count() > 0);
        observers.iter().filter_map(Weak::upgrade).collect()
    }

    async fn notify_signed_in(&self, identity: &Identity) {
        for observer in self.live_observers() {
            observer.signed_in(identity).await;
        }
    }

    async fn notify_signed_out(&self) {
        for observer in self.live_observers() {
            observer.signed_out().await;
        }
    }
}

/// A sign-in rejection from the auth endpoint is a credential problem;
/// anything else is a backend failure.
fn credential_error(err: RemoteError) -> AuthError {
    match err.status() {
        Some(400 | 401 | 403) => AuthError::InvalidCredentials,
        _ => AuthError::Remote(err),
    }
}

fn signup_error(err: RemoteError) -> AuthError {
    match err.status() {
        Some(422) => AuthError::AlreadyRegistered,
        _ => AuthError::Remote(err),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::memory::{CallRecord, MemoryStore};

    fn service() -> (Arc<MemoryStore>, SessionService) {
        let store = Arc::new(MemoryStore::new());
        let service = SessionService::new(store.clone());
        (store, service)
    }

    fn seed_account(store: &MemoryStore, mobile: Option<&str>, is_admin: bool) -> UserId {
        let user_id = store.seed_user("asha@example.com", "hunter42");
        store.seed_profile(ProfileRow {
            id: user_id,
            name: "Asha".to_owned(),
            email: "asha@example.com".to_owned(),
            mobile: mobile.map(str::to_owned),
            is_admin,
        });
        user_id
    }

    #[tokio::test]
    async fn test_sign_in_with_email() {
        let (store, service) = service();
        let user_id = seed_account(&store, None, false);

        let identity = service.sign_in("asha@example.com", "hunter42").await.unwrap();
        assert_eq!(identity.id, user_id);
        assert_eq!(service.identity().unwrap().id, user_id);
        assert_eq!(service.profile().unwrap().name, "Asha");
    }

    #[tokio::test]
    async fn test_sign_in_with_mobile_resolves_email_first() {
        let (store, service) = service();
        seed_account(&store, Some("9876543210"), false);

        service.sign_in("9876543210", "hunter42").await.unwrap();

        let calls = store.calls();
        assert_eq!(
            calls[0],
            CallRecord::EmailForMobile {
                mobile: "9876543210".to_owned()
            }
        );
        assert_eq!(
            calls[1],
            CallRecord::SignIn {
                email: "asha@example.com".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_mobile_fails_before_credential_check() {
        let (store, service) = service();
        seed_account(&store, Some("9876543210"), false);

        let err = service.sign_in("0000000000", "hunter42").await.unwrap_err();
        assert!(matches!(err, AuthError::IdentifierNotFound));

        // The lookup ran; no credential check did.
        assert!(
            !store
                .calls()
                .iter()
                .any(|c| matches!(c, CallRecord::SignIn { .. }))
        );
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (store, service) = service();
        seed_account(&store, None, false);

        let err = service.sign_in("asha@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(service.identity().is_none());
    }

    #[tokio::test]
    async fn test_profile_fetch_failure_is_tolerated() {
        let (store, service) = service();
        seed_account(&store, None, true);
        store.fail_on("profile");

        let identity = service.sign_in("asha@example.com", "hunter42").await.unwrap();
        assert_eq!(identity.email.as_str(), "asha@example.com");
        assert!(service.profile().is_none());
        assert!(!service.is_admin());
    }

    #[tokio::test]
    async fn test_is_admin_requires_profile_flag() {
        let (store, service) = service();
        seed_account(&store, None, true);

        assert!(!service.is_admin());
        service.sign_in("asha@example.com", "hunter42").await.unwrap();
        assert!(service.is_admin());
    }

    #[tokio::test]
    async fn test_register_flow() {
        let (store, service) = service();

        service
            .register("Ravi", "ravi@example.com", "9000000001", "secret99")
            .await
            .unwrap();

        let calls = store.calls();
        assert!(matches!(calls[0], CallRecord::SignUp { .. }));
        assert!(matches!(calls[1], CallRecord::InsertProfile { .. }));
        assert_eq!(calls[2], CallRecord::SignOut);

        // Registration does not leave the user signed in.
        assert!(service.identity().is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let (store, service) = service();
        seed_account(&store, None, false);

        let err = service
            .register("Asha", "asha@example.com", "", "hunter42")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyRegistered));
    }

    #[tokio::test]
    async fn test_sign_out_clears_local_state_even_when_remote_fails() {
        let (store, service) = service();
        seed_account(&store, None, false);
        service.sign_in("asha@example.com", "hunter42").await.unwrap();

        store.fail_on("sign_out");
        let result = service.sign_out().await;

        assert!(result.is_err());
        assert!(service.identity().is_none());
        assert!(service.profile().is_none());
    }

    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SessionObserver for RecordingObserver {
        async fn signed_in(&self, identity: &Identity) {
            self.events.lock().push(format!("in:{}", identity.email));
        }

        async fn signed_out(&self) {
            self.events.lock().push("out".to_owned());
        }
    }

    #[tokio::test]
    async fn test_observers_notified_before_return() {
        let (store, service) = service();
        seed_account(&store, None, false);

        let observer = Arc::new(RecordingObserver {
            events: Mutex::new(Vec::new()),
        });
        service.subscribe(Arc::downgrade(&observer) as Weak<dyn SessionObserver>);

        service.sign_in("asha@example.com", "hunter42").await.unwrap();
        assert_eq!(
            observer.events.lock().clone(),
            vec!["in:asha@example.com".to_owned()]
        );

        service.sign_out().await.unwrap();
        assert_eq!(
            observer.events.lock().clone(),
            vec!["in:asha@example.com".to_owned(), "out".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_dropped_observer_is_skipped() {
        let (store, service) = service();
        seed_account(&store, None, false);

        let observer = Arc::new(RecordingObserver {
            events: Mutex::new(Vec::new()),
        });
        service.subscribe(Arc::downgrade(&observer) as Weak<dyn SessionObserver>);
        drop(observer);

        // Must not panic or deliver to freed state.
        service.sign_in("asha@example.com", "hunter42").await.unwrap();
    }
}
