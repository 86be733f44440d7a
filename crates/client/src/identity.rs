//! Sign-in, registration and sign-out.
//!
//! [`Identity`] owns the transitions between guest and signed-in sessions.
//! Sign-in and registration persist the new credential and announce an
//! [`IdentityTransition`](crate::notifier::IdentityTransition) so every
//! watched container refetches. Sign-out instead resets every registered
//! container synchronously, then starts a brand new guest session.

use std::sync::Arc;

use greenshoes_core::{BearerToken, Email, GuestId, LoginId, UserProfile, validate_password};
use tracing::{info, instrument, warn};

use crate::api::ApiClient;
use crate::error::{ApiError, Failure, FailureKind, Outcome};
use crate::session::Session;
use crate::state::Resettable;

/// Shown when a required form field is blank.
pub const REQUIRED_FIELDS_MESSAGE: &str = "All fields are required";

/// Shown when the confirmation does not match the password.
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match";

/// Registration form as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Check the form without sending it.
    ///
    /// Checks run in form order: required fields, email shape, password
    /// policy, confirmation.
    ///
    /// # Errors
    ///
    /// Returns a validation `Failure` naming the first problem.
    pub fn validate(&self) -> Result<Email, Failure> {
        let required = [
            &self.full_name,
            &self.email,
            &self.password,
            &self.confirm_password,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(Failure::validation(REQUIRED_FIELDS_MESSAGE));
        }
        let email = Email::parse(&self.email)
            .map_err(|_| Failure::validation("Please enter a valid email address"))?;
        validate_password(&self.password).map_err(|e| Failure::validation(e.to_string()))?;
        if self.password != self.confirm_password {
            return Err(Failure::validation(PASSWORD_MISMATCH_MESSAGE));
        }
        Ok(email)
    }
}

/// Identity resolver: moves the session between guest and signed-in.
pub struct Identity {
    api: ApiClient,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("session", self.api.session())
            .finish_non_exhaustive()
    }
}

impl Identity {
    /// Create a resolver acting through `api`.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// The session being managed.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.api.session()
    }

    /// Reset `container` on every sign-out and whenever the API rejects
    /// the credential, for as long as it is alive.
    pub fn register_container<C: Resettable + 'static>(&self, container: &Arc<C>) {
        self.session().register_container(container);
    }

    /// The signed-in account, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.session().current_user()
    }

    /// Sign in with an email or username.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` carrying the server's reason or "Login failed".
    /// Nothing is sent if either field is blank.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email_or_username: &str, password: &str) -> Outcome<UserProfile> {
        let login = LoginId::parse(email_or_username)
            .filter(|_| !password.is_empty())
            .ok_or_else(|| Failure::validation(REQUIRED_FIELDS_MESSAGE))?;

        let result = self.api.login(login.as_str(), password).await;
        self.complete(result, "Login failed")
    }

    /// Create an account and sign in to it.
    ///
    /// The form is checked locally first, including the password policy; a
    /// form failing any check never reaches the network.
    ///
    /// # Errors
    ///
    /// Returns a validation `Failure` for a bad form, otherwise the server's
    /// reason or "Registration failed".
    #[instrument(skip_all)]
    pub async fn register(&self, form: &RegisterForm) -> Outcome<UserProfile> {
        let email = form.validate()?;
        let result = self
            .api
            .register(form.full_name.trim(), email.as_str(), &form.password)
            .await;
        self.complete(result, "Registration failed")
    }

    /// Whether an account already uses `email`.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if the email is malformed or the check fails.
    #[instrument(skip(self))]
    pub async fn check_email(&self, email: &str) -> Outcome<bool> {
        let email = Email::parse(email)
            .map_err(|_| Failure::validation("Please enter a valid email address"))?;
        self.api
            .check_email(email.as_str())
            .await
            .map_err(|e| Failure::from_api(&e, "Could not check email"))
    }

    /// Sign out.
    ///
    /// Forgets the credential, replaces the guest ID with a fresh one so the
    /// next shopper on this machine starts with an empty cart, and resets
    /// every registered container before returning. Watched containers then
    /// refetch for the new guest session.
    ///
    /// Returns the new guest ID.
    #[instrument(skip(self))]
    pub fn logout(&self) -> GuestId {
        let session = self.session();
        session.clear_auth();
        session.clear_login_required();
        let guest_id = session.regenerate_guest_id();

        let containers = session.reset_containers();

        session.notifier().publish();
        info!(containers, "Signed out");
        guest_id
    }

    /// Persist a successful sign-in and announce it.
    fn complete(
        &self,
        result: Result<(BearerToken, UserProfile), ApiError>,
        fallback: &str,
    ) -> Outcome<UserProfile> {
        let (token, user) = result.map_err(|e| {
            let failure = Failure::from_api(&e, fallback);
            // A 401 here means bad credentials, not an expired session.
            if failure.kind() == FailureKind::Unauthorized {
                Failure::new(FailureKind::Rejected, failure.message())
            } else {
                failure
            }
        })?;

        let session = self.session();
        if let Err(e) = session.store_auth(&token, &user) {
            warn!(error = %e, "Signed in, but the session could not be saved");
        }
        session.clear_login_required();
        session.notifier().publish();
        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn identity() -> Identity {
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        Identity::new(ApiClient::new(&config, Session::in_memory()).unwrap())
    }

    #[test]
    fn test_register_form_order_of_checks() {
        let blank = RegisterForm::default().validate().unwrap_err();
        assert_eq!(blank.message(), REQUIRED_FIELDS_MESSAGE);

        let weak = form("abc", "abc").validate().unwrap_err();
        assert!(weak.message().starts_with("Password does not meet requirements"));

        let mismatch = form("Abcdef1!", "Abcdef1?").validate().unwrap_err();
        assert_eq!(mismatch.message(), PASSWORD_MISMATCH_MESSAGE);

        assert!(form("Abcdef1!", "Abcdef1!").validate().is_ok());
    }

    #[test]
    fn test_register_form_rejects_malformed_email() {
        let mut bad = form("Abcdef1!", "Abcdef1!");
        bad.email = "not-an-email".to_string();
        assert_eq!(bad.validate().unwrap_err().kind(), FailureKind::Validation);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let err = identity().login("  ", "secret").await.unwrap_err();
        assert_eq!(err.message(), REQUIRED_FIELDS_MESSAGE);
        let err = identity().login("ada", "").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    struct Counter(AtomicUsize);

    impl Resettable for Counter {
        fn reset(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_logout_resets_live_containers_and_rotates_guest() {
        let identity = identity();
        let before = identity.session().guest_id();

        let live = Arc::new(Counter(AtomicUsize::new(0)));
        identity.register_container(&live);
        let dropped = Arc::new(Counter(AtomicUsize::new(0)));
        identity.register_container(&dropped);
        drop(dropped);

        let after = identity.logout();

        assert_ne!(before, after);
        assert_eq!(identity.session().guest_id(), after);
        assert_eq!(live.0.load(Ordering::SeqCst), 1);
    }
}
