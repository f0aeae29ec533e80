//! Shopper session: login against the API and logout, both traced.

use std::time::Instant;

use tracing::{error, field, info, Instrument};

use crate::core::error::{StoreError, StoreResult};
use crate::core::types::PublicUser;
use crate::observability::logging::mask_email;
use crate::observability::metrics::BusinessMetrics;
use crate::observability::tracing::{mark_error, mark_ok, set_user_context};
use crate::storefront::client::StorefrontClient;
use crate::storefront::validators::{validate_email, validate_password};

const AUTH_METHOD: &str = "email_password";
const AUTH_PROVIDER: &str = "local";

#[derive(Debug, Clone)]
pub struct Session {
    client: StorefrontClient,
    user: Option<PublicUser>,
    token: Option<String>,
}

impl Session {
    pub fn new(client: StorefrontClient) -> Self {
        Self {
            client,
            user: None,
            token: None,
        }
    }

    pub fn client(&self) -> &StorefrontClient {
        &self.client
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Sign in with email and password.
    ///
    /// The form checks (email shape, password length) run before the API is
    /// called; both kinds of failure count as a failed login.
    pub async fn login(&mut self, email: &str, password: &str) -> StoreResult<PublicUser> {
        let span = crate::store_span!(
            "auth.login",
            auth.method = AUTH_METHOD,
            auth.provider = AUTH_PROVIDER,
            user.email = email,
            user.id = field::Empty,
            auth.duration_ms = field::Empty
        );
        let started = Instant::now();
        BusinessMetrics::login_attempt();

        let result = async {
            info!(user.email = %mask_email(email), "login_attempt_started");
            check_login_form(email, password)?;

            info!("validating_credentials");
            self.client.login(email, password).await
        }
        .instrument(span.clone())
        .await;

        span.record("auth.duration_ms", started.elapsed().as_millis() as u64);

        match result {
            Ok(response) => {
                set_user_context(&span, response.user.id, &response.user.email);
                let _guard = span.enter();
                info!("user_context_set");
                info!(user.name = %response.user.name, "login_successful");
                BusinessMetrics::login_result(true);
                info!(
                    user.email = %mask_email(email),
                    user.name = %response.user.name,
                    "👤 User logged in successfully"
                );
                mark_ok(&span);

                self.user = Some(response.user.clone());
                self.token = Some(response.token);
                Ok(response.user)
            }
            Err(e) => {
                span.in_scope(|| {
                    info!("error.type" = e.error_type(), error.message = %e, "login_failed");
                    error!(user.email = %mask_email(email), error = %e, "❌ Login failed");
                });
                BusinessMetrics::login_result(false);
                mark_error(&span, "Login failed");
                Err(e)
            }
        }
    }

    /// Forget the signed-in user
    pub fn logout(&mut self) {
        let email = self
            .user
            .as_ref()
            .map_or_else(|| "unknown".to_string(), |user| user.email.clone());
        let span = crate::store_span!("auth.logout", user.email = %email);
        let _guard = span.enter();

        info!("logout_initiated");
        self.user = None;
        self.token = None;
        info!(session.ended = %chrono::Utc::now().to_rfc3339(), "session_terminated");
        info!(user.email = %mask_email(&email), "User logged out");
        mark_ok(&span);
    }
}

fn check_login_form(email: &str, password: &str) -> StoreResult<()> {
    if !validate_email(email) {
        return Err(StoreError::validation("email", "Please enter a valid email"));
    }
    if !validate_password(password) {
        return Err(StoreError::validation(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}
