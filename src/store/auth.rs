//! Credential checks against the demo user table.

use std::time::Duration;

use tracing::{field, info, Instrument};

use crate::core::types::User;
use crate::observability::logging::mask_email;
use crate::observability::tracing::{mark_error, mark_ok, set_user_context};
use crate::store::Store;

const USER_LOOKUP_LATENCY: Duration = Duration::from_millis(30);

impl Store {
    /// Look up the user with this email and password.
    ///
    /// A miss is not an error here; the caller decides how to answer it.
    pub async fn validate_credentials(&self, email: &str, password: &str) -> Option<User> {
        let span = crate::store_span!(
            "auth.validateCredentials",
            auth.method = "password",
            auth.result = field::Empty,
            user.id = field::Empty,
            user.email = field::Empty
        );
        span.record("user.email", email);

        let user = async {
            info!("validation_started");
            self.database().query("query.users", USER_LOOKUP_LATENCY).await;

            let user = self
                .users()
                .iter()
                .find(|u| u.email == email && u.password == password)
                .cloned();

            match &user {
                Some(user) => info!(user.id = user.id, "user_authenticated"),
                None => info!(user.email = %mask_email(email), "authentication_failed"),
            }
            user
        }
        .instrument(span.clone())
        .await;

        match &user {
            Some(user) => {
                span.record("auth.result", "success");
                set_user_context(&span, user.id, &user.email);
                mark_ok(&span);
            }
            None => {
                span.record("auth.result", "failure");
                mark_error(&span, "Invalid credentials");
            }
        }

        user
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::SimulationConfig;
    use crate::store::Store;

    #[tokio::test]
    async fn test_demo_accounts_authenticate() {
        let store = Store::new(SimulationConfig::instant());

        let user = store
            .validate_credentials("demo@chiccloset.com", "demo123")
            .await
            .unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Fashion Lover");

        let jane = store.validate_credentials("jane@example.com", "password").await;
        assert_eq!(jane.map(|u| u.id), Some(2));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let store = Store::new(SimulationConfig::instant());
        assert!(store
            .validate_credentials("demo@chiccloset.com", "wrong")
            .await
            .is_none());
        assert!(store.validate_credentials("nobody@example.com", "demo123").await.is_none());
    }
}
