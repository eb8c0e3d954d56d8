//! Session credential sources
//!
//! The extractor never reads process state directly; it asks a
//! [`CredentialProvider`] supplied at construction time.

use crate::error::{Error, Result};
use crate::types::SessionCredentials;

/// Supplies the three session cookies for the viewer request
pub trait CredentialProvider: Send + Sync {
    /// Return the current credentials
    fn credentials(&self) -> Result<SessionCredentials>;
}

/// Fixed credentials held in memory
#[derive(Clone, Debug)]
pub struct StaticCredentials(SessionCredentials);

impl StaticCredentials {
    /// Wrap already-known credentials
    pub fn new(credentials: SessionCredentials) -> Self {
        Self(credentials)
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<SessionCredentials> {
        Ok(self.0.clone())
    }
}

/// Reads credentials from environment variables on every call
///
/// Defaults to `api_session`, `manga_one_session` and `home_popup_start_time`.
/// Load a `.env` file beforehand (e.g. with `dotenvy`) if that is where they live.
#[derive(Clone, Debug)]
pub struct EnvCredentials {
    /// Variable holding the `api_session` cookie
    pub api_session_var: String,
    /// Variable holding the `manga_one_session` cookie
    pub manga_one_session_var: String,
    /// Variable holding the `home_popup_start_time` cookie
    pub home_popup_start_time_var: String,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self {
            api_session_var: "api_session".to_string(),
            manga_one_session_var: "manga_one_session".to_string(),
            home_popup_start_time_var: "home_popup_start_time".to_string(),
        }
    }
}

impl EnvCredentials {
    fn read(name: &str) -> Result<String> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            Ok(_) => Err(Error::Credentials(format!("{name} is empty"))),
            Err(_) => Err(Error::Credentials(format!("{name} not set in environment"))),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<SessionCredentials> {
        Ok(SessionCredentials {
            api_session: Self::read(&self.api_session_var)?,
            manga_one_session: Self::read(&self.manga_one_session_var)?,
            home_popup_start_time: Self::read(&self.home_popup_start_time_var)?,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Unique names so these tests never see a developer's real session
    fn test_provider() -> EnvCredentials {
        EnvCredentials {
            api_session_var: "MANGAONE_DL_TEST_API_SESSION".into(),
            manga_one_session_var: "MANGAONE_DL_TEST_SESSION".into(),
            home_popup_start_time_var: "MANGAONE_DL_TEST_POPUP".into(),
        }
    }

    fn clear(provider: &EnvCredentials) {
        // SAFETY: serial tests, no other thread touches these variables
        unsafe {
            std::env::remove_var(&provider.api_session_var);
            std::env::remove_var(&provider.manga_one_session_var);
            std::env::remove_var(&provider.home_popup_start_time_var);
        }
    }

    #[test]
    #[serial]
    fn env_credentials_read_all_three_tokens() {
        let provider = test_provider();
        // SAFETY: serial tests, no other thread touches these variables
        unsafe {
            std::env::set_var(&provider.api_session_var, "a");
            std::env::set_var(&provider.manga_one_session_var, "b");
            std::env::set_var(&provider.home_popup_start_time_var, "1700000000");
        }

        let creds = provider.credentials().unwrap();
        clear(&provider);

        assert_eq!(creds.api_session, "a");
        assert_eq!(creds.manga_one_session, "b");
        assert_eq!(creds.home_popup_start_time, "1700000000");
    }

    #[test]
    #[serial]
    fn env_credentials_missing_variable_is_error() {
        let provider = test_provider();
        clear(&provider);

        let err = provider.credentials().unwrap_err();

        assert!(matches!(err, Error::Credentials(msg) if msg.contains("MANGAONE_DL_TEST_API_SESSION")));
    }

    #[test]
    #[serial]
    fn env_credentials_blank_variable_is_error() {
        let provider = test_provider();
        // SAFETY: serial tests, no other thread touches these variables
        unsafe {
            std::env::set_var(&provider.api_session_var, "a");
            std::env::set_var(&provider.manga_one_session_var, "  ");
            std::env::set_var(&provider.home_popup_start_time_var, "1");
        }

        let err = provider.credentials().unwrap_err();
        clear(&provider);

        assert!(matches!(err, Error::Credentials(msg) if msg.contains("empty")));
    }

    #[test]
    fn static_credentials_return_clone() {
        let creds = SessionCredentials {
            api_session: "x".into(),
            manga_one_session: "y".into(),
            home_popup_start_time: "z".into(),
        };

        let provider = StaticCredentials::new(creds.clone());

        assert_eq!(provider.credentials().unwrap(), creds);
    }
}
