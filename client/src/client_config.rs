use std::default::Default;

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    /// Sent with the admission request when the session is password protected
    pub credential: Option<String>,
    /// The session's own local connection. It is admitted without asking.
    pub is_host: bool,
}

impl ClientConfig {
    pub fn host() -> Self {
        Self {
            credential: None,
            is_host: true,
        }
    }

    pub fn with_credential<S: Into<String>>(credential: S) -> Self {
        Self {
            credential: Some(credential.into()),
            is_host: false,
        }
    }
}
