use super::AuthSnapshot;

/// What a protected view should do for the current session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    /// An attempt is in flight; show a pending indicator.
    Pending,
    Granted { email: String },
    /// Prompt for login, with the last attempt's error if there was one.
    LoginRequired { error: Option<String> },
}

impl From<&AuthSnapshot> for Access {
    fn from(snapshot: &AuthSnapshot) -> Self {
        if snapshot.loading {
            return Self::Pending;
        }
        match (&snapshot.user_email, snapshot.is_authenticated) {
            (Some(email), true) => Self::Granted {
                email: email.clone(),
            },
            _ => Self::LoginRequired {
                error: snapshot.error_message(),
            },
        }
    }
}
