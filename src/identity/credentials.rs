use super::ClientError;
use secrecy::SecretString;
use uuid::Uuid;

/// Identifiers and signing key issued to a deployment.
///
/// Immutable for the life of the process; every QR issuance request is signed
/// with the key held here.
#[derive(Clone)]
pub struct Credentials {
    application_id: String,
    hub_id: String,
    signing_key: SecretString,
}

impl Credentials {
    /// Build credentials, validating both identifiers.
    ///
    /// # Errors
    /// Returns `ClientError::Config` if the application or hub id is not a UUID.
    pub fn new(
        application_id: impl Into<String>,
        hub_id: impl Into<String>,
        signing_key: SecretString,
    ) -> Result<Self, ClientError> {
        let application_id = application_id.into();
        let hub_id = hub_id.into();

        Uuid::parse_str(&application_id)
            .map_err(|e| ClientError::Config(format!("invalid application id: {e}")))?;
        Uuid::parse_str(&hub_id)
            .map_err(|e| ClientError::Config(format!("invalid hub id: {e}")))?;

        Ok(Self {
            application_id,
            hub_id,
            signing_key,
        })
    }

    #[must_use]
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    #[must_use]
    pub fn hub_id(&self) -> &str {
        &self.hub_id
    }

    #[must_use]
    pub const fn signing_key(&self) -> &SecretString {
        &self.signing_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("application_id", &self.application_id)
            .field("hub_id", &self.hub_id)
            .field("signing_key", &"***")
            .finish()
    }
}
