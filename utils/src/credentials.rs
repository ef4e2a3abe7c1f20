//! Provider secrets, read from the environment before any request is made.

/// Reads a required variable; empty values count as missing.
fn require<F>(lookup: &F, var: &'static str, provider: &'static str) -> crate::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|value| !value.trim().is_empty())
        .ok_or(crate::Error::CredentialMissing { var, provider })
}

/// Process environment lookup used outside of tests.
pub fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

#[derive(Clone)]
pub struct InfuraCredentials {
    pub project_id: String,
    pub project_secret: String,
}

impl InfuraCredentials {
    pub const PROJECT_ID_VAR: &'static str = "INFURA_PROJECT_ID";
    pub const PROJECT_SECRET_VAR: &'static str = "INFURA_PROJECT_SECRET";

    pub fn lookup<F: Fn(&str) -> Option<String>>(lookup: &F) -> crate::Result<Self> {
        Ok(Self {
            project_id: require(lookup, Self::PROJECT_ID_VAR, "infura")?,
            project_secret: require(lookup, Self::PROJECT_SECRET_VAR, "infura")?,
        })
    }
}

/// A single key, sent however the provider expects it.
#[derive(Clone)]
pub struct ApiKey(pub String);

impl ApiKey {
    pub const MORALIS_VAR: &'static str = "MORALIS_API_KEY";
    pub const ALCHEMY_VAR: &'static str = "ALCHEMY_API_KEY";
    pub const ETHERSCAN_VAR: &'static str = "ETHERSCAN_API_KEY";

    pub fn lookup<F: Fn(&str) -> Option<String>>(
        lookup: &F,
        var: &'static str,
        provider: &'static str,
    ) -> crate::Result<Self> {
        require(lookup, var, provider).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep keys out of `{:?}` output.
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl std::fmt::Debug for InfuraCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfuraCredentials")
            .field("project_id", &self.project_id)
            .field("project_secret", &"***")
            .finish()
    }
}
