use vigil_domain::{AdminCredential, AuthConfig, VigilError, VigilResult};

/// Who performed an admin action; recorded as `created_by`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub email: String,
}

/// Checks bearer tokens for the admin and cron endpoints.
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    cron_secret: Option<String>,
    admins: Vec<AdminCredential>,
}

impl Authorizer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            cron_secret: config.cron_secret.clone().filter(|s| !s.is_empty()),
            admins: config
                .admins
                .iter()
                .filter(|admin| !admin.token.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// `token` is the bearer credential with the scheme already stripped.
    pub fn admin(&self, token: Option<&str>) -> VigilResult<AdminIdentity> {
        let token = non_empty(token).ok_or(VigilError::Unauthorized)?;
        self.admins
            .iter()
            .find(|admin| admin.token == token)
            .map(|admin| AdminIdentity {
                email: admin.email.clone(),
            })
            .ok_or(VigilError::Unauthorized)
    }

    /// Without a configured secret the cron endpoint is open.
    pub fn cron(&self, token: Option<&str>) -> VigilResult<()> {
        match &self.cron_secret {
            None => Ok(()),
            Some(secret) if non_empty(token) == Some(secret.as_str()) => Ok(()),
            Some(_) => Err(VigilError::Unauthorized),
        }
    }
}

fn non_empty(token: Option<&str>) -> Option<&str> {
    token.map(str::trim).filter(|token| !token.is_empty())
}
