use crate::env::{
    EnvSource, ProcessEnv, AWS_ACCESS_KEY_ENV, AWS_ACCESS_KEY_ID_ENV, AWS_ENDPOINT_ENV,
    AWS_REGION_ENV, AWS_SECRET_ACCESS_KEY_ENV, AWS_SECRET_KEY_ENV, AWS_SESSION_TOKEN_ENV,
};
use serde::Deserialize;

/// Region used when neither the config nor the environment names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// AWS settings for the Kinesis client.
///
/// Every field is optional. Unset (or empty) values are resolved through
/// the environment, see [`Config::credential_source`], [`Config::region`]
/// and [`Config::endpoint`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

/// A fixed access/secret key pair with an optional session token.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

/// Where the client's credentials come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    /// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` (or their legacy aliases).
    Environment(StaticCredentials),
    /// The explicit pair from [`Config`].
    Static(StaticCredentials),
    /// `~/.aws/credentials`, profile chosen by `AWS_PROFILE`. Loaded lazily
    /// by the SDK, so a missing file surfaces on the first write.
    SharedFile,
}

impl CredentialSource {
    /// Name of the provider, as reported in construction logs.
    pub fn provider_name(&self) -> &'static str {
        match self {
            CredentialSource::Environment(_) => "EnvProvider",
            CredentialSource::Static(_) => "StaticProvider",
            CredentialSource::SharedFile => "SharedCredentialsProvider",
        }
    }

    /// The key pair, unless credentials come from the shared file.
    pub fn credentials(&self) -> Option<&StaticCredentials> {
        match self {
            CredentialSource::Environment(c) | CredentialSource::Static(c) => Some(c),
            CredentialSource::SharedFile => None,
        }
    }
}

impl Config {
    /// Config with an explicit key pair. Region and endpoint stay unset.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Config {
            access_key: Some(access_key.into()),
            secret_key: Some(secret_key.into()),
            ..Default::default()
        }
    }

    /// Set the region explicitly.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Point the client at a custom endpoint, e.g. a local Kinesis emulator.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Pick credentials from the process environment, then the explicit
    /// key pair, then the shared credentials file.
    pub fn credential_source(&self) -> CredentialSource {
        self.credential_source_with(&ProcessEnv)
    }

    /// Same cascade as [`Config::credential_source`] over an arbitrary
    /// environment.
    pub fn credential_source_with(&self, env: &impl EnvSource) -> CredentialSource {
        let env_pair = (
            env.first_of(&[AWS_ACCESS_KEY_ID_ENV, AWS_ACCESS_KEY_ENV]),
            env.first_of(&[AWS_SECRET_ACCESS_KEY_ENV, AWS_SECRET_KEY_ENV]),
        );
        if let (Some(access_key_id), Some(secret_access_key)) = env_pair {
            return CredentialSource::Environment(StaticCredentials {
                access_key_id,
                secret_access_key,
                session_token: env.non_empty(AWS_SESSION_TOKEN_ENV),
            });
        }

        if let (Some(access_key_id), Some(secret_access_key)) =
            (non_empty(&self.access_key), non_empty(&self.secret_key))
        {
            return CredentialSource::Static(StaticCredentials {
                access_key_id,
                secret_access_key,
                session_token: None,
            });
        }

        CredentialSource::SharedFile
    }

    /// Explicit region, else `AWS_REGION`, else [`DEFAULT_REGION`].
    pub fn region(&self) -> String {
        self.region_with(&ProcessEnv)
    }

    /// [`Config::region`] over an arbitrary environment.
    pub fn region_with(&self, env: &impl EnvSource) -> String {
        non_empty(&self.region)
            .or_else(|| env.non_empty(AWS_REGION_ENV))
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Explicit endpoint, else `AWS_ENDPOINT`, else `None` (service default).
    pub fn endpoint(&self) -> Option<String> {
        self.endpoint_with(&ProcessEnv)
    }

    /// [`Config::endpoint`] over an arbitrary environment.
    pub fn endpoint_with(&self, env: &impl EnvSource) -> Option<String> {
        non_empty(&self.endpoint).or_else(|| env.non_empty(AWS_ENDPOINT_ENV))
    }
}

#[cfg(feature = "kinesis")]
impl Config {
    /// Build the SDK configuration from the resolved credentials, region
    /// and endpoint.
    pub async fn sdk_config(&self) -> aws_config::SdkConfig {
        self.sdk_config_with(&ProcessEnv).await
    }

    pub async fn sdk_config_with(&self, env: &impl EnvSource) -> aws_config::SdkConfig {
        use aws_config::profile::ProfileFileCredentialsProvider;
        use aws_config::{BehaviorVersion, Region};
        use aws_sdk_kinesis::config::Credentials;

        let source = self.credential_source_with(env);
        let region = self.region_with(env);
        let endpoint = self.endpoint_with(env);

        tracing::debug!(
            provider = source.provider_name(),
            region = %region,
            endpoint = ?endpoint,
            "resolved kinesis client configuration"
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
        loader = match &source {
            CredentialSource::Environment(c) | CredentialSource::Static(c) => {
                loader.credentials_provider(Credentials::new(
                    c.access_key_id.clone(),
                    c.secret_access_key.clone(),
                    c.session_token.clone(),
                    None,
                    source.provider_name(),
                ))
            }
            CredentialSource::SharedFile => {
                loader.credentials_provider(ProfileFileCredentialsProvider::builder().build())
            }
        };
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        loader.load().await
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
