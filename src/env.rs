//! Environment variable names consulted when resolving the AWS client
//! configuration, plus a small lookup abstraction so the resolution
//! cascade can be exercised without touching the process environment.

use std::collections::HashMap;

/// Region override, e.g. `ap-northeast-1`.
pub const AWS_REGION_ENV: &str = "AWS_REGION";

/// Endpoint override, e.g. `http://localhost:4566` for localstack.
pub const AWS_ENDPOINT_ENV: &str = "AWS_ENDPOINT";

/// Access key id read by the environment credential source.
pub const AWS_ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";

/// Legacy alias of [`AWS_ACCESS_KEY_ID_ENV`].
pub const AWS_ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY";

/// Secret access key read by the environment credential source.
pub const AWS_SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// Legacy alias of [`AWS_SECRET_ACCESS_KEY_ENV`].
pub const AWS_SECRET_KEY_ENV: &str = "AWS_SECRET_KEY";

/// Optional session token for temporary credentials.
pub const AWS_SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Source of environment variables.
pub trait EnvSource {
    /// Value of `key`, or `None` when unset.
    fn var(&self, key: &str) -> Option<String>;

    /// Value of `key`, treating an empty value as unset.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }

    /// First non-empty value among `keys`.
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.non_empty(k))
    }
}

/// Reads the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string())
    }
}
