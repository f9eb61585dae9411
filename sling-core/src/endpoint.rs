use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_USER: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";

/// Where the servlet lives and who we authenticate as.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl Endpoint {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Control flags of the servlet's import operation. Only flags that are set
/// go on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportOptions {
    pub checkin: bool,
    pub auto_checkout: bool,
    pub replace: bool,
    pub replace_properties: bool,
}

impl ImportOptions {
    pub fn enabled_fields(&self) -> Vec<&'static str> {
        [
            (":checkin", self.checkin),
            (":autoCheckout", self.auto_checkout),
            (":replace", self.replace),
            (":replaceProperties", self.replace_properties),
        ]
        .into_iter()
        .filter_map(|(field, enabled)| enabled.then_some(field))
        .collect()
    }
}
