use sling_core::{
    DEFAULT_HOST, DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USER, Endpoint, ImportOptions,
};

/// Settings shared by the `post` and `import` commands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Endpoint,
    /// Upper bound on requests in flight; `None` sends everything at once.
    pub max_requests: Option<usize>,
    pub import: ImportOptions,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let endpoint = Endpoint {
            host: lookup("SLING_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: lookup("SLING_PORT")
                .and_then(|value| value.trim().parse::<u16>().ok())
                .filter(|port| *port > 0)
                .unwrap_or(DEFAULT_PORT),
            user: lookup("SLING_USER").unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: lookup("SLING_PASS").unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
        };
        let max_requests = lookup("SLING_MAX_REQUESTS")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|value| *value > 0);
        let import = ImportOptions {
            checkin: read_bool(&lookup, "SLING_CHECKIN"),
            auto_checkout: read_bool(&lookup, "SLING_AUTO_CHECKOUT"),
            replace: read_bool(&lookup, "SLING_REPLACE"),
            replace_properties: read_bool(&lookup, "SLING_REPLACE_PROPERTIES"),
        };

        Self {
            endpoint,
            max_requests,
            import,
        }
    }

    pub fn log_options(&self, with_import: bool) {
        log::debug!("Host: {}", self.endpoint.host);
        log::debug!("Port: {}", self.endpoint.port);
        log::debug!("User: {}", self.endpoint.user);
        if with_import {
            log::debug!("Checkin: {}", self.import.checkin);
            log::debug!("Auto-checkout: {}", self.import.auto_checkout);
            log::debug!("Replace: {}", self.import.replace);
            log::debug!("Replace properties: {}", self.import.replace_properties);
        }
    }
}

fn read_bool<L>(lookup: &L, name: &str) -> bool
where
    L: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]);
        assert_eq!(config.endpoint, Endpoint::default());
        assert_eq!(config.max_requests, None);
        assert_eq!(config.import, ImportOptions::default());
    }

    #[test]
    fn reads_endpoint_and_flags() {
        let config = config(&[
            ("SLING_HOST", "author.local"),
            ("SLING_PORT", "4502"),
            ("SLING_USER", "deployer"),
            ("SLING_PASS", "secret"),
            ("SLING_MAX_REQUESTS", "8"),
            ("SLING_REPLACE", "yes"),
            ("SLING_CHECKIN", "0"),
        ]);
        assert_eq!(config.endpoint.host, "author.local");
        assert_eq!(config.endpoint.port, 4502);
        assert_eq!(config.endpoint.user, "deployer");
        assert_eq!(config.endpoint.password, "secret");
        assert_eq!(config.max_requests, Some(8));
        assert!(config.import.replace);
        assert!(!config.import.checkin);
    }

    #[test]
    fn unparseable_values_fall_back() {
        let config = config(&[("SLING_PORT", "http"), ("SLING_MAX_REQUESTS", "0")]);
        assert_eq!(config.endpoint.port, 8080);
        assert_eq!(config.max_requests, None);
    }
}
