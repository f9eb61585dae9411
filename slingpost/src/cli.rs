use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "slingpost", version, about = "Push local content into Apache Sling")]
pub struct Cli {
    /// Servlet host [env: SLING_HOST, default: localhost]
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// Servlet port [env: SLING_PORT, default: 8080]
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// User name [env: SLING_USER, default: admin]
    #[arg(long, global = true)]
    pub user: Option<String>,
    /// Password [env: SLING_PASS, default: admin]
    #[arg(long, global = true)]
    pub pass: Option<String>,
    /// Maximum number of requests in flight [env: SLING_MAX_REQUESTS]
    #[arg(long, global = true)]
    pub max_requests: Option<usize>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recreate directory trees as folders, files and descriptor nodes
    Post {
        #[arg(required = true)]
        directories: Vec<PathBuf>,
        /// Resource the directories are mapped to
        #[arg(long, default_value = "/")]
        dest: String,
    },
    /// Import json, jar, zip, jcr.xml or xml content files
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Resource the content is imported under
        #[arg(long, default_value = "/")]
        dest: String,
        #[arg(long)]
        checkin: bool,
        #[arg(long)]
        auto_checkout: bool,
        #[arg(long)]
        replace: bool,
        #[arg(long)]
        replace_properties: bool,
    },
}

impl Cli {
    /// Lays command-line values over `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.endpoint.host = host.clone();
        }
        if let Some(port) = self.port {
            config.endpoint.port = port;
        }
        if let Some(user) = &self.user {
            config.endpoint.user = user.clone();
        }
        if let Some(pass) = &self.pass {
            config.endpoint.password = pass.clone();
        }
        if let Some(max) = self.max_requests {
            config.max_requests = (max > 0).then_some(max);
        }
        if let Command::Import {
            checkin,
            auto_checkout,
            replace,
            replace_properties,
            ..
        } = &self.command
        {
            config.import.checkin |= checkin;
            config.import.auto_checkout |= auto_checkout;
            config.import.replace |= replace;
            config.import.replace_properties |= replace_properties;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_defaults_to_root_resource() {
        let cli = Cli::parse_from(["slingpost", "post", "content", "apps"]);
        let Command::Post { directories, dest } = cli.command else {
            panic!("expected post command");
        };
        assert_eq!(
            directories,
            vec![PathBuf::from("content"), PathBuf::from("apps")]
        );
        assert_eq!(dest, "/");
    }

    #[test]
    fn post_requires_a_directory() {
        assert!(Cli::try_parse_from(["slingpost", "post"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "slingpost",
            "import",
            "site.zip",
            "--dest",
            "/content",
            "--replace",
            "--host",
            "author",
            "--port",
            "4502",
        ]);
        let mut config = Config::default();
        config.import.checkin = true;
        cli.apply(&mut config);

        assert_eq!(config.endpoint.host, "author");
        assert_eq!(config.endpoint.port, 4502);
        assert_eq!(config.endpoint.user, "admin");
        assert!(config.import.replace);
        assert!(config.import.checkin);
        assert!(!config.import.auto_checkout);
    }
}
