use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Title shown on the notification when an alert fires, unless overridden.
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Live now!";
/// Body shown on the notification when an alert fires, unless overridden.
pub const DEFAULT_NOTIFICATION_BODY: &str = "Someone just went live! 💜";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    /// A single `*` allows any origin.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:5173,http://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 3000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,

    /// Minimum number of distinct connected clients that must signal "live"
    /// before an alert fires. Zero is rejected at startup.
    #[arg(long, env, default_value_t = 3)]
    pub alert_threshold: u32,

    /// Minimum time in milliseconds between two alert fires.
    #[arg(long, env, default_value_t = 60_000)]
    pub alert_cooldown_millis: u64,

    /// Window in milliseconds used to coalesce connect/disconnect bursts into
    /// a single connected-user count broadcast.
    #[arg(long, env, default_value_t = 100)]
    pub count_debounce_millis: u64,

    /// Upper bound in seconds for a single push delivery attempt.
    #[arg(long, env, default_value_t = 10)]
    pub push_timeout_secs: u64,

    /// Time-to-live in seconds handed to the push service for each message.
    #[arg(long, env, default_value_t = 86_400)]
    pub push_ttl_secs: u32,

    /// VAPID application server public key (base64url), handed to browsers.
    #[arg(long, env)]
    vapid_public_key: Option<String>,

    /// VAPID application server private key (base64url) used to sign pushes.
    #[arg(long, env, hide_env_values = true)]
    vapid_private_key: Option<String>,

    /// Contact URI placed in the VAPID `sub` claim.
    #[arg(long, env, default_value = "mailto:alerts@example.com")]
    vapid_subject: String,

    /// Remove subscriptions whose push service reports them gone (404/410).
    #[arg(long, env, default_value_t = false)]
    pub evict_expired_subscriptions: bool,

    /// JSON file backing the nickname registration list.
    #[arg(long, env, default_value = "nicknames.json")]
    nicknames_file: String,

    /// Directory of static assets served for any unmatched route.
    #[arg(long, env, default_value = "./public")]
    static_dir: String,

    /// Title of the notification sent when an alert fires.
    #[arg(long, env, default_value = DEFAULT_NOTIFICATION_TITLE)]
    notification_title: String,

    /// Body of the notification sent when an alert fires.
    #[arg(long, env, default_value = DEFAULT_NOTIFICATION_BODY)]
    notification_body: String,

    /// Icon path of the notification sent when an alert fires.
    #[arg(long, env, default_value = "/icon.png")]
    notification_icon: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_millis(self.alert_cooldown_millis)
    }

    pub fn count_debounce(&self) -> Duration {
        Duration::from_millis(self.count_debounce_millis)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout_secs)
    }

    pub fn vapid_public_key(&self) -> Option<String> {
        self.vapid_public_key.clone()
    }

    pub fn vapid_private_key(&self) -> Option<String> {
        self.vapid_private_key.clone()
    }

    pub fn set_vapid_private_key(mut self, key: String) -> Self {
        self.vapid_private_key = Some(key);
        self
    }

    pub fn vapid_subject(&self) -> &str {
        &self.vapid_subject
    }

    pub fn nicknames_file(&self) -> &str {
        &self.nicknames_file
    }

    pub fn static_dir(&self) -> &str {
        &self.static_dir
    }

    pub fn notification_title(&self) -> &str {
        &self.notification_title
    }

    pub fn notification_body(&self) -> &str {
        &self.notification_body
    }

    pub fn notification_icon(&self) -> &str {
        &self.notification_icon
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["live_alert"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_the_documented_alert_policy() {
        let config = parse(&[]);
        assert_eq!(config.alert_threshold, 3);
        assert_eq!(config.alert_cooldown(), Duration::from_secs(60));
        assert_eq!(config.count_debounce(), Duration::from_millis(100));
        assert_eq!(config.notification_title(), DEFAULT_NOTIFICATION_TITLE);
        assert!(!config.evict_expired_subscriptions);
    }

    #[test]
    fn allowed_origins_are_split_on_commas() {
        let config = parse(&["--allowed-origins", "https://a.example,https://b.example"]);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn runtime_env_parses_case_insensitively() {
        assert_eq!("PRODUCTION".parse::<RustEnv>(), Ok(RustEnv::Production));
        assert_eq!("staging".parse::<RustEnv>(), Ok(RustEnv::Staging));
        assert_eq!("qa".parse::<RustEnv>(), Err(RustEnvParseError));
    }

    #[test]
    fn set_vapid_private_key_overrides_unset_value() {
        let config = parse(&[]).set_vapid_private_key("secret".to_string());
        assert_eq!(config.vapid_private_key().as_deref(), Some("secret"));
    }
}
