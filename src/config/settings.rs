use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_FEED_URL: &str = "https://data.vatsim.net/v3/vatsim-data.json";

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub feed: FeedSettings,
    pub poll: PollSettings,
    pub discord: DiscordSettings,
    pub gateway: GatewaySettings,
    pub logging: LoggingSettings,
}

/// Where the live network snapshot comes from and which positions matter.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    pub url: String,
    pub timeout_secs: u64,
    /// Globally watched callsigns. Anything else in the feed is ignored.
    pub watched: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollSettings {
    pub interval_secs: u64,
}

/// Discord delivery target.
///
/// Without a token, notifications only go to the log and the gateway.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiscordSettings {
    pub token: Option<String>,
    pub channel_id: Option<u64>,
    pub guild_id: Option<u64>,
    /// Role pinged on every broadcast.
    pub role_id: Option<u64>,
}

/// Command gateway listener.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub feed: Option<PartialFeedSettings>,
    pub poll: Option<PartialPollSettings>,
    pub discord: Option<DiscordSettings>,
    pub gateway: Option<PartialGatewaySettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialFeedSettings {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub watched: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialPollSettings {
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialGatewaySettings {
    pub enabled: Option<bool>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed: FeedSettings {
                url: DEFAULT_FEED_URL.to_string(),
                timeout_secs: 10,
                watched: vec!["ML_GND".to_string(), "SY_GND".to_string()],
            },
            poll: PollSettings { interval_secs: 30 },
            discord: DiscordSettings::default(),
            gateway: GatewaySettings {
                enabled: true,
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Fill every missing value from the defaults.
    pub fn merge(self) -> Settings {
        let default = Settings::default();
        let feed = self.feed.unwrap_or_default();
        let poll = self.poll.unwrap_or_default();
        let gateway = self.gateway.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();

        Settings {
            feed: FeedSettings {
                url: feed.url.unwrap_or(default.feed.url),
                timeout_secs: feed.timeout_secs.unwrap_or(default.feed.timeout_secs),
                watched: feed.watched.unwrap_or(default.feed.watched),
            },
            poll: PollSettings {
                interval_secs: poll.interval_secs.unwrap_or(default.poll.interval_secs),
            },
            discord: self.discord.unwrap_or(default.discord),
            gateway: GatewaySettings {
                enabled: gateway.enabled.unwrap_or(default.gateway.enabled),
                host: gateway.host.unwrap_or(default.gateway.host),
                port: gateway.port.unwrap_or(default.gateway.port),
            },
            logging: LoggingSettings {
                level: logging.level.unwrap_or(default.logging.level),
            },
        }
    }
}

impl Settings {
    /// Poll period. A zero interval is bumped to one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs.max(1))
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed.timeout_secs.max(1))
    }

    pub fn gateway_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }

    /// Log warnings for settings that load fine but will not behave as expected.
    pub fn validate(&self) {
        if self.feed.watched.is_empty() {
            tracing::warn!("feed.watched is empty, no position will ever be reported");
        }
        if self.poll.interval_secs == 0 {
            tracing::warn!("poll.interval_secs is 0, using 1s instead");
        }
        if self.discord.token.is_some() && self.discord.channel_id.is_none() {
            tracing::warn!("discord.token is set but discord.channel_id is not, Discord delivery disabled");
        }
        if self.discord.token.is_none() && !self.gateway.enabled {
            tracing::warn!("no Discord token and gateway disabled, notifications only reach the log");
        }
    }
}
