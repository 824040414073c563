mod settings;

use config::{Config, ConfigError, Environment, File};

pub use settings::{
    DEFAULT_FEED_URL, DiscordSettings, FeedSettings, GatewaySettings, LoggingSettings,
    PartialSettings, PollSettings, Settings,
};

/// Environment variable prefix, e.g. `ATCWATCH_DISCORD__TOKEN`.
pub const ENV_PREFIX: &str = "ATCWATCH";

/// Loads the configuration from the given file (any format `config` knows,
/// extension optional) layered under the environment, then merges the result
/// with default values.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("feed.watched")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge())
}
