use scoreboard_entities::awards::AwardConfig;

#[derive(Debug, serde::Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub db_url: String,
    pub host: String,
    pub port: u16,
    pub logging_config: String,
    pub competition_name: String,
    pub award_config: AwardConfig,
    /// Only used when no admin password has been stored yet.
    pub initial_admin_password: String,
    pub allow_any_origin: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_url: "sqlite://./scoreboard.sqlite3?mode=rwc".into(),
            host: "0.0.0.0".into(),
            port: 3001,
            logging_config: "debug,sqlx::query=error,hyper=error,mio=debug,tower_http=debug,axum::rejection=trace".into(),
            competition_name: "2025年湖南省青少年创新实践大赛".into(),
            award_config: AwardConfig::default(),
            initial_admin_password: "admin".into(),
            allow_any_origin: true,
        }
    }
}

pub(crate) fn read_config_inner() -> Result<Config, anyhow::Error> {
    let config_path = std::env::var("SCOREBOARD_SERVER_CONFIG")?;
    let config = std::fs::read_to_string(config_path)?;
    let config = serde_yaml::from_str::<Config>(&config)?;
    Ok(config)
}

pub fn read_config() -> Config {
    match read_config_inner() {
        Ok(config) => config,
        Err(e) => {
            //Print to stderr, since logging is set up in the config
            eprintln!("Warning: Failed to read config: {}", e);
            Config::default()
        }
    }
}
