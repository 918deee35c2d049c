use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,

    /// Team whose members may invoke admin actions. Admin actions fail
    /// with ADMIN_REQUIRED while this is unset.
    pub admin_team_id: Option<String>,

    // Rate limiting
    pub rate_actions_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            admin_team_id: env::var("ADMIN_TEAM_ID").ok().filter(|v| !v.is_empty()),
            rate_actions_per_min: env::var("RATE_ACTIONS_PER_MIN")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap(),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }
}
