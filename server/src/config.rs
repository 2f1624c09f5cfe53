//! Command-line configuration for the game server

use clap::Parser;
use shared::MAX_PLAYERS;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[clap(author, version, about)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    pub port: u16,
    /// Maximum number of players per room
    #[clap(short, long, default_value_t = MAX_PLAYERS)]
    pub max_players: usize,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_players: MAX_PLAYERS,
        }
    }
}
