//! Core configuration shared by the CLI, the pipeline and the server.

mod config;

pub use config::{
    env_lookup, parse_project_id, AiConfig, BoardConfig, Config, ConfigError, Credentials,
    OutputConfig, ServerSection, Settings, TicketingConfig, LOCAL_CONFIG_FILE,
};
