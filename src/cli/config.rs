//! Config command implementation.

use crate::cli::AppContext;
use crate::cli::args::ConfigCommand;
use crate::error::Result;
use crate::render::to_json;

/// Execute a config subcommand.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(ctx: &AppContext, command: &ConfigCommand) -> Result<()> {
    let config = &ctx.config;
    match command {
        ConfigCommand::Path => {
            if ctx.is_json() {
                let body = serde_json::json!({
                    "config_path": config.config_path,
                    "exists": config.config_path.exists(),
                    "session_file": ctx.paths.session_file(),
                });
                println!("{}", to_json(&body, ctx.pretty)?);
            } else {
                println!("{}", config.config_path.display());
            }
        }
        ConfigCommand::Show => {
            if ctx.is_json() {
                println!("{}", to_json(config, ctx.pretty)?);
                return Ok(());
            }
            let exists = if config.config_path.exists() { "" } else { " (not found)" };
            println!("config file:      {}{exists}", config.config_path.display());
            println!("base_url:         {} [{}]", config.base_url, config.sources.base_url);
            println!(
                "timeout:          {}s [{}]",
                config.timeout.as_secs(),
                config.sources.timeout
            );
            match config.stream_idle_timeout {
                Some(idle) => println!("stream idle:      {}s", idle.as_secs()),
                None => println!("stream idle:      disabled"),
            }
            println!(
                "session backend:  {} [{}]",
                config.session_backend, config.sources.session_backend
            );
            println!("session store:    {}", ctx.store.backend_description());
            println!("refresh path:     {}", config.refresh_path);
            println!("login path:       {}", config.login_path);
            println!("logout path:      {}", config.logout_path);
            println!("profile path:     {}", config.profile_path);
            println!("format path:      {}", config.format_path);
            println!("default mode:     {}", config.default_mode);
            if let Some(dir) = &config.output_dir {
                println!("output dir:       {}", dir.display());
            }
        }
    }
    Ok(())
}
