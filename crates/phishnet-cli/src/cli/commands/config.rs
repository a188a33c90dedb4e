//! `phishnet config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::OutputFormat;

pub fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(&ctx, &key, &value),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let mut config = ctx.config.clone();
    config.api_key = config.api_key.as_deref().map(mask_key);

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Pretty => {
            println!("{}", "Current Configuration:".bold());
            println!();

            let api_display = config
                .api_key
                .unwrap_or_else(|| "(not set)".dimmed().to_string());
            println!("  {} {}", "api_key:".bold(), api_display);
            println!(
                "  {} {}",
                "base_url:".bold(),
                config.base_url.as_deref().unwrap_or(phishnet::DEFAULT_BASE_URL)
            );
            println!(
                "  {} {}",
                "output_format:".bold(),
                config.output_format.unwrap_or_default()
            );
            println!("  {} {}", "max_concurrency:".bold(), config.scan.max_concurrency);
            println!("  {} {}", "poll_interval_secs:".bold(), config.scan.poll_interval_secs);
            println!("  {} {}", "timeout_secs:".bold(), config.scan.timeout_secs);
            println!("  {} {}", "report_ttl_secs:".bold(), config.scan.report_ttl_secs);
            if let Some(limit) = config.scan.requests_per_minute {
                println!("  {} {}", "requests_per_minute:".bold(), limit);
            }
        }
    }

    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = ctx.config.clone();
    apply(&mut config, key, value)?;
    config.save(&ctx.config_path)?;

    println!("{} {} set.", "Success:".green().bold(), key.cyan());
    Ok(())
}

/// Apply one `key = value` update
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "api_key" => config.api_key = Some(value.to_string()),
        "base_url" => config.base_url = Some(value.trim_end_matches('/').to_string()),
        "output_format" | "output" => config.output_format = Some(value.parse()?),
        "max_concurrency" | "concurrency" => config.scan.max_concurrency = value.parse()?,
        "poll_interval_secs" | "poll_interval" => {
            let secs: u64 = value.parse()?;
            if secs == 0 {
                anyhow::bail!("poll_interval_secs must be at least 1");
            }
            config.scan.poll_interval_secs = secs;
        }
        "timeout_secs" | "timeout" => config.scan.timeout_secs = value.parse()?,
        "report_ttl_secs" => config.scan.report_ttl_secs = value.parse()?,
        "requests_per_minute" => config.scan.requests_per_minute = Some(value.parse()?),
        _ => {
            anyhow::bail!(
                "Unknown config key: {}\n\n\
                 Available keys:\n  \
                 api_key             - Reputation service API key\n  \
                 base_url            - Reputation service base URL\n  \
                 output_format       - Default output format (json/pretty)\n  \
                 max_concurrency     - Concurrent service calls\n  \
                 poll_interval_secs  - Seconds between status polls\n  \
                 timeout_secs        - Seconds before an analysis times out\n  \
                 report_ttl_secs     - Seconds a report stays cached\n  \
                 requests_per_minute - Outbound request quota",
                key
            );
        }
    }
    Ok(())
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}
