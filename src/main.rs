use anyhow::Result;
use log::info;

use workshop_sync::config::Config;
use workshop_sync::constants::{ERROR_NO_API_TOKEN, SUCCESS_NOTHING_TO_SYNC};
use workshop_sync::utils::datetime;
use workshop_sync::{logger, AppContext};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--generate-config") {
        Config::generate_default_config(Config::get_default_config_path()?)?;
        return Ok(());
    }
    let force = args.iter().any(|arg| arg == "--force");

    let config = Config::load()?;
    if let Some(log_path) = logger::init(&config.logging)? {
        eprintln!("📝 Logging to {}", log_path.display());
    }

    // Check if the web-service token is set
    if config.site.token().is_none() {
        eprintln!("{} ({})", ERROR_NO_API_TOKEN, config.site.token_env);
        eprintln!("\n💡 To use this tool:");
        eprintln!("1. Create a web-service token in your Moodle profile (Security keys)");
        eprintln!("2. Set it as environment variable: export {}=your_token_here", config.site.token_env);
        eprintln!("3. Run workshop-sync again to send your offline work");
        return Ok(());
    }

    let context = AppContext::from_config(config).await?;
    let summary = context.sync.sync_all_workshops(force).await?;
    info!(
        "Sync finished: {} synced, {} skipped, {} failed",
        summary.synced.len(),
        summary.skipped.len(),
        summary.failed.len()
    );

    if summary.synced.is_empty() && summary.failed.is_empty() {
        println!("{}", SUCCESS_NOTHING_TO_SYNC);
    }

    for (workshop_id, result) in &summary.synced {
        if result.updated {
            println!("✅ Workshop {} synchronized", workshop_id);
        }
        for warning in &result.warnings {
            println!("⚠️  {}", warning);
        }
    }
    for (workshop_id, error) in &summary.failed {
        eprintln!("❌ Workshop {}: {}", workshop_id, error);
    }
    for workshop_id in &summary.skipped {
        let last_sync = context.sync.get_sync_time(*workshop_id).await?;
        println!(
            "⏭️  Workshop {} was synchronized at {} (use --force)",
            workshop_id,
            datetime::format_timestamp(last_sync)
        );
    }

    Ok(())
}
