//! Config command handler: show effective configuration.

use crate::app::RunContext;
use crate::app_config::LoadedConfig;

pub fn run_config_show_command(ctx: &RunContext, loaded: &LoadedConfig) {
    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded.loaded_from_file {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!("user = {}", ctx.user.as_deref().unwrap_or("<anonymous>"));
    println!("output_dir = {}", ctx.output_dir.display());
    println!("tap_url = {}", ctx.archive.tap_url);
    println!("data_url = {}", ctx.archive.data_url);
    println!("token_url = {}", ctx.archive.token_url);
    println!("instruments = {}", ctx.defaults.instruments.join(","));
    println!("since = {}", ctx.defaults.since);
    println!("min_snr = {}", ctx.defaults.min_snr);
    println!("connect_timeout_secs = {}", ctx.archive.timeouts.connect_secs);
    println!("read_timeout_secs = {}", ctx.archive.timeouts.read_secs);
    println!(
        "max_rows = {}",
        ctx.archive
            .max_rows
            .map_or_else(|| "unlimited".to_string(), |rows| rows.to_string())
    );
}
