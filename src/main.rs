use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cfg = beatvis::config::Config::parse();
    if cfg.list_devices {
        beatvis::audio::list_input_devices()?;
        return Ok(());
    }

    beatvis::app::run(cfg)
}
