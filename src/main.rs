use model_viewer::{app, config::ViewerConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "viewer.json".to_string());
    let config = ViewerConfig::load_or_default(&config_path)?;
    app::run(config)
}
