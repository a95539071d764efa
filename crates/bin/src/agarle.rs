//! Agarle - headless episode runner.

use std::env;

use agarle::ai::{BotPolicy, GreedyBot};
use agarle::render::LogRenderer;
use agarle::{Config, Environment};
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("invalid {key}: {value:?}")),
        Err(_) => Ok(default),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Agarle v{}", env!("CARGO_PKG_VERSION"));

    let config_path = env::var("AGARLE_CONFIG").unwrap_or_else(|_| "agarle.toml".to_string());
    let episodes: u32 = env_or("EPISODES", 1)?;
    let max_steps: u64 = env_or("MAX_STEPS", 500)?;
    let render = env::var_os("RENDER").is_some();

    let config = Config::load(&config_path)?;
    info!("Loaded configuration from {}", config_path);
    info!("  Arena: {}", config.arena.size);
    info!("  Bots: {}", config.env.num_bots);
    info!("  Frames per step: {}", config.env.frames_per_step);

    let seed = config.env.seed;
    let mut arena = Environment::new(config)?;
    if render {
        arena.set_renderer(Box::new(LogRenderer::default()));
    }
    let mut agent = GreedyBot::new(seed);

    for episode in 1..=episodes {
        arena.reset();
        agent.reset();
        let mut total_reward = 0.0f32;
        while arena.steps() < max_steps && !arena.done() {
            let action = agent.decide(&arena.view(), arena.pid());
            let direction = action.direction();
            arena.take_action(direction.x, direction.y, action.kind())?;
            total_reward += arena.step();
            arena.render();
        }

        let final_mass = arena
            .view()
            .player(arena.pid())
            .map_or(0.0, |p| p.total_mass());
        info!(
            "Episode {}: {} steps, reward {:.1}, final mass {:.1}, done {}",
            episode,
            arena.steps(),
            total_reward,
            final_mass,
            arena.done()
        );
    }

    Ok(())
}
