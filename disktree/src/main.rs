// Forbid unwrap() in production code to prevent panics from corrupt data.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use disktree::DiskTree;
use disktree::config::DemoConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "disktree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match DemoConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: file={}, fresh={}",
        config.file.display(),
        config.fresh
    );

    if let Err(e) = run(&config) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: &DemoConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.fresh {
        match std::fs::remove_file(&config.file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    let mut tree = DiskTree::open(&config.file)?;

    tree.insert(10)?;
    println!("{}", tree.delete(10)?);
    tree.insert(20)?;

    tree.print(&mut std::io::stdout().lock())?;
    tree.close()?;
    Ok(())
}
