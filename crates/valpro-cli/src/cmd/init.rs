use anyhow::Context;
use std::path::Path;
use valpro_core::{config::Config, io, paths};
use valpro_sync::FileBackend;

pub fn run(root: &Path, empty: bool) -> anyhow::Result<()> {
    println!("Initializing valpro in: {}", root.display());

    let dir = paths::valpro_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        println!("  exists:  .valpro/config.yaml");
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: .valpro/config.yaml");
        cfg
    };

    match config.backend.resolved_data_dir(root) {
        Some(data_dir) => {
            io::ensure_dir(&data_dir)
                .with_context(|| format!("failed to create {}", data_dir.display()))?;
            if empty {
                println!("  skipped: demo data (--empty)");
            } else if FileBackend::seed(&data_dir).context("failed to seed demo data")? {
                println!("  created: {} (demo data)", data_dir.display());
            } else {
                println!("  exists:  {}", data_dir.display());
            }
        }
        None => println!("  remote backend configured; no local data"),
    }

    println!("\nNext: valpro login <user-id>   (see 'valpro user list')");
    Ok(())
}
