use anyhow::{anyhow, Context};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use valpro_core::config::Config;
use valpro_core::session::Session;
use valpro_core::User;
use valpro_sync::Store;

/// An opened project: its configuration, a runtime and a store wired to the
/// configured backend.
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    pub store: Store,
    rt: Runtime,
}

impl Workspace {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        let backend =
            valpro_sync::from_config(&config, root).context("failed to set up backend")?;
        let store = Store::new(backend).with_pricing(config.pricing.clone());
        let rt = Runtime::new().context("failed to start async runtime")?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            store,
            rt,
        })
    }

    /// Open the project and resume the saved session.
    pub fn signed_in(root: &Path) -> anyhow::Result<Self> {
        let ws = Self::open(root)?;
        let session = Session::load(root)
            .context("failed to read session")?
            .ok_or_else(|| anyhow!("not logged in: run 'valpro login <user-id>'"))?;
        ws.block_on(ws.store.login_as(&session.user_id))
            .with_context(|| format!("failed to resume session for {}", session.user_id))?;
        Ok(ws)
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.rt.block_on(fut)
    }

    pub fn actor(&self) -> anyhow::Result<User> {
        self.block_on(self.store.current_user())
            .ok_or_else(|| anyhow!("not logged in"))
    }
}
