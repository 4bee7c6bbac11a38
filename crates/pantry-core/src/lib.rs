pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod item;
pub mod notify;
pub mod registry;
pub mod render;
pub mod session;
pub mod storage;
pub mod store;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use error::RegistryError;
pub use item::{
  DEFAULT_LIST,
  Item
};
pub use notify::{
  Change,
  Notifier,
  SubscriptionId
};
pub use registry::ListRegistry;
pub use session::{
  Session,
  SessionOptions
};
pub use storage::{
  FileStorage,
  MemoryStorage,
  Storage
};
pub use store::{
  ListStore,
  ListSummary
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting pantry CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.pantryrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let storage =
    storage::FileStorage::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open storage at {}",
        data_dir.display()
      )
    })?;
  let mut session = session::Session::open(
    storage,
    session::SessionOptions::from_config(
      &cfg
    )
  );

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.list, cli.rest
  )?;

  commands::dispatch(
    &mut session,
    &cfg,
    &mut renderer,
    inv
  )?;

  info!("done");
  Ok(())
}
