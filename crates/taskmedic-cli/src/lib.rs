pub mod cli;
pub mod commands;
pub mod config;
pub mod fs_store;
pub mod render;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use taskmedic_core::app::{
  App,
  AppConfig
};
use taskmedic_core::datetime::now_ms;
use tracing::{
  debug,
  info
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
    "starting taskmedic CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.taskmedicrc.as_deref()
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

  let store =
    fs_store::FileStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open file store at \
         {}",
        data_dir.display()
      )
    })?;

  let app_config = AppConfig {
    tz: cfg.timezone()?,
    highlight: cfg.highlight(),
    ..AppConfig::default()
  };
  let mut app =
    App::open(store, app_config)?;

  let renderer =
    render::Renderer::new(&cfg)?;

  commands::dispatch(
    &mut app,
    &renderer,
    cli.command,
    now_ms()
  )?;

  info!("done");
  Ok(())
}
