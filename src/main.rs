use std::io;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bulkmail::{account::Config, backend::imap, cli::Cli, filter::BulkFilter};

fn main() -> anyhow::Result<()> {
    // logs go to stderr so show output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let filter_config = cli.to_filter_config();
    filter_config.validate()?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let config = Config::from_file(&config_path)?;
    let account = config.account(&cli.account)?;

    let mut session = imap::connect(account, cli.debug_imap)?;

    let mut out = io::stdout().lock();
    BulkFilter::new(&filter_config, session.as_mut(), &mut out).run()?;

    if let Err(err) = session.logout() {
        debug!("cannot logout cleanly: {err}");
    }

    Ok(())
}
