use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use secretvault::cli::commands;
use secretvault::cli::{output, Cli, Commands, Context};
use secretvault::errors::Result;

/// Environment variable holding a `tracing` filter, e.g. `secretvault=debug`.
const LOG_ENV: &str = "SECRETVAULT_LOG";

fn main() {
    let cli = Cli::parse();

    let ctx = match Context::load(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    };

    init_tracing(&ctx.settings.log_filter);

    if let Err(e) = run(&cli, &ctx) {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn run(cli: &Cli, ctx: &Context) -> Result<()> {
    match cli.command {
        Commands::Init => commands::init::execute(ctx),
        Commands::Generate {
            ref secret_type,
            ref persistence,
            length,
        } => commands::generate::execute(ctx, secret_type, persistence, length),
        Commands::Import {
            ref secret_type,
            ref persistence,
            length,
            ref material,
        } => commands::import_cmd::execute(ctx, secret_type, persistence, length, material),
        Commands::Export { index } => commands::export::execute(ctx, index),
        Commands::Pubkey { index } => commands::pubkey::execute(ctx, index),
        Commands::List => commands::list::execute(ctx),
        Commands::Destroy { index } => commands::destroy::execute(ctx, index),
        Commands::Random { count } => commands::random::execute(count),
        Commands::Sha256 { ref text } => commands::hash::execute(text),
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(ctx, last, since.as_deref())
        }
        #[cfg(not(feature = "audit-log"))]
        Commands::Audit { .. } => Err(secretvault::errors::VaultError::CommandFailed(
            "built without the audit-log feature".into(),
        )),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(),
    }
}
