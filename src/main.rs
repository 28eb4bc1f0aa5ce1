//! a scrolling cpu usage graph for status bars.

use {
    clap::Parser,
    cpu_usage::{App, Cli, Config, Error, daemon},
    std::process::ExitCode,
    tracing::error,
    tracing_subscriber::EnvFilter,
};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return Error::usage_exit_code(&error);
        }
    };

    init_logging(&cli.log_level);

    match run(&cli.config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "exiting");
            error.exit_code()
        }
    }
}

fn run(config: &Config) -> Result<(), Error> {
    let app = App::new(config)?;

    // show diagnostics before going into the background.
    app.print_diagnostics(config, std::io::stdout().lock())?;

    if config.background {
        daemon::detach(false)?;
    }

    app.run()
}

/// logs to stderr, filtered by `RUST_LOG` or else by the given filter.
fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|err| {
            eprintln!("invalid log filter {log_level:?}, using \"warn\": {err}");
            EnvFilter::new("warn")
        });

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("failed to init logger: {err}");
    }
}
