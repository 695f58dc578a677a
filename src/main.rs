mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Args, CaptureOutcome, CliError, Command, ConfigAction};
use selfie_booth::config::Config;

fn load_config(args: &Args) -> Result<Config, CliError> {
    // An explicit --config must exist; the default location may be absent
    match args.config.as_deref() {
        Some(path) => Ok(Config::load_from_explicit(path)?),
        None => Ok(Config::load(None)?),
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    // Init must work before any config exists
    let config = match args.command {
        Some(Command::Config {
            action: ConfigAction::Init,
        }) => Config::default(),
        _ => load_config(&args)?,
    };

    match args.command {
        Some(Command::ListCameras { backend }) => cli::list_cameras(backend, &config),
        Some(Command::Config { action }) => {
            cli::handle_config_action(action, args.config.as_deref(), &config)
        }
        Some(Command::Login {
            username,
            password,
            cookie,
        }) => cli::login(&username, &password, cookie.as_deref()),
        Some(Command::Capture(capture)) => report(cli::run_capture(&config, &capture).await?),
        None => report(cli::run_capture(&config, &Default::default()).await?),
    }
}

fn report(outcome: CaptureOutcome) -> Result<(), CliError> {
    match outcome {
        CaptureOutcome::Saved(path) => println!("Saved {}", path.display()),
        CaptureOutcome::Cancelled => eprintln!("No photo taken."),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
