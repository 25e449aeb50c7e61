use mailcheck::{config, Config, MailStatus};
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr and only when RUST_LOG asks for them; a plain
/// run must stay silent.
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::OFF.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A panic must not surface either: log it (if enabled) and exit with the
/// same status as any other failure.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        tracing::debug!(panic = %panic_info, "Mail check panicked, reporting no mail");
        std::process::exit(i32::from(MailStatus::NoMail.code()));
    }));
}

fn load_config() -> anyhow::Result<Config> {
    let path = config::config_path()?;
    Ok(Config::load(&path)?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    install_panic_hook();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!(error = %e, "Configuration unusable, reporting no mail");
            return MailStatus::NoMail.into();
        }
    };

    let client = match mailcheck::build_client() {
        Ok(client) => client,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to build HTTP client, reporting no mail");
            return MailStatus::NoMail.into();
        }
    };

    mailcheck::run(&client, &config).await.into()
}
