use gitsnap::cli::{self, Cli};
use gitsnap::ui::output;

fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    if let Err(err) = cli::run(cli) {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("gitsnap={level}")));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
