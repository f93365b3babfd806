use tracing_subscriber::EnvFilter;
use vmsim::config::Config;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match Config::from_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = vmsim::run(&config) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
