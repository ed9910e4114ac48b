mod cli;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let level = if args.iter().any(|arg| arg == "--verbose") {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Debug
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    cli::run_cli_demos()
}
