//! Command-line entry point (native).

#[cfg(feature = "native")]
fn main() {
    use clap::Parser;
    use swatchkeep_app::AppConfig;
    use swatchkeep_app::cli::{Cli, SystemClipboard, run};

    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().with_data_dir(cli.data_dir);
    log::debug!("Running {:?} with {:?}", cli.command, config);

    let stdout = std::io::stdout();
    if let Err(e) = run(cli.command, &config, &mut stdout.lock(), &mut SystemClipboard) {
        eprintln!("swatchkeep: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
