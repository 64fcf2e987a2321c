//! atelier - offline inspection tool for scene documents
//!
//! Run with: cargo run -p atelier_cli -- inspect scene.json
//!       or: atelier --config atelier.toml preview scene.json

mod commands;

use commands::CliError;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = commands::parse_args(&args).and_then(|invocation| {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        commands::run(&invocation, &mut out)
    });

    let code = match result {
        Ok(()) => 0,
        Err(CliError::Usage(message)) => {
            eprintln!("{}\n\n{}", message, commands::USAGE);
            2
        }
        Err(e) => {
            log::error!("{}", e);
            1
        }
    };
    std::process::exit(code);
}
