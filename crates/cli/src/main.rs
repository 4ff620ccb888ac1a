use std::process::ExitCode;

use clap::Parser;

use atk_cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.log_json {
        atk_observability::init_json();
    } else {
        atk_observability::init();
    }

    let mut stdout = std::io::stdout().lock();

    match atk_cli::run(cli, &mut stdout) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
