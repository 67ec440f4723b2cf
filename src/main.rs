use clap::Parser;
use shinneashi::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    shinneashi::logger::init_tracing(cli.json_logs);
    run(cli)
}
