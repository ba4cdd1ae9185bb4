use clap::Parser;
use stratbench::cli::{Cli, init_logging, run};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
