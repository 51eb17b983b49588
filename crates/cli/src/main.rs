use std::process::ExitCode;

fn main() -> ExitCode {
    ledgerline_cli::run()
}
