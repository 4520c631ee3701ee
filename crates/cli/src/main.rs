use std::process::ExitCode;

fn main() -> ExitCode {
    fleetline_cli::run()
}
