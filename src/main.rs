use std::process::ExitCode;

fn main() -> ExitCode {
    docgraph::cli::run()
}
