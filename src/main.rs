use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = eia_prices::app::run() {
        eprintln!("error: {err}");
        return ExitCode::from(err.exit_code());
    }
    ExitCode::SUCCESS
}
