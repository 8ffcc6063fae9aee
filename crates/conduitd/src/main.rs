use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match conduitd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            if writeln!(stderr, "conduitd: {error}").is_err() {
                return ExitCode::from(2);
            }
            ExitCode::FAILURE
        }
    }
}
