#![forbid(unsafe_code)]

fn main() -> std::process::ExitCode {
    let code = driftcheck::run();
    std::process::ExitCode::from(code)
}
