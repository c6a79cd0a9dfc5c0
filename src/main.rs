fn main() -> std::process::ExitCode {
    deeplink_runner_lib::run()
}
