use std::process::ExitCode;

fn main() -> ExitCode {
    chat_scraper_lib::run()
}
