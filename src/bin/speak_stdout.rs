//! `speak-stdout "<text>" [language_code] [voice_name]`
//!
//! Writes raw MP3 bytes to stdout and nothing else; diagnostics go to stderr.

use std::process::ExitCode;

use tracing::info;

use voice_speak::cli::{self, StreamArgs};
use voice_speak::config::{self, paths};
use voice_speak::logger;

#[tokio::main]
async fn main() -> ExitCode {
    let args: StreamArgs = match cli::parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => return e.report(),
    };

    logger::init(&paths::get_log_dir());
    let config = config::read_speak_config();
    info!(?config, language = %args.language, "speak-stdout starting");

    match cli::stream_speech(&args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            info!(error = %e, "speak-stdout failed");
            e.report()
        }
    }
}
