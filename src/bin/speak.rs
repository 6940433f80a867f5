//! `speak "<text>" "<language_code>"`
//!
//! Synthesizes the text and plays it, blocking until playback ends.

use std::process::ExitCode;

use tracing::info;

use voice_speak::cli::{self, PlaybackArgs};
use voice_speak::config::{self, paths};
use voice_speak::logger;

#[tokio::main]
async fn main() -> ExitCode {
    let args: PlaybackArgs = match cli::parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => return e.report(),
    };

    logger::init(&paths::get_log_dir());
    let config = config::read_speak_config();
    info!(?config, language = %args.language, "speak starting");

    match cli::speak_aloud(&args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            info!(error = %e, "speak failed");
            e.report()
        }
    }
}
