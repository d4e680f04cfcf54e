mod api_key;
mod app;
mod audio;
mod capture;
mod cli;
mod constants;
mod error;
mod gateway;
mod gemini;
mod image;
mod logging;
mod model;
mod output;
mod planner;
mod provider;
mod response;
mod state;
mod store;
mod theme;

use anyhow::Result;

use crate::app::run_app;
use crate::cli::Config;
use crate::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::from_args();

    if let Err(e) = run_app(config).await {
        // the outermost context is the user notice, the root cause says why
        let notice = e.to_string();
        let mut last_cause = notice.clone();
        let mut source = e.source();
        while let Some(cause) = source {
            last_cause = cause.to_string();
            source = cause.source();
        }

        if last_cause == notice {
            eprintln!("Error: {notice}");
        } else {
            eprintln!("Error: {notice}\n  Caused by: {last_cause}");
        }
        std::process::exit(1);
    }

    Ok(())
}
