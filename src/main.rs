use bookmark_tagger::cli::{Cli, run_cli};
use bookmark_tagger::logging;
use bookmark_tagger::output::OutputFormatter;
use bookmark_tagger::sync::{
    FixedAnswer, NullSyncTarget, Prompt, SheetsConfig, SheetsTarget, SyncTarget, TerminalPrompt,
};
use clap::Parser;

fn main() {
    // credentials may live in a local .env
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let sync = sync_target(cli.no_upload);
    let prompt: Box<dyn Prompt> = if cli.yes {
        Box::new(FixedAnswer(true))
    } else {
        Box::new(TerminalPrompt)
    };

    if let Err(e) = run_cli(cli.command(), &cli.options(), sync.as_ref(), prompt.as_ref()) {
        OutputFormatter::error(&e);
        std::process::exit(1);
    }
}

/// Google Sheets when configured through the environment, otherwise a no-op.
fn sync_target(no_upload: bool) -> Box<dyn SyncTarget> {
    if no_upload {
        return Box::new(NullSyncTarget);
    }
    let Some(config) = SheetsConfig::from_env() else {
        tracing::info!("Google Drive credentials not available; upload disabled");
        return Box::new(NullSyncTarget);
    };
    match SheetsTarget::connect(config) {
        Ok(target) => Box::new(target),
        Err(e) => {
            OutputFormatter::warning(&format!("{}; upload disabled", e));
            Box::new(NullSyncTarget)
        }
    }
}
