use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wikibase::database::Database;
use wikibase::error::Result;
use wikibase::import::{EntityDocument, import_entities};
use wikibase::settings::Settings;

fn run(settings: &Settings) -> Result<()> {
    let database = Database::from_settings(settings)?;
    info!(database = %settings.database, "store ready");
    // every argument is a JSON file with one or more entity documents
    for path in std::env::args().skip(1) {
        let json = std::fs::read_to_string(&path)
            .map_err(|e| wikibase::error::WikibaseError::Wire(format!("{}: {}", path, e)))?;
        let documents = EntityDocument::parse_all(&json)?;
        let items = import_entities(&database, &documents)?;
        for item in &items {
            let label = database.get_label(&item.entity(), "en")?.unwrap_or_default();
            println!("{}\t{}", item, label);
        }
        info!(file = %path, items = items.len(), "import committed");
    }
    Ok(())
}

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| settings.log_filter.clone().into()),
        )
        .init();
    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "wikibase failed");
            ExitCode::FAILURE
        }
    }
}
