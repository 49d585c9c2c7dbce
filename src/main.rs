//! upload-puzzles: load Daily Doublet puzzles into Firestore.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use doublet_loader::{
    CliArgs, FirestoreOptions, FirestoreStore, ImportConfig, ImportError, ServiceAccountKey,
    import_text, init_tracing, read_puzzle_file,
};

fn run(config: &ImportConfig) -> anyhow::Result<()> {
    config.validate()?;

    // Both inputs are checked before the store is contacted.
    let key = ServiceAccountKey::from_file(&config.credentials_path)?;
    let text = read_puzzle_file(&config.input_path)?;

    let options = FirestoreOptions {
        project_id: config.project_id.clone(),
        emulator_host: config.emulator_host.clone(),
        timeout: config.commit_timeout,
    };
    info!(
        project = %options.project_id.as_deref().unwrap_or(&key.project_id),
        emulator = options.emulator_host.is_some(),
        "Connecting to Firestore"
    );
    let store = FirestoreStore::new(key, &options).map_err(ImportError::Store)?;

    let report = import_text(&store, config, &text)
        .with_context(|| format!("import of {} failed", config.input_path.display()))?;

    println!();
    println!("{}", "=".repeat(50));
    println!("Upload complete! {} puzzles uploaded.", report.committed);
    println!("{}", "=".repeat(50));
    println!();
    println!("Next steps:");
    println!("1. Set up Firestore security rules in Firebase Console");
    println!("2. Run: flutter pub get");
    println!("3. Run: flutter run");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let config = CliArgs::parse().into_config();
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<ImportError>().is_some_and(ImportError::is_timeout) {
                error!("store did not respond within the commit timeout");
            }
            eprintln!("Upload failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
