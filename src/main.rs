use std::{process::ExitCode, time::Duration};

use clap::Parser;
use mongodb_smoke::{
    init_logging,
    options::{MatchBy, SmokeOptions, DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_URI},
    smoke,
};

/// Runs an insert / find / update / delete sequence against a MongoDB deployment and prints
/// each result. Exits with the number of steps that did not succeed.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Connection string. `timeoutMS` bounds connecting and every step.
    #[arg(long, env = "MONGODB_URI", default_value = DEFAULT_URI)]
    uri: String,

    /// Overrides `timeoutMS` from the URI. 0 disables the ceiling.
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long, default_value = DEFAULT_DATABASE)]
    database: String,

    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// How the update and delete steps find the inserted car.
    #[arg(long, value_enum, default_value_t = MatchBy::Content)]
    match_by: MatchBy,

    /// Read the car back after the update.
    #[arg(long)]
    verify: bool,

    /// Drop the collection before inserting.
    #[arg(long)]
    drop_first: bool,

    /// Log level for this tool's diagnostics on stderr. `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn options(self) -> SmokeOptions {
        SmokeOptions::builder()
            .uri(self.uri)
            .timeout(self.timeout_ms.map(Duration::from_millis))
            .database(self.database)
            .collection(self.collection)
            .match_by(self.match_by)
            .verify_update(self.verify)
            .drop_first(self.drop_first)
            .build()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    let options = args.options();

    println!("Starting MongoDB client");
    let report = smoke::run(&options, |step| println!("{step}")).await;
    println!("{report}");

    ExitCode::from(report.exit_code())
}
