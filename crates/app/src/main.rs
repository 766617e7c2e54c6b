use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use kg_migrate_core::stores::DEFAULT_TIMEOUT;
use kg_migrate_core::{
    plan, CollectionSample, MigrationConfig, MigrationReport, Migrator, QdrantStore,
    DEFAULT_BATCH_SIZE, DEFAULT_GRAPH_FILE, DEFAULT_VECTOR_SIZE, DEFAULT_VERIFY_SAMPLE,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "kg-migrate", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Qdrant API key, sent as the `api-key` header
    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true)]
    qdrant_api_key: Option<String>,

    /// HTTP timeout for each Qdrant request, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

#[derive(Args)]
struct ExportArgs {
    /// Directory holding the graph, kv_store_* and vdb_* exports.
    #[arg(long, env = "KG_INDEX_DIR")]
    index_dir: PathBuf,

    /// Graph export file name inside the index directory.
    #[arg(long, default_value = DEFAULT_GRAPH_FILE)]
    graph_file: String,

    /// Vector dimensionality of every collection.
    #[arg(long, default_value_t = DEFAULT_VECTOR_SIZE)]
    vector_size: usize,

    /// Points per upsert request.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

impl ExportArgs {
    fn into_config(self) -> MigrationConfig {
        MigrationConfig {
            graph_file: self.graph_file,
            vector_size: self.vector_size,
            batch_size: self.batch_size,
            ..MigrationConfig::new(self.index_dir)
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Drop, recreate and refill every collection from an export directory.
    Migrate {
        #[command(flatten)]
        export: ExportArgs,
        /// Points sampled per collection after the run.
        #[arg(long, default_value_t = DEFAULT_VERIFY_SAMPLE)]
        verify_sample: usize,
        /// Skip the read-back sample after migrating.
        #[arg(long, default_value_t = false)]
        skip_verify: bool,
    },
    /// Build every point and report counts without contacting Qdrant.
    Plan {
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Print point counts and a sample from each collection.
    Verify {
        /// Points sampled per collection.
        #[arg(long, default_value_t = DEFAULT_VERIFY_SAMPLE)]
        sample: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "kg-migrate boot"
    );

    let connect = || {
        QdrantStore::new(
            &cli.qdrant_url,
            cli.qdrant_api_key.as_deref(),
            Duration::from_secs(cli.timeout_secs),
        )
    };

    match cli.command {
        Command::Migrate {
            export,
            verify_sample,
            skip_verify,
        } => {
            let config = MigrationConfig {
                verify_sample,
                ..export.into_config()
            };
            info!(
                index_dir = %config.index_dir.display(),
                qdrant = %cli.qdrant_url,
                "starting migration"
            );

            let migrator = Migrator::new(connect()?, config)?;
            let report = migrator.run().await?;
            print_report(&report);

            if !skip_verify {
                print_samples(&migrator.verify().await);
            }
        }
        Command::Plan { export } => {
            let report = plan(&export.into_config())?;
            print_report(&report);
        }
        Command::Verify { sample } => {
            let config = MigrationConfig {
                verify_sample: sample,
                ..MigrationConfig::default()
            };
            let migrator = Migrator::new(connect()?, config)?;
            print_samples(&migrator.verify().await);
        }
    }

    Ok(())
}

fn print_report(report: &MigrationReport) {
    for collection in &report.collections {
        println!(
            "{}: migrated={} skipped={} batches={}",
            collection.collection, collection.migrated, collection.skipped, collection.batches
        );
        if collection.skipped > 0 {
            warn!(
                collection = %collection.collection,
                skipped = collection.skipped,
                "records were skipped"
            );
        }
    }
    if report.matrix_fallback {
        println!("chunks: embedding matrix unusable, zero vectors were written");
    }
    println!("finished at {}", report.finished_at.to_rfc3339());
}

fn print_samples(samples: &[CollectionSample]) {
    for sample in samples {
        print!("{}", sample.render());
    }
}
