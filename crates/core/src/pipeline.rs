use crate::migrators::{
    migrate_chunks, migrate_documents, migrate_entities, migrate_relationships, SharedState,
    CHUNKS_FILE, ENTITIES_FILE, RELATIONSHIPS_FILE,
};
use crate::traits::VectorStore;
use crate::upload::upload;
use crate::verify::{verify, CollectionSample};
use crate::{
    Collection, CollectionReport, MigrateError, MigrationBatch, MigrationConfig, MigrationReport,
    Result,
};
use chrono::Utc;
use tracing::info;

/// Runs the full migration against one vector store.
///
/// Collections are dropped and rebuilt, so a run must not overlap with another
/// run or with live readers of the same collections.
pub struct Migrator<S>
where
    S: VectorStore,
{
    store: S,
    config: MigrationConfig,
}

impl<S> Migrator<S>
where
    S: VectorStore + Send + Sync,
{
    pub fn new(store: S, config: MigrationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Every export is parsed and every point built before the first collection is dropped.
    pub async fn run(&self) -> Result<MigrationReport> {
        let built = build_all(&self.config)?;
        self.prepare_collections().await?;

        let mut collections = Vec::with_capacity(built.len());
        let mut matrix_fallback = false;

        for (collection, batch) in built {
            info!(
                collection = collection.name(),
                points = batch.points.len(),
                "migrating collection"
            );
            matrix_fallback |= batch.matrix_fallback;

            let batches = upload(
                &self.store,
                &batch.points,
                collection.name(),
                self.config.batch_size,
            )
            .await?;

            collections.push(CollectionReport {
                collection,
                migrated: batch.points.len(),
                skipped: batch.skipped,
                batches,
            });
        }

        info!("migration completed");
        Ok(MigrationReport {
            collections,
            matrix_fallback,
            finished_at: Utc::now(),
        })
    }

    pub async fn prepare_collections(&self) -> Result<()> {
        for collection in Collection::ALL {
            let name = collection.name();
            self.store.delete_collection(name).await?;
            self.store
                .create_collection(name, self.config.vector_size, self.config.distance)
                .await?;
            info!(
                collection = name,
                vector_size = self.config.vector_size,
                "collection recreated"
            );
        }
        Ok(())
    }

    pub async fn verify(&self) -> Vec<CollectionSample> {
        verify(&self.store, self.config.verify_sample).await
    }
}

/// Builds every point without touching a store.
pub fn plan(config: &MigrationConfig) -> Result<MigrationReport> {
    config.validate()?;
    let built = build_all(config)?;

    let matrix_fallback = built.iter().any(|(_, batch)| batch.matrix_fallback);
    let collections = built
        .into_iter()
        .map(|(collection, batch)| CollectionReport {
            collection,
            migrated: batch.points.len(),
            skipped: batch.skipped,
            batches: 0,
        })
        .collect();

    Ok(MigrationReport {
        collections,
        matrix_fallback,
        finished_at: Utc::now(),
    })
}

fn build_all(config: &MigrationConfig) -> Result<Vec<(Collection, MigrationBatch)>> {
    ensure_primary_exports(config)?;
    let state = SharedState::load(config)?;
    Collection::ALL
        .into_iter()
        .map(|collection| Ok((collection, build_collection(collection, config, &state)?)))
        .collect()
}

fn build_collection(
    collection: Collection,
    config: &MigrationConfig,
    state: &SharedState,
) -> Result<MigrationBatch> {
    let index_dir = config.index_dir.as_path();
    match collection {
        Collection::Entities => migrate_entities(index_dir, state, config.vector_size),
        Collection::Relationships => migrate_relationships(index_dir, state, config.vector_size),
        Collection::Chunks => migrate_chunks(index_dir, state, config.vector_size),
        Collection::Documents => Ok(migrate_documents(state, config.vector_size)),
    }
}

/// Checked before any collection is dropped.
fn ensure_primary_exports(config: &MigrationConfig) -> Result<()> {
    for file in [ENTITIES_FILE, RELATIONSHIPS_FILE, CHUNKS_FILE] {
        let path = config.index_dir.join(file);
        if !path.is_file() {
            return Err(MigrateError::MissingExport(path.display().to_string()));
        }
    }
    Ok(())
}
