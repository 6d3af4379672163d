//! Startup path selection: reuse persisted dumps when both exist, otherwise
//! work backwards from the decompressed XML, the compressed download, or the
//! canonical dump mirror, and persist the freshly built index for the next
//! start.

use crate::artifacts::{init_data_dir, Shard};
use anyhow::{bail, Context, Result};
use engine::{dump, DocumentStream, IndexBuilder, SearchEngine};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::task::spawn_blocking;

/// Produces a ready-to-query engine for `shard_index`, creating whatever
/// artifacts are missing along the way. Any failure here is fatal to
/// startup.
pub async fn bootstrap(data_dir: &Path, shard_index: usize, clean: bool) -> Result<Arc<SearchEngine>> {
    let started = Instant::now();
    init_data_dir(data_dir, clean).context("initializing data directory")?;
    let shard = Shard::new(data_dir, shard_index);

    let engine = if shard.index_dump.exists() && shard.data_dump.exists() {
        load_dumps(&shard).await?
    } else {
        if !shard.xml_path.exists() {
            if !shard.gz_path.exists() {
                download(&shard.url, &shard.gz_path).await?;
            }
            let gz_path = shard.gz_path.clone();
            spawn_blocking(move || dump::gunzip(&gz_path))
                .await?
                .context("decompressing abstract dump")?;
        }
        parse_and_save(&shard).await?
    };

    tracing::info!(
        shard = shard_index,
        seconds = started.elapsed().as_secs_f64(),
        "engine ready"
    );
    Ok(engine)
}

/// Loads the two dump files in parallel; either failure fails startup.
async fn load_dumps(shard: &Shard) -> Result<Arc<SearchEngine>> {
    let index_path = shard.index_dump.clone();
    let data_path = shard.data_dump.clone();
    let (index, store) = tokio::try_join!(
        spawn_blocking(move || dump::load_index(&index_path)),
        spawn_blocking(move || dump::load_data(&data_path)),
    )?;
    Ok(Arc::new(SearchEngine::new(
        index.context("loading index dump")?,
        store.context("loading data dump")?,
    )))
}

/// Streams the shard XML through the index builder, then persists both dumps
/// in parallel.
async fn parse_and_save(shard: &Shard) -> Result<Arc<SearchEngine>> {
    let xml_path = shard.xml_path.clone();
    let engine = spawn_blocking(move || -> engine::Result<SearchEngine> {
        let records = DocumentStream::open(&xml_path)?;
        let (index, store) = IndexBuilder::new().build(records)?;
        Ok(SearchEngine::new(index, store))
    })
    .await?
    .context("building index from abstract dump")?;

    let engine = Arc::new(engine);
    let index_path = shard.index_dump.clone();
    let data_path = shard.data_dump.clone();
    let index_engine = engine.clone();
    let data_engine = engine.clone();
    let (saved_index, saved_data) = tokio::try_join!(
        spawn_blocking(move || dump::save_index(index_engine.index(), &index_path)),
        spawn_blocking(move || dump::save_data(data_engine.store(), &data_path)),
    )?;
    saved_index.context("saving index dump")?;
    saved_data.context("saving data dump")?;
    Ok(engine)
}

/// Single GET of the compressed shard, streamed chunk-by-chunk to `target`.
/// Non-success statuses are fatal.
async fn download(url: &str, target: &Path) -> Result<()> {
    let started = Instant::now();
    tracing::info!(url, "downloading abstract dump");

    let mut response = reqwest::get(url).await.context("requesting abstract dump")?;
    if !response.status().is_success() {
        bail!("download of {url} failed with status {}", response.status());
    }

    let mut file = tokio::fs::File::create(target)
        .await
        .with_context(|| format!("creating {}", target.display()))?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    tracing::info!(
        url,
        seconds = started.elapsed().as_secs_f64(),
        "downloaded abstract dump"
    );
    Ok(())
}
