use std::path::PathBuf;

use anyhow::Context;
use oc_universe::model::timeline::group_by_era;
use oc_universe::{Universe, UniverseConfig};

/// Opens a universe database, prints what `load` finds and lists the stored
/// assets.
///
/// ```text
/// cargo run --example inspect_draft -- universe.db [http://localhost:8000/js/data.json]
/// ```
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let db: PathBuf = args.next().unwrap_or_else(|| "universe.db".into()).into();

    // Build the config. Without a database path everything stays in memory,
    // so this demo always points at a file.
    let mut builder = UniverseConfig::builder().database_path(&db);
    if let Some(url) = args.next() {
        builder = builder.default_document_url(url.parse().context("invalid default document url")?);
    }
    let config = builder.build().context("invalid configuration")?;

    let universe = Universe::open(config)
        .await
        .with_context(|| format!("cannot open {}", db.display()))?;

    // Load never fails; it tells us which tier the document came from.
    let loaded = universe.load().await;
    let doc = &loaded.document;
    println!("source:      {}", loaded.source);
    println!("title:       {}", doc.world_view.title);
    println!("modules:     {}", doc.world_view.modules.len());
    println!("characters:  {}", doc.characters.len());
    println!("novels:      {}", doc.novels.len());

    for group in group_by_era(&doc.storyline) {
        println!("era {}:", group.era);
        for event in group.events {
            println!("  {:<14} {}", event.date, event.title);
        }
    }

    // Resolve every asset the document references. Missing ones come back
    // unchanged.
    for (reference, url) in universe.resolver().resolve_document(doc).await {
        println!("asset {reference} -> {url}");
    }

    let keys = universe.storage().list_asset_keys().await?;
    println!("{} stored assets", keys.len());

    Ok(())
}
