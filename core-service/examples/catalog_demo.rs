//! Uploads a few files into a scratch directory, lists the catalog by
//! category and cleans up again.
//!
//! ```text
//! cargo run -p core-service --example catalog_demo -- [root]
//! ```

use anyhow::Context;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{format_size, Category, CoreEvent, SortOrder, UploadSource};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))
        .context("failed to initialise logging")?;

    let root = std::env::args()
        .nth(1)
        .map(Into::into)
        .unwrap_or_else(|| std::env::temp_dir().join("media-drive-demo"));

    let service = core_service::bootstrap_local(&root)
        .await
        .with_context(|| format!("failed to open {}", root.display()))?;
    println!("Catalog at {} holds {} objects", root.display(), service.snapshot().len());

    let mut events = service
        .subscribe()
        .filter(|event| matches!(event, CoreEvent::Transfer(_)));
    let watcher = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("  [{:?}] {}", event.severity(), event.description());
        }
    });

    let files = [
        ("sunset.jpg", vec![0u8; 180_000]),
        ("interview.mp4", vec![0u8; 2_400_000]),
        ("theme.mp3", vec![0u8; 64_000]),
        ("itinerary.pdf", vec![0u8; 900]),
    ];

    let mut uploaded = Vec::new();
    for (name, data) in files {
        let progress = Arc::new(move |percent: u8| {
            if percent == 100 {
                println!("  {name}: done");
            }
        });
        let key = service
            .upload(UploadSource::from_bytes(name, data), "demo", progress)
            .await
            .with_context(|| format!("upload of {name} failed"))?;
        uploaded.push(key);
    }

    let view = service.list_categorized_by("", SortOrder::LARGEST_FIRST);
    for category in [
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::Document,
    ] {
        let section = view.section(category);
        if section.is_empty() {
            continue;
        }
        println!("{} {} ({})", category.icon(), category.label(), section.len());
        for record in section {
            println!(
                "    {:<40} {:>10}",
                record.display_name(),
                format_size(record.size_bytes())
            );
        }
    }

    for key in &uploaded {
        service.remove(key).await?;
    }
    println!("Removed {} demo objects", uploaded.len());

    service.shutdown().await;
    watcher.abort();
    Ok(())
}
