use std::path::Path;

use anyhow::Result;

use stagehand_core::AppConfig;

pub async fn run(config: &AppConfig, content: Option<&Path>) -> Result<()> {
    let source = super::content_source(config, content)?;
    let items = source.list_items().await?;

    if items.is_empty() {
        println!("No items.");
        return Ok(());
    }

    println!("Items ({}):\n", items.len());

    for (index, item) in items.iter().enumerate() {
        let subtitle = item
            .subtitle
            .as_deref()
            .map(|s| format!(" - {}", s))
            .unwrap_or_default();

        println!("  [{}] #{} {}{}", index, item.number, item.title, subtitle);
        println!("    id: {}", item.id);
        if let Some(published) = item.published_at {
            println!("    Published: {}", published.format("%Y-%m-%d"));
        }
    }

    Ok(())
}
