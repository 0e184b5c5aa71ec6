use std::path::PathBuf;

use crate::config::Config;
use crate::db::Store;
use crate::services::CatalogLoader;

pub async fn cmd_load(
    config: &Config,
    ingredients: Option<PathBuf>,
    tags: Option<PathBuf>,
    units: Option<PathBuf>,
) -> anyhow::Result<()> {
    if ingredients.is_none() && tags.is_none() && units.is_none() {
        println!("Usage: ladle load [--ingredients <path>] [--tags <path>] [--units <path>]");
        println!("Example: ladle load --ingredients data/ingredients.json --tags data/tags.json");
        return Ok(());
    }

    let store = Store::new(&config.general.database_path).await?;
    let loader = CatalogLoader::new(store);

    if let Some(path) = ingredients {
        let (new_units, new_ingredients) = loader.load_ingredients(&path).await?;
        println!(
            "✓ Loaded {} units, {} ingredients from {}",
            new_units,
            new_ingredients,
            path.display()
        );
    }

    if let Some(path) = units {
        let updated = loader.load_unit_forms(&path).await?;
        println!("✓ Updated plural forms for {} units", updated);
    }

    if let Some(path) = tags {
        let new_tags = loader.load_tags(&path).await?;
        println!("✓ Loaded {} tags from {}", new_tags, path.display());
    }

    println!();
    println!("Re-running the import is safe; existing rows are skipped.");

    Ok(())
}
