//! Idempotent catalog import.
//!
//! Reads the static ingredient/tag datasets and inserts rows, skipping
//! anything already present. A one-time batch job invoked from the CLI,
//! not part of the request path.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::info;

use crate::db::Store;

#[derive(Debug, Deserialize)]
struct IngredientSeed {
    name: String,
    measurement_unit: String,
}

#[derive(Debug, Deserialize)]
struct TagSeed {
    name: String,
    color: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct UnitSeed {
    name: String,
    plural_first: Option<String>,
    plural_second: Option<String>,
}

fn hex_color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[A-Fa-f0-9]{6}$").expect("valid hex color regex"))
}

pub struct CatalogLoader {
    store: Store,
}

impl CatalogLoader {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Units first (distinct measurement units of the dataset), then the
    /// ingredients referencing them. Conflicts are skipped, so re-running
    /// the import is harmless.
    pub async fn load_ingredients(&self, path: &Path) -> Result<(usize, usize)> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let seeds: Vec<IngredientSeed> =
            serde_json::from_str(&content).context("Malformed ingredients file")?;

        let mut new_units = 0;
        for seed in &seeds {
            if self.store.insert_unit(&seed.measurement_unit).await? {
                new_units += 1;
            }
        }

        let mut new_ingredients = 0;
        for seed in &seeds {
            if self
                .store
                .insert_ingredient(&seed.name, &seed.measurement_unit)
                .await?
            {
                new_ingredients += 1;
            }
        }

        info!(
            "Loaded {} units, {} ingredients from {}",
            new_units,
            new_ingredients,
            path.display()
        );
        Ok((new_units, new_ingredients))
    }

    pub async fn load_tags(&self, path: &Path) -> Result<usize> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let seeds: Vec<TagSeed> = serde_json::from_str(&content).context("Malformed tags file")?;

        let mut new_tags = 0;
        for seed in &seeds {
            if !hex_color_regex().is_match(&seed.color) {
                anyhow::bail!(
                    "Invalid hex color {:?} for tag {:?}, expected e.g. #000000",
                    seed.color,
                    seed.slug
                );
            }
            if self
                .store
                .insert_tag(&seed.name, &seed.color, &seed.slug)
                .await?
            {
                new_tags += 1;
            }
        }

        info!("Loaded {} tags from {}", new_tags, path.display());
        Ok(new_tags)
    }

    /// Attach plural forms to units already imported from the ingredients
    /// dataset. Unknown unit names are skipped.
    pub async fn load_unit_forms(&self, path: &Path) -> Result<usize> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let seeds: Vec<UnitSeed> = serde_json::from_str(&content).context("Malformed units file")?;

        let mut updated = 0;
        for seed in &seeds {
            if self
                .store
                .set_unit_plural_forms(
                    &seed.name,
                    seed.plural_first.as_deref(),
                    seed.plural_second.as_deref(),
                )
                .await?
            {
                updated += 1;
            }
        }

        info!("Updated plural forms for {} units", updated);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_validated() {
        assert!(hex_color_regex().is_match("#000000"));
        assert!(hex_color_regex().is_match("#AaBbCc"));
        assert!(!hex_color_regex().is_match("#000"));
        assert!(!hex_color_regex().is_match("000000"));
        assert!(!hex_color_regex().is_match("#GGGGGG"));
    }
}
