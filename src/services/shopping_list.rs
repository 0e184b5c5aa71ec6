//! Shopping-list aggregation and rendering.
//!
//! Read-only: unions the recipes in a user's cart, sums ingredient amounts
//! per (ingredient, unit) pair, and renders the result as a downloadable
//! document. The aggregation itself lives in the cart repository; this
//! service applies the empty-cart policy and the output format.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::{Config, EmptyCartPolicy, ListFormat};
use crate::db::{ShoppingListRow, Store};
use crate::services::pluralize::{self, UnitForms};

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Shopping cart is empty")]
    Empty,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for CartError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// A rendered shopping list ready to be sent as an attachment.
pub struct RenderedList {
    pub body: String,
    pub content_type: &'static str,
    pub filename: &'static str,
}

pub struct ShoppingListService {
    store: Store,
    config: Arc<RwLock<Config>>,
}

impl ShoppingListService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }

    pub async fn aggregate(&self, user_id: i32) -> Result<Vec<ShoppingListRow>, CartError> {
        Ok(self.store.shopping_list(user_id).await?)
    }

    /// Aggregate and render according to the configured policy. An empty
    /// cart either rejects or produces an empty document.
    pub async fn render(&self, user_id: i32) -> Result<RenderedList, CartError> {
        let rows = self.aggregate(user_id).await?;
        let config = self.config.read().await;

        if rows.is_empty() && config.cart.on_empty == EmptyCartPolicy::Reject {
            return Err(CartError::Empty);
        }

        let rendered = match config.cart.format {
            ListFormat::Plain => RenderedList {
                body: render_plain(&rows),
                content_type: "text/plain; charset=utf-8",
                filename: "shopping-list.txt",
            },
            ListFormat::Phrased => RenderedList {
                body: render_html(&rows, &config.pluralization),
                content_type: "text/html; charset=utf-8",
                filename: "shopping-list.html",
            },
        };

        Ok(rendered)
    }
}

/// `name(unit) - amount`, one line per aggregated ingredient.
fn render_plain(rows: &[ShoppingListRow]) -> String {
    use std::fmt::Write;

    rows.iter().fold(String::new(), |mut out, row| {
        let _ = writeln!(out, "{}({}) - {}", row.name, row.unit, row.total);
        out
    })
}

/// The phrased variant: an HTML document whose items pluralize the unit.
fn render_html(rows: &[ShoppingListRow], policy: &crate::config::PluralizationConfig) -> String {
    use std::fmt::Write;

    let mut items = String::new();
    for row in rows {
        let forms = UnitForms {
            singular: &row.unit,
            first: row.plural_first.as_deref(),
            second: row.plural_second.as_deref(),
        };
        let phrased = pluralize::phrase(policy, &forms, row.total);
        let _ = writeln!(
            items,
            "    <li>{} — {}</li>",
            html_escape::encode_text(&row.name),
            html_escape::encode_text(&phrased),
        );
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Shopping list</title></head>\n\
         <body>\n  <h1>Shopping list</h1>\n  <ul>\n{items}  </ul>\n</body>\n</html>\n"
    )
}
