//! Table formatting for search results and index stats.

use comfy_table::{
    Attribute, Cell, CellAlignment, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::search::{ResolvedHit, SearchHit};
use crate::vector::IndexStats;

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

/// Ranked hits without product details.
pub fn create_hits_table(hits: &[SearchHit]) -> String {
    let mut table = styled_table(&["Rank", "Product", "Similarity"]);
    for (rank, hit) in hits.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(hit.product_id),
            Cell::new(hit.similarity).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

/// Ranked hits joined with their catalog entries.
pub fn create_resolved_table(hits: &[ResolvedHit]) -> String {
    let mut table = styled_table(&["Rank", "Product", "Name", "Category", "Similarity"]);
    for (rank, hit) in hits.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(hit.product.id),
            Cell::new(&hit.product.name),
            Cell::new(hit.product.category.as_deref().unwrap_or("-")),
            Cell::new(hit.similarity).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

/// Two-column summary of the in-memory index.
pub fn create_stats_table(stats: &IndexStats) -> String {
    let mut table = styled_table(&["Metric", "Value"]);
    table.add_row(vec!["Status".to_string(), stats.status.to_string()]);
    if let Some(count) = stats.count {
        table.add_row(vec!["Products".to_string(), count.to_string()]);
    }
    if let Some(dimension) = stats.dimension {
        table.add_row(vec!["Dimension".to_string(), dimension.to_string()]);
    }
    if let Some(index_type) = stats.index_type {
        table.add_row(vec!["Index type".to_string(), index_type.to_string()]);
    }
    table.to_string()
}
