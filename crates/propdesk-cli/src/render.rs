//! Terminal rendering of grid views

use comfy_table::{ContentArrangement, Table, presets};
use propdesk_grid::{Cell, GridView};

pub fn grid_table(view: &GridView) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(view.headers.iter().map(String::as_str));

    for row in &view.page.items {
        table.add_row(row.cells.iter().map(Cell::text));
    }
    table
}

/// Footer below the table, e.g. "21-40 of 47 | page 2/3 | sorted by rent DESC"
pub fn status_line(view: &GridView) -> String {
    let mut parts = vec![
        view.page.range_label(),
        format!("page {}/{}", view.page.current_page, view.page.total_pages),
    ];
    if let Some(sort) = &view.sort {
        parts.push(format!("sorted by {} {}", sort.key, sort.direction.label()));
    }
    if let Some(density) = view.density {
        parts.push(format!("density {}", density));
    }
    if view.selection.count > 0 {
        parts.push(format!("{} selected", view.selection.count));
    }
    parts.join(" | ")
}
