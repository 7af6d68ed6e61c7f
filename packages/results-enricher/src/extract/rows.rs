//! Row-level extraction: which class a result row belongs to, and the
//! whole-page mode that collects every row of one club.

use url::Url;

use super::class_facts::class_facts_in;
use super::fields::{date_in, event_info_in, extract_position_facts};
use super::patterns::{class_name_prefix, RE_TIME, HEADINGS};
use crate::document::{HtmlDocument, QueryableDocument};
use crate::types::row::{time_to_seconds, EnrichedResult};

/// Class name for a result row (`<tr>`) whose class is not already known.
///
/// Looks, in order, at headings before the row's table, the table caption, a
/// "Klass" column, bold text near the row, and finally a `class` or
/// `className` query parameter of `page_url`. Returns an empty string when
/// nothing matches.
pub fn extract_class_name_for_row<'a, D: QueryableDocument>(
    document: &'a D,
    row: D::Node<'a>,
    page_url: Option<&str>,
) -> String {
    let table = document.closest(row, "table");

    if let Some(table) = table {
        if let Some(name) = preceding_heading(document, table) {
            return name;
        }

        if let Some(name) = document
            .select_in(table, "caption")
            .into_iter()
            .find_map(|c| class_name_prefix(&document.text(c)))
        {
            return name;
        }

        if let Some(name) = class_column(document, table, row) {
            return name;
        }

        if let Some(name) = nearby_bold(document, table, row) {
            return name;
        }
    }

    page_url.and_then(class_from_url).unwrap_or_default()
}

/// Nearest heading before `table` with a recognized class name, walking out
/// through the table's ancestors.
fn preceding_heading<'a, D: QueryableDocument>(document: &'a D, table: D::Node<'a>) -> Option<String> {
    let mut current = Some(table);
    while let Some(node) = current {
        for sibling in document.previous_siblings(node) {
            let headings = if is_heading(document, sibling) {
                vec![sibling]
            } else {
                document.select_in(sibling, HEADINGS)
            };
            // Last heading inside a sibling is the one closest to the table.
            if let Some(name) = headings
                .into_iter()
                .rev()
                .find_map(|h| class_name_prefix(&document.text(h)))
            {
                return Some(name);
            }
        }
        current = document.parent(node);
    }
    None
}

fn is_heading<'a, D: QueryableDocument>(document: &'a D, node: D::Node<'a>) -> bool {
    matches!(
        document.tag_name(node).as_str(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

fn class_column<'a, D: QueryableDocument>(
    document: &'a D,
    table: D::Node<'a>,
    row: D::Node<'a>,
) -> Option<String> {
    let index = document
        .select_in(table, "th")
        .into_iter()
        .position(|th| document.text(th).eq_ignore_ascii_case("klass"))?;
    document
        .select_in(row, "td")
        .into_iter()
        .nth(index)
        .map(|td| document.text(td))
        .filter(|text| !text.is_empty())
}

fn nearby_bold<'a, D: QueryableDocument>(
    document: &'a D,
    table: D::Node<'a>,
    row: D::Node<'a>,
) -> Option<String> {
    let in_row = document.select_in(row, "b, strong");
    let before_table = document
        .previous_siblings(table)
        .into_iter()
        .flat_map(|sibling| {
            let tag = document.tag_name(sibling);
            if tag == "b" || tag == "strong" {
                vec![sibling]
            } else {
                let mut inner = document.select_in(sibling, "b, strong");
                inner.reverse();
                inner
            }
        });

    in_row
        .into_iter()
        .chain(before_table)
        .find_map(|b| class_name_prefix(&document.text(b)))
}

fn class_from_url(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let value = url
        .query_pairs()
        .find(|(key, _)| key == "class" || key == "className")
        .map(|(_, value)| value.trim().to_string())?;
    (!value.is_empty()).then_some(value)
}

/// Every result row of `club_name` on a results page, across all tables.
///
/// Legacy whole-page mode: used when no per-row spreadsheet input exists.
/// Event id is not known from the markup and is left empty.
pub fn parse_rows_for_club(html: &str, club_name: &str) -> Vec<EnrichedResult> {
    let club_name = club_name.trim();
    if club_name.is_empty() {
        return Vec::new();
    }

    let document = HtmlDocument::parse(html);
    let info = event_info_in(&document);
    let date = date_in(&document);
    let mut results = Vec::new();

    for table in document.select("table") {
        // Rows of nested tables belong to those tables.
        let rows: Vec<_> = document
            .select_in(table, "tr")
            .into_iter()
            .filter(|row| document.closest(*row, "table") == Some(table))
            .collect();
        if rows.len() < 2 {
            continue;
        }

        for row in rows.iter().copied() {
            if !document.text(row).contains(club_name) {
                continue;
            }
            let cells: Vec<String> = document
                .select_in(row, "td")
                .into_iter()
                .map(|td| document.text(td))
                .collect();
            if cells.is_empty() {
                continue;
            }

            let class_name = extract_class_name_for_row(&document, row, None);
            let mut result = club_row(&cells, club_name, rows.len());
            result.class_name = class_name;
            result.event_name = info.event_name.clone();
            result.organizer = info.organizer.clone().unwrap_or_default();
            result.date = date.clone();

            let facts = class_facts_in(&document, &result.class_name);
            result.length = facts.length;
            if facts.participants > 0 {
                result.total_participants = facts.participants;
            }

            results.push(result);
        }
    }

    results
}

/// Map the cells of one club row onto a result.
fn club_row(cells: &[String], club_name: &str, table_rows: usize) -> EnrichedResult {
    let name = cells
        .iter()
        .position(|cell| cell == club_name)
        .filter(|&idx| idx > 0)
        .map(|idx| cells[idx - 1].clone())
        .or_else(|| {
            cells
                .iter()
                .find(|cell| {
                    !cell.is_empty()
                        && !is_numeric(cell)
                        && !RE_TIME.is_match(cell)
                        && !cell.starts_with('+')
                        && !cell.contains(club_name)
                })
                .cloned()
        })
        .unwrap_or_default();

    let placing = extract_position_facts(&cells[0], Some(table_rows));
    let time = cells
        .iter()
        .find(|cell| RE_TIME.is_match(cell))
        .cloned()
        .unwrap_or_default();
    let time_after_winner = cells
        .iter()
        .rev()
        .find(|cell| cell.starts_with('+'))
        .cloned()
        .unwrap_or_default();

    EnrichedResult {
        name,
        position: placing.position,
        total_participants: placing.total,
        time_in_seconds: time_to_seconds(&time),
        time,
        time_after_winner,
        ..Default::default()
    }
}

fn is_numeric(cell: &str) -> bool {
    let trimmed = cell.trim_end_matches('.');
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}
