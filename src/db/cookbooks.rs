use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{ShelfError, ShelfResult, StorageContext};
use crate::models::{Cookbook, NewCookbook};

const COOKBOOK_COLUMNS: &str =
    "id, title, author, year_published, aesthetic_rating, instagram_worthy, cover_color";

/// Map a row selected with [`COOKBOOK_COLUMNS`]. A NULL `instagram_worthy`
/// reads as `false` so hand-edited files still load.
fn cookbook_from_row(row: &Row<'_>) -> rusqlite::Result<Cookbook> {
    Ok(Cookbook {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        year_published: row.get(3)?,
        aesthetic_rating: row.get(4)?,
        instagram_worthy: row.get::<_, Option<bool>>(5)?.unwrap_or(false),
        cover_color: row.get(6)?,
    })
}

/// Insert a cookbook and return its new id. Title and author are NOT NULL in
/// the schema; blank strings are rejected here as well so the shelf never
/// stores an empty heading.
pub fn add_cookbook(conn: &Connection, cookbook: &NewCookbook) -> ShelfResult<i64> {
    const ACTION: &str = "failed to add cookbook";

    if cookbook.title.trim().is_empty() {
        return Err(ShelfError::Constraint {
            action: ACTION,
            detail: "title is required".to_string(),
        });
    }
    if cookbook.author.trim().is_empty() {
        return Err(ShelfError::Constraint {
            action: ACTION,
            detail: "author is required".to_string(),
        });
    }

    let tx = conn.unchecked_transaction().storage_context(ACTION)?;
    tx.execute(
        "INSERT INTO cookbooks (title, author, year_published, aesthetic_rating,
                                instagram_worthy, cover_color)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            cookbook.title,
            cookbook.author,
            cookbook.year_published,
            cookbook.aesthetic_rating,
            cookbook.instagram_worthy,
            cookbook.cover_color,
        ],
    )
    .storage_context(ACTION)?;
    let id = tx.last_insert_rowid();
    tx.commit().storage_context(ACTION)?;

    tracing::info!(id, title = %cookbook.title, "curated new cookbook");
    Ok(id)
}

/// Every cookbook in insertion order. An empty shelf is an empty vector.
pub fn list_cookbooks(conn: &Connection) -> ShelfResult<Vec<Cookbook>> {
    const ACTION: &str = "failed to list cookbooks";

    let mut stmt = conn
        .prepare(&format!("SELECT {COOKBOOK_COLUMNS} FROM cookbooks ORDER BY id"))
        .storage_context(ACTION)?;

    let cookbooks = stmt
        .query_map([], cookbook_from_row)
        .storage_context(ACTION)?
        .collect::<Result<Vec<_>, _>>()
        .storage_context(ACTION)?;

    tracing::debug!(count = cookbooks.len(), "loaded cookbooks");
    Ok(cookbooks)
}

/// The photogenic shortlist: instagram-worthy books rated at least
/// `minimum_rating`, ordered by cover color so the grid reads as a gradient.
/// NULL colors sort first. The rating is not range-checked.
pub fn search_by_aesthetic(conn: &Connection, minimum_rating: i64) -> ShelfResult<Vec<Cookbook>> {
    const ACTION: &str = "failed to search for photogenic cookbooks";

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COOKBOOK_COLUMNS}
             FROM cookbooks
             WHERE aesthetic_rating >= ?1 AND instagram_worthy = 1
             ORDER BY cover_color ASC, id ASC"
        ))
        .storage_context(ACTION)?;

    let cookbooks = stmt
        .query_map([minimum_rating], cookbook_from_row)
        .storage_context(ACTION)?
        .collect::<Result<Vec<_>, _>>()
        .storage_context(ACTION)?;

    tracing::debug!(minimum_rating, matches = cookbooks.len(), "photogenic search");
    Ok(cookbooks)
}

pub fn fetch_cookbook(conn: &Connection, id: i64) -> ShelfResult<Option<Cookbook>> {
    conn.query_row(
        &format!("SELECT {COOKBOOK_COLUMNS} FROM cookbooks WHERE id = ?1"),
        [id],
        cookbook_from_row,
    )
    .optional()
    .storage_context("failed to load cookbook")
}

pub fn cookbook_exists(conn: &Connection, id: i64) -> ShelfResult<bool> {
    conn.query_row("SELECT 1 FROM cookbooks WHERE id = ?1", [id], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .storage_context("failed to look up cookbook")
}

/// Fail with [`ShelfError::NotFound`] unless the cookbook exists. Write paths
/// call this before touching any table so no orphan rows are created.
pub(crate) fn require_cookbook(
    conn: &Connection,
    id: i64,
    action: &'static str,
) -> ShelfResult<()> {
    if cookbook_exists(conn, id)? {
        Ok(())
    } else {
        tracing::warn!(cookbook_id = id, "{action}: cookbook does not exist");
        Err(ShelfError::NotFound {
            action,
            cookbook_id: id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db::open_in_memory_store;

    fn seed(
        conn: &Connection,
        title: &str,
        rating: Option<i64>,
        worthy: bool,
        color: Option<&str>,
    ) -> i64 {
        let mut book = NewCookbook::new(title, "Someone").instagram_worthy(worthy);
        book.aesthetic_rating = rating;
        book.cover_color = color.map(str::to_string);
        add_cookbook(conn, &book).unwrap()
    }

    #[test]
    fn add_then_list_round_trips_fields() {
        let conn = open_in_memory_store().unwrap();
        let book = NewCookbook::new("Foraged & Found", "R. Thistle")
            .year_published(2021)
            .aesthetic_rating(5)
            .instagram_worthy(true)
            .cover_color("sage green");

        let id = add_cookbook(&conn, &book).unwrap();
        let listed = list_cookbooks(&conn).unwrap();

        assert_eq!(listed, vec![book.into_cookbook(id)]);
    }

    #[test]
    fn optional_fields_stay_empty() {
        let conn = open_in_memory_store().unwrap();
        let id = add_cookbook(&conn, &NewCookbook::new("Toast", "Anon")).unwrap();

        let book = fetch_cookbook(&conn, id).unwrap().unwrap();
        assert_eq!(book.year_published, None);
        assert_eq!(book.aesthetic_rating, None);
        assert_eq!(book.cover_color, None);
        assert!(!book.instagram_worthy);
    }

    #[test]
    fn ids_are_unique_and_listing_keeps_insert_order() {
        let conn = open_in_memory_store().unwrap();
        let first = add_cookbook(&conn, &NewCookbook::new("Zest", "A")).unwrap();
        let second = add_cookbook(&conn, &NewCookbook::new("Alpha", "B")).unwrap();

        assert_ne!(first, second);
        let titles: Vec<_> = list_cookbooks(&conn)
            .unwrap()
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, vec!["Zest", "Alpha"]);
    }

    #[test]
    fn empty_shelf_lists_nothing() {
        let conn = open_in_memory_store().unwrap();
        assert!(list_cookbooks(&conn).unwrap().is_empty());
    }

    #[test]
    fn blank_title_or_author_is_rejected() {
        let conn = open_in_memory_store().unwrap();

        let err = add_cookbook(&conn, &NewCookbook::new("  ", "Author")).unwrap_err();
        assert!(err.is_constraint());
        let err = add_cookbook(&conn, &NewCookbook::new("Title", "")).unwrap_err();
        assert!(err.is_constraint());

        assert!(list_cookbooks(&conn).unwrap().is_empty());
    }

    #[test]
    fn photogenic_search_filters_and_orders_by_cover_color() {
        let conn = open_in_memory_store().unwrap();
        seed(&conn, "Teal Tarts", Some(4), true, Some("teal"));
        seed(&conn, "Plain Jane", Some(5), false, Some("amber"));
        seed(&conn, "Low Key", Some(3), true, Some("black"));
        seed(&conn, "Blush Bakes", Some(5), true, Some("blush"));
        seed(&conn, "No Color", Some(4), true, None);
        seed(&conn, "Unrated", None, true, Some("aqua"));

        let titles: Vec<_> = search_by_aesthetic(&conn, 4)
            .unwrap()
            .into_iter()
            .map(|book| book.title)
            .collect();

        assert_eq!(titles, vec!["No Color", "Blush Bakes", "Teal Tarts"]);
    }

    #[test]
    fn out_of_range_ratings_are_not_validated() {
        let conn = open_in_memory_store().unwrap();
        seed(&conn, "One", Some(1), true, Some("red"));
        seed(&conn, "Five", Some(5), true, Some("blue"));

        assert_eq!(search_by_aesthetic(&conn, -10).unwrap().len(), 2);
        assert!(search_by_aesthetic(&conn, 99).unwrap().is_empty());
    }

    #[test]
    fn existence_checks() {
        let conn = open_in_memory_store().unwrap();
        let id = add_cookbook(&conn, &NewCookbook::new("Here", "Me")).unwrap();

        assert!(cookbook_exists(&conn, id).unwrap());
        assert!(!cookbook_exists(&conn, 9999).unwrap());
        assert!(fetch_cookbook(&conn, 9999).unwrap().is_none());
        assert!(require_cookbook(&conn, 9999, "testing").unwrap_err().is_not_found());
    }
}
