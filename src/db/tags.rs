use rusqlite::{params, Connection};

use crate::db::cookbooks::require_cookbook;
use crate::error::{ShelfResult, StorageContext};
use crate::models::{Tag, TagOutcome, TagReport};

/// Trim and lower-case a tag. Returns `None` when nothing is left, which is
/// how stray commas in user input get dropped.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Split a comma separated line typed by the user into raw tag names.
/// Normalization is left to [`add_tags`].
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input.split(',').map(|part| part.trim().to_string()).collect()
}

/// Look up a tag by its normalized name, creating it if needed. `INSERT OR
/// IGNORE` against the UNIQUE `name` column makes the create step atomic;
/// the follow-up select always sees the winning row. The flag reports
/// whether this call created it.
pub fn get_or_create_tag(conn: &Connection, name: &str) -> ShelfResult<(i64, bool)> {
    const ACTION: &str = "failed to save tag";

    let inserted = conn
        .execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", [name])
        .storage_context(ACTION)?;
    let id = conn
        .query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| row.get(0))
        .storage_context(ACTION)?;

    Ok((id, inserted > 0))
}

/// Attach each of `names` to a cookbook. Every name is normalized, blanks are
/// skipped, and each remaining tag is created and linked inside its own
/// transaction. Re-tagging is a no-op for links that already exist.
///
/// An unknown cookbook fails with `NotFound` before anything is written. A
/// storage error stops processing at that tag; earlier tags stay committed.
pub fn add_tags<S: AsRef<str>>(
    conn: &Connection,
    cookbook_id: i64,
    names: &[S],
) -> ShelfResult<TagReport> {
    const ACTION: &str = "failed to add tags";

    require_cookbook(conn, cookbook_id, ACTION)?;

    let mut report = TagReport::new(cookbook_id);
    for raw in names {
        let Some(name) = normalize_tag(raw.as_ref()) else {
            report.skipped_blank += 1;
            continue;
        };

        let tx = conn.unchecked_transaction().storage_context(ACTION)?;
        let (tag_id, created_tag) = get_or_create_tag(&tx, &name)?;
        let linked = tx
            .execute(
                "INSERT OR IGNORE INTO cookbook_tags (cookbook_id, tag_id) VALUES (?1, ?2)",
                params![cookbook_id, tag_id],
            )
            .storage_context(ACTION)?
            > 0;
        tx.commit().storage_context(ACTION)?;

        if created_tag {
            tracing::info!(tag = %name, "new tag added");
        }
        if linked {
            tracing::info!(tag = %name, cookbook_id, "tag linked to cookbook");
        } else {
            tracing::debug!(tag = %name, cookbook_id, "tag already linked to cookbook");
        }

        report.outcomes.push(TagOutcome {
            name,
            tag_id,
            created_tag,
            linked,
        });
    }

    Ok(report)
}

/// Tags on one cookbook, alphabetically.
pub fn fetch_tags_for_cookbook(conn: &Connection, cookbook_id: i64) -> ShelfResult<Vec<Tag>> {
    const ACTION: &str = "failed to load cookbook tags";

    let mut stmt = conn
        .prepare(
            "SELECT t.id, t.name
             FROM tags t
             INNER JOIN cookbook_tags ct ON ct.tag_id = t.id
             WHERE ct.cookbook_id = ?1
             ORDER BY t.name",
        )
        .storage_context(ACTION)?;

    let tags = stmt
        .query_map([cookbook_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .storage_context(ACTION)?
        .collect::<Result<Vec<_>, _>>()
        .storage_context(ACTION)?;

    Ok(tags)
}

/// Every `(cookbook_id, tag name)` pair, so the shelf view can show tags for
/// all books after a single query.
pub fn fetch_cookbook_tag_names(conn: &Connection) -> ShelfResult<Vec<(i64, String)>> {
    const ACTION: &str = "failed to load tags";

    let mut stmt = conn
        .prepare(
            "SELECT ct.cookbook_id, t.name
             FROM cookbook_tags ct
             INNER JOIN tags t ON t.id = ct.tag_id
             ORDER BY ct.cookbook_id, t.name",
        )
        .storage_context(ACTION)?;

    let mut rows = stmt.query([]).storage_context(ACTION)?;
    let mut pairs = Vec::new();
    while let Some(row) = rows.next().storage_context(ACTION)? {
        pairs.push((
            row.get(0).storage_context(ACTION)?,
            row.get(1).storage_context(ACTION)?,
        ));
    }

    Ok(pairs)
}
