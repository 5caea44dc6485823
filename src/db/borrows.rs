use rusqlite::{params, Connection};

use crate::db::cookbooks::require_cookbook;
use crate::error::{ShelfError, ShelfResult, StorageContext};
use crate::models::BorrowRecord;

/// Log that a friend borrowed a cookbook. The date is stored as given; the
/// `date_returned` column starts out NULL. Returns the new record id.
pub fn record_borrow(
    conn: &Connection,
    cookbook_id: i64,
    friend_name: &str,
    date_borrowed: &str,
) -> ShelfResult<i64> {
    const ACTION: &str = "failed to track borrowed cookbook";

    require_cookbook(conn, cookbook_id, ACTION)?;

    if friend_name.trim().is_empty() {
        return Err(ShelfError::Constraint {
            action: ACTION,
            detail: "friend name is required".to_string(),
        });
    }
    if date_borrowed.trim().is_empty() {
        return Err(ShelfError::Constraint {
            action: ACTION,
            detail: "borrow date is required".to_string(),
        });
    }

    let tx = conn.unchecked_transaction().storage_context(ACTION)?;
    tx.execute(
        "INSERT INTO borrow_history (cookbook_id, friend_name, date_borrowed)
         VALUES (?1, ?2, ?3)",
        params![cookbook_id, friend_name, date_borrowed],
    )
    .storage_context(ACTION)?;
    let id = tx.last_insert_rowid();
    tx.commit().storage_context(ACTION)?;

    tracing::info!(cookbook_id, friend = friend_name, date_borrowed, "cookbook borrowed");
    Ok(id)
}

/// Loans of one cookbook, oldest first.
pub fn fetch_borrow_history(conn: &Connection, cookbook_id: i64) -> ShelfResult<Vec<BorrowRecord>> {
    const ACTION: &str = "failed to load borrow history";

    require_cookbook(conn, cookbook_id, ACTION)?;

    let mut stmt = conn
        .prepare(
            "SELECT id, cookbook_id, friend_name, date_borrowed, date_returned
             FROM borrow_history
             WHERE cookbook_id = ?1
             ORDER BY id",
        )
        .storage_context(ACTION)?;

    let records = stmt
        .query_map([cookbook_id], |row| {
            Ok(BorrowRecord {
                id: row.get(0)?,
                cookbook_id: row.get(1)?,
                friend_name: row.get(2)?,
                date_borrowed: row.get(3)?,
                date_returned: row.get(4)?,
            })
        })
        .storage_context(ACTION)?
        .collect::<Result<Vec<_>, _>>()
        .storage_context(ACTION)?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db::{add_cookbook, open_in_memory_store};
    use crate::models::NewCookbook;

    fn borrow_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM borrow_history", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn borrow_is_recorded_without_return_date() {
        let conn = open_in_memory_store().unwrap();
        let book = add_cookbook(&conn, &NewCookbook::new("Crumb", "Baker")).unwrap();

        let id = record_borrow(&conn, book, "Ava", "2024-03-01").unwrap();

        let history = fetch_borrow_history(&conn, book).unwrap();
        assert_eq!(
            history,
            vec![BorrowRecord {
                id,
                cookbook_id: book,
                friend_name: "Ava".to_string(),
                date_borrowed: "2024-03-01".to_string(),
                date_returned: None,
            }]
        );
        assert!(history[0].is_out());
    }

    #[test]
    fn date_text_is_not_validated() {
        let conn = open_in_memory_store().unwrap();
        let book = add_cookbook(&conn, &NewCookbook::new("Crumb", "Baker")).unwrap();

        record_borrow(&conn, book, "Milo", "last tuesday").unwrap();

        assert_eq!(
            fetch_borrow_history(&conn, book).unwrap()[0].date_borrowed,
            "last tuesday"
        );
    }

    #[test]
    fn unknown_cookbook_writes_nothing() {
        let conn = open_in_memory_store().unwrap();

        let err = record_borrow(&conn, 9999, "Ava", "2024-03-01").unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(borrow_count(&conn), 0);
        assert!(fetch_borrow_history(&conn, 9999).unwrap_err().is_not_found());
    }

    #[test]
    fn blank_friend_is_rejected() {
        let conn = open_in_memory_store().unwrap();
        let book = add_cookbook(&conn, &NewCookbook::new("Crumb", "Baker")).unwrap();

        assert!(record_borrow(&conn, book, " ", "2024-03-01")
            .unwrap_err()
            .is_constraint());
        assert_eq!(borrow_count(&conn), 0);
    }

    #[test]
    fn blank_date_is_rejected() {
        let conn = open_in_memory_store().unwrap();
        let book = add_cookbook(&conn, &NewCookbook::new("Crumb", "Baker")).unwrap();

        let err = record_borrow(&conn, book, "Ava", "  ").unwrap_err();
        assert!(err.is_constraint());
        assert!(err.to_string().contains("borrow date is required"));
        assert_eq!(borrow_count(&conn), 0);
    }

    #[test]
    fn history_keeps_loan_order_per_book() {
        let conn = open_in_memory_store().unwrap();
        let first = add_cookbook(&conn, &NewCookbook::new("One", "A")).unwrap();
        let second = add_cookbook(&conn, &NewCookbook::new("Two", "B")).unwrap();

        record_borrow(&conn, first, "Ava", "2024-03-01").unwrap();
        record_borrow(&conn, second, "Ben", "2024-03-02").unwrap();
        record_borrow(&conn, first, "Cas", "2024-04-10").unwrap();

        let friends: Vec<_> = fetch_borrow_history(&conn, first)
            .unwrap()
            .into_iter()
            .map(|record| record.friend_name)
            .collect();
        assert_eq!(friends, vec!["Ava", "Cas"]);
    }
}
