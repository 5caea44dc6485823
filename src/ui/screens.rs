use anyhow::Result;
use rusqlite::Connection;

use crate::db::{fetch_borrow_history, search_by_aesthetic};
use crate::models::{BorrowRecord, Cookbook};

/// Move `selected` by `offset` inside a list of `len` entries, clamping at
/// both ends.
pub(crate) fn step_selection(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len as isize - 1;
    (selected as isize + offset).clamp(0, max) as usize
}

/// Results of the photogenic search for one minimum rating.
pub(crate) struct PhotogenicScreen {
    pub(crate) minimum_rating: i64,
    pub(crate) cookbooks: Vec<Cookbook>,
    pub(crate) selected: usize,
}

impl PhotogenicScreen {
    pub(crate) fn load(conn: &Connection, minimum_rating: i64) -> Result<Self> {
        let cookbooks = search_by_aesthetic(conn, minimum_rating)?;
        Ok(Self {
            minimum_rating,
            cookbooks,
            selected: 0,
        })
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.cookbooks.len(), offset);
    }

    pub(crate) fn current(&self) -> Option<&Cookbook> {
        self.cookbooks.get(self.selected)
    }
}

/// Loan history of a single cookbook.
pub(crate) struct HistoryScreen {
    pub(crate) cookbook: Cookbook,
    pub(crate) records: Vec<BorrowRecord>,
    pub(crate) selected: usize,
}

impl HistoryScreen {
    pub(crate) fn load(conn: &Connection, cookbook: Cookbook) -> Result<Self> {
        let records = fetch_borrow_history(conn, cookbook.id)?;
        Ok(Self {
            cookbook,
            records,
            selected: 0,
        })
    }

    /// Re-query after a new loan, keeping the cursor on the newest entry.
    pub(crate) fn reload(&mut self, conn: &Connection) -> Result<()> {
        self.records = fetch_borrow_history(conn, self.cookbook.id)?;
        self.selected = self.records.len().saturating_sub(1);
        Ok(())
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.records.len(), offset);
    }

    pub(crate) fn open_loans(&self) -> usize {
        self.records.iter().filter(|record| record.is_out()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db::{add_cookbook, open_in_memory_store, record_borrow};
    use crate::models::NewCookbook;

    #[test]
    fn selection_clamps_to_bounds() {
        assert_eq!(step_selection(0, 0, 3), 0);
        assert_eq!(step_selection(0, 3, -1), 0);
        assert_eq!(step_selection(1, 3, 5), 2);
        assert_eq!(step_selection(2, 3, -1), 1);
    }

    #[test]
    fn photogenic_screen_loads_matches() {
        let conn = open_in_memory_store().unwrap();
        let book = NewCookbook::new("Glow", "Lumen")
            .aesthetic_rating(5)
            .instagram_worthy(true);
        add_cookbook(&conn, &book).unwrap();
        add_cookbook(&conn, &NewCookbook::new("Dull", "Grey").aesthetic_rating(1)).unwrap();

        let mut screen = PhotogenicScreen::load(&conn, 4).unwrap();
        screen.move_selection(3);

        assert_eq!(screen.cookbooks.len(), 1);
        assert_eq!(screen.current().unwrap().title, "Glow");
    }

    #[test]
    fn history_reload_focuses_newest_loan() {
        let conn = open_in_memory_store().unwrap();
        let id = add_cookbook(&conn, &NewCookbook::new("Crumb", "Baker")).unwrap();
        let cookbook = crate::db::fetch_cookbook(&conn, id).unwrap().unwrap();

        let mut screen = HistoryScreen::load(&conn, cookbook).unwrap();
        assert!(screen.records.is_empty());

        record_borrow(&conn, id, "Ava", "2024-03-01").unwrap();
        record_borrow(&conn, id, "Ben", "2024-05-01").unwrap();
        screen.reload(&conn).unwrap();

        assert_eq!(screen.selected, 1);
        assert_eq!(screen.open_loans(), 2);
    }
}
