//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. They stay plain data holders; presentation helpers that several views
//! share live next to the struct they format.

use std::fmt;

/// Symbol repeated once per rating point.
const RATING_SYMBOL: &str = "✨";
/// Most sparkles drawn for one rating; the rest is shown as a count.
const MAX_SPARKLES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A tracked book on the shelf. Optional columns stay `Option` so rows
/// written by older tools with NULLs load without guessing defaults.
pub struct Cookbook {
    /// Surrogate key assigned by SQLite on insert.
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year_published: Option<i64>,
    /// Nominally 0-5 but never clamped in storage.
    pub aesthetic_rating: Option<i64>,
    pub instagram_worthy: bool,
    pub cover_color: Option<String>,
}

impl Cookbook {
    /// Rating as a row of sparkles. Missing or negative ratings render empty,
    /// and ratings above `MAX_SPARKLES` end with `(+n)` for the overflow.
    pub fn rating_sparkles(&self) -> String {
        let rating = self.aesthetic_rating.unwrap_or(0).max(0);
        let drawn = rating.min(MAX_SPARKLES);
        let sparkles = RATING_SYMBOL.repeat(drawn as usize);
        match rating - drawn {
            0 => sparkles,
            extra => format!("{sparkles} (+{extra})"),
        }
    }

    pub fn instagram_label(&self) -> &'static str {
        if self.instagram_worthy {
            "📸 Yes"
        } else {
            "Not aesthetic enough"
        }
    }

    pub fn published_label(&self) -> String {
        match self.year_published {
            Some(year) => format!("{year} (vintage is better)"),
            None => "Unknown".to_string(),
        }
    }

    pub fn cover_color_label(&self) -> &str {
        self.cover_color
            .as_deref()
            .filter(|color| !color.trim().is_empty())
            .unwrap_or("Unspecified")
    }
}

impl fmt::Display for Cookbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

/// Field values for a cookbook that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCookbook {
    pub title: String,
    pub author: String,
    pub year_published: Option<i64>,
    pub aesthetic_rating: Option<i64>,
    pub instagram_worthy: bool,
    pub cover_color: Option<String>,
}

impl NewCookbook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn year_published(mut self, year: i64) -> Self {
        self.year_published = Some(year);
        self
    }

    pub fn aesthetic_rating(mut self, rating: i64) -> Self {
        self.aesthetic_rating = Some(rating);
        self
    }

    pub fn instagram_worthy(mut self, worthy: bool) -> Self {
        self.instagram_worthy = worthy;
        self
    }

    pub fn cover_color(mut self, color: impl Into<String>) -> Self {
        self.cover_color = Some(color.into());
        self
    }

    /// Attach the id SQLite assigned so callers can keep the hydrated row.
    pub fn into_cookbook(self, id: i64) -> Cookbook {
        Cookbook {
            id,
            title: self.title,
            author: self.author,
            year_published: self.year_published,
            aesthetic_rating: self.aesthetic_rating,
            instagram_worthy: self.instagram_worthy,
            cover_color: self.cover_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A normalized label. `name` is always trimmed lower-case text.
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One loan of a cookbook to a friend. Dates are stored as opaque text,
/// conventionally `YYYY-MM-DD`.
pub struct BorrowRecord {
    pub id: i64,
    pub cookbook_id: i64,
    pub friend_name: String,
    pub date_borrowed: String,
    /// Present in the schema but never written by this application.
    pub date_returned: Option<String>,
}

impl BorrowRecord {
    pub fn is_out(&self) -> bool {
        self.date_returned.is_none()
    }
}

/// What happened to a single tag name during [`crate::db::add_tags`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOutcome {
    /// Normalized tag name.
    pub name: String,
    pub tag_id: i64,
    /// The tag row did not exist before this call.
    pub created_tag: bool,
    /// The cookbook was not yet linked to the tag.
    pub linked: bool,
}

/// Per-tag results of one `add_tags` call, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReport {
    pub cookbook_id: i64,
    pub outcomes: Vec<TagOutcome>,
    /// Inputs that normalized to nothing.
    pub skipped_blank: usize,
}

impl TagReport {
    pub fn new(cookbook_id: i64) -> Self {
        Self {
            cookbook_id,
            ..Self::default()
        }
    }

    pub fn created_tags(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.created_tag)
            .map(|outcome| outcome.name.as_str())
    }

    pub fn new_links(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.linked).count()
    }

    pub fn already_linked(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.linked).count()
    }

    /// One-line summary for the status footer.
    pub fn summary(&self) -> String {
        let created = self.created_tags().count();
        let mut summary = format!(
            "Cookbook {}: {} tag(s) linked, {} already present",
            self.cookbook_id,
            self.new_links(),
            self.already_linked()
        );
        if created > 0 {
            summary.push_str(&format!(", {created} new tag(s) created"));
        }
        summary.push('.');
        summary
    }
}
