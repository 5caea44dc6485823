use anyhow::{anyhow, Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::db::{normalize_tag, parse_tag_list};
use crate::models::{Cookbook, NewCookbook};

/// Render one `Name: value` row of a modal form.
fn field_line(field_name: &str, value: &str, placeholder: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Parse an optional integer field. Blank means "not set".
fn parse_optional_int(raw: &str, label: &str) -> Result<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .with_context(|| format!("{label} must be a whole number."))
}

/// Fields of the "add cookbook" form, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum CookbookField {
    #[default]
    Title,
    Author,
    Year,
    Rating,
    Instagram,
    CoverColor,
}

impl CookbookField {
    pub(crate) const ALL: [CookbookField; 6] = [
        CookbookField::Title,
        CookbookField::Author,
        CookbookField::Year,
        CookbookField::Rating,
        CookbookField::Instagram,
        CookbookField::CoverColor,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            CookbookField::Title => "Title",
            CookbookField::Author => "Author",
            CookbookField::Year => "Published",
            CookbookField::Rating => "Aesthetic rating",
            CookbookField::Instagram => "Instagram worthy",
            CookbookField::CoverColor => "Cover color",
        }
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }
}

/// Form state for shelving a new cookbook.
#[derive(Default, Clone, Debug)]
pub(crate) struct CookbookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) rating: String,
    pub(crate) instagram_worthy: bool,
    pub(crate) cover_color: String,
    pub(crate) active: CookbookField,
    pub(crate) error: Option<String>,
}

impl CookbookForm {
    pub(crate) fn next_field(&mut self) {
        let next = (self.active.index() + 1) % CookbookField::ALL.len();
        self.active = CookbookField::ALL[next];
    }

    pub(crate) fn previous_field(&mut self) {
        let len = CookbookField::ALL.len();
        let previous = (self.active.index() + len - 1) % len;
        self.active = CookbookField::ALL[previous];
    }

    /// Year accepts digits only; the rating also takes a leading minus since
    /// the column is an unconstrained integer. The instagram field toggles on
    /// space, `y` or `n`.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            CookbookField::Title => self.title.push(ch),
            CookbookField::Author => self.author.push(ch),
            CookbookField::CoverColor => self.cover_color.push(ch),
            CookbookField::Year => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                self.year.push(ch);
            }
            CookbookField::Rating => {
                let leading_minus = ch == '-' && self.rating.is_empty();
                if !ch.is_ascii_digit() && !leading_minus {
                    return false;
                }
                self.rating.push(ch);
            }
            CookbookField::Instagram => match ch {
                ' ' => self.instagram_worthy = !self.instagram_worthy,
                'y' | 'Y' => self.instagram_worthy = true,
                'n' | 'N' => self.instagram_worthy = false,
                _ => return false,
            },
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            CookbookField::Title => {
                self.title.pop();
            }
            CookbookField::Author => {
                self.author.pop();
            }
            CookbookField::Year => {
                self.year.pop();
            }
            CookbookField::Rating => {
                self.rating.pop();
            }
            CookbookField::CoverColor => {
                self.cover_color.pop();
            }
            CookbookField::Instagram => self.instagram_worthy = false,
        }
    }

    /// Validate the inputs and build the row to insert.
    pub(crate) fn parse_inputs(&self) -> Result<NewCookbook> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(anyhow!("Author is required."));
        }
        let cover_color = self.cover_color.trim();

        Ok(NewCookbook {
            title: title.to_string(),
            author: author.to_string(),
            year_published: parse_optional_int(&self.year, "Year")?,
            aesthetic_rating: parse_optional_int(&self.rating, "Aesthetic rating")?,
            instagram_worthy: self.instagram_worthy,
            cover_color: (!cover_color.is_empty()).then(|| cover_color.to_string()),
        })
    }

    pub(crate) fn value(&self, field: CookbookField) -> String {
        match field {
            CookbookField::Title => self.title.clone(),
            CookbookField::Author => self.author.clone(),
            CookbookField::Year => self.year.clone(),
            CookbookField::Rating => self.rating.clone(),
            CookbookField::CoverColor => self.cover_color.clone(),
            CookbookField::Instagram => {
                if self.instagram_worthy {
                    "[x] yes".to_string()
                } else {
                    "[ ] no".to_string()
                }
            }
        }
    }

    pub(crate) fn build_line(&self, field: CookbookField) -> Line<'static> {
        let placeholder = match field {
            CookbookField::Title | CookbookField::Author => "<required>",
            CookbookField::Rating => "<0-5>",
            _ => "<optional>",
        };
        field_line(
            field.label(),
            &self.value(field),
            placeholder,
            self.active == field,
        )
    }

    pub(crate) fn value_len(&self, field: CookbookField) -> usize {
        self.value(field).chars().count()
    }
}

/// Comma separated tag entry for one cookbook.
#[derive(Clone, Debug)]
pub(crate) struct TagForm {
    pub(crate) cookbook_id: i64,
    pub(crate) cookbook_title: String,
    pub(crate) input: String,
    pub(crate) error: Option<String>,
}

impl TagForm {
    pub(crate) fn for_cookbook(cookbook: &Cookbook) -> Self {
        Self {
            cookbook_id: cookbook.id,
            cookbook_title: cookbook.title.clone(),
            input: String::new(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.input.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.input.pop();
    }

    /// Raw tag names exactly as typed. At least one must survive
    /// normalization or there is nothing to save.
    pub(crate) fn parse_inputs(&self) -> Result<Vec<String>> {
        let names = parse_tag_list(&self.input);
        if names.iter().all(|name| normalize_tag(name).is_none()) {
            return Err(anyhow!("Enter at least one tag."));
        }
        Ok(names)
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        field_line("Tags", &self.input, "<comma separated>", true)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum BorrowField {
    #[default]
    Friend,
    Date,
}

/// Loan entry for one cookbook.
#[derive(Clone, Debug)]
pub(crate) struct BorrowForm {
    pub(crate) cookbook_id: i64,
    pub(crate) cookbook_title: String,
    pub(crate) friend: String,
    pub(crate) date: String,
    pub(crate) active: BorrowField,
    pub(crate) error: Option<String>,
}

impl BorrowForm {
    pub(crate) fn for_cookbook(cookbook: &Cookbook) -> Self {
        Self {
            cookbook_id: cookbook.id,
            cookbook_title: cookbook.title.clone(),
            friend: String::new(),
            date: String::new(),
            active: BorrowField::Friend,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BorrowField::Friend => BorrowField::Date,
            BorrowField::Date => BorrowField::Friend,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BorrowField::Friend => self.friend.push(ch),
            BorrowField::Date => self.date.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            BorrowField::Friend => {
                self.friend.pop();
            }
            BorrowField::Date => {
                self.date.pop();
            }
        }
    }

    /// Friend and date are both required. The date is kept as typed.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String)> {
        let friend = self.friend.trim();
        if friend.is_empty() {
            return Err(anyhow!("Friend's name is required."));
        }
        let date = self.date.trim();
        if date.is_empty() {
            return Err(anyhow!("Borrow date is required (YYYY-MM-DD)."));
        }
        Ok((friend.to_string(), date.to_string()))
    }

    pub(crate) fn build_line(&self, field: BorrowField) -> Line<'static> {
        match field {
            BorrowField::Friend => field_line(
                "Friend",
                &self.friend,
                "<required>",
                self.active == BorrowField::Friend,
            ),
            BorrowField::Date => field_line(
                "Date borrowed",
                &self.date,
                "<YYYY-MM-DD>",
                self.active == BorrowField::Date,
            ),
        }
    }

    pub(crate) fn value_len(&self, field: BorrowField) -> usize {
        match field {
            BorrowField::Friend => self.friend.chars().count(),
            BorrowField::Date => self.date.chars().count(),
        }
    }
}

/// Minimum rating prompt for the photogenic search.
#[derive(Clone, Debug)]
pub(crate) struct RatingForm {
    pub(crate) input: String,
    pub(crate) error: Option<String>,
}

impl RatingForm {
    pub(crate) fn with_default(rating: i64) -> Self {
        Self {
            input: rating.to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let leading_minus = ch == '-' && self.input.is_empty();
        if ch.is_ascii_digit() || leading_minus {
            self.input.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.input.pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<i64> {
        let raw = self.input.trim();
        if raw.is_empty() {
            return Err(anyhow!("Minimum rating is required."));
        }
        raw.parse::<i64>()
            .context("Minimum rating must be a whole number.")
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        field_line("Minimum rating", &self.input, "<0-5>", true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(form: &mut CookbookForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn cookbook_form_builds_new_cookbook() {
        let mut form = CookbookForm::default();
        type_text(&mut form, "Foraged & Found");
        form.next_field();
        type_text(&mut form, "R. Thistle");
        form.next_field();
        type_text(&mut form, "20x21");
        form.next_field();
        type_text(&mut form, "5");
        form.next_field();
        form.push_char('y');
        form.next_field();
        type_text(&mut form, " sage green ");

        let cookbook = form.parse_inputs().unwrap();
        assert_eq!(
            cookbook,
            NewCookbook::new("Foraged & Found", "R. Thistle")
                .year_published(2021)
                .aesthetic_rating(5)
                .instagram_worthy(true)
                .cover_color("sage green")
        );
    }

    #[test]
    fn cookbook_form_requires_title_and_author() {
        let mut form = CookbookForm::default();
        assert_eq!(
            form.parse_inputs().unwrap_err().to_string(),
            "Title is required."
        );
        form.title = "Toast".into();
        assert_eq!(
            form.parse_inputs().unwrap_err().to_string(),
            "Author is required."
        );
    }

    #[test]
    fn cookbook_form_leaves_blank_optionals_unset() {
        let form = CookbookForm {
            title: "Toast".into(),
            author: "Anon".into(),
            cover_color: "   ".into(),
            ..CookbookForm::default()
        };
        let cookbook = form.parse_inputs().unwrap();
        assert_eq!(cookbook.year_published, None);
        assert_eq!(cookbook.aesthetic_rating, None);
        assert_eq!(cookbook.cover_color, None);
    }

    #[test]
    fn rating_field_accepts_only_a_leading_minus() {
        let mut form = CookbookForm {
            active: CookbookField::Rating,
            ..CookbookForm::default()
        };
        assert!(form.push_char('-'));
        assert!(form.push_char('1'));
        assert!(!form.push_char('-'));
        assert_eq!(form.rating, "-1");
    }

    #[test]
    fn field_navigation_wraps() {
        let mut form = CookbookForm::default();
        form.previous_field();
        assert_eq!(form.active, CookbookField::CoverColor);
        form.next_field();
        assert_eq!(form.active, CookbookField::Title);
    }

    #[test]
    fn tag_form_needs_one_real_tag() {
        let mut form = TagForm {
            cookbook_id: 1,
            cookbook_title: "Crumb".into(),
            input: " , ,".into(),
            error: None,
        };
        assert!(form.parse_inputs().is_err());

        form.input = "Vegan, ,baking".into();
        assert_eq!(form.parse_inputs().unwrap(), vec!["Vegan", "", "baking"]);
    }

    #[test]
    fn borrow_form_requires_both_fields() {
        let mut form = BorrowForm {
            cookbook_id: 1,
            cookbook_title: "Crumb".into(),
            friend: String::new(),
            date: String::new(),
            active: BorrowField::Friend,
            error: None,
        };
        for ch in "Ava".chars() {
            form.push_char(ch);
        }
        assert!(form.parse_inputs().is_err());

        form.toggle_field();
        for ch in "2024-03-01".chars() {
            form.push_char(ch);
        }
        assert_eq!(
            form.parse_inputs().unwrap(),
            ("Ava".to_string(), "2024-03-01".to_string())
        );
    }

    #[test]
    fn rating_form_parses_integers() {
        let mut form = RatingForm::with_default(4);
        assert_eq!(form.parse_inputs().unwrap(), 4);
        form.backspace();
        assert!(form.parse_inputs().is_err());
        form.push_char('-');
        form.push_char('2');
        assert_eq!(form.parse_inputs().unwrap(), -2);
    }
}
