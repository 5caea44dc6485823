//! Persistence module split across logical submodules. Every function takes
//! the shared connection by reference and commits its own work before
//! returning.

mod borrows;
mod connection;
mod cookbooks;
mod tags;

pub use borrows::{fetch_borrow_history, record_borrow};
pub use connection::{ensure_schema, open_in_memory_store, open_store};
pub use cookbooks::{
    add_cookbook, cookbook_exists, fetch_cookbook, list_cookbooks, search_by_aesthetic,
};
pub use tags::{
    add_tags, fetch_cookbook_tag_names, fetch_tags_for_cookbook, get_or_create_tag,
    normalize_tag, parse_tag_list,
};
