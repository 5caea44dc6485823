//! Ratatui front-end for the cookbook shelf. It replaces the numbered console
//! menu with a browsable list: every menu action maps onto one persistence
//! call, and the modal forms do the input parsing the menu used to do inline.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
