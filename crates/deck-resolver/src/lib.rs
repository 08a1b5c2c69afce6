//! Decklist parsing and resolution into print units.

pub mod bulk;
pub mod grammar;
mod provider;
mod resolve;
mod types;

pub use bulk::{HttpIdentity, fetch_bulk_json};
pub use provider::{CardDataProvider, CardDatabase, parsed_index_path};
pub use resolve::{load_decklist, resolve_decklist};
pub use types::*;
