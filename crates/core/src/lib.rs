pub mod config;
pub mod error;
pub mod history;
pub mod parser;
pub mod search;
pub mod session;
pub mod sites;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::history::*;
    pub use crate::parser::PagedParser;
    pub use crate::session::ReadingSession;
}
