//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod index;
mod init;
mod list;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use index::run_index;
pub use init::run_init;
pub use list::run_list;
pub use search::run_search;
pub use serve::run_serve;
