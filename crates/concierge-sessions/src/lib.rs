pub mod fs;
pub mod memory;
pub mod store;
pub mod types;

pub use fs::FsSessionStore;
pub use memory::MemorySessionStore;
pub use store::{SessionStore, SessionStoreError, SessionStoreResult};
pub use types::{
    SessionId, SessionKey, Timestamp, Turn, TurnPart, TurnRole, USER_AUTHOR, current_timestamp,
};
