pub mod errors;
pub mod id;

pub use errors::{ConfigError, ParleyError, SessionError};
pub use id::{new_id, ConnectionId};

pub type Result<T> = std::result::Result<T, ParleyError>;
