pub mod session;

pub use session::{QueryResult, Session, SessionConfig};
