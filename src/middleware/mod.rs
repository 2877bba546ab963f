pub mod session;

pub use session::{default_session_fetcher, session_from_extensions, session_middleware, SessionFetcher};
