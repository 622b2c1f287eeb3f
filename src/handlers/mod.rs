mod fallback;
mod gateway;

pub use fallback::{WELCOME_HTML, not_found, welcome};
pub use gateway::gateway;
