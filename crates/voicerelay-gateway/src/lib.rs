//! HTTP gateway exposing the completion streamer and the synthesis relay.

pub mod completion;
pub mod server;
pub mod state;
pub mod synthesis;
pub mod token;

pub use server::{router, start_server};
pub use state::AppState;
