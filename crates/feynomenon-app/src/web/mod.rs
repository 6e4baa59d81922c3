// Web front end: JSON API and WebSocket chat
pub mod protocol;
pub mod routes;
pub mod server;

pub use protocol::{ChatRequest, ChatResponse, ClientMessage, ServerMessage, SessionStateResponse};
pub use routes::{create_router, AppState};
pub use server::{WebServer, WebServerConfig};
