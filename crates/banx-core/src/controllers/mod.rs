pub mod session_controller;

pub use session_controller::{SendError, SendRequest, SessionController};
