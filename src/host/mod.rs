pub mod display;
pub mod error;
pub mod events;
pub mod mock;
pub mod session_host;

pub use display::{activity_label, tool_label};
pub use error::HostError;
pub use events::CliEvent;
pub use mock::{CliEventBuilder, MockFailure, MockSessionHost};
pub use session_host::{SendMessageOptions, SessionHost, StartSessionOptions};
