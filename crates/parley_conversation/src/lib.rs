pub mod error;
pub mod session;
pub mod transcript;
pub mod turn;
pub mod wire;

pub use error::Error;
pub use session::SessionId;
pub use transcript::Transcript;
pub use turn::{Part, Role, Turn};
pub use wire::{ErrorBody, RelayRequest, RelayResponse};
