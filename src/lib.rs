#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod cli;
pub mod dispatch;
pub mod game;
pub mod session;
pub mod types;

pub use api::{ApiClient, ApiError};
pub use dispatch::{AdvanceOutcome, Dispatcher, SelectionChoice, SeqGate};
pub use game::{ActionDescriptor, ActionInput, GameStateSnapshot, TranscriptEntry, resolve};
pub use session::{SessionRecord, SessionStore};
pub use types::{AdvanceEvent, GameStatus, HumanPlacement, RequiredAction, RoleKind, VoteChoice};
