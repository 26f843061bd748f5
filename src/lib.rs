pub mod catalog;
pub mod chess_serde;
pub mod config;
pub mod driver;
pub mod error;
pub mod interaction;
pub mod notation;
pub mod rules;
pub mod schedule;
#[cfg(feature = "server")]
pub mod server;
pub mod server_types;
pub mod session;

pub use catalog::{Catalog, Puzzle, PuzzleDefinition};
pub use config::SessionConfig;
pub use error::{CatalogError, CodecError, RulesError, SessionError};
pub use interaction::{Frame, Interaction, ViewEvent};
pub use notation::{CoordinateMove, MoveToken, Notation};
pub use session::{Orientation, Phase, Session, Verdict};

pub use shakmaty;
