//! Entity reconstruction and the session lifecycle.

mod classify;
mod enums;
#[cfg(test)]
pub(crate) mod fixture;
mod names;
mod player;
mod registered;
mod session;
mod state;
mod tables;
mod transform;
mod watchlist;

pub use classify::*;
pub use enums::*;
pub use names::*;
pub use player::*;
pub use registered::*;
pub use session::*;
pub use state::*;
pub use tables::*;
pub use transform::*;
pub use watchlist::*;
