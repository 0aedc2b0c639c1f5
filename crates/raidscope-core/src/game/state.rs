use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr, IntoStaticStr};

/// Lifecycle status of the observed session
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum SessionStatus {
    /// Process or main module not located
    #[default]
    NotFound = 0,
    /// Main module located, registry not yet walked
    Found = 1,
    Menu = 2,
    Hideout = 3,
    LoadingLoot = 4,
    /// World located, match not yet started
    Matching = 5,
    InGame = 6,
    /// Unrecoverable classification or layout fault
    Error = 7,
}

impl SessionStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }

    /// A world root is cached in this state.
    pub fn has_world(&self) -> bool {
        matches!(self, Self::Matching | Self::InGame | Self::Hideout)
    }

    pub fn is_attached(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}
