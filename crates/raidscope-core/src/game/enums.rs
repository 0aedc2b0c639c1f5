use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr, IntoStaticStr};

/// Semantic category of an entity
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
    EnumString,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum PlayerType {
    #[default]
    Default = 0,
    LocalPlayer = 1,
    Teammate = 2,
    #[strum(serialize = "PMC")]
    Pmc = 3,
    AIScav = 4,
    AIRaider = 5,
    AIRogue = 6,
    AIBoss = 7,
    PScav = 8,
    SpecialPlayer = 9,
    #[strum(serialize = "BEAR")]
    Bear = 10,
    #[strum(serialize = "USEC")]
    Usec = 11,
    AIOfflineScav = 12,
    AISniperScav = 13,
    AIBossGuard = 14,
    AIBossFollower = 15,
}

impl PlayerType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }

    pub fn short_name(&self) -> &'static str {
        self.into()
    }

    /// Human-controlled, friendly or not.
    pub fn is_human(&self) -> bool {
        matches!(self, Self::LocalPlayer | Self::Teammate) || self.is_human_hostile()
    }

    pub fn is_human_hostile(&self) -> bool {
        matches!(
            self,
            Self::Pmc | Self::SpecialPlayer | Self::PScav | Self::Bear | Self::Usec
        )
    }

    pub fn is_pmc_faction(&self) -> bool {
        matches!(self, Self::Pmc | Self::Bear | Self::Usec)
    }

    pub fn is_ai(&self) -> bool {
        matches!(
            self,
            Self::AIScav
                | Self::AIRaider
                | Self::AIRogue
                | Self::AIBoss
                | Self::AIOfflineScav
                | Self::AISniperScav
                | Self::AIBossGuard
                | Self::AIBossFollower
        )
    }

    /// Bosses and their escorts.
    pub fn is_boss_raider(&self) -> bool {
        matches!(
            self,
            Self::AIRaider
                | Self::AIBossFollower
                | Self::AIBossGuard
                | Self::AIRogue
                | Self::AIBoss
        )
    }

    pub fn is_hostile(&self) -> bool {
        self.is_human_hostile() || self.is_ai()
    }

    pub fn is_friendly(&self) -> bool {
        matches!(self, Self::LocalPlayer | Self::Teammate)
    }
}

/// Runtime class of a player record, resolved once from its class name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, Display)]
pub enum PlayerClass {
    ClientPlayer,
    LocalPlayer,
    HideoutPlayer,
    ObservedPlayerView,
}

/// Memory layout family of a player record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum LayoutKind {
    Local,
    Observed,
}

impl PlayerClass {
    pub fn layout(&self) -> LayoutKind {
        match self {
            Self::ClientPlayer | Self::LocalPlayer | Self::HideoutPlayer => LayoutKind::Local,
            Self::ObservedPlayerView => LayoutKind::Observed,
        }
    }
}

/// Faction indicator read from observed records
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, Display)]
#[repr(i32)]
pub enum Side {
    #[strum(serialize = "USEC")]
    Usec = 1,
    #[strum(serialize = "BEAR")]
    Bear = 2,
    Savage = 4,
}
