//! Foreign structure layout.
//!
//! Every offset into the observed process lives here and is loaded from a
//! JSON file, so a new foreign build only needs a new table.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Offsets from the main module base
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModuleOffsets {
    /// Static slot holding the object manager pointer
    pub object_manager: u64,
}

/// Object manager fields holding the active-object list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectManagerOffsets {
    pub last_active_node: u64,
    pub active_nodes: u64,
}

/// One link of the active-object list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeOffsets {
    pub next: u64,
    pub object: u64,
}

impl NodeOffsets {
    /// Bytes that cover both fields.
    pub fn span(&self) -> usize {
        (self.next.max(self.object) + 8) as usize
    }
}

/// Registry object fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectOffsets {
    /// Pointer to the null-terminated object name
    pub name: u64,
    /// Chain from the object to its world component
    pub to_world: Vec<u64>,
}

/// World (per-match root) fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldOffsets {
    pub main_player: u64,
    pub map_name: u64,
    pub registered_players: u64,
    /// Boolean flag set once the match has started
    pub raid_started: u64,
}

/// Managed list object (`items` array plus `count`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListOffsets {
    pub items: u64,
    pub count: u64,
    /// Offset of element 0 inside the items array
    pub first_element: u64,
}

/// Managed string object (UTF-16, length-prefixed)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StringOffsets {
    pub length: u64,
    pub value: u64,
}

/// Chain from an object to the pointer of its runtime class name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassOffsets {
    pub to_name: Vec<u64>,
}

/// Locally controlled player record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerOffsets {
    pub profile: u64,
    pub movement_context: u64,
    pub to_transform: Vec<u64>,
    pub inventory_controller: u64,
    pub player_body: u64,
    /// Pointer to the location (map id) string
    pub location: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileOffsets {
    pub player_info: u64,
    pub account_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerInfoOffsets {
    pub nickname: u64,
    pub group_id: u64,
    pub game_version: u64,
}

/// Remotely observed player record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObservedOffsets {
    pub to_movement_context: Vec<u64>,
    pub to_transform: Vec<u64>,
    pub to_inventory_controller: Vec<u64>,
    pub to_health_controller: Vec<u64>,
    pub nickname: u64,
    pub account_id: u64,
    pub group_id: u64,
    /// `i32` side indicator
    pub side: u64,
    /// `bool` AI flag
    pub is_ai: u64,
    pub player_body: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MovementOffsets {
    /// `Vec2` rotation inside the local movement context
    pub local_rotation: u64,
    /// `Vec2` rotation inside the observed movement context
    pub observed_rotation: u64,
}

/// Inventory controller → inventory → equipment → slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryOffsets {
    pub inventory: u64,
    pub equipment: u64,
    pub slots: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthOffsets {
    /// `i32` health status tag
    pub tag_status: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformOffsets {
    /// Pointer from the transform object to its data block
    pub hierarchy: u64,
    /// `Vec3` world position inside the data block
    pub position: u64,
}

/// The complete foreign layout table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Offsets {
    pub version: String,
    pub module: ModuleOffsets,
    pub object_manager: ObjectManagerOffsets,
    pub node: NodeOffsets,
    pub object: ObjectOffsets,
    pub world: WorldOffsets,
    pub list: ListOffsets,
    pub string: StringOffsets,
    pub class: ClassOffsets,
    pub player: PlayerOffsets,
    pub profile: ProfileOffsets,
    pub player_info: PlayerInfoOffsets,
    pub observed: ObservedOffsets,
    pub movement: MovementOffsets,
    pub inventory: InventoryOffsets,
    pub health: HealthOffsets,
    pub transform: TransformOffsets,
}

impl Offsets {
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check that the table can drive a session at all.
    ///
    /// Individual field offsets may legitimately be zero; the anchors and
    /// every pointer chain may not.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::InvalidOffset("version is empty".to_string()));
        }
        if self.module.object_manager == 0 {
            return Err(Error::InvalidOffset(
                "module.objectManager is zero".to_string(),
            ));
        }
        if self.node.next == self.node.object {
            return Err(Error::InvalidOffset(
                "node.next and node.object overlap".to_string(),
            ));
        }
        let chains = [
            ("object.toWorld", &self.object.to_world),
            ("class.toName", &self.class.to_name),
            ("player.toTransform", &self.player.to_transform),
            ("observed.toMovementContext", &self.observed.to_movement_context),
            ("observed.toTransform", &self.observed.to_transform),
            (
                "observed.toInventoryController",
                &self.observed.to_inventory_controller,
            ),
            (
                "observed.toHealthController",
                &self.observed.to_health_controller,
            ),
        ];
        for (name, chain) in chains {
            if chain.is_empty() {
                return Err(Error::InvalidOffset(format!("{} is empty", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::test_offsets;

    #[test]
    fn test_default_is_invalid() {
        assert!(!Offsets::default().is_valid());
    }

    #[test]
    fn test_test_table_is_valid() {
        test_offsets().validate().unwrap();
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        let mut offsets = test_offsets();
        offsets.observed.to_transform.clear();
        let err = offsets.validate().unwrap_err();
        assert!(err.to_string().contains("observed.toTransform"));
    }

    #[test]
    fn test_node_span_covers_both_fields() {
        let node = NodeOffsets {
            next: 0x8,
            object: 0x18,
        };
        assert_eq!(node.span(), 0x20);
    }

    #[test]
    fn test_missing_sections_deserialize_as_default() {
        let offsets: Offsets =
            serde_json::from_str(r#"{"version":"1.0","module":{"objectManager":4096}}"#).unwrap();
        assert_eq!(offsets.module.object_manager, 0x1000);
        assert_eq!(offsets.world, WorldOffsets::default());
    }
}
