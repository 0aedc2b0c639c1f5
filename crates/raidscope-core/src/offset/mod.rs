mod collection;
mod loader;

pub use collection::*;
pub use loader::*;

/// A complete, self-consistent table used by the synthetic memory fixtures.
#[cfg(test)]
pub(crate) fn test_offsets() -> Offsets {
    Offsets {
        version: "test-1".to_string(),
        module: ModuleOffsets {
            object_manager: 0x100,
        },
        object_manager: ObjectManagerOffsets {
            last_active_node: 0x20,
            active_nodes: 0x28,
        },
        node: NodeOffsets {
            next: 0x8,
            object: 0x10,
        },
        object: ObjectOffsets {
            name: 0x60,
            to_world: vec![0x30, 0x18, 0x28],
        },
        world: WorldOffsets {
            main_player: 0x10,
            map_name: 0x20,
            registered_players: 0x30,
            raid_started: 0x40,
        },
        list: ListOffsets {
            items: 0x10,
            count: 0x18,
            first_element: 0x20,
        },
        string: StringOffsets {
            length: 0x10,
            value: 0x14,
        },
        class: ClassOffsets {
            to_name: vec![0x0, 0x0, 0x48],
        },
        player: PlayerOffsets {
            profile: 0x10,
            movement_context: 0x18,
            to_transform: vec![0x20, 0x10],
            inventory_controller: 0x28,
            player_body: 0x30,
            location: 0x38,
        },
        profile: ProfileOffsets {
            player_info: 0x10,
            account_id: 0x18,
        },
        player_info: PlayerInfoOffsets {
            nickname: 0x10,
            group_id: 0x18,
            game_version: 0x20,
        },
        observed: ObservedOffsets {
            to_movement_context: vec![0x40, 0x10],
            to_transform: vec![0x48, 0x10],
            to_inventory_controller: vec![0x50],
            to_health_controller: vec![0x58],
            nickname: 0x60,
            account_id: 0x68,
            group_id: 0x70,
            side: 0x78,
            is_ai: 0x7C,
            player_body: 0x80,
        },
        movement: MovementOffsets {
            local_rotation: 0x20,
            observed_rotation: 0x28,
        },
        inventory: InventoryOffsets {
            inventory: 0x10,
            equipment: 0x18,
            slots: 0x20,
        },
        health: HealthOffsets { tag_status: 0x10 },
        transform: TransformOffsets {
            hierarchy: 0x10,
            position: 0x20,
        },
    }
}
