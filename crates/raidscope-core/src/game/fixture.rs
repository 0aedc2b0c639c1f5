//! Foreign record builders shared by the game tests.

use crate::memory::MockMemoryBuilder;
use crate::offset::Offsets;

/// Write pointer hops so that `read_ptr_chain(base, chain)` yields `target`.
pub fn alloc_chain(mem: &mut MockMemoryBuilder, base: u64, chain: &[u64], target: u64) {
    let mut current = base;
    for (i, offset) in chain.iter().enumerate() {
        if i + 1 == chain.len() {
            mem.write_u64(current + offset, target);
        } else {
            let block = mem.alloc(0x100);
            mem.write_u64(current + offset, block);
            current = block;
        }
    }
}

pub fn alloc_class_name(mem: &mut MockMemoryBuilder, offsets: &Offsets, base: u64, name: &str) {
    let name_ptr = mem.alloc_cstring(name);
    alloc_chain(mem, base, &offsets.class.to_name, name_ptr);
}

/// Transform object and data block holding `position`.
fn alloc_transform(mem: &mut MockMemoryBuilder, offsets: &Offsets, position: [f32; 3]) -> (u64, u64) {
    let internal = mem.alloc(0x40);
    let data = mem.alloc(0x40);
    mem.write_u64(internal + offsets.transform.hierarchy, data);
    mem.write_f32s(data + offsets.transform.position, &position);
    (internal, data + offsets.transform.position)
}

fn alloc_inventory(mem: &mut MockMemoryBuilder, offsets: &Offsets) -> u64 {
    let controller = mem.alloc(0x40);
    let inventory = mem.alloc(0x40);
    let equipment = mem.alloc(0x40);
    let slots = mem.alloc(0x10);
    mem.write_u64(controller + offsets.inventory.inventory, inventory);
    mem.write_u64(inventory + offsets.inventory.equipment, equipment);
    mem.write_u64(equipment + offsets.inventory.slots, slots);
    controller
}

pub struct ObservedSeed<'a> {
    pub class_name: &'a str,
    pub name: &'a str,
    pub account: &'a str,
    pub group: Option<&'a str>,
    pub side: i32,
    pub is_ai: bool,
    pub position: [f32; 3],
    pub rotation: [f32; 2],
    pub health_tag: i32,
}

impl Default for ObservedSeed<'_> {
    fn default() -> Self {
        Self {
            class_name: "ObservedPlayerView",
            name: "Observed",
            account: "",
            group: None,
            side: 1,
            is_ai: false,
            position: [0.0, 0.0, 0.0],
            rotation: [90.0, 0.0],
            health_tag: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ObservedRecord {
    pub base: u64,
    pub transform_internal: u64,
    pub position_addr: u64,
    pub rotation_addr: u64,
    pub health_addr: u64,
}

pub fn alloc_observed(
    mem: &mut MockMemoryBuilder,
    offsets: &Offsets,
    seed: &ObservedSeed<'_>,
) -> ObservedRecord {
    let o = &offsets.observed;
    let base = mem.alloc(0x100);
    alloc_class_name(mem, offsets, base, seed.class_name);

    let movement_context = mem.alloc(0x40);
    alloc_chain(mem, base, &o.to_movement_context, movement_context);
    let rotation_addr = movement_context + offsets.movement.observed_rotation;
    mem.write_f32s(rotation_addr, &seed.rotation);

    let (transform_internal, position_addr) = alloc_transform(mem, offsets, seed.position);
    alloc_chain(mem, base, &o.to_transform, transform_internal);

    let controller = alloc_inventory(mem, offsets);
    alloc_chain(mem, base, &o.to_inventory_controller, controller);

    let health_controller = mem.alloc(0x40);
    alloc_chain(mem, base, &o.to_health_controller, health_controller);
    let health_addr = health_controller + offsets.health.tag_status;
    mem.write_i32(health_addr, seed.health_tag);

    let name = mem.alloc_managed_string(seed.name, &offsets.string);
    mem.write_u64(base + o.nickname, name);
    let account = mem.alloc_managed_string(seed.account, &offsets.string);
    mem.write_u64(base + o.account_id, account);
    if let Some(group) = seed.group {
        let group = mem.alloc_managed_string(group, &offsets.string);
        mem.write_u64(base + o.group_id, group);
    }
    mem.write_i32(base + o.side, seed.side);
    mem.write_bool(base + o.is_ai, seed.is_ai);
    let body = mem.alloc(0x10);
    mem.write_u64(base + o.player_body, body);

    ObservedRecord {
        base,
        transform_internal,
        position_addr,
        rotation_addr,
        health_addr,
    }
}

pub struct LocalSeed<'a> {
    pub class_name: &'a str,
    pub name: &'a str,
    pub account: &'a str,
    pub game_version: &'a str,
    pub location: Option<&'a str>,
    pub position: [f32; 3],
}

impl Default for LocalSeed<'_> {
    fn default() -> Self {
        Self {
            class_name: "LocalPlayer",
            name: "Local",
            account: "local-acct",
            game_version: "standard",
            location: None,
            position: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LocalRecord {
    pub base: u64,
    pub profile: u64,
    pub position_addr: u64,
    pub rotation_addr: u64,
}

pub fn alloc_local(
    mem: &mut MockMemoryBuilder,
    offsets: &Offsets,
    seed: &LocalSeed<'_>,
) -> LocalRecord {
    let p = &offsets.player;
    let base = mem.alloc(0x100);
    alloc_class_name(mem, offsets, base, seed.class_name);

    let profile = mem.alloc(0x40);
    let info = mem.alloc(0x40);
    mem.write_u64(base + p.profile, profile);
    mem.write_u64(profile + offsets.profile.player_info, info);
    let account = mem.alloc_managed_string(seed.account, &offsets.string);
    mem.write_u64(profile + offsets.profile.account_id, account);
    let name = mem.alloc_managed_string(seed.name, &offsets.string);
    mem.write_u64(info + offsets.player_info.nickname, name);
    let version = mem.alloc_managed_string(seed.game_version, &offsets.string);
    mem.write_u64(info + offsets.player_info.game_version, version);

    let movement_context = mem.alloc(0x40);
    mem.write_u64(base + p.movement_context, movement_context);

    let (transform_internal, position_addr) = alloc_transform(mem, offsets, seed.position);
    alloc_chain(mem, base, &p.to_transform, transform_internal);

    let controller = alloc_inventory(mem, offsets);
    mem.write_u64(base + p.inventory_controller, controller);
    let body = mem.alloc(0x10);
    mem.write_u64(base + p.player_body, body);

    if let Some(location) = seed.location {
        let location = mem.alloc_managed_string(location, &offsets.string);
        mem.write_u64(base + p.location, location);
    }

    LocalRecord {
        base,
        profile,
        position_addr,
        rotation_addr: movement_context + offsets.movement.local_rotation,
    }
}

/// Capacity of fixture player lists
pub const LIST_CAPACITY: usize = 32;

/// Managed list of player record pointers.
pub fn alloc_player_list(mem: &mut MockMemoryBuilder, offsets: &Offsets, bases: &[u64]) -> u64 {
    let list = mem.alloc(0x40);
    let items = mem.alloc(offsets.list.first_element as usize + LIST_CAPACITY * 8);
    mem.write_u64(list + offsets.list.items, items);
    mem.write_i32(list + offsets.list.count, bases.len() as i32);
    for (i, base) in bases.iter().enumerate() {
        mem.write_u64(list_slot(offsets, items, i), *base);
    }
    list
}

pub fn list_slot(offsets: &Offsets, items: u64, index: usize) -> u64 {
    items + offsets.list.first_element + (index as u64) * 8
}

pub struct WorldSeed<'a> {
    pub main_player: u64,
    pub map_name: Option<&'a str>,
    pub players_list: u64,
    pub raid_started: bool,
}

pub fn alloc_world(mem: &mut MockMemoryBuilder, offsets: &Offsets, seed: &WorldSeed<'_>) -> u64 {
    let w = &offsets.world;
    let world = mem.alloc(0x80);
    mem.write_u64(world + w.main_player, seed.main_player);
    if let Some(map) = seed.map_name {
        let map = mem.alloc_managed_string(map, &offsets.string);
        mem.write_u64(world + w.map_name, map);
    }
    mem.write_u64(world + w.registered_players, seed.players_list);
    mem.write_bool(world + w.raid_started, seed.raid_started);
    world
}

/// Object registry under `module_base` whose objects are `(name, world)`.
///
/// Returns the object addresses in list order.
pub fn alloc_registry(
    mem: &mut MockMemoryBuilder,
    offsets: &Offsets,
    module_base: u64,
    objects: &[(&str, Option<u64>)],
) -> Vec<u64> {
    let manager = mem.alloc(0x40);
    mem.write_u64(module_base + offsets.module.object_manager, manager);
    let active_slot = mem.alloc(0x10);
    let last_slot = mem.alloc(0x10);
    mem.write_u64(manager + offsets.object_manager.active_nodes, active_slot);
    mem.write_u64(manager + offsets.object_manager.last_active_node, last_slot);

    let addrs: Vec<u64> = objects
        .iter()
        .map(|(name, world)| {
            let object = mem.alloc(0x100);
            let name_ptr = mem.alloc_cstring(name);
            mem.write_u64(object + offsets.object.name, name_ptr);
            if let Some(world) = world {
                alloc_chain(mem, object, &offsets.object.to_world, *world);
            }
            object
        })
        .collect();
    let nodes: Vec<u64> = addrs.iter().map(|_| mem.alloc(offsets.node.span())).collect();
    for (i, node) in nodes.iter().enumerate() {
        mem.write_u64(node + offsets.node.object, addrs[i]);
        if let Some(next) = nodes.get(i + 1) {
            mem.write_u64(node + offsets.node.next, *next);
        }
    }
    if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
        mem.write_u64(active_slot, *first);
        mem.write_u64(last_slot, *last);
    }
    addrs
}

#[derive(Debug, Clone, Copy)]
pub struct RaidRecord {
    pub module_base: u64,
    pub world: u64,
    pub list: u64,
    pub local: u64,
}

/// A started match with a local player and one observed enemy, reachable
/// from the module `module_name`.
pub fn alloc_raid(mem: &mut MockMemoryBuilder, offsets: &Offsets, module_name: &str) -> RaidRecord {
    let module_base = mem.alloc(0x200);
    mem.module(module_name, module_base);
    let local = alloc_local(
        mem,
        offsets,
        &LocalSeed {
            location: Some("interchange"),
            ..LocalSeed::default()
        },
    );
    let enemy = alloc_observed(mem, offsets, &ObservedSeed::default());
    let list = alloc_player_list(mem, offsets, &[local.base, enemy.base]);
    let world = alloc_world(
        mem,
        offsets,
        &WorldSeed {
            main_player: local.base,
            map_name: None,
            players_list: list,
            raid_started: true,
        },
    );
    alloc_registry(mem, offsets, module_base, &[("GameWorld", Some(world))]);
    RaidRecord {
        module_base,
        world,
        list,
        local: local.base,
    }
}
