//! Walk command implementation.
//!
//! Locates the object registry through the main module and searches it for a
//! named object, then optionally follows the world chain from the hit.

use anyhow::{Context, Result};
use raidscope_core::{
    ChainTrace, Config, ObjectGraphWalker, Offsets, ReadMemory, RegistryHeads,
};

use super::hex_utils::format_hex_address;
use super::source::SnapshotArgs;

/// Run the walk command
pub fn run(
    source: &SnapshotArgs,
    config: &Config,
    offsets: &Offsets,
    name: Option<&str>,
    world: bool,
) -> Result<()> {
    let reader = source.reader()?;
    let settings = config.session_settings();
    let name = name.unwrap_or(&settings.world_object_name);

    let module_base = reader
        .module_base(&settings.module_name)
        .with_context(|| format!("Pass --module {}=ADDR", settings.module_name))?;
    let heads = RegistryHeads::locate(&reader, module_base, offsets)?;

    println!("Module {} at {}", settings.module_name, format_hex_address(module_base));
    println!("  Active head slot: {}", format_hex_address(heads.active_head));
    println!("  Last node slot:   {}", format_hex_address(heads.last_node));

    let walker = ObjectGraphWalker::new(&reader, offsets, reader.shutdown_signal())
        .with_options(settings.walk);
    let outcome = walker.find(heads, name)?;

    if !outcome.is_found() {
        println!(
            "Object '{}' not found ({} nodes examined)",
            name, outcome.visited
        );
        return Ok(());
    }

    let object_name = walker
        .object_name(outcome.object)
        .unwrap_or_else(|_| "<unreadable>".to_string());
    println!(
        "Found '{}' at {} after {} nodes",
        object_name,
        format_hex_address(outcome.object),
        outcome.visited
    );

    if world {
        let trace = ChainTrace::trace(&reader, outcome.object, &offsets.object.to_world);
        match (trace.target(), &trace.error) {
            (Some(root), _) => {
                println!("World root: {}", format_hex_address(root));
                let started = reader
                    .read_bool(root.wrapping_add(offsets.world.raid_started))
                    .map(|flag| flag.to_string())
                    .unwrap_or_else(|_| "<unreadable>".to_string());
                println!("  Raid started: {}", started);
            }
            (None, Some(error)) => println!(
                "World chain failed after {} hops: {}",
                trace.hops.len(),
                error
            ),
            (None, None) => println!("World chain is empty"),
        }
    }

    Ok(())
}
