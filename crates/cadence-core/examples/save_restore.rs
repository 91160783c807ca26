//! Snapshot save/restore example.
//!
//! Runs a few frames of damage, captures the arena into the versioned
//! binary envelope, keeps playing, then restores and shows that the
//! world rewound to the captured state.
//!
//! Run with: `cargo run -p cadence-core --example save_restore`

use cadence_core::bus::QueueId;
use cadence_core::orchestrator::Orchestrator;
use cadence_core::serialize::{decode_snapshot, encode_snapshot};
use cadence_core::test_utils::*;
use cadence_core::tick::TickDuration;

fn main() {
    let mut orch = Orchestrator::new(quiet_collaborators());
    let hero = orch
        .spawn_entity(TestPayload::default())
        .expect("spawn hero");

    let dt = TickDuration::from_ticks(1);
    let hit = |orch: &mut Orchestrator<TestRules>, amount: i32| {
        orch.bus_mut()
            .enqueue::<DamageCommand, _>(QueueId::Entity(hero), |c| {
                c.target = hero;
                c.amount = amount;
            });
        orch.advance(dt);
    };

    // --- Step 1: Take some damage, then save ---

    hit(&mut orch, 10);
    hit(&mut orch, 10);
    let at_save = orch.world().arena.get_any(hero).map(|p| p.health);
    println!("health at save point: {at_save:?}");

    let snapshot = orch.world().capture_snapshot();
    let bytes =
        encode_snapshot(&snapshot, orch.pipeline().total_ticks()).expect("encode snapshot");
    println!("saved {} bytes", bytes.len());

    // --- Step 2: Keep playing past the save ---

    hit(&mut orch, 40);
    println!(
        "health after more damage: {:?}",
        orch.world().arena.get_any(hero).map(|p| p.health)
    );

    // --- Step 3: Restore ---

    let (header, decoded) =
        decode_snapshot::<TestPayload>(&bytes).expect("decode snapshot");
    orch.world_mut().restore_snapshot(&decoded);
    println!(
        "restored snapshot from tick {}: health {:?}",
        header.tick,
        orch.world().arena.get_any(hero).map(|p| p.health)
    );

    assert_eq!(
        orch.world().arena.get_any(hero).map(|p| p.health),
        at_save
    );
    println!("rewind verified");
}
