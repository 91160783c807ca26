//! Minimal duel example: two fighters trading contact damage.
//!
//! Spawns two entities, feeds a collision between them every frame, and
//! runs the six-phase tick until one side is removed by the cleanup
//! phase. After each frame, prints health and the tick report.
//!
//! Run with: `cargo run -p cadence-core --example minimal_duel`

use cadence_core::orchestrator::Orchestrator;
use cadence_core::test_utils::*;
use cadence_core::tick::TickDuration;

fn main() {
    // --- Step 1: Wire collaborators ---

    // The shared feed stands in for a collision detector; the damage
    // router turns each contact into 15 damage on both fighters.
    let feed = SharedCollisionFeed::default();
    let mut collaborators = quiet_collaborators();
    collaborators.collision_source = Box::new(feed.clone());
    collaborators.collision_router = Box::new(DamageRouter { amount: 15 });

    let mut orch = Orchestrator::new(collaborators);

    // --- Step 2: Spawn the fighters ---

    let red = orch
        .spawn_entity(TestPayload::default())
        .expect("spawn red fighter");
    let blue = orch
        .spawn_entity(TestPayload {
            health: 70,
            ..Default::default()
        })
        .expect("spawn blue fighter");

    println!("duel start: red 100 hp vs blue 70 hp");

    // --- Step 3: Fight until the world thins out ---

    let dt = TickDuration::from_ticks(1);
    for frame in 1.. {
        // Both fighters stay in contact every frame.
        if orch.world().is_valid(red) && orch.world().is_valid(blue) {
            feed.push(contact(red, blue));
        }

        let report = orch.advance(dt);

        let hp = |h| {
            orch.world()
                .arena
                .get_any(h)
                .map(|p: &TestPayload| p.health)
        };
        println!(
            "frame {frame}: red {:?} blue {:?} (steps {:?}, despawned {})",
            hp(red),
            hp(blue),
            report.update.message_steps.depth(),
            report.late.despawned
        );

        if report.late.despawned > 0 {
            break;
        }
        if frame > 20 {
            println!("no knockout after 20 frames, calling it a draw");
            break;
        }
    }

    // --- Step 4: Inspect the survivors ---

    println!(
        "survivors: {} of 2, after {} frames and {} ticks",
        orch.world().registry.len(),
        orch.pipeline().frame_count(),
        orch.pipeline().total_ticks()
    );
}
