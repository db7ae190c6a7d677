//! Belief state properties under arbitrary evidence sequences

use escape_room::belief::BeliefState;
use escape_room::core::config::BeliefConfig;
use escape_room::core::types::RoomId;
use escape_room::world::WorldGraph;
use proptest::prelude::*;

const ROOMS: u32 = 6;

#[derive(Debug, Clone)]
enum Evidence {
    Enter(u32, bool),
    Sensor(u32, bool),
    Spread(u32),
}

fn arb_evidence() -> impl Strategy<Value = Evidence> {
    prop_oneof![
        (0..ROOMS, any::<bool>()).prop_map(|(room, hazard)| Evidence::Enter(room, hazard)),
        (0..ROOMS, any::<bool>()).prop_map(|(room, hazard)| Evidence::Sensor(room, hazard)),
        (0..ROOMS).prop_map(Evidence::Spread),
    ]
}

fn arb_config() -> impl Strategy<Value = BeliefConfig> {
    (0.01f64..0.99, 0.5f64..0.99, 0.0f64..=1.0).prop_map(|(prior, reliability, correlation)| {
        BeliefConfig {
            prior,
            reliability,
            correlation,
        }
    })
}

/// 0-1-2-3-4-5 chain with a locked 0-5 door
fn ring() -> WorldGraph {
    let mut world = WorldGraph::with_rooms(ROOMS);
    for i in 0..ROOMS - 1 {
        world.connect(RoomId(i), RoomId(i + 1), false).unwrap();
    }
    world.connect(RoomId(0), RoomId(ROOMS - 1), true).unwrap();
    world
}

fn apply(belief: &mut BeliefState, world: &WorldGraph, evidence: &Evidence) {
    match *evidence {
        Evidence::Enter(room, hazard) => {
            belief.observe(RoomId(room), hazard).unwrap();
        }
        Evidence::Sensor(room, hazard) => {
            belief.observe_noisy(RoomId(room), hazard).unwrap();
        }
        Evidence::Spread(room) => {
            belief.propagate(world, RoomId(room)).unwrap();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_probabilities_stay_in_bounds(
        config in arb_config(),
        sequence in prop::collection::vec(arb_evidence(), 0..40),
    ) {
        let world = ring();
        let mut belief = BeliefState::new(&world, config).unwrap();

        for evidence in &sequence {
            apply(&mut belief, &world, evidence);
            for room in world.room_ids() {
                let p = belief.probability(room).unwrap();
                prop_assert!((0.0..=1.0).contains(&p), "{} has p = {}", room, p);
            }
        }
    }

    #[test]
    fn prop_verified_rooms_never_change(
        config in arb_config(),
        sequence in prop::collection::vec(arb_evidence(), 0..40),
    ) {
        let world = ring();
        let mut belief = BeliefState::new(&world, config).unwrap();
        let mut pinned: Vec<Option<f64>> = vec![None; ROOMS as usize];

        for evidence in &sequence {
            apply(&mut belief, &world, evidence);
            for room in world.room_ids() {
                let p = belief.probability(room).unwrap();
                match pinned[room.index()] {
                    Some(fixed) => prop_assert_eq!(p, fixed),
                    None if belief.is_verified(room).unwrap() => {
                        prop_assert!(p == 0.0 || p == 1.0);
                        pinned[room.index()] = Some(p);
                    }
                    None => {}
                }
            }
        }
    }

    #[test]
    fn prop_path_risk_is_monotonic(
        probabilities in prop::collection::vec(0.0f64..=1.0, ROOMS as usize),
        room in 1..ROOMS,
        bump in 0.0f64..=1.0,
    ) {
        let world = ring();
        let mut belief = BeliefState::new(&world, BeliefConfig::default()).unwrap();
        for (i, p) in probabilities.iter().enumerate() {
            belief.set_probability(RoomId(i as u32), *p).unwrap();
        }
        let path: Vec<RoomId> = world.room_ids().collect();
        let before = belief.risk_of_path(&path).unwrap();

        let raised = (probabilities[room as usize] + bump).min(1.0);
        belief.set_probability(RoomId(room), raised).unwrap();
        let after = belief.risk_of_path(&path).unwrap();

        prop_assert!(after >= before - 1e-12);
        prop_assert!((0.0..=1.0).contains(&after));
    }
}

#[test]
fn test_hazard_observation_spreads_to_neighbors() {
    let world = ring();
    let mut belief = BeliefState::new(&world, BeliefConfig::default()).unwrap();

    belief.observe(RoomId(2), true).unwrap();
    belief.propagate(&world, RoomId(2)).unwrap();

    assert_eq!(belief.probability(RoomId(2)).unwrap(), 1.0);
    assert!(belief.is_verified(RoomId(2)).unwrap());
    for neighbor in [1, 3] {
        assert!((belief.probability(RoomId(neighbor)).unwrap() - 0.44).abs() < 1e-12);
    }
    for far in [0, 4, 5] {
        assert!((belief.probability(RoomId(far)).unwrap() - 0.2).abs() < 1e-12);
    }
}

#[test]
fn test_propagation_crosses_locked_doors() {
    let world = ring();
    let mut belief = BeliefState::new(&world, BeliefConfig::default()).unwrap();

    belief.observe(RoomId(0), true).unwrap();
    belief.propagate(&world, RoomId(0)).unwrap();

    assert!((belief.probability(RoomId(ROOMS - 1)).unwrap() - 0.44).abs() < 1e-12);
}

#[test]
fn test_risk_of_path_excludes_start_room() {
    let world = ring();
    let mut belief = BeliefState::new(&world, BeliefConfig::default()).unwrap();
    belief.set_probability(RoomId(0), 0.7).unwrap();
    belief.set_probability(RoomId(1), 0.1).unwrap();
    belief.set_probability(RoomId(2), 0.5).unwrap();
    belief.set_probability(RoomId(3), 0.0).unwrap();

    let risk = belief
        .risk_of_path(&[RoomId(0), RoomId(1), RoomId(2), RoomId(3)])
        .unwrap();
    assert!((risk - 0.55).abs() < 1e-12);
}
