//! Laws every graph operation must satisfy, checked over generated trees.

// Tests panic on failure by design.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use armada_graph::{Entity, Graph, GraphError, ShipEntity, apply, denormalize, normalize};
use armada_types::{
    AirSquadronMode, AirSquadronState, EntityKind, FleetState, GearId, GearState, OrgState,
    OrgType, ShipState,
};
use pretty_assertions::assert_eq;
use proptest::option;
use proptest::prelude::*;
use proptest::sample::Index;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

// Every level is boxed so the value trees live on the heap. Unboxed, a full
// organization's tree is large enough to overflow a test thread's stack.

fn gear() -> BoxedStrategy<GearState> {
    (1u32..600, option::of(0i32..=120), option::of(0i32..=10))
        .prop_map(|(gear_id, exp, stars)| GearState {
            id: None,
            gear_id,
            exp,
            stars,
        })
        .boxed()
}

fn ship() -> BoxedStrategy<ShipState> {
    (
        1u32..1600,
        option::of(1i32..=180),
        option::of(0i32..=100),
        prop::array::uniform5(option::of(gear())),
        option::of(gear()),
        prop::array::uniform5(option::of(0i32..=99)),
    )
        .prop_map(|(ship_id, level, morale, gears, gx, sizes)| {
            let mut ship = ShipState::new(ship_id);
            ship.attrs.level = level;
            ship.attrs.morale = morale;
            ship.set_gear_slots(gears);
            ship.gx = gx;
            ship.set_slot_sizes(sizes);
            ship
        })
        .boxed()
}

fn fleet() -> BoxedStrategy<FleetState> {
    (
        option::of(6i32..=7),
        prop::array::uniform7(option::weighted(0.4, ship())),
    )
        .prop_map(|(len, ships)| {
            let mut fleet = FleetState {
                len,
                ..FleetState::default()
            };
            fleet.set_ship_slots(ships);
            fleet
        })
        .boxed()
}

fn squadron() -> BoxedStrategy<AirSquadronState> {
    (
        option::of(prop_oneof![
            Just(AirSquadronMode::Sortie),
            Just(AirSquadronMode::AirDefense)
        ]),
        prop::array::uniform4(option::of(gear())),
        prop::array::uniform4(option::of(0i32..=18)),
    )
        .prop_map(|(mode, gears, sizes)| {
            let mut squadron = AirSquadronState {
                mode,
                ..AirSquadronState::default()
            };
            squadron.set_gear_slots(gears);
            squadron.set_slot_sizes(sizes);
            squadron
        })
        .boxed()
}

fn org() -> BoxedStrategy<OrgState> {
    (
        prop::array::uniform4(option::weighted(0.5, fleet())),
        prop::array::uniform3(option::weighted(0.5, squadron())),
        option::of(1i32..=120),
        option::of(prop_oneof![
            Just(OrgType::Single),
            Just(OrgType::CarrierTaskForce),
            Just(OrgType::EnemyCombined)
        ]),
    )
        .prop_map(|(fleets, squadrons, hq_level, org_type)| {
            let mut org = OrgState {
                hq_level,
                org_type,
                ..OrgState::default()
            };
            org.set_fleet_slots(fleets);
            org.set_squadron_slots(squadrons);
            org
        })
        .boxed()
}

/// Give every node in the tree a distinct, deterministic identifier.
fn with_ids(mut org: OrgState) -> OrgState {
    let mut n = 0u32;
    let mut next = || {
        n += 1;
        format!("t{n}")
    };
    let label_gear = |g: &mut Option<GearState>, next: &mut dyn FnMut() -> String| {
        if let Some(g) = g {
            g.id = Some(next().into());
        }
    };

    org.id = Some(next().into());
    for fleet in [&mut org.f1, &mut org.f2, &mut org.f3, &mut org.f4]
        .into_iter()
        .flatten()
    {
        fleet.id = Some(next().into());
        for ship in [
            &mut fleet.s1,
            &mut fleet.s2,
            &mut fleet.s3,
            &mut fleet.s4,
            &mut fleet.s5,
            &mut fleet.s6,
            &mut fleet.s7,
        ]
        .into_iter()
        .flatten()
        {
            ship.id = Some(next().into());
            for g in [
                &mut ship.g1,
                &mut ship.g2,
                &mut ship.g3,
                &mut ship.g4,
                &mut ship.g5,
                &mut ship.gx,
            ] {
                label_gear(g, &mut next);
            }
        }
    }
    for squadron in [&mut org.a1, &mut org.a2, &mut org.a3]
        .into_iter()
        .flatten()
    {
        squadron.id = Some(next().into());
        for g in [
            &mut squadron.g1,
            &mut squadron.g2,
            &mut squadron.g3,
            &mut squadron.g4,
        ] {
            label_gear(g, &mut next);
        }
    }
    org
}

fn rows(graph: &Graph) -> Vec<(EntityKind, String)> {
    graph
        .iter_any()
        .map(|row| (row.kind(), row.id().to_owned()))
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn trees_with_ids_round_trip(tree in org().prop_map(with_ids)) {
        let (graph, root) = normalize(&tree).expect("normalize");
        let back: OrgState = denormalize(&graph, &root).expect("denormalize");
        prop_assert_eq!(back, tree);
    }

    #[test]
    fn normalized_graph_has_no_dangling_references(tree in org()) {
        let (graph, _) = normalize(&tree).expect("normalize");
        prop_assert!(graph.dangling_references().is_empty());
    }

    #[test]
    fn removal_never_dangles_and_never_mutates_input(
        tree in org().prop_map(with_ids),
        pick in any::<Index>(),
    ) {
        let (graph, _) = normalize(&tree).expect("normalize");
        let before = graph.clone();
        let all = rows(&graph);
        let (kind, id) = pick.get(&all).clone();

        let next = apply(&graph, |draft| draft.remove(kind, &id)).expect("apply");

        prop_assert_eq!(&graph, &before);
        prop_assert!(next.dangling_references().is_empty());
        prop_assert!(!next.contains(kind, &id));
        prop_assert_eq!(next.len(kind) + 1, graph.len(kind));
    }

    #[test]
    fn rejected_change_leaves_no_trace(tree in org().prop_map(with_ids)) {
        let (graph, root) = normalize(&tree).expect("normalize");
        let before = graph.clone();
        let result = apply(&graph, |draft| {
            draft.create_gear(1)?;
            draft.update::<armada_graph::OrgEntity>(&root, |o| o.hq_level = Some(1))?;
            draft.remove(EntityKind::Ship, "no-such-ship")
        });
        prop_assert!(
            matches!(result, Err(GraphError::InvalidReference { .. })),
            "expected InvalidReference, got {:?}",
            result
        );
        prop_assert_eq!(graph, before);
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn removing_shared_gear_clears_both_holders_in_one_change() {
    let shared = GearId::from("shared");
    let mut fleet = FleetState::default();
    let mut first = ShipState::new(1);
    first.g2 = Some(GearState {
        id: Some(shared.clone()),
        ..GearState::new(7)
    });
    fleet.s1 = Some(first);
    fleet.s2 = Some(ShipState::new(2));
    let (graph, root) = normalize(&fleet).expect("normalize");

    // Point the second ship's overflow slot at the same gear.
    let second = graph
        .get::<armada_graph::FleetEntity>(&root)
        .and_then(|f| f.ships[1].clone())
        .expect("second ship");
    let graph = apply(&graph, |draft| {
        draft.set_ship_overflow(&second, Some(shared.clone()))
    })
    .expect("link");
    let holders = graph
        .all::<ShipEntity>()
        .filter(|s| s.references().iter().any(|r| r.id == shared.as_str()))
        .count();
    assert_eq!(holders, 2);

    let graph = apply(&graph, |draft| draft.remove(EntityKind::Gear, shared.as_str()))
        .expect("remove");

    assert_eq!(graph.len(EntityKind::Gear), 0);
    for ship in graph.all::<ShipEntity>() {
        assert_eq!(ship.gears, [None, None, None, None, None]);
        assert_eq!(ship.gx, None);
    }
    assert!(graph.dangling_references().is_empty());
}

#[test]
fn denormalizing_after_removal_keeps_positions() {
    let mut ship = ShipState::new(131);
    ship.g1 = Some(GearState::new(1));
    ship.g2 = Some(GearState::new(2));
    ship.g3 = Some(GearState::new(3));
    let (graph, root) = normalize(&ship).expect("normalize");
    let middle = graph
        .get::<ShipEntity>(&root)
        .and_then(|s| s.gears[1].clone())
        .expect("middle gear");

    let graph = apply(&graph, |draft| draft.remove(EntityKind::Gear, middle.as_str()))
        .expect("remove");
    let back: ShipState = denormalize(&graph, &root).expect("denormalize");

    assert_eq!(back.g1.map(|g| g.gear_id), Some(1));
    assert_eq!(back.g2, None);
    assert_eq!(back.g3.map(|g| g.gear_id), Some(3));
}

#[test]
fn org_json_normalizes_end_to_end() {
    let json = serde_json::json!({
        "id": "org-1",
        "hq_level": 120,
        "org_type": "SurfaceTaskForce",
        "f1": {
            "id": "fleet-1",
            "len": 6,
            "s1": { "id": "ship-1", "ship_id": 131, "level": 99, "g1": { "id": "gear-1", "gear_id": 9 } }
        },
        "a1": { "id": "air-1", "mode": "AirDefense", "g1": { "id": "gear-2", "gear_id": 168 } }
    });
    let tree: OrgState = serde_json::from_value(json).expect("valid tree");
    let (graph, root) = Graph::normalize(&tree).expect("normalize");

    assert_eq!(root.as_str(), "org-1");
    assert_eq!(graph.len(EntityKind::Gear), 2);
    let back: OrgState = graph.denormalize(&root).expect("denormalize");
    assert_eq!(back, tree);
}
