mod common;

use common::{attrs, box_mesh, disc_mesh, model_of, two_disc_model, RecordingFactory};
use glam::{Quat, Vec3};
use panel3d_core::animation::{AnimationClip, Channel, ChannelValues, Interpolation};
use panel3d_core::gears::*;
use panel3d_core::scene::NodeId;
use panel3d_core::*;
use std::cell::Cell;
use std::rc::Rc;

const C1: ContainerId = ContainerId(7);

fn z_angle(q: Quat) -> f32 {
    2.0 * q.z.atan2(q.w)
}

struct CountingResolver {
    label: &'static str,
    result: Vec<NodeId>,
    calls: Rc<Cell<usize>>,
}

impl CountingResolver {
    fn new(label: &'static str, result: Vec<NodeId>) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                label,
                result,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl PartResolver for CountingResolver {
    fn name(&self) -> &'static str {
        self.label
    }

    fn resolve(&self, _model: &Model) -> Vec<NodeId> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone()
    }
}

#[test]
fn name_list_match_short_circuits_later_resolvers() {
    let model = two_disc_model();
    let (names, name_calls) = CountingResolver::new("names", vec![NodeId(2)]);
    let (pattern, pattern_calls) = CountingResolver::new("pattern", vec![NodeId(1)]);
    let (auto, auto_calls) = CountingResolver::new("auto", vec![NodeId(1), NodeId(2)]);

    let found = resolve_parts(
        [
            &names as &dyn PartResolver,
            &pattern as &dyn PartResolver,
            &auto as &dyn PartResolver,
        ],
        &model,
    )
    .unwrap();

    assert_eq!(found.strategy, "names");
    assert_eq!(found.nodes, vec![NodeId(2)]);
    assert_eq!(name_calls.get(), 1);
    assert_eq!(pattern_calls.get(), 0);
    assert_eq!(auto_calls.get(), 0);
}

#[test]
fn empty_results_fall_through_in_order() {
    let model = two_disc_model();
    let (names, _) = CountingResolver::new("names", vec![]);
    let (pattern, pattern_calls) = CountingResolver::new("pattern", vec![]);
    let (auto, auto_calls) = CountingResolver::new("auto", vec![NodeId(1)]);
    let found = resolve_parts(
        [
            &names as &dyn PartResolver,
            &pattern as &dyn PartResolver,
            &auto as &dyn PartResolver,
        ],
        &model,
    )
    .unwrap();
    assert_eq!(found.strategy, "auto");
    assert_eq!(pattern_calls.get(), 1);
    assert_eq!(auto_calls.get(), 1);

    let (none, _) = CountingResolver::new("names", vec![]);
    assert!(resolve_parts([&none as &dyn PartResolver], &model).is_none());
}

#[test]
fn name_list_matches_exact_names_in_traversal_order() {
    let model = model_of(&[
        ("Gear_Big", disc_mesh("m0", 1.0), Vec3::ZERO),
        ("gear_big", disc_mesh("m1", 1.0), Vec3::X),
        ("Small", disc_mesh("m2", 0.3), Vec3::Y),
    ]);
    let r = NameListResolver::from_csv(" Small , Gear_Big ");
    assert_eq!(r.resolve(&model), vec![NodeId(1), NodeId(3)]);
}

#[test]
fn pattern_forms() {
    let bare = compile_pattern("GEAR").unwrap();
    assert!(bare.is_match("big_gear_01"));

    let delimited = compile_pattern(r"/^cog_\d+$/").unwrap();
    assert!(delimited.is_match("cog_12"));
    assert!(!delimited.is_match("COG_12"));

    let flagged = compile_pattern("/^cog/gi").unwrap();
    assert!(flagged.is_match("Cog_front"));

    // Malformed body and unknown flags both use the stock pattern.
    for bad in ["(unclosed", "/cog/q"] {
        let re = compile_pattern(bad).unwrap();
        assert!(re.is_match("Rear_Wheel"), "{bad}");
        assert!(re.is_match("pinion"), "{bad}");
        assert!(!re.is_match("chassis"), "{bad}");
    }
}

#[test]
fn pattern_resolver_filters_node_names() {
    let model = model_of(&[
        ("Cog_A", box_mesh("a", Vec3::ONE), Vec3::ZERO),
        ("Body", box_mesh("b", Vec3::ONE), Vec3::X),
        ("cog_b", box_mesh("c", Vec3::ONE), Vec3::Y),
    ]);
    let r = PatternResolver::new("cog");
    assert_eq!(r.resolve(&model), vec![NodeId(1), NodeId(3)]);
}

#[test]
fn auto_detects_round_flat_parts_sorted_by_radius() {
    let model = model_of(&[
        ("small", disc_mesh("s", 0.25), Vec3::new(0.0, 3.0, 0.0)),
        ("cube", box_mesh("c", Vec3::splat(1.0)), Vec3::ZERO),
        ("plank", box_mesh("p", Vec3::new(2.0, 0.5, 0.05)), Vec3::X),
        ("big", disc_mesh("b", 1.0), Vec3::new(3.0, 0.0, 0.0)),
        ("mid", disc_mesh("m", 0.5), Vec3::new(-3.0, 0.0, 0.0)),
    ]);
    let auto = AutoResolver::default();
    let first = auto.resolve(&model);
    assert_eq!(first, vec![NodeId(4), NodeId(5), NodeId(1)]);
    for _ in 0..5 {
        assert_eq!(auto.resolve(&model), first);
    }

    let capped = AutoResolver {
        max_count: 2,
        ..AutoResolver::default()
    };
    assert_eq!(capped.resolve(&model), vec![NodeId(4), NodeId(5)]);
}

#[test]
fn auto_respects_tolerance_and_flatness() {
    // 10% out of round, depth ratio 2.
    let model = model_of(&[("oval", box_mesh("o", Vec3::new(1.0, 0.9, 0.5)), Vec3::ZERO)]);
    assert_eq!(AutoResolver::default().resolve(&model).len(), 1);

    let strict_round = AutoResolver {
        tolerance: 0.05,
        ..AutoResolver::default()
    };
    assert!(strict_round.resolve(&model).is_empty());

    let strict_flat = AutoResolver {
        flatness: 3.0,
        ..AutoResolver::default()
    };
    assert!(strict_flat.resolve(&model).is_empty());
}

#[test]
fn smaller_parts_spin_faster_with_alternating_signs() {
    let model = model_of(&[
        ("r1", disc_mesh("a", 1.0), Vec3::ZERO),
        ("r05", disc_mesh("b", 0.5), Vec3::X * 3.0),
        ("r025", disc_mesh("c", 0.25), Vec3::X * 6.0),
    ]);
    let nodes = [NodeId(1), NodeId(2), NodeId(3)];

    let parts = plan_speeds(&model, &nodes, 2.0, true);
    let omegas: Vec<f32> = parts.iter().map(|p| p.omega).collect();
    assert!((omegas[0] - 2.0).abs() < 1e-5);
    assert!((omegas[1] + 4.0).abs() < 1e-5);
    assert!((omegas[2] - 8.0).abs() < 1e-5);
    assert!(omegas[0].abs() < omegas[1].abs() && omegas[1].abs() < omegas[2].abs());

    let same_way = plan_speeds(&model, &nodes, 2.0, false);
    assert!(same_way.iter().all(|p| p.omega > 0.0));
}

#[test]
fn degenerate_bounds_use_unit_radius() {
    let mut model = model_of(&[("A", disc_mesh("a", 2.0), Vec3::ZERO)]);
    let empty = model.scene.add_node(
        panel3d_core::scene::SceneGraph::ROOT,
        Some("empty"),
        Default::default(),
        None,
    );
    let parts = plan_speeds(&model, &[NodeId(1), empty], 1.0, false);
    assert_eq!(parts[1].radius, 1.0);
    assert!((parts[1].omega - 2.0).abs() < 1e-5);
}

#[test]
fn gear_ticker_tracks_angle_and_fails_without_model() {
    let mut model = two_disc_model();
    let mut t = GearTicker::new(NodeId(1), Axis::Z, 1.5);
    for _ in 0..4 {
        let mut ctx = TickContext {
            viewer: ViewerId(0),
            model: Some(&mut model),
        };
        t.advance(0.25, &mut ctx).unwrap();
    }
    assert!((t.angle() - 1.5).abs() < 1e-5);
    let q = model.scene.node(NodeId(1)).transform.rotation;
    assert!((z_angle(q) - 1.5).abs() < 1e-4);

    let mut empty = TickContext {
        viewer: ViewerId(0),
        model: None,
    };
    assert!(t.advance(0.1, &mut empty).is_err());

    let mut missing = GearTicker::new(NodeId(99), Axis::X, 1.0);
    let mut ctx = TickContext {
        viewer: ViewerId(0),
        model: Some(&mut model),
    };
    assert!(missing.advance(0.1, &mut ctx).is_err());
}

fn gear_manager() -> (ViewerManager, RecordingFactory, ViewerId) {
    gear_manager_with(&[])
}

fn gear_manager_with(extra: &[(&str, &str)]) -> (ViewerManager, RecordingFactory, ViewerId) {
    let mut mgr = ViewerManager::new();
    mgr.subscribe(Box::new(GearAnimator::new()));
    let mut factory = RecordingFactory::default();
    let mut pairs = vec![("model", "disc.glb")];
    pairs.extend_from_slice(extra);
    let ensured = mgr
        .on_intersection(C1, true, || attrs(&pairs), &mut factory)
        .unwrap()
        .unwrap();
    (mgr, factory, ensured.viewer)
}

#[test]
fn two_discs_end_to_end() {
    let (mut mgr, _factory, id) = gear_manager();
    mgr.complete_load(id, "disc.glb", Ok(two_disc_model()));

    let v = mgr.viewer(id).unwrap();
    assert_eq!(v.load_state(), LoadState::Loaded);
    assert_eq!(v.ticker_count(), 2);

    mgr.frame(10.0);
    mgr.frame(11.0);

    let scene = &mgr.viewer(id).unwrap().model().unwrap().scene;
    let a = scene.find_by_name("A").unwrap();
    let b = scene.find_by_name("B").unwrap();
    assert!((z_angle(scene.node(a).transform.rotation) - 2.0).abs() < 1e-4);
    assert!((z_angle(scene.node(b).transform.rotation) + 4.0).abs() < 1e-4);
}

#[test]
fn second_completion_is_not_redelivered() {
    let (mut mgr, _factory, id) = gear_manager();
    mgr.complete_load(id, "disc.glb", Ok(two_disc_model()));
    mgr.complete_load(id, "disc.glb", Ok(two_disc_model()));
    assert_eq!(mgr.viewer(id).unwrap().ticker_count(), 2);
}

fn with_clip(mut model: Model) -> Model {
    model.clips.push(AnimationClip::new(
        None,
        vec![Channel {
            node: NodeId(1),
            interpolation: Interpolation::Step,
            times: vec![0.0, 1.0],
            values: ChannelValues::Scale(vec![Vec3::ONE, Vec3::ONE]),
        }],
    ));
    model
}

#[test]
fn built_in_clips_win_unless_forced() {
    let (mut mgr, _f, id) = gear_manager();
    mgr.complete_load(id, "disc.glb", Ok(with_clip(two_disc_model())));
    assert_eq!(mgr.viewer(id).unwrap().ticker_count(), 0);

    for flag in [("force-procedural", "true"), ("use-built-in-anim", "false")] {
        let (mut mgr, _f, id) = gear_manager_with(&[flag]);
        mgr.complete_load(id, "disc.glb", Ok(with_clip(two_disc_model())));
        assert_eq!(mgr.viewer(id).unwrap().ticker_count(), 2, "{flag:?}");
    }
}

#[test]
fn explicit_names_pick_a_subset() {
    let (mut mgr, _f, id) = gear_manager_with(&[("gear-names", "B"), ("gear-match", "A")]);
    mgr.complete_load(id, "disc.glb", Ok(two_disc_model()));
    assert_eq!(mgr.viewer(id).unwrap().ticker_count(), 1);

    mgr.frame(0.0);
    mgr.frame(0.5);
    let scene = &mgr.viewer(id).unwrap().model().unwrap().scene;
    let b = scene.find_by_name("B").unwrap();
    // Only one part, so it is also the largest.
    assert!((z_angle(scene.node(b).transform.rotation) - 1.0).abs() < 1e-4);
}

#[test]
fn no_candidates_is_a_quiet_no_op() {
    let (mut mgr, _f, id) = gear_manager_with(&[("gear-axis", "y")]);
    let cubes = model_of(&[("crate", box_mesh("c", Vec3::ONE), Vec3::ZERO)]);
    mgr.complete_load(id, "disc.glb", Ok(cubes));
    let v = mgr.viewer(id).unwrap();
    assert_eq!(v.load_state(), LoadState::Loaded);
    assert_eq!(v.ticker_count(), 0);
    mgr.frame(0.0);
    mgr.frame(0.1);
}

#[test]
fn auto_disabled_finds_nothing_without_names() {
    let (mut mgr, _f, id) = gear_manager_with(&[("gear-auto", "false")]);
    mgr.complete_load(id, "disc.glb", Ok(two_disc_model()));
    assert_eq!(mgr.viewer(id).unwrap().ticker_count(), 0);
}
