mod common;

use anyhow::bail;
use common::{attrs, two_disc_model, RecordingFactory};
use glam::Vec3;
use panel3d_core::animation::{AnimationClip, Channel, ChannelValues, Interpolation};
use panel3d_core::scene::NodeId;
use panel3d_core::*;
use std::cell::RefCell;
use std::rc::Rc;

const C1: ContainerId = ContainerId(1);
const C2: ContainerId = ContainerId(2);

fn show(reg: &mut ViewerRegistry, factory: &mut RecordingFactory, c: ContainerId, pairs: &[(&str, &str)]) -> ViewerId {
    reg.on_intersection(c, true, || attrs(pairs), factory)
        .unwrap()
        .unwrap()
        .viewer
}

fn dt_recorder(out: Rc<RefCell<Vec<f32>>>) -> Box<dyn Ticker> {
    Box::new(FnTicker::new(move |dt, _| {
        out.borrow_mut().push(dt);
        Ok(())
    }))
}

#[test]
fn first_frame_has_zero_dt() {
    let mut reg = ViewerRegistry::new();
    let mut sched = RenderScheduler::new();
    let stats = sched.frame(12.5, &mut reg);
    assert_eq!(stats.dt, 0.0);
    assert_eq!(sched.frame(12.75, &mut reg).dt, 0.25);
}

#[test]
fn hidden_viewers_are_never_advanced_or_drawn() {
    let mut reg = ViewerRegistry::new();
    let mut factory = RecordingFactory::default();
    let mut sched = RenderScheduler::new();

    let a = show(&mut reg, &mut factory, C1, &[]);
    let b = show(&mut reg, &mut factory, C2, &[("autorotate", "true")]);
    reg.on_intersection(C2, false, Attributes::new, &mut factory)
        .unwrap();

    let hidden_ticks = Rc::new(RefCell::new(Vec::new()));
    reg.get_mut(b).unwrap().add_ticker(dt_recorder(hidden_ticks.clone()));
    let azimuth = reg.get(b).unwrap().controls().azimuth();

    for i in 0..50 {
        let stats = sched.frame(i as f64 / 60.0, &mut reg);
        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.skipped, 1);
    }

    assert!(hidden_ticks.borrow().is_empty());
    assert_eq!(reg.get(b).unwrap().frames_drawn(), 0);
    assert_eq!(factory.log_for(C2).borrow().renders, 0);
    assert_eq!(reg.get(b).unwrap().controls().azimuth(), azimuth);
    assert_eq!(reg.get(a).unwrap().frames_drawn(), 50);
}

#[test]
fn reappearing_viewer_gets_frame_delta_not_hidden_time() {
    let mut reg = ViewerRegistry::new();
    let mut factory = RecordingFactory::default();
    let mut sched = RenderScheduler::new();

    show(&mut reg, &mut factory, C1, &[]);
    let b = show(&mut reg, &mut factory, C2, &[]);
    let ticks = Rc::new(RefCell::new(Vec::new()));
    reg.get_mut(b).unwrap().add_ticker(dt_recorder(ticks.clone()));

    sched.frame(0.0, &mut reg);
    reg.on_intersection(C2, false, Attributes::new, &mut factory)
        .unwrap();
    for i in 1..=10 {
        sched.frame(i as f64 * 0.5, &mut reg);
    }
    reg.on_intersection(C2, true, Attributes::new, &mut factory)
        .unwrap();
    sched.frame(5.25, &mut reg);

    let ticks = ticks.borrow();
    assert_eq!(ticks.len(), 2);
    assert_eq!(ticks[0], 0.0);
    assert!((ticks[1] - 0.25).abs() < 1e-6);
}

#[test]
fn tickers_run_in_order_and_failures_are_isolated() {
    let mut reg = ViewerRegistry::new();
    let mut factory = RecordingFactory::default();
    let mut sched = RenderScheduler::new();
    let a = show(&mut reg, &mut factory, C1, &[]);
    let b = show(&mut reg, &mut factory, C2, &[]);

    let order = Rc::new(RefCell::new(Vec::new()));
    let push = |tag: &'static str| {
        let order = order.clone();
        Box::new(FnTicker::new(move |_, _| {
            order.borrow_mut().push(tag);
            Ok(())
        })) as Box<dyn Ticker>
    };
    let failing = {
        let order = order.clone();
        Box::new(FnTicker::new(move |_, _| {
            order.borrow_mut().push("boom");
            bail!("gear node vanished")
        })) as Box<dyn Ticker>
    };

    let va = reg.get_mut(a).unwrap();
    va.add_ticker(push("a1"));
    va.add_ticker(failing);
    va.add_ticker(push("a3"));
    reg.get_mut(b).unwrap().add_ticker(push("b1"));

    sched.frame(0.0, &mut reg);
    let stats = sched.frame(0.1, &mut reg);

    assert_eq!(stats.drawn, 2);
    assert_eq!(
        *order.borrow(),
        vec!["a1", "boom", "a3", "b1", "a1", "boom", "a3", "b1"]
    );
}

#[test]
fn tickers_see_the_loaded_model() {
    let mut reg = ViewerRegistry::new();
    let mut factory = RecordingFactory::default();
    let mut sched = RenderScheduler::new();
    let a = show(&mut reg, &mut factory, C1, &[("model", "m.glb")]);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    reg.get_mut(a)
        .unwrap()
        .add_ticker(Box::new(FnTicker::new(move |_, ctx| {
            s.borrow_mut().push(ctx.model.is_some());
            Ok(())
        })));

    sched.frame(0.0, &mut reg);
    reg.get_mut(a).unwrap().attach_model(two_disc_model());
    sched.frame(0.1, &mut reg);
    assert_eq!(*seen.borrow(), vec![false, true]);
}

#[test]
fn render_errors_do_not_stop_other_viewers() {
    let mut reg = ViewerRegistry::new();
    let mut factory = RecordingFactory {
        fail_render: true,
        ..Default::default()
    };
    let mut sched = RenderScheduler::new();
    let broken = show(&mut reg, &mut factory, C1, &[]);
    factory.fail_render = false;
    let fine = show(&mut reg, &mut factory, C2, &[]);

    for i in 0..3 {
        let stats = sched.frame(i as f64, &mut reg);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.drawn, 1);
    }
    assert_eq!(reg.get(broken).unwrap().render_failures(), 3);
    assert_eq!(reg.get(fine).unwrap().frames_drawn(), 3);
}

#[test]
fn auto_rotation_spins_and_pauses_on_interaction() {
    let mut reg = ViewerRegistry::new();
    let mut factory = RecordingFactory::default();
    let mut sched = RenderScheduler::new();
    let id = show(&mut reg, &mut factory, C1, &[("autorotate", "true")]);

    sched.frame(0.0, &mut reg);
    let before = reg.get(id).unwrap().controls().azimuth();
    sched.frame(1.0, &mut reg);
    let after = reg.get(id).unwrap().controls().azimuth();
    // 2π/60 · 2.0 rad per second
    assert!((before - after - std::f32::consts::TAU / 30.0).abs() < 1e-4);

    let v = reg.get_mut(id).unwrap();
    v.on_pointer_down();
    assert!(!v.is_auto_rotating());
    v.on_pointer_up(1.0);
    assert!(v.resume_pending());

    sched.frame(2.0, &mut reg);
    assert!(!reg.get(id).unwrap().is_auto_rotating());
    sched.frame(2.9, &mut reg);
    assert!(reg.get(id).unwrap().is_auto_rotating());
}

#[test]
fn interaction_before_deadline_cancels_resume() {
    let mut reg = ViewerRegistry::new();
    let mut factory = RecordingFactory::default();
    let mut sched = RenderScheduler::new();
    let id = show(&mut reg, &mut factory, C1, &[("autorotate", "true")]);

    let v = reg.get_mut(id).unwrap();
    v.on_pointer_down();
    v.on_pointer_up(0.0);
    v.on_wheel(0.95);
    assert!(!v.resume_pending());

    sched.frame(5.0, &mut reg);
    assert!(!reg.get(id).unwrap().is_auto_rotating());
}

#[test]
fn no_resume_without_autorotate_config() {
    let mut reg = ViewerRegistry::new();
    let mut factory = RecordingFactory::default();
    let mut sched = RenderScheduler::new();
    let id = show(&mut reg, &mut factory, C1, &[]);

    reg.get_mut(id).unwrap().on_pointer_up(0.0);
    sched.frame(3.0, &mut reg);
    let v = reg.get(id).unwrap();
    assert!(!v.is_auto_rotating());
    assert!(!v.resume_pending());
}

fn clip_model() -> Model {
    let mut m = two_disc_model();
    let clip = AnimationClip::new(
        Some("bob".into()),
        vec![Channel {
            node: NodeId(1),
            interpolation: Interpolation::Linear,
            times: vec![0.0, 1.0, 2.0],
            values: ChannelValues::Translation(vec![
                Vec3::ZERO,
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::ZERO,
            ]),
        }],
    );
    m.clips.push(clip);
    m
}

#[test]
fn embedded_clips_suppress_auto_rotation_and_advance() {
    let mut reg = ViewerRegistry::new();
    let mut factory = RecordingFactory::default();
    let mut sched = RenderScheduler::new();
    let id = show(&mut reg, &mut factory, C1, &[("autorotate", "true"), ("model", "m.glb")]);

    let v = reg.get_mut(id).unwrap();
    assert!(v.is_auto_rotating());
    v.attach_model(clip_model());
    assert!(!v.is_auto_rotating());
    assert_eq!(v.mixer().map(|m| m.clip_count()), Some(1));

    sched.frame(0.0, &mut reg);
    sched.frame(0.5, &mut reg);
    let y = reg.get(id).unwrap().model().unwrap().scene.node(NodeId(1)).transform.translation.y;
    assert!((y - 0.5).abs() < 1e-5);

    // The idle timer never re-enables rotation while a mixer plays.
    reg.get_mut(id).unwrap().on_pointer_up(0.5);
    sched.frame(3.0, &mut reg);
    assert!(!reg.get(id).unwrap().is_auto_rotating());
}
