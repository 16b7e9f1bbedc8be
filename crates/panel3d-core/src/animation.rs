//! Embedded animation clips and a looping mixer that plays all of them at once.

use crate::scene::{NodeId, SceneGraph};
use glam::{Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
}

#[derive(Clone, Debug)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl ChannelValues {
    fn len(&self) -> usize {
        match self {
            ChannelValues::Translation(v) | ChannelValues::Scale(v) => v.len(),
            ChannelValues::Rotation(v) => v.len(),
        }
    }
}

/// Keyframes driving one TRS property of one node.
#[derive(Clone, Debug)]
pub struct Channel {
    pub node: NodeId,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: ChannelValues,
}

impl Channel {
    /// Index of the segment start and the blend factor towards the next key.
    fn locate(&self, t: f32) -> Option<(usize, usize, f32)> {
        let n = self.times.len().min(self.values.len());
        if n == 0 {
            return None;
        }
        if n == 1 || t <= self.times[0] {
            return Some((0, 0, 0.0));
        }
        if t >= self.times[n - 1] {
            return Some((n - 1, n - 1, 0.0));
        }
        let next = self.times[..n].partition_point(|k| *k <= t);
        let prev = next - 1;
        let span = self.times[next] - self.times[prev];
        let f = if span > 0.0 {
            (t - self.times[prev]) / span
        } else {
            0.0
        };
        match self.interpolation {
            Interpolation::Step => Some((prev, prev, 0.0)),
            Interpolation::Linear => Some((prev, next, f)),
        }
    }

    fn apply(&self, t: f32, scene: &mut SceneGraph) {
        let Some((a, b, f)) = self.locate(t) else {
            return;
        };
        let Some(node) = scene.get_mut(self.node) else {
            return;
        };
        match &self.values {
            ChannelValues::Translation(v) => node.transform.translation = v[a].lerp(v[b], f),
            ChannelValues::Scale(v) => node.transform.scale = v[a].lerp(v[b], f),
            ChannelValues::Rotation(v) => {
                node.transform.rotation = v[a].slerp(v[b], f).normalize();
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: Option<String>,
    pub channels: Vec<Channel>,
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(name: Option<String>, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0_f32, f32::max);
        Self {
            name,
            channels,
            duration,
        }
    }

    pub fn sample(&self, t: f32, scene: &mut SceneGraph) {
        for ch in &self.channels {
            ch.apply(t, scene);
        }
    }
}

/// Plays every clip of a model, each looping over its own duration.
#[derive(Clone, Debug, Default)]
pub struct AnimationMixer {
    time: f32,
    clip_count: usize,
}

impl AnimationMixer {
    pub fn new(clips: &[AnimationClip]) -> Self {
        Self {
            time: 0.0,
            clip_count: clips.len(),
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn clip_count(&self) -> usize {
        self.clip_count
    }

    pub fn update(&mut self, dt: f32, clips: &[AnimationClip], scene: &mut SceneGraph) {
        self.time += dt.max(0.0);
        for clip in clips {
            let t = if clip.duration > 0.0 {
                self.time % clip.duration
            } else {
                0.0
            };
            clip.sample(t, scene);
        }
    }
}
