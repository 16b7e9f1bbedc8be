//! Procedural gear animation.
//!
//! Listens for loaded models, finds rotor-like parts and spins each one with
//! its own ticker. Parts are found by the first resolver that returns
//! anything: an explicit name list, a name pattern, then a bounding-box
//! heuristic for round flat discs.

use crate::config::Attributes;
use crate::constants::*;
use crate::events::{ModelLoaded, ModelLoadedListener};
use crate::model::Model;
use crate::scene::NodeId;
use crate::viewer::{TickContext, Ticker, Viewer};
use anyhow::anyhow;
use glam::{Quat, Vec3};
use regex::{Regex, RegexBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Unknown values map to Z.
    pub fn parse(s: Option<&str>) -> Axis {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("x") => Axis::X,
            Some("y") => Axis::Y,
            _ => Axis::Z,
        }
    }

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GearConfig {
    pub names: Vec<String>,
    pub pattern: Option<String>,
    pub auto: bool,
    pub max_count: usize,
    pub tolerance: f32,
    pub flatness: f32,
    pub axis: Axis,
    pub speed: f32,
    pub alternate: bool,
    pub log_tree: bool,
    /// Animate even when the asset carries its own clips.
    pub force_procedural: bool,
}

impl GearConfig {
    pub fn from_attributes(attrs: &Attributes) -> Self {
        let names = attrs
            .text("gear-names")
            .map(|csv| {
                csv.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            names,
            pattern: attrs.text("gear-match").map(str::to_owned),
            auto: attrs.flag("gear-auto", true),
            max_count: attrs.count("gear-count", GEAR_DEFAULT_COUNT),
            tolerance: attrs.float("gear-tolerance", GEAR_DEFAULT_TOLERANCE, |v| v >= 0.0),
            flatness: attrs.float("gear-flatness", GEAR_DEFAULT_FLATNESS, |v| v > 0.0),
            axis: Axis::parse(attrs.get("gear-axis")),
            speed: attrs.float("gear-speed", GEAR_DEFAULT_SPEED, |_| true),
            alternate: attrs.flag("gear-alternate-dir", true),
            log_tree: attrs.flag("log-tree", false),
            force_procedural: attrs.flag("force-procedural", false)
                || !attrs.flag("use-built-in-anim", true),
        }
    }

    /// Resolvers in precedence order; only declared strategies are included.
    pub fn resolvers(&self) -> Vec<Box<dyn PartResolver>> {
        let mut out: Vec<Box<dyn PartResolver>> = Vec::new();
        if !self.names.is_empty() {
            out.push(Box::new(NameListResolver::new(self.names.clone())));
        }
        if let Some(p) = &self.pattern {
            out.push(Box::new(PatternResolver::new(p)));
        }
        if self.auto {
            out.push(Box::new(AutoResolver {
                max_count: self.max_count,
                tolerance: self.tolerance,
                flatness: self.flatness,
            }));
        }
        out
    }
}

/// One strategy for picking rotor-like nodes out of a model.
pub trait PartResolver {
    fn name(&self) -> &'static str;
    fn resolve(&self, model: &Model) -> Vec<NodeId>;
}

/// Exact node names, in traversal order.
pub struct NameListResolver {
    names: Vec<String>,
}

impl NameListResolver {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn from_csv(csv: &str) -> Self {
        Self::new(
            csv.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }
}

impl PartResolver for NameListResolver {
    fn name(&self) -> &'static str {
        "names"
    }

    fn resolve(&self, model: &Model) -> Vec<NodeId> {
        model
            .scene
            .traverse()
            .into_iter()
            .filter(|id| {
                model
                    .scene
                    .node(*id)
                    .name
                    .as_deref()
                    .is_some_and(|n| self.names.iter().any(|w| w == n))
            })
            .collect()
    }
}

pub struct PatternResolver {
    regex: Option<Regex>,
}

impl PatternResolver {
    pub fn new(pattern: &str) -> Self {
        Self {
            regex: compile_pattern(pattern),
        }
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }
}

impl PartResolver for PatternResolver {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn resolve(&self, model: &Model) -> Vec<NodeId> {
        let Some(re) = &self.regex else {
            return Vec::new();
        };
        model
            .scene
            .traverse()
            .into_iter()
            .filter(|id| {
                model
                    .scene
                    .node(*id)
                    .name
                    .as_deref()
                    .is_some_and(|n| re.is_match(n))
            })
            .collect()
    }
}

/// Compiles `/body/flags` or a bare case-insensitive pattern. Malformed input
/// yields the stock gear/cog/pinion/wheel pattern.
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    let parsed = match pattern.strip_prefix('/').and_then(|rest| {
        rest.rfind('/')
            .map(|end| (&rest[..end], &rest[end + 1..]))
    }) {
        Some((body, flags)) => build_with_flags(body, flags),
        None => RegexBuilder::new(pattern).case_insensitive(true).build().ok(),
    };
    parsed.or_else(|| {
        log::warn!("[gears] invalid gear-match {:?}, using default pattern", pattern);
        Regex::new(GEAR_FALLBACK_PATTERN).ok()
    })
}

fn build_with_flags(body: &str, flags: &str) -> Option<Regex> {
    let mut builder = RegexBuilder::new(body);
    for f in flags.chars() {
        match f {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            // Stateful or unicode flags have no effect on a plain match test.
            'g' | 'u' | 'y' | 'd' => {}
            _ => return None,
        }
    }
    builder.build().ok()
}

/// Round flat discs: nearly equal X/Y extents, thin along Z.
#[derive(Clone, Copy, Debug)]
pub struct AutoResolver {
    pub max_count: usize,
    pub tolerance: f32,
    pub flatness: f32,
}

impl Default for AutoResolver {
    fn default() -> Self {
        Self {
            max_count: GEAR_DEFAULT_COUNT,
            tolerance: GEAR_DEFAULT_TOLERANCE,
            flatness: GEAR_DEFAULT_FLATNESS,
        }
    }
}

impl PartResolver for AutoResolver {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn resolve(&self, model: &Model) -> Vec<NodeId> {
        let worlds = model.scene.world_matrices();
        let mut candidates: Vec<(NodeId, f32)> = model
            .mesh_nodes()
            .into_iter()
            .filter_map(|id| {
                let s = model.node_bounds_with(id, &worlds).size();
                let planar = s.x.max(s.y);
                let round = (s.x - s.y).abs() / planar.max(1e-6) <= self.tolerance;
                let flat = planar / s.z.max(1e-6) >= self.flatness;
                (round && flat).then_some((id, planar * 0.5))
            })
            .collect();
        // Stable, so equal radii keep traversal order.
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(self.max_count);
        candidates.into_iter().map(|(id, _)| id).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub strategy: &'static str,
    pub nodes: Vec<NodeId>,
}

/// First resolver with a non-empty result wins; later ones are not consulted.
pub fn resolve_parts<'a>(
    resolvers: impl IntoIterator<Item = &'a dyn PartResolver>,
    model: &Model,
) -> Option<Resolution> {
    resolvers.into_iter().find_map(|r| {
        let nodes = r.resolve(model);
        (!nodes.is_empty()).then(|| Resolution {
            strategy: r.name(),
            nodes,
        })
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GearPart {
    pub node: NodeId,
    pub radius: f32,
    pub omega: f32,
}

/// `omega = base * (r_max / r) * dir`, alternating `dir` by selection index.
pub fn plan_speeds(model: &Model, nodes: &[NodeId], base: f32, alternate: bool) -> Vec<GearPart> {
    let worlds = model.scene.world_matrices();
    let radii: Vec<f32> = nodes
        .iter()
        .map(|id| {
            let r = model.node_bounds_with(*id, &worlds).size().max_element() * 0.5;
            if r > 0.0 && r.is_finite() {
                r
            } else {
                1.0
            }
        })
        .collect();
    let r_max = radii.iter().copied().fold(0.0_f32, f32::max);
    let r_max = if r_max > 0.0 { r_max } else { 1.0 };
    nodes
        .iter()
        .zip(&radii)
        .enumerate()
        .map(|(i, (node, r))| {
            let dir = if alternate && i % 2 == 1 { -1.0 } else { 1.0 };
            GearPart {
                node: *node,
                radius: *r,
                omega: base * (r_max / r) * dir,
            }
        })
        .collect()
}

/// Spins one node about a local axis at a constant rate.
#[derive(Clone, Debug)]
pub struct GearTicker {
    node: NodeId,
    axis: Vec3,
    omega: f32,
    angle: f32,
}

impl GearTicker {
    pub fn new(node: NodeId, axis: Axis, omega: f32) -> Self {
        Self {
            node,
            axis: axis.unit(),
            omega,
            angle: 0.0,
        }
    }

    pub fn omega(&self) -> f32 {
        self.omega
    }

    /// Total rotation applied so far, in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }
}

impl Ticker for GearTicker {
    fn advance(&mut self, dt: f32, ctx: &mut TickContext<'_>) -> anyhow::Result<()> {
        let model = ctx
            .model
            .as_deref_mut()
            .ok_or_else(|| anyhow!("viewer {} has no model", ctx.viewer.0))?;
        let node = model
            .scene
            .get_mut(self.node)
            .ok_or_else(|| anyhow!("gear node {} missing", self.node.0))?;
        let step = self.omega * dt;
        node.transform.rotation =
            (node.transform.rotation * Quat::from_axis_angle(self.axis, step)).normalize();
        self.angle += step;
        Ok(())
    }

    fn label(&self) -> &str {
        "gear"
    }
}

/// Model-loaded listener that wires gear tickers into viewers.
#[derive(Debug, Default)]
pub struct GearAnimator {
    animated: usize,
}

impl GearAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of viewers that received gear tickers.
    pub fn animated(&self) -> usize {
        self.animated
    }
}

impl ModelLoadedListener for GearAnimator {
    fn on_model_loaded(&mut self, event: &ModelLoaded, viewer: &mut Viewer) {
        let cfg = GearConfig::from_attributes(viewer.attributes());
        let Some(model) = viewer.model() else {
            return;
        };
        if cfg.log_tree {
            log::info!("[gears] scene graph of {}:\n{}", event.url, model.tree_dump());
        }
        if event.clip_count > 0 && !cfg.force_procedural {
            log::debug!(
                "[gears] {} has {} built-in clips, skipping procedural animation",
                event.url,
                event.clip_count
            );
            return;
        }

        let resolvers = cfg.resolvers();
        let Some(found) = resolve_parts(resolvers.iter().map(|r| r.as_ref()), model) else {
            log::warn!(
                "[gears] no gear-like nodes found in {}; set gear-names or gear-match, or enable log-tree to inspect",
                event.url
            );
            return;
        };
        let parts = plan_speeds(model, &found.nodes, cfg.speed, cfg.alternate);
        let names: Vec<&str> = parts
            .iter()
            .map(|p| model.scene.node(p.node).name.as_deref().unwrap_or("?"))
            .collect();
        log::info!(
            "[gears] {} parts via {} in {}: {}",
            parts.len(),
            found.strategy,
            event.url,
            names.join(", ")
        );

        for p in parts {
            viewer.add_ticker(Box::new(GearTicker::new(p.node, cfg.axis, p.omega)));
        }
        self.animated += 1;
    }
}
