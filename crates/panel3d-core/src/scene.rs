//! Arena scene graph shared by the importer, the mixer, tickers and the renderer.

use glam::{Mat4, Quat, Vec3};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Local TRS transform of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Axis-aligned bounding box. An empty box has `min > max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut b = Aabb::EMPTY;
        for p in points {
            b.extend(p);
        }
        b
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f32 {
        self.size().length()
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of the eight transformed corners.
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        if self.is_empty() {
            return Aabb::EMPTY;
        }
        Aabb::from_points(self.corners().iter().map(|c| m.transform_point3(*c)))
    }
}

/// One drawable triangle list with a flat base color.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

impl Primitive {
    /// Builds a primitive, generating sequential indices and smooth normals when absent.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        indices: Option<Vec<u32>>,
        base_color: [f32; 4],
    ) -> Self {
        let indices = indices.unwrap_or_else(|| (0..positions.len() as u32).collect());
        let normals = match normals {
            Some(n) if n.len() == positions.len() => n,
            _ => compute_normals(&positions, &indices),
        };
        Self {
            positions,
            normals,
            indices,
            base_color,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().map(|p| Vec3::from_array(*p)))
    }

    /// Upward facing square in the XZ plane centred on the origin.
    pub fn quad_xz(size: f32, base_color: [f32; 4]) -> Self {
        let h = size * 0.5;
        Self {
            positions: vec![[-h, 0.0, -h], [h, 0.0, -h], [h, 0.0, h], [-h, 0.0, h]],
            normals: vec![[0.0, 1.0, 0.0]; 4],
            indices: vec![0, 2, 1, 0, 3, 2],
            base_color,
        }
    }
}

/// Area-weighted vertex normals.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if ia >= positions.len() || ib >= positions.len() || ic >= positions.len() {
            continue;
        }
        let a = Vec3::from_array(positions[ia]);
        let b = Vec3::from_array(positions[ib]);
        let c = Vec3::from_array(positions[ic]);
        let n = (b - a).cross(c - a);
        acc[ia] += n;
        acc[ib] += n;
        acc[ic] += n;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

impl MeshData {
    pub fn bounds(&self) -> Aabb {
        self.primitives
            .iter()
            .fold(Aabb::EMPTY, |acc, p| acc.union(p.bounds()))
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
    pub transform: Transform,
    pub mesh: Option<usize>,
}

impl Node {
    fn empty(name: Option<String>) -> Self {
        Self {
            name,
            parent: None,
            children: SmallVec::new(),
            transform: Transform::IDENTITY,
            mesh: None,
        }
    }
}

/// Node arena with a synthetic root at index 0.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::empty(None)],
        }
    }

    /// Appends a detached node. Use [`SceneGraph::attach`] to parent it.
    pub fn push_detached(
        &mut self,
        name: Option<String>,
        transform: Transform,
        mesh: Option<usize>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = Node::empty(name);
        node.transform = transform;
        node.mesh = mesh;
        self.nodes.push(node);
        id
    }

    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
        transform: Transform,
        mesh: Option<usize>,
    ) -> NodeId {
        let id = self.push_detached(name.map(str::to_owned), transform, mesh);
        self.attach(parent, id);
        id
    }

    /// Re-parents `child` under `parent`. Ignores out-of-range ids and self-parenting.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() {
            return;
        }
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Depth-first pre-order walk from the root, children in insertion order.
    pub fn traverse(&self) -> Vec<NodeId> {
        self.traverse_from(Self::ROOT)
    }

    pub fn traverse_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if start.0 >= self.nodes.len() {
            return out;
        }
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in self.nodes[id.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut d = 0;
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            d += 1;
            cur = self.nodes[p.0].parent;
        }
        d
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut m = self.nodes[id.0].transform.matrix();
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            m = self.nodes[p.0].transform.matrix() * m;
            cur = self.nodes[p.0].parent;
        }
        m
    }

    /// World matrices for every node; detached nodes keep their local matrix.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut out: Vec<Mat4> = self.nodes.iter().map(|n| n.transform.matrix()).collect();
        for id in self.traverse() {
            if let Some(p) = self.nodes[id.0].parent {
                out[id.0] = out[p.0] * self.nodes[id.0].transform.matrix();
            }
        }
        out
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse()
            .into_iter()
            .find(|id| self.nodes[id.0].name.as_deref() == Some(name))
    }
}
