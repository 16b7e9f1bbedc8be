//! A loaded 3D asset: scene graph, mesh data and embedded clips.

use crate::animation::{AnimationClip, Channel, ChannelValues, Interpolation};
use crate::error::LoadError;
use crate::scene::{Aabb, MeshData, NodeId, Primitive, SceneGraph, Transform};
use glam::{Mat4, Quat, Vec3};
use std::fmt::Write as _;

const DEFAULT_BASE_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

#[derive(Clone, Debug, Default)]
pub struct Model {
    pub scene: SceneGraph,
    pub meshes: Vec<MeshData>,
    pub clips: Vec<AnimationClip>,
}

impl Model {
    pub fn new(scene: SceneGraph, meshes: Vec<MeshData>, clips: Vec<AnimationClip>) -> Self {
        Self {
            scene,
            meshes,
            clips,
        }
    }

    /// Decodes a `.glb` or self-contained `.gltf` (embedded or data-URI buffers).
    pub fn from_gltf_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let (document, buffers, _images) = gltf::import_slice(bytes)?;
        let scene_def = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(LoadError::NoScene)?;

        let read = |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|d| &d[..]);

        let meshes = document
            .meshes()
            .map(|mesh| {
                let primitives = mesh
                    .primitives()
                    .filter(|p| p.mode() == gltf::mesh::Mode::Triangles)
                    .filter_map(|p| {
                        let reader = p.reader(read);
                        let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
                        let normals = reader.read_normals().map(|n| n.collect());
                        let indices = reader.read_indices().map(|i| i.into_u32().collect());
                        let color = p.material().pbr_metallic_roughness().base_color_factor();
                        Some(Primitive::new(positions, normals, indices, color))
                    })
                    .collect();
                MeshData {
                    name: mesh.name().map(str::to_owned),
                    primitives,
                }
            })
            .collect::<Vec<_>>();

        // glTF node i becomes NodeId(i + 1); 0 is the synthetic root.
        let mut scene = SceneGraph::new();
        for node in document.nodes() {
            let (t, r, s) = node.transform().decomposed();
            let name = node
                .name()
                .map(str::to_owned)
                .or_else(|| node.mesh().and_then(|m| m.name().map(str::to_owned)));
            scene.push_detached(
                name,
                Transform {
                    translation: Vec3::from_array(t),
                    rotation: Quat::from_array(r).normalize(),
                    scale: Vec3::from_array(s),
                },
                node.mesh().map(|m| m.index()),
            );
        }
        for node in document.nodes() {
            for child in node.children() {
                scene.attach(NodeId(node.index() + 1), NodeId(child.index() + 1));
            }
        }
        for root in scene_def.nodes() {
            scene.attach(SceneGraph::ROOT, NodeId(root.index() + 1));
        }

        let clips = document
            .animations()
            .map(|anim| {
                let channels = anim
                    .channels()
                    .filter_map(|channel| {
                        let reader = channel.reader(read);
                        let times: Vec<f32> = reader.read_inputs()?.collect();
                        let cubic = channel.sampler().interpolation()
                            == gltf::animation::Interpolation::CubicSpline;
                        let interpolation = match channel.sampler().interpolation() {
                            gltf::animation::Interpolation::Step => Interpolation::Step,
                            _ => Interpolation::Linear,
                        };
                        // Cubic spline keys are stored as (in-tangent, value, out-tangent).
                        let keep = |i: usize| !cubic || i % 3 == 1;
                        let values = match reader.read_outputs()? {
                            gltf::animation::util::ReadOutputs::Translations(it) => {
                                ChannelValues::Translation(
                                    it.enumerate()
                                        .filter(|(i, _)| keep(*i))
                                        .map(|(_, v)| Vec3::from_array(v))
                                        .collect(),
                                )
                            }
                            gltf::animation::util::ReadOutputs::Rotations(it) => {
                                ChannelValues::Rotation(
                                    it.into_f32()
                                        .enumerate()
                                        .filter(|(i, _)| keep(*i))
                                        .map(|(_, v)| Quat::from_array(v).normalize())
                                        .collect(),
                                )
                            }
                            gltf::animation::util::ReadOutputs::Scales(it) => ChannelValues::Scale(
                                it.enumerate()
                                    .filter(|(i, _)| keep(*i))
                                    .map(|(_, v)| Vec3::from_array(v))
                                    .collect(),
                            ),
                            gltf::animation::util::ReadOutputs::MorphTargetWeights(_) => {
                                return None
                            }
                        };
                        Some(Channel {
                            node: NodeId(channel.target().node().index() + 1),
                            interpolation,
                            times,
                            values,
                        })
                    })
                    .collect();
                AnimationClip::new(anim.name().map(str::to_owned), channels)
            })
            .collect();

        Ok(Self {
            scene,
            meshes,
            clips,
        })
    }

    pub fn has_animations(&self) -> bool {
        !self.clips.is_empty()
    }

    pub fn is_mesh(&self, id: NodeId) -> bool {
        self.scene
            .get(id)
            .and_then(|n| n.mesh)
            .is_some_and(|m| m < self.meshes.len())
    }

    /// Mesh-bearing nodes in traversal order.
    pub fn mesh_nodes(&self) -> Vec<NodeId> {
        self.scene
            .traverse()
            .into_iter()
            .filter(|id| self.is_mesh(*id))
            .collect()
    }

    fn own_bounds(&self, id: NodeId, world: &Mat4) -> Aabb {
        match self.scene.node(id).mesh.and_then(|m| self.meshes.get(m)) {
            Some(mesh) => mesh.bounds().transformed(world),
            None => Aabb::EMPTY,
        }
    }

    /// World-space bounds of a node and all of its descendants.
    pub fn node_bounds(&self, id: NodeId) -> Aabb {
        let worlds = self.scene.world_matrices();
        self.node_bounds_with(id, &worlds)
    }

    pub fn node_bounds_with(&self, id: NodeId, worlds: &[Mat4]) -> Aabb {
        self.scene
            .traverse_from(id)
            .into_iter()
            .fold(Aabb::EMPTY, |acc, n| acc.union(self.own_bounds(n, &worlds[n.0])))
    }

    pub fn bounds(&self) -> Aabb {
        self.node_bounds(SceneGraph::ROOT)
    }

    /// Moves the root so the model's bounding box is centred on the origin.
    /// Returns the centre that was removed.
    pub fn center_at_origin(&mut self) -> Vec3 {
        self.scene.node_mut(SceneGraph::ROOT).transform = Transform::IDENTITY;
        let center = self.bounds().center();
        self.scene.node_mut(SceneGraph::ROOT).transform = Transform::from_translation(-center);
        center
    }

    /// Indented listing of the scene graph with mesh dimensions.
    pub fn tree_dump(&self) -> String {
        let worlds = self.scene.world_matrices();
        let mut out = String::new();
        for id in self.scene.traverse() {
            let node = self.scene.node(id);
            let kind = if id == SceneGraph::ROOT {
                "Scene"
            } else if self.is_mesh(id) {
                "Mesh"
            } else {
                "Group"
            };
            _ = write!(out, "{}- {}", "  ".repeat(self.scene.depth(id)), kind);
            if let Some(name) = &node.name {
                _ = write!(out, " \"{}\"", name);
            }
            if self.is_mesh(id) {
                let s = self.own_bounds(id, &worlds[id.0]).size();
                _ = write!(out, "  [{:.2} × {:.2} × {:.2}]", s.x, s.y, s.z);
            }
            out.push('\n');
        }
        out
    }
}
