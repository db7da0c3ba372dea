//! Procedural meshes for the scene: dashed orbit guides, planetary rings and the
//! starfield point cloud.

use std::f32::consts::{FRAC_PI_2, TAU};

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use rand::Rng;

pub const RING_INNER_SCALE: f32 = 1.35;
pub const RING_OUTER_SCALE: f32 = 2.15;
pub const RING_SEGMENTS: usize = 192;
pub const RING_TILT_DEGREES: f32 = 15.0;

// Shortest piece emitted when walking dash boundaries; keeps the walk finite
// when float error leaves a sliver of a dash.
const MIN_DASH_PIECE: f32 = 1e-4;

fn circle_point(radius: f32, i: usize, samples: usize) -> Vec3 {
    let angle = i as f32 / samples as f32 * TAU;
    Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}

/// Line pieces tracing a dashed circle of `radius` around the origin in the X-Z
/// plane. The circle is sampled at `samples` evenly spaced points and each chord
/// is cut wherever the running arc length crosses a dash/gap boundary.
pub fn dashed_circle(radius: f32, samples: usize, dash: f32, gap: f32) -> Vec<[Vec3; 2]> {
    let samples = samples.max(3);
    if dash <= 0.0 {
        return Vec::new();
    }
    let period = dash + gap.max(0.0);

    let mut pieces = Vec::new();
    let mut travelled = 0.0;
    for i in 0..samples {
        let a = circle_point(radius, i, samples);
        let b = circle_point(radius, i + 1, samples);
        let len = a.distance(b);
        if gap <= 0.0 {
            pieces.push([a, b]);
            continue;
        }

        let mut t = 0.0;
        while t < len {
            let phase = (travelled + t) % period;
            let (drawn, remaining) = if phase < dash {
                (true, dash - phase)
            } else {
                (false, period - phase)
            };
            let end = (t + remaining.max(MIN_DASH_PIECE)).min(len);
            if drawn {
                pieces.push([a.lerp(b, t / len), a.lerp(b, end / len)]);
            }
            t = end;
        }
        travelled += len;
    }
    pieces
}

pub fn line_list_mesh(pieces: &[[Vec3; 2]]) -> Mesh {
    let positions: Vec<[f32; 3]> = pieces
        .iter()
        .flat_map(|[a, b]| [a.to_array(), b.to_array()])
        .collect();
    let normals = vec![[0.0, 1.0, 0.0]; positions.len()];
    Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD)
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
}

/// Flat annulus in the X-Y plane facing +Z. UVs map the bounding square of the
/// outer edge onto the texture.
pub fn ring_mesh(inner: f32, outer: f32, segments: usize) -> Mesh {
    let segments = segments.max(3);
    let mut positions = Vec::with_capacity(2 * (segments + 1));
    let mut normals = Vec::with_capacity(2 * (segments + 1));
    let mut uvs = Vec::with_capacity(2 * (segments + 1));

    for radius in [inner, outer] {
        for i in 0..=segments {
            let theta = i as f32 / segments as f32 * TAU;
            let (x, y) = (theta.cos() * radius, theta.sin() * radius);
            positions.push([x, y, 0.0]);
            normals.push([0.0, 0.0, 1.0]);
            uvs.push([(x / outer + 1.0) * 0.5, (y / outer + 1.0) * 0.5]);
        }
    }

    let stride = (segments + 1) as u32;
    let mut indices = Vec::with_capacity(segments * 6);
    for i in 0..segments as u32 {
        let a = i;
        let b = i + stride;
        let c = i + stride + 1;
        let d = i + 1;
        indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD)
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

/// Lays the ring into the orbital plane, then tips it about the world Z axis.
pub fn ring_rotation() -> Quat {
    Quat::from_rotation_z(RING_TILT_DEGREES.to_radians()) * Quat::from_rotation_x(FRAC_PI_2)
}

pub fn starfield_points(rng: &mut impl Rng, count: usize, extent: f32) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
            )
        })
        .collect()
}

pub fn point_cloud_mesh(points: &[Vec3]) -> Mesh {
    let positions: Vec<[f32; 3]> = points.iter().map(|p| p.to_array()).collect();
    let normals = vec![[0.0, 1.0, 0.0]; positions.len()];
    Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::RENDER_WORLD)
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
}
