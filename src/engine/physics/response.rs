use glam::Vec2;

use super::body::{RigidBody, StaticBody};
use crate::core::math::{reflect, segment_normal};

/// Extra separation applied when pushing bodies apart, so floating point
/// residue doesn't leave them touching on the next step
pub const SEPARATION_SLOP: f32 = 1.01;

/// Resolve a circle/circle collision.
///
/// Overlapping bodies are pushed apart along the line of centres, the
/// lighter one moving further. If they are approaching, the normal
/// components of their velocities are exchanged using the larger of the two
/// elasticities; tangential components are untouched. Returns whether any
/// velocity changed.
pub fn bounce_rigid_bodies(a: &mut RigidBody, b: &mut RigidBody) -> bool {
    let e = a.elasticity().max(b.elasticity());
    let (ma, mb) = (a.mass(), b.mass());
    let m = ma + mb;

    let offset = b.position() - a.position();
    let dist = offset.length();
    // Coincident centres have no line between them, pick one
    let n = offset.try_normalize().unwrap_or(Vec2::X);

    // Normal speeds
    let ua = n.dot(a.velocity());
    let ub = n.dot(b.velocity());
    let du = ub - ua;

    let overlap = (a.radius() + b.radius()) - dist;
    if overlap > 0.0 {
        // Each body moves by the other's share of the total mass
        let push = overlap * SEPARATION_SLOP / m;
        a.set_position_unchecked(a.position() - n * (push * mb));
        b.set_position_unchecked(b.position() + n * (push * ma));
    }

    if du >= 0.0 {
        return false;
    }

    let mv = ma * ua + mb * ub;
    let va = (mv + e * du * mb) / m;
    let vb = (mv - e * du * ma) / m;
    a.set_velocity_unchecked(a.velocity() - n * (ua - va));
    b.set_velocity_unchecked(b.velocity() - n * (ub - vb));
    true
}

/// Resolve a circle/wall collision.
///
/// A circle moving into the wall has its velocity mirrored about the wall
/// normal. A circle closer to the wall's line than its radius is pushed out
/// along the normal. Returns whether the velocity changed.
pub fn bounce_rigid_from_static(a: &mut RigidBody, s: &StaticBody) -> bool {
    let c = a.position();
    let p = s.start();

    // A zero-length wall acts like a point: push away from it
    let n = segment_normal(p, s.end())
        .or_else(|| (c - p).try_normalize())
        .unwrap_or(Vec2::Y);

    let v = a.velocity();
    let normal_speed = n.dot(v);
    let overlap = a.radius() - n.dot(c - p);

    let reflected = normal_speed < 0.0;
    if reflected {
        a.set_velocity_unchecked(reflect(v, n));
    }
    if overlap > 0.0 {
        a.set_position_unchecked(c + n * (SEPARATION_SLOP * overlap));
    }
    reflected
}
