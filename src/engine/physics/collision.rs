use glam::Vec2;

use super::body::{BodyId, BodyKind, RigidBody, StaticBody};
use crate::core::math::{point_to_segment_distance, solve_quadratic};

/// Fraction of the step at which wall contacts are reported.
///
/// Walls are resolved after every circle/circle contact of the same step.
pub const STATIC_COLLISION_TIME: f32 = 0.99;

/// What kind of pair collided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    RigidRigid,
    RigidStatic,
}

/// A pending collision found during a step.
///
/// `a` always indexes the rigid collection. `b` indexes the rigid or static
/// collection depending on `kind`. Indices are only meaningful within the
/// step that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub a: usize,
    pub b: usize,
    /// Time of impact within the step, in `[0, dt)`
    pub t: f32,
    pub kind: CollisionKind,
}

/// A collision after response, identified by body ids
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCollision {
    pub a: BodyId,
    pub b: BodyId,
    pub t: f32,
    pub kind: CollisionKind,
    /// Whether any velocity changed
    pub impulse: bool,
}

impl ResolvedCollision {
    /// The collision as seen by one of its participants
    pub fn contact_for(&self, me: BodyId) -> Option<Contact> {
        let (other, other_kind) = if me == self.a {
            let kind = match self.kind {
                CollisionKind::RigidRigid => BodyKind::Rigid,
                CollisionKind::RigidStatic => BodyKind::Static,
            };
            (self.b, kind)
        } else if me == self.b {
            (self.a, BodyKind::Rigid)
        } else {
            return None;
        };

        Some(Contact {
            body: me,
            other,
            other_kind,
            t: self.t,
            kind: self.kind,
            impulse: self.impulse,
        })
    }
}

/// What a body's collision hook receives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The body whose hook is running
    pub body: BodyId,
    /// The other participant
    pub other: BodyId,
    pub other_kind: BodyKind,
    pub t: f32,
    pub kind: CollisionKind,
    pub impulse: bool,
}

/// Removals requested by collision hooks.
///
/// The world applies them once every collision of the step has been
/// handled, so the bodies disappear at the end of that same step.
#[derive(Debug, Default)]
pub struct Removals {
    ids: Vec<BodyId>,
}

impl Removals {
    /// Ask for a body to be removed at the end of the current step
    pub fn remove(&mut self, id: BodyId) {
        self.ids.push(id);
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<BodyId> {
        std::mem::take(&mut self.ids)
    }
}

/// Earliest time at which two moving circles touch.
///
/// Solves `|dp + t*dv| = rA + rB` for `t`. Circles that already overlap
/// collide at `t = 0`. Returns `None` when they never touch at a
/// non-negative time.
pub fn rigid_bodies_collide(a: &RigidBody, b: &RigidBody) -> Option<f32> {
    let dp = b.position() - a.position();
    let dv = b.velocity() - a.velocity();
    let r = a.radius() + b.radius();

    // t^2*|dv|^2 + 2*t*dot(dv,dp) + |dp|^2 - r^2 = 0
    let qa = dv.dot(dv);
    let qb = 2.0 * dv.dot(dp);
    let qc = dp.dot(dp) - r * r;
    if qc < 0.0 {
        return Some(0.0);
    }
    // Touching or apart, and not closing in
    if qb >= 0.0 {
        return None;
    }

    let (t0, t1) = solve_quadratic(qa, qb, qc)?;
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

/// Whether a circle touches a wall, reported late in the step
pub fn rigid_and_static_collide(a: &RigidBody, s: &StaticBody, dt: f32) -> Option<f32> {
    if circle_touches_segment(a.position(), a.radius(), s) {
        Some(STATIC_COLLISION_TIME * dt)
    } else {
        None
    }
}

fn circle_touches_segment(center: Vec2, radius: f32, s: &StaticBody) -> bool {
    point_to_segment_distance(center, s.start(), s.end()) < radius
}

/// All collisions within the next `dt`, earliest first.
///
/// Ties keep detection order. Bodies flagged `no_collide` are skipped.
pub fn detect_collisions(
    rigid: &[RigidBody],
    statics: &[StaticBody],
    dt: f32,
) -> Vec<CollisionEvent> {
    let mut events = Vec::new();
    let in_step = |t: f32| t >= 0.0 && t < dt;

    for (i, a) in rigid.iter().enumerate() {
        if a.no_collide() {
            continue;
        }

        // Against the remaining circles
        for (j, b) in rigid.iter().enumerate().skip(i + 1) {
            if b.no_collide() {
                continue;
            }
            if let Some(t) = rigid_bodies_collide(a, b).filter(|&t| in_step(t)) {
                events.push(CollisionEvent {
                    a: i,
                    b: j,
                    t,
                    kind: CollisionKind::RigidRigid,
                });
            }
        }

        // Against the walls
        for (j, s) in statics.iter().enumerate() {
            if let Some(t) = rigid_and_static_collide(a, s, dt).filter(|&t| in_step(t)) {
                events.push(CollisionEvent {
                    a: i,
                    b: j,
                    t,
                    kind: CollisionKind::RigidStatic,
                });
            }
        }
    }

    // Vec::sort_by is stable
    events.sort_by(|x, y| x.t.total_cmp(&y.t));
    events
}
