use log::{debug, trace, warn};
use std::collections::BTreeSet;

use super::body::{Body, BodyId, BodyKind, RigidBody, StaticBody};
use super::collision::{
    detect_collisions, CollisionEvent, CollisionKind, Removals, ResolvedCollision,
};
use super::response::{bounce_rigid_bodies, bounce_rigid_from_static};

/// Where a live body is stored
#[derive(Debug, Clone, Copy)]
struct Slot {
    kind: BodyKind,
    index: usize,
}

/// Physics world that owns every body and advances the simulation.
///
/// Bodies live in dense per-kind arrays. A slot table maps each id to its
/// array index. Removal is deferred to the end of `step`, so indices stay
/// valid for the whole step.
///
/// The world is single-threaded and not reentrant: collision hooks run while
/// the world is mutably borrowed and cannot call back into it.
pub struct PhysicsWorld {
    rigid_bodies: Vec<RigidBody>,
    rigid_ids: Vec<BodyId>,

    static_bodies: Vec<StaticBody>,
    static_ids: Vec<BodyId>,

    /// Indexed by id; `None` for ids not currently in use
    slots: Vec<Option<Slot>>,

    /// Ids released by removed bodies, reused before new ones are minted
    free_ids: Vec<BodyId>,

    /// Removals requested since the last flush
    pending_removal: BTreeSet<BodyId>,

    /// Removals requested by hooks during the current step
    hook_removals: Removals,

    /// Collisions resolved during the most recent step
    last_collisions: Vec<ResolvedCollision>,

    step_count: u64,
}

impl PhysicsWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self {
            rigid_bodies: Vec::new(),
            rigid_ids: Vec::new(),
            static_bodies: Vec::new(),
            static_ids: Vec::new(),
            slots: Vec::new(),
            free_ids: Vec::new(),
            pending_removal: BTreeSet::new(),
            hook_removals: Removals::default(),
            last_collisions: Vec::with_capacity(32),
            step_count: 0,
        }
    }

    /// Add a body and return its id
    pub fn add_body(&mut self, body: impl Into<Body>) -> BodyId {
        let body = body.into();
        let kind = body.kind();
        let id = self.next_free_id();
        let slot = match body {
            Body::Rigid(body) => {
                self.rigid_bodies.push(body);
                self.rigid_ids.push(id);
                Slot {
                    kind: BodyKind::Rigid,
                    index: self.rigid_bodies.len() - 1,
                }
            }
            Body::Static(body) => {
                self.static_bodies.push(body);
                self.static_ids.push(id);
                Slot {
                    kind: BodyKind::Static,
                    index: self.static_bodies.len() - 1,
                }
            }
        };
        self.slots[id.0 as usize] = Some(slot);

        debug!("Added {:?} body {}", kind, id);
        id
    }

    /// Request removal of a body at the end of the current (or next) step.
    ///
    /// Returns `false` if the body is unknown or already marked.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        if self.slot(id).is_none() {
            warn!("Ignoring removal of unknown body {}", id);
            return false;
        }
        let marked = self.pending_removal.insert(id);
        if marked {
            debug!("Body {} marked for removal", id);
        }
        marked
    }

    /// Advance the simulation by one fixed step.
    ///
    /// Integrates every body not marked for removal, then detects all
    /// collisions, resolves them in time order and finally drops the bodies
    /// marked for removal, including those requested by hooks this step.
    pub fn step(&mut self, dt: f32) {
        for (body, id) in self.rigid_bodies.iter_mut().zip(&self.rigid_ids) {
            if self.pending_removal.contains(id) {
                continue;
            }
            body.integrate(dt);
        }

        self.handle_collisions(dt);
        self.process_removals();
        self.step_count += 1;
    }

    /// Forward a draw request to every body's render proxy, walls first
    pub fn draw(&mut self) {
        for body in &mut self.static_bodies {
            body.draw();
        }
        for body in &mut self.rigid_bodies {
            body.draw();
        }
    }

    fn handle_collisions(&mut self, dt: f32) {
        let events = detect_collisions(&self.rigid_bodies, &self.static_bodies, dt);
        self.last_collisions.clear();

        for event in events {
            let resolved = self.resolve(event);
            trace!(
                "{:?} collision {} / {} at t={:.4} (impulse: {})",
                resolved.kind,
                resolved.a,
                resolved.b,
                resolved.t,
                resolved.impulse
            );

            self.notify(resolved.a, &resolved);
            self.notify(resolved.b, &resolved);
            self.last_collisions.push(resolved);
        }

        for id in self.hook_removals.take() {
            self.remove_body(id);
        }
    }

    fn resolve(&mut self, event: CollisionEvent) -> ResolvedCollision {
        let (b, impulse) = match event.kind {
            CollisionKind::RigidRigid => {
                // Detection only pairs a lower index with a higher one
                let (head, tail) = self.rigid_bodies.split_at_mut(event.b);
                let impulse = bounce_rigid_bodies(&mut head[event.a], &mut tail[0]);
                (self.rigid_ids[event.b], impulse)
            }
            CollisionKind::RigidStatic => {
                let impulse = bounce_rigid_from_static(
                    &mut self.rigid_bodies[event.a],
                    &self.static_bodies[event.b],
                );
                (self.static_ids[event.b], impulse)
            }
        };

        ResolvedCollision {
            a: self.rigid_ids[event.a],
            b,
            t: event.t,
            kind: event.kind,
            impulse,
        }
    }

    /// Run a participant's collision hook, if it has one
    fn notify(&mut self, id: BodyId, resolved: &ResolvedCollision) {
        let (Some(slot), Some(contact)) = (self.slot(id), resolved.contact_for(id)) else {
            return;
        };

        let hook = match slot.kind {
            BodyKind::Rigid => self.rigid_bodies[slot.index].take_hook(),
            BodyKind::Static => self.static_bodies[slot.index].take_hook(),
        };
        if let Some(mut hook) = hook {
            hook(&contact, &mut self.hook_removals);
            match slot.kind {
                BodyKind::Rigid => self.rigid_bodies[slot.index].restore_hook(hook),
                BodyKind::Static => self.static_bodies[slot.index].restore_hook(hook),
            }
        }
    }

    fn process_removals(&mut self) {
        for id in std::mem::take(&mut self.pending_removal) {
            let Some(slot) = self.slots[id.0 as usize].take() else {
                continue;
            };

            let moved = match slot.kind {
                BodyKind::Rigid => {
                    self.rigid_bodies.swap_remove(slot.index);
                    self.rigid_ids.swap_remove(slot.index);
                    self.rigid_ids.get(slot.index).copied()
                }
                BodyKind::Static => {
                    self.static_bodies.swap_remove(slot.index);
                    self.static_ids.swap_remove(slot.index);
                    self.static_ids.get(slot.index).copied()
                }
            };

            // The last body now sits where the removed one was
            if let Some(moved) = moved {
                if let Some(moved_slot) = self.slots[moved.0 as usize].as_mut() {
                    moved_slot.index = slot.index;
                }
            }

            self.free_ids.push(id);
            debug!("Removed {:?} body {}", slot.kind, id);
        }
    }

    fn next_free_id(&mut self) -> BodyId {
        if let Some(id) = self.free_ids.pop() {
            return id;
        }
        let id = BodyId(self.slots.len() as u32);
        self.slots.push(None);
        id
    }

    fn slot(&self, id: BodyId) -> Option<Slot> {
        self.slots.get(id.0 as usize).copied().flatten()
    }

    /// Whether the id refers to a live body (pending removal included)
    pub fn contains(&self, id: BodyId) -> bool {
        self.slot(id).is_some()
    }

    pub fn is_pending_removal(&self, id: BodyId) -> bool {
        self.pending_removal.contains(&id)
    }

    pub fn body_kind(&self, id: BodyId) -> Option<BodyKind> {
        self.slot(id).map(|slot| slot.kind)
    }

    /// Get a reference to a rigid body
    pub fn rigid_body(&self, id: BodyId) -> Option<&RigidBody> {
        match self.slot(id)? {
            Slot {
                kind: BodyKind::Rigid,
                index,
            } => self.rigid_bodies.get(index),
            _ => None,
        }
    }

    /// Get a mutable reference to a rigid body
    pub fn rigid_body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        match self.slot(id)? {
            Slot {
                kind: BodyKind::Rigid,
                index,
            } => self.rigid_bodies.get_mut(index),
            _ => None,
        }
    }

    /// Get a reference to a static body
    pub fn static_body(&self, id: BodyId) -> Option<&StaticBody> {
        match self.slot(id)? {
            Slot {
                kind: BodyKind::Static,
                index,
            } => self.static_bodies.get(index),
            _ => None,
        }
    }

    /// All rigid bodies with their ids
    pub fn rigid_bodies(&self) -> impl Iterator<Item = (BodyId, &RigidBody)> {
        self.rigid_ids.iter().copied().zip(self.rigid_bodies.iter())
    }

    /// All static bodies with their ids
    pub fn static_bodies(&self) -> impl Iterator<Item = (BodyId, &StaticBody)> {
        self.static_ids.iter().copied().zip(self.static_bodies.iter())
    }

    pub fn rigid_body_count(&self) -> usize {
        self.rigid_bodies.len()
    }

    pub fn static_body_count(&self) -> usize {
        self.static_bodies.len()
    }

    /// Collisions resolved during the most recent step, in resolution order
    pub fn last_collisions(&self) -> &[ResolvedCollision] {
        &self.last_collisions
    }

    /// Number of steps taken so far
    pub fn step_count(&self) -> u64 {
        self.step_count
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
