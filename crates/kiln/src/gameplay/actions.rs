//! # Demo Actions
//!
//! Small behaviors that exercise each hook: `start` captures state,
//! `update` integrates it, `pre_draw` derives render-only values.
//!
//! Each one runs on free-standing entities and batch members alike.

use glam::Vec3;
use kiln_core::{Action, ActionContext, BatchSafe, Capability};
use kiln_rendering::SpriteTint;

use super::components::Velocity;

/// Moves the entity by its [`Velocity`] every update.
///
/// Entities without a velocity stay put.
#[derive(Clone, Copy, Debug, Default)]
pub struct Drift;

impl<C: Capability> Action<C> for Drift {
    fn update(&mut self, ctx: &mut ActionContext<'_, C>) {
        let Ok(velocity) = ctx.component::<Velocity>() else {
            return;
        };
        let step = velocity.borrow().0 * ctx.delta();
        ctx.translate(step);
    }
}

impl BatchSafe for Drift {}

/// Rotates the entity at a constant rate, radians per second per axis.
#[derive(Clone, Copy, Debug)]
pub struct Spin {
    /// Angular rate.
    pub rate: Vec3,
}

impl<C: Capability> Action<C> for Spin {
    fn update(&mut self, ctx: &mut ActionContext<'_, C>) {
        let euler = ctx.transform().euler() + self.rate * ctx.delta();
        ctx.transform_mut().set_euler(euler);
    }
}

impl BatchSafe for Spin {}

/// Kills the entity once its time runs out.
#[derive(Clone, Copy, Debug)]
pub struct Lifetime {
    total: f32,
    remaining: f32,
}

impl Lifetime {
    /// A lifetime of `seconds`.
    #[must_use]
    pub const fn seconds(seconds: f32) -> Self {
        Self {
            total: seconds,
            remaining: seconds,
        }
    }

    /// Seconds left.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Remaining share of the full lifetime, from 1 down to 0.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.total <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.total).clamp(0.0, 1.0)
    }
}

impl<C: Capability> Action<C> for Lifetime {
    fn update(&mut self, ctx: &mut ActionContext<'_, C>) {
        self.remaining -= ctx.delta();
        if self.remaining <= 0.0 {
            tracing::trace!(entity = ?ctx.entity_id(), "lifetime expired");
            ctx.kill();
        }
    }
}

impl BatchSafe for Lifetime {}

/// Oscillates the entity's scale around the scale it had when started.
#[derive(Clone, Copy, Debug)]
pub struct Pulse {
    amplitude: f32,
    frequency: f32,
    base: Vec3,
    elapsed: f32,
}

impl Pulse {
    /// Pulses by `amplitude` (relative) at `frequency` Hz.
    #[must_use]
    pub const fn new(amplitude: f32, frequency: f32) -> Self {
        Self {
            amplitude,
            frequency,
            base: Vec3::ONE,
            elapsed: 0.0,
        }
    }
}

impl<C: Capability> Action<C> for Pulse {
    fn start(&mut self, ctx: &mut ActionContext<'_, C>) {
        self.base = ctx.transform().scale();
    }

    fn update(&mut self, ctx: &mut ActionContext<'_, C>) {
        self.elapsed += ctx.delta();
    }

    fn pre_draw(&mut self, ctx: &mut ActionContext<'_, C>) {
        let wave = (self.elapsed * self.frequency * std::f32::consts::TAU).sin();
        ctx.transform_mut()
            .set_scale(self.base * (1.0 + self.amplitude * wave));
    }
}

impl BatchSafe for Pulse {}

/// Fades the [`SpriteTint`] alpha with the sibling [`Lifetime`].
///
/// Does nothing on entities missing either one.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fade;

impl<C: Capability> Action<C> for Fade {
    fn pre_draw(&mut self, ctx: &mut ActionContext<'_, C>) {
        let (Ok(lifetime), Ok(tint)) = (ctx.action::<Lifetime>(), ctx.component::<SpriteTint>())
        else {
            return;
        };
        let alpha = lifetime.borrow().fraction();
        tint.borrow_mut().0.w = alpha;
    }
}

impl BatchSafe for Fade {}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use kiln_core::{Entity, EntityId};

    #[test]
    fn test_drift_follows_velocity() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        entity.add_component(Velocity(Vec3::new(2.0, 0.0, 0.0)));
        entity.add_action(Drift);

        entity.update(0.5);
        assert_eq!(entity.transform().position(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_lifetime_kills_entity() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        entity.add_action(Lifetime::seconds(1.0));

        entity.update(0.6);
        assert!(entity.is_alive());
        entity.update(0.6);
        assert!(!entity.is_alive());
    }

    #[test]
    fn test_pulse_keeps_base_scale_at_zero_phase() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        entity.transform_mut().set_scale(Vec3::splat(2.0));
        entity.add_action(Pulse::new(0.5, 1.0));

        entity.drain_removals();
        entity.drain_starts();
        entity.pre_draw();
        assert_eq!(entity.transform().scale(), Vec3::splat(2.0));

        entity.run_updates(0.25);
        entity.pre_draw();
        assert!((entity.transform().scale().x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_fade_tracks_lifetime() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        entity.add_component(SpriteTint(Vec4::ONE));
        entity.add_action(Lifetime::seconds(2.0));
        entity.add_action(Fade);

        entity.update(1.0);
        entity.pre_draw();

        let alpha = entity.component::<SpriteTint>().unwrap().borrow().0.w;
        assert!((alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_spin_accumulates_euler() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        entity.add_action(Spin { rate: Vec3::Y });
        entity.update(0.5);
        entity.update(0.5);
        assert!((entity.transform().euler().y - 1.0).abs() < 1e-6);
    }
}
