//! Lifecycle behavior across entities, pools and storages.

use std::cell::RefCell;
use std::rc::Rc;

use kiln_core::{
    kind_id, Action, ActionContext, ActionFamily, Component, ComponentFamily, ComponentStorage,
    CoreError, Entity, EntityId, EntityPool, MaterialHandle, MeshHandle, MeshRenderer, Phased,
};

#[derive(Default)]
struct Journal {
    events: Vec<&'static str>,
}

type SharedJournal = Rc<RefCell<Journal>>;

struct Greeter(SharedJournal);
impl Action for Greeter {
    fn start(&mut self, _ctx: &mut ActionContext<'_>) {
        self.0.borrow_mut().events.push("greeter.start");
    }
    fn update(&mut self, _ctx: &mut ActionContext<'_>) {
        self.0.borrow_mut().events.push("greeter.update");
    }
}

struct OneShot(SharedJournal);
impl Action for OneShot {
    fn update(&mut self, ctx: &mut ActionContext<'_>) {
        self.0.borrow_mut().events.push("oneshot.update");
        ctx.remove_action::<OneShot>().unwrap();
        // The rest of the hook still runs after the request.
        self.0.borrow_mut().events.push("oneshot.after_remove");
    }
}

struct Replacer(SharedJournal);
impl Action for Replacer {
    fn update(&mut self, ctx: &mut ActionContext<'_>) {
        ctx.remove_action::<Replacer>().unwrap();
        ctx.add_action(Greeter(Rc::clone(&self.0)));
    }
}

struct Pruner;
impl Action for Pruner {
    fn update(&mut self, ctx: &mut ActionContext<'_>) {
        if ctx.has_action::<Greeter>() {
            ctx.remove_action::<Greeter>().unwrap();
        }
    }
}

struct Health(u32);
impl Component for Health {}

struct Armor;
impl Component for Armor {}

struct Mortal;
impl Action for Mortal {
    fn update(&mut self, ctx: &mut ActionContext<'_>) {
        let health = ctx.component::<Health>().unwrap();
        let remaining = {
            let mut health = health.borrow_mut();
            health.0 = health.0.saturating_sub(1);
            health.0
        };
        if remaining == 0 {
            ctx.kill();
        }
    }
}

fn events(journal: &SharedJournal) -> Vec<&'static str> {
    journal.borrow().events.clone()
}

#[test]
fn test_add_is_visible_before_start() {
    let journal = SharedJournal::default();
    let mut entity = Entity::new(EntityId::new(0, 0));

    entity.add_action(Greeter(Rc::clone(&journal)));
    assert!(entity.has_action::<Greeter>());
    assert!(events(&journal).is_empty());

    entity.drain_removals();
    assert!(events(&journal).is_empty());

    entity.drain_starts();
    assert_eq!(events(&journal), vec!["greeter.start"]);
}

#[test]
fn test_self_removal_from_update() {
    let journal = SharedJournal::default();
    let mut entity = Entity::new(EntityId::new(0, 0));
    entity.add_action(OneShot(Rc::clone(&journal)));

    entity.update(0.016);
    assert_eq!(events(&journal), vec!["oneshot.update", "oneshot.after_remove"]);

    entity.update(0.016);
    assert!(!entity.has_action::<OneShot>());
    assert_eq!(events(&journal).len(), 2);
}

#[test]
fn test_sibling_removed_from_update_still_updates_that_tick() {
    let journal = SharedJournal::default();
    let mut entity = Entity::new(EntityId::new(0, 0));
    // Pruner sweeps first, so the removal is queued before Greeter's turn.
    entity.add_action(Pruner);
    entity.add_action(Greeter(Rc::clone(&journal)));

    entity.update(0.016);
    assert_eq!(events(&journal), vec!["greeter.start", "greeter.update"]);
    assert!(entity.has_action::<Greeter>());
    assert!(entity.is_pending_remove::<Greeter>());

    entity.drain_removals();
    assert!(!entity.has_action::<Greeter>());
    assert!(entity.action::<Greeter>().is_err());

    entity.drain_starts();
    entity.run_updates(0.016);
    assert_eq!(events(&journal).len(), 2);
}

#[test]
fn test_replacement_requested_from_hook() {
    let journal = SharedJournal::default();
    let mut entity = Entity::new(EntityId::new(0, 0));
    entity.add_action(Replacer(Rc::clone(&journal)));

    entity.update(0.016);
    assert!(events(&journal).is_empty());

    entity.update(0.016);
    assert!(!entity.has_action::<Replacer>());
    assert_eq!(events(&journal), vec!["greeter.start", "greeter.update"]);
}

#[test]
fn test_readd_replaces_instance() {
    let journal = SharedJournal::default();
    let mut entity = Entity::new(EntityId::new(0, 0));

    let first = entity.add_action(Greeter(Rc::clone(&journal)));
    entity.update(0.016);
    let second = entity.add_action(Greeter(Rc::clone(&journal)));

    assert!(!Rc::ptr_eq(&first, &second));
    assert!(entity.is_pending_start::<Greeter>());
    assert_eq!(entity.actions().len(), 1);

    entity.update(0.016);
    assert_eq!(
        events(&journal),
        vec!["greeter.start", "greeter.update", "greeter.start", "greeter.update"]
    );
}

#[test]
fn test_missing_lookups_are_recoverable() {
    let entity = Entity::new(EntityId::new(0, 0));
    let err = entity.component::<Health>().err().unwrap();
    assert!(matches!(err, CoreError::NotFound { .. }));
    assert!(err.is_recoverable());
    assert!(entity.action::<Greeter>().is_err());
}

#[test]
fn test_pool_exhaust_and_recover() {
    const N: usize = 8;
    let root = MeshRenderer::new(MeshHandle::new(7), MaterialHandle::new(8));
    let mut pool = EntityPool::new(N, root);

    for _ in 0..N {
        assert!(pool.get().is_some());
    }
    assert!(pool.get().is_none());

    let victim = pool.iter_alive().nth(3).unwrap().id();
    pool.entity_mut(victim).unwrap().kill();
    assert_eq!(pool.sweep(), 1);

    assert!(pool.get().is_some());
    assert!(pool.get().is_none());
    assert_eq!(pool.alive_count() + pool.dead_count(), N);
}

#[test]
fn test_pool_phases_drive_actions() {
    let mut pool = EntityPool::new(2, MeshRenderer::default());
    {
        let entity = pool.get().unwrap();
        entity.add_component(Health(2));
        entity.add_action(Mortal);
    }

    pool.drain_removals();
    pool.drain_starts();
    pool.run_updates(0.016);
    assert_eq!(pool.alive_count(), 1);

    pool.update(0.016);
    assert_eq!(pool.alive_count(), 0);
}

#[test]
fn test_ids_shared_between_storages() {
    let mut a: ComponentStorage<ComponentFamily> = ComponentStorage::new();
    let mut b: ComponentStorage<ComponentFamily> = ComponentStorage::new();

    a.add(Health(1));
    a.add(Armor);
    b.add(Armor);
    b.add(Health(2));

    assert_eq!(kind_id::<ComponentFamily, Health>(), kind_id::<ComponentFamily, Health>());
    assert_ne!(kind_id::<ComponentFamily, Health>(), kind_id::<ComponentFamily, Armor>());

    let armor = kind_id::<ComponentFamily, Armor>();
    assert!(a.has_id(armor) && b.has_id(armor));
    assert_eq!(b.get::<Health>().unwrap().borrow().0, 2);

    // Actions draw from their own id space.
    let _ = kind_id::<ActionFamily, Mortal>();
}
