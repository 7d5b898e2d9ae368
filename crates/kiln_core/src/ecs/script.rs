//! # Script Actions
//!
//! Bridges the action lifecycle into an embedded interpreter. The interpreter
//! lives outside this crate behind [`ScriptHost`]; a [`ScriptAction`] only
//! knows the script's name and forwards each hook to the host.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::action::{Action, ActionContext};
use super::capability::{BatchSafe, Batched, Capability, Standalone};

/// Which lifecycle hook is being forwarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptHook {
    /// One-time start.
    Start,
    /// Per-tick update.
    Update,
    /// Render phase.
    PreDraw,
}

impl ScriptHook {
    /// Conventional function name the interpreter looks up.
    #[must_use]
    pub const fn function_name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Update => "update",
            Self::PreDraw => "pre_draw",
        }
    }
}

impl fmt::Display for ScriptHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// An external interpreter that runs named scripts.
///
/// The host receives the same context as a native action, so scripts can
/// move the entity, read its components or queue lifecycle requests. A host
/// serving batch members gets the restricted batched context.
pub trait ScriptHost<C: Capability = Standalone> {
    /// Runs `hook` of `script` against the entity behind `ctx`.
    fn call(&mut self, script: &str, hook: ScriptHook, ctx: &mut ActionContext<'_, C>);
}

/// An action whose hooks are implemented by a script.
pub struct ScriptAction<C: Capability = Standalone> {
    script: String,
    host: Rc<RefCell<dyn ScriptHost<C>>>,
}

impl<C: Capability> ScriptAction<C> {
    /// Binds `script` to `host`.
    pub fn new(script: impl Into<String>, host: Rc<RefCell<dyn ScriptHost<C>>>) -> Self {
        Self {
            script: script.into(),
            host,
        }
    }

    /// Name of the bound script.
    #[must_use]
    pub fn script(&self) -> &str {
        &self.script
    }

    fn forward(&self, hook: ScriptHook, ctx: &mut ActionContext<'_, C>) {
        tracing::trace!(script = %self.script, %hook, entity = ?ctx.entity_id(), "script hook");
        self.host.borrow_mut().call(&self.script, hook, ctx);
    }
}

impl<C: Capability> Action<C> for ScriptAction<C> {
    fn start(&mut self, ctx: &mut ActionContext<'_, C>) {
        self.forward(ScriptHook::Start, ctx);
    }

    fn update(&mut self, ctx: &mut ActionContext<'_, C>) {
        self.forward(ScriptHook::Update, ctx);
    }

    fn pre_draw(&mut self, ctx: &mut ActionContext<'_, C>) {
        self.forward(ScriptHook::PreDraw, ctx);
    }
}

impl BatchSafe for ScriptAction<Batched> {}

impl<C: Capability> fmt::Debug for ScriptAction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptAction")
            .field("script", &self.script)
            .finish_non_exhaustive()
    }
}
