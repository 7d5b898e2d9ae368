//! Plain data attached to demo entities.

use glam::Vec3;
use kiln_core::{BatchSafe, Component};

/// Linear velocity in units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity(pub Vec3);

impl Component for Velocity {}
impl BatchSafe for Velocity {}
