mod controller;
mod plugin;

pub use controller::{NavInfo, NavMode, NavState, SupportSphere, SupportSurfaces};
pub use plugin::NavigationPlugin;
