// src/build/mod.rs

//! Build collaborator: run the external build, then find what it produced.

pub mod artifact;
pub mod trigger;

pub use artifact::find_artifact;
pub use trigger::{shell_quote, BuildParameters, BuildTrigger, CommandBuildTrigger};
