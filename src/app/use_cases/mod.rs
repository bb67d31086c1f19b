//! Use-Cases der Application-Layer-Orchestrierung.

pub mod camera;
pub mod entities;
pub mod map_io;
pub mod robot;
