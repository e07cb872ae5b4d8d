//! # vf-av
//!
//! External tool layer for the vidforge pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg,
//!   openscad, and blender.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Staging** ([`Workspace`]) -- temporary directory whose outputs are
//!   moved into place only once complete.
//! - **Frame extraction** ([`FrameExtractor`], [`FfmpegFrameExtractor`]) --
//!   stills at given timestamps, with a placeholder fallback.
//! - **Geometry conversion** ([`GeometryToolchain`], [`OpenScadBlender`]) --
//!   OpenSCAD source to STL to GLB.

pub mod command;
pub mod frames;
pub mod geometry;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use frames::{timestamp_to_seconds, ExtractedFrame, FfmpegFrameExtractor, FrameExtractor};
pub use geometry::{GeometryToolchain, OpenScadBlender};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use workspace::Workspace;
