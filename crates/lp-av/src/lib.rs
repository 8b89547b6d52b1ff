//! # lp-av
//!
//! ffmpeg/ffprobe backends for the lessonpack pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Workspaces** ([`Workspace`]) -- a scratch directory that turns blobs
//!   into files for a tool and reads the tool's output back.
//! - **Transformer** ([`FfmpegTransformer`]) -- implements
//!   [`lp_core::Transformer`] with the fixed remux and low-quality recipes.
//! - **Duration probe** ([`FfprobeDurationProbe`]) -- implements
//!   [`lp_core::DurationProbe`].

pub mod command;
pub mod probe;
pub mod tools;
pub mod transform;
pub mod workspace;

pub use command::{ToolCommand, ToolOutput};
pub use probe::FfprobeDurationProbe;
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use transform::FfmpegTransformer;
pub use workspace::Workspace;
