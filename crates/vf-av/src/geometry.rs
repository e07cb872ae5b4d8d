//! Geometry toolchain: OpenSCAD source to STL to GLB.
//!
//! [`OpenScadBlender`] compiles generated OpenSCAD code with `openscad` and
//! converts the resulting STL mesh to a binary glTF with a headless
//! `blender` run. Both steps stage their output in a [`Workspace`] so the
//! model directory never holds a partially written mesh.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::command::ToolCommand;
use crate::tools::{ToolRegistry, BLENDER, OPENSCAD};
use crate::workspace::Workspace;

pub const SCAD_FILE: &str = "model.scad";
pub const STL_FILE: &str = "model.stl";
pub const GLB_FILE: &str = "model.glb";
const CONVERT_SCRIPT: &str = "convert.py";

/// Turns geometry source code into a renderable mesh.
#[async_trait]
pub trait GeometryToolchain: Send + Sync {
    /// Compile geometry source into a mesh file inside `out_dir`.
    async fn compile_script(&self, source: &str, out_dir: &Path) -> vf_core::Result<PathBuf>;

    /// Convert a mesh into the exchange format served to clients.
    async fn convert_mesh(&self, mesh: &Path, out_dir: &Path) -> vf_core::Result<PathBuf>;
}

/// openscad + blender implementation of [`GeometryToolchain`].
#[derive(Debug, Clone)]
pub struct OpenScadBlender {
    openscad: Option<ToolCommand>,
    blender: Option<ToolCommand>,
}

impl OpenScadBlender {
    pub fn from_registry(tools: &ToolRegistry) -> Self {
        Self {
            openscad: tools.require(OPENSCAD).ok().map(|c| c.command()),
            blender: tools.require(BLENDER).ok().map(|c| c.command()),
        }
    }

    /// Build on explicit base invocations; tool arguments are appended.
    pub fn from_commands(openscad: ToolCommand, blender: ToolCommand) -> Self {
        Self {
            openscad: Some(openscad),
            blender: Some(blender),
        }
    }

    fn tool(cmd: &Option<ToolCommand>, name: &str) -> vf_core::Result<ToolCommand> {
        cmd.clone().ok_or_else(|| {
            vf_core::Error::tool(name, format!("{name} not found; is it installed and in PATH?"))
        })
    }
}

/// Render a path as a single-quoted Python string literal.
fn python_str(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let escaped = raw.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Blender script importing an STL and exporting it as GLB.
///
/// Blender 4.x replaced `import_mesh.stl` with `wm.stl_import`; both are
/// tried.
pub fn blender_convert_script(stl: &Path, glb: &Path) -> String {
    format!(
        r#"import bpy

INPUT_PATH = {input}
OUTPUT_PATH = {output}

bpy.ops.object.select_all(action='SELECT')
bpy.ops.object.delete(use_global=False)

if hasattr(bpy.ops.wm, "stl_import"):
    bpy.ops.wm.stl_import(filepath=INPUT_PATH)
else:
    bpy.ops.import_mesh.stl(filepath=INPUT_PATH)

bpy.ops.export_scene.gltf(
    filepath=OUTPUT_PATH,
    export_format='GLB',
    use_selection=False
)
"#,
        input = python_str(stl),
        output = python_str(glb),
    )
}

#[async_trait]
impl GeometryToolchain for OpenScadBlender {
    async fn compile_script(&self, source: &str, out_dir: &Path) -> vf_core::Result<PathBuf> {
        let mut cmd = Self::tool(&self.openscad, OPENSCAD)?;

        tokio::fs::create_dir_all(out_dir).await?;
        let scad = out_dir.join(SCAD_FILE);
        tokio::fs::write(&scad, source).await?;

        let workspace = Workspace::new(out_dir)?;
        let staged = workspace.temp_file(STL_FILE);

        tracing::info!(scad = %scad.display(), "compiling geometry with openscad");
        cmd.arg("-o").path_arg(&staged).path_arg(&scad);
        cmd.execute().await?;

        workspace.finalize(STL_FILE)
    }

    async fn convert_mesh(&self, mesh: &Path, out_dir: &Path) -> vf_core::Result<PathBuf> {
        let mut cmd = Self::tool(&self.blender, BLENDER)?;

        if !mesh.exists() {
            return Err(vf_core::Error::not_found("mesh", mesh.display()));
        }

        let workspace = Workspace::new(out_dir)?;
        let staged = workspace.temp_file(GLB_FILE);
        let script = workspace.temp_file(CONVERT_SCRIPT);
        tokio::fs::write(&script, blender_convert_script(mesh, &staged)).await?;

        tracing::info!(mesh = %mesh.display(), "converting mesh with blender");
        cmd.args(["--background", "--python"]).path_arg(&script);
        cmd.execute().await?;

        workspace.finalize(GLB_FILE)
    }
}
