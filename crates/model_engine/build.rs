// build.rs
// Compiles the Vulkan backend's GLSL sources to SPIR-V with glslc.
//
// Sources live in <workspace>/resources/shaders/*.{vert,frag}; the output goes
// to <workspace>/target/shaders/<stem>.spv where the renderer looks for it at
// runtime. The OpenGL backend embeds its own GLSL and needs nothing from here.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHADER_SOURCE_DIR: &str = "../../resources/shaders";
const SHADER_OUTPUT_DIR: &str = "../../target/shaders";

fn main() {
    println!("cargo:rerun-if-changed={SHADER_SOURCE_DIR}");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");
    println!("cargo:rerun-if-env-changed=SKIP_SHADERS");

    if env::var("SKIP_SHADERS").is_ok() {
        eprintln!("info: SKIP_SHADERS set, not compiling SPIR-V shaders");
        return;
    }

    let Some(glslc) = locate_glslc() else {
        eprintln!("warning: VULKAN_SDK not set or glslc missing, SPIR-V shaders not compiled");
        eprintln!("hint: the OpenGL backend still works; the Vulkan backend needs target/shaders/*.spv");
        return;
    };

    let source_dir = PathBuf::from(SHADER_SOURCE_DIR);
    let output_dir = PathBuf::from(SHADER_OUTPUT_DIR);
    if let Err(e) = std::fs::create_dir_all(&output_dir) {
        eprintln!("warning: cannot create {}: {e}", output_dir.display());
        return;
    }

    let entries = match std::fs::read_dir(&source_dir) {
        Ok(entries) => entries,
        Err(_) => {
            eprintln!("info: no shader directory at {}", source_dir.display());
            return;
        }
    };

    let mut compiled = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_stage = path
            .extension()
            .is_some_and(|ext| ext == "vert" || ext == "frag");
        if !is_stage {
            continue;
        }
        match compile_shader(&glslc, &path, &output_dir) {
            Ok(true) => compiled += 1,
            Ok(false) => {}
            Err(message) => panic!("{message}"),
        }
    }

    eprintln!("info: {compiled} shader(s) compiled");
}

fn locate_glslc() -> Option<PathBuf> {
    let sdk = env::var("VULKAN_SDK").ok()?;
    let glslc = if cfg!(target_os = "windows") {
        Path::new(&sdk).join("Bin").join("glslc.exe")
    } else {
        Path::new(&sdk).join("bin").join("glslc")
    };
    glslc.exists().then_some(glslc)
}

/// Returns `Ok(false)` when the existing output is newer than the source.
fn compile_shader(glslc: &Path, source: &Path, output_dir: &Path) -> Result<bool, String> {
    let stem = source
        .file_stem()
        .ok_or_else(|| format!("shader without a file name: {}", source.display()))?;
    let output = output_dir.join(stem).with_extension("spv");

    let up_to_date = match (std::fs::metadata(source), std::fs::metadata(&output)) {
        (Ok(src), Ok(dst)) => match (src.modified(), dst.modified()) {
            (Ok(src_time), Ok(dst_time)) => dst_time >= src_time,
            _ => false,
        },
        _ => false,
    };
    if up_to_date {
        return Ok(false);
    }

    let status = Command::new(glslc)
        .arg(source)
        .arg("-o")
        .arg(&output)
        .status()
        .map_err(|e| format!("failed to run glslc for {}: {e}", source.display()))?;

    if status.success() {
        eprintln!("info: compiled {} -> {}", source.display(), output.display());
        Ok(true)
    } else {
        Err(format!(
            "glslc failed for {} with exit code {}",
            source.display(),
            status.code().unwrap_or(-1)
        ))
    }
}
