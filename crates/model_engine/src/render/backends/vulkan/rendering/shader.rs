//! SPIR-V shader set and shader modules
//!
//! The Vulkan backend draws with one fixed pair of shaders compiled ahead of
//! time by the build script. The bytecode is read once per process and shared
//! read-only by every renderer.

use std::ffi::CStr;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use ash::{vk, Device};
use log::{debug, info};

use crate::render::backends::vulkan::{VkResultExt, VulkanError, VulkanResult};

const ENTRY_POINT: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };

/// Shader files and their stages, in pipeline order
const SHADER_FILES: [(&str, vk::ShaderStageFlags); 2] = [
    ("model_vert.spv", vk::ShaderStageFlags::VERTEX),
    ("model_frag.spv", vk::ShaderStageFlags::FRAGMENT),
];

static SHADERS: OnceLock<Arc<[SpirvShader]>> = OnceLock::new();

/// Pre-compiled shader tagged with stage and entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpirvShader {
    /// SPIR-V words
    pub bytecode: Vec<u32>,
    /// Pipeline stage
    pub stage: vk::ShaderStageFlags,
    /// Entry point name
    pub entry_point: &'static CStr,
}

/// The Vulkan backend's fixed shader set
///
/// Loaded from `dir` on first use; later calls return the cached set.
pub fn get_shaders(dir: &Path) -> VulkanResult<Arc<[SpirvShader]>> {
    if let Some(shaders) = SHADERS.get() {
        return Ok(Arc::clone(shaders));
    }

    let loaded: Arc<[SpirvShader]> = SHADER_FILES
        .iter()
        .map(|&(file, stage)| {
            let path = dir.join(file);
            let bytes = std::fs::read(&path).map_err(|e| {
                VulkanError::new(format!("Failed to read shader {}", path.display())).with_message(&e.to_string())
            })?;
            let bytecode = parse_spirv(&bytes)
                .map_err(|e| e.with_message(&path.display().to_string()))?;
            debug!("Loaded {} ({} words)", path.display(), bytecode.len());
            Ok(SpirvShader {
                bytecode,
                stage,
                entry_point: ENTRY_POINT,
            })
        })
        .collect::<VulkanResult<Vec<_>>>()?
        .into();

    info!("Loaded {} SPIR-V shaders from {}", loaded.len(), dir.display());
    Ok(Arc::clone(SHADERS.get_or_init(|| loaded)))
}

/// Validate and decode SPIR-V bytes
pub fn parse_spirv(bytes: &[u8]) -> VulkanResult<Vec<u32>> {
    ash::util::read_spv(&mut Cursor::new(bytes))
        .map_err(|e| VulkanError::new("Failed to decode SPIR-V").with_message(&e.to_string()))
}

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
    stage: vk::ShaderStageFlags,
    entry_point: &'static CStr,
}

impl ShaderModule {
    /// Create a module from a shader of the set
    pub fn new(device: &Device, shader: &SpirvShader) -> VulkanResult<Self> {
        let create_info = vk::ShaderModuleCreateInfo::builder().code(&shader.bytecode);
        let module = unsafe { device.create_shader_module(&create_info, None) }
            .or_vk(&format!("create {:?} shader module", shader.stage))?;
        Ok(Self {
            device: device.clone(),
            module,
            stage: shader.stage,
            entry_point: shader.entry_point,
        })
    }

    /// Stage info for pipeline creation
    pub fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(self.stage)
            .module(self.module)
            .name(self.entry_point)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_to_bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_parse_valid_header() {
        let words = [0x0723_0203, 0x0001_0000, 0, 8, 0];
        assert_eq!(parse_spirv(&words_to_bytes(&words)).unwrap(), words.to_vec());
    }

    #[test]
    fn test_parse_rejects_truncated_word() {
        let mut bytes = words_to_bytes(&[0x0723_0203, 0x0001_0000]);
        bytes.pop();
        let error = parse_spirv(&bytes).unwrap_err();
        assert!(error.description().starts_with("Failed to decode SPIR-V"));
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        assert!(parse_spirv(&words_to_bytes(&[0xdead_beef, 0])).is_err());
    }

    #[test]
    fn test_missing_directory_is_error() {
        if SHADERS.get().is_some() {
            return;
        }
        let error = get_shaders(Path::new("/nonexistent/shader/dir")).unwrap_err();
        assert!(error.description().contains("model_vert.spv"));
    }
}
