//! Vulkan instance and validation messenger

use std::ffi::{CStr, CString};

use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry, Instance};
use log::{debug, info, warn};

use crate::render::backends::vulkan::{VkResultExt, VulkanError, VulkanResult};

const VALIDATION_LAYER: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0") };

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    instance: Instance,
    debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Create an instance exposing the toolkit's surface extensions
    ///
    /// Debug builds enable the Khronos validation layer when it is installed
    /// and route its messages into the log.
    pub fn new(entry: &Entry, toolkit_extensions: &[CString], app_name: &str) -> VulkanResult<Self> {
        let app_name = CString::new(app_name)
            .map_err(|_| VulkanError::new("Application name contains a NUL byte"))?;
        let engine_name = CString::new("model_engine").map_err(|_| VulkanError::new("Invalid engine name"))?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let validation = cfg!(debug_assertions) && Self::validation_available(entry);
        let mut extensions: Vec<*const std::os::raw::c_char> =
            toolkit_extensions.iter().map(|ext| ext.as_ptr()).collect();
        let mut layers = Vec::new();
        if validation {
            extensions.push(DebugUtils::name().as_ptr());
            layers.push(VALIDATION_LAYER.as_ptr());
        }

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let instance = unsafe { entry.create_instance(&create_info, None) }.or_vk("create Vulkan instance")?;
        let mut wrapper = Self { instance, debug: None };

        if validation {
            let debug_utils = DebugUtils::new(entry, &wrapper.instance);
            let messenger = Self::setup_debug_messenger(&debug_utils)?;
            wrapper.debug = Some((debug_utils, messenger));
            info!("Vulkan validation layer enabled");
        }

        debug!("Created Vulkan instance with {} extensions", extensions.len());
        Ok(wrapper)
    }

    fn validation_available(entry: &Entry) -> bool {
        match entry.enumerate_instance_layer_properties() {
            Ok(layers) => {
                let found = layers
                    .iter()
                    .any(|layer| unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) } == VALIDATION_LAYER);
                if !found {
                    warn!("Validation layer not installed, running without it");
                }
                found
            }
            Err(e) => {
                warn!("Could not enumerate instance layers: {:?}", e);
                false
            }
        }
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }.or_vk("create debug messenger")
    }

    /// The instance function table
    pub fn handle(&self) -> &Instance {
        &self.instance
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((debug_utils, messenger)) = self.debug.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Routes validation messages into the log by severity
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    log::log!(severity_level(message_severity), "[Vulkan] {:?} - {}", message_type, message);
    vk::FALSE
}

fn severity_level(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> log::Level {
    type Severity = vk::DebugUtilsMessageSeverityFlagsEXT;
    if severity.contains(Severity::ERROR) {
        log::Level::Error
    } else if severity.contains(Severity::WARNING) {
        log::Level::Warn
    } else if severity.contains(Severity::INFO) {
        log::Level::Info
    } else {
        log::Level::Trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_severity_maps_to_log_level() {
        type Severity = vk::DebugUtilsMessageSeverityFlagsEXT;
        assert_eq!(severity_level(Severity::ERROR), log::Level::Error);
        assert_eq!(severity_level(Severity::WARNING), log::Level::Warn);
        assert_eq!(severity_level(Severity::INFO), log::Level::Info);
        assert_eq!(severity_level(Severity::VERBOSE), log::Level::Trace);
    }
}
