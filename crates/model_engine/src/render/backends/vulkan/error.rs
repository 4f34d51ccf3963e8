//! Vulkan error wrapper
//!
//! Vulkan reports failure as a bare `VkResult`. [`VulkanError`] pairs that
//! code with a description of the operation that produced it. Enrichment
//! never mutates: [`VulkanError::with_code`] and [`VulkanError::with_message`]
//! return a new error and leave the receiver as it was.

use ash::vk;

/// Vulkan failure with operation context and optional result code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{description}")]
pub struct VulkanError {
    description: String,
    code: Option<vk::Result>,
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

impl VulkanError {
    /// Error carrying only a description
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            code: None,
        }
    }

    /// Copy of this error with a result code appended
    pub fn with_code(&self, code: vk::Result) -> Self {
        Self {
            description: format!("{} (VkResult {:?} = {})", self.description, code, code.as_raw()),
            code: Some(code),
        }
    }

    /// Copy of this error with extra detail appended
    pub fn with_message(&self, message: &str) -> Self {
        Self {
            description: format!("{}: {}", self.description, message),
            code: self.code,
        }
    }

    /// Full description including appended detail
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Most recently attached result code
    pub fn code(&self) -> Option<vk::Result> {
        self.code
    }

    /// Whether the swapchain no longer matches the surface
    pub fn is_out_of_date(&self) -> bool {
        self.code == Some(vk::Result::ERROR_OUT_OF_DATE_KHR)
    }
}

/// Attach an operation description to raw `VkResult` failures
pub trait VkResultExt<T> {
    /// Convert the error side into a [`VulkanError`] naming `operation`
    fn or_vk(self, operation: &str) -> VulkanResult<T>;
}

impl<T> VkResultExt<T> for Result<T, vk::Result> {
    fn or_vk(self, operation: &str) -> VulkanResult<T> {
        self.map_err(|code| VulkanError::new(format!("Failed to {operation}")).with_code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_code_returns_new_value() {
        let original = VulkanError::new("Failed to create buffer");
        let enriched = original.with_code(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);

        assert_eq!(original.description(), "Failed to create buffer");
        assert_eq!(original.code(), None);
        assert!(enriched.description().contains("Failed to create buffer"));
        assert!(enriched.description().contains("ERROR_OUT_OF_DEVICE_MEMORY"));
        assert!(enriched.description().contains("-2"));
        assert_eq!(enriched.code(), Some(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
    }

    #[test]
    fn test_with_message_keeps_code() {
        let original = VulkanError::new("Failed to create image").with_code(vk::Result::ERROR_FORMAT_NOT_SUPPORTED);
        let before = original.clone();
        let enriched = original.with_message("texture crate.png");

        assert_eq!(original, before);
        assert!(enriched.description().starts_with(original.description()));
        assert!(enriched.description().ends_with("texture crate.png"));
        assert_eq!(enriched.code(), original.code());
    }

    #[test]
    fn test_display_is_description() {
        let error = VulkanError::new("Failed to present").with_code(vk::Result::ERROR_OUT_OF_DATE_KHR);
        assert_eq!(error.to_string(), error.description());
        assert!(error.is_out_of_date());
    }

    #[test]
    fn test_or_vk() {
        let failed: Result<(), vk::Result> = Err(vk::Result::ERROR_DEVICE_LOST);
        let error = failed.or_vk("submit draw commands").unwrap_err();
        assert!(error.description().starts_with("Failed to submit draw commands"));
        assert_eq!(error.code(), Some(vk::Result::ERROR_DEVICE_LOST));

        let ok: Result<u32, vk::Result> = Ok(7);
        assert_eq!(ok.or_vk("anything").unwrap(), 7);
    }
}
