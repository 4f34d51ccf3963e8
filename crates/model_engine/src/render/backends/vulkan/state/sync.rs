//! Synchronization primitives
//!
//! One [`FrameSync`] per frame in flight: the fence lets the CPU reuse the
//! frame's command buffer and uniform buffer, the semaphores order acquire,
//! render and present on the GPU.

use ash::{vk, Device};
use log::warn;

use crate::render::backends::vulkan::{VkResultExt, VulkanError, VulkanResult};

/// Binary semaphore
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create an unsignaled semaphore
    pub fn new(device: &Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        let semaphore = unsafe { device.create_semaphore(&create_info, None) }.or_vk("create semaphore")?;
        Ok(Self {
            device: device.clone(),
            semaphore,
        })
    }

    /// Semaphore handle
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe { self.device.destroy_semaphore(self.semaphore, None) };
    }
}

/// CPU-GPU fence
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a fence, optionally already signaled
    pub fn new(device: &Device, signaled: bool) -> VulkanResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        let fence = unsafe { device.create_fence(&create_info, None) }.or_vk("create fence")?;
        Ok(Self {
            device: device.clone(),
            fence,
        })
    }

    /// Block until signaled
    pub fn wait(&self) -> VulkanResult<()> {
        unsafe { self.device.wait_for_fences(&[self.fence], true, u64::MAX) }.or_vk("wait for fence")
    }

    /// Return to the unsignaled state
    pub fn reset(&self) -> VulkanResult<()> {
        unsafe { self.device.reset_fences(&[self.fence]) }.or_vk("reset fence")
    }

    /// Fence handle
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe { self.device.destroy_fence(self.fence, None) };
    }
}

/// Synchronization objects of one frame in flight
pub struct FrameSync {
    /// Signaled when the swapchain image is ready
    pub image_available: Semaphore,
    /// Signaled when rendering has finished
    pub render_finished: Semaphore,
    /// Signaled when the frame's submission has completed
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create the set; the fence starts signaled so the first wait passes
    pub fn new(device: &Device) -> VulkanResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device)?,
            render_finished: Semaphore::new(device)?,
            in_flight: Fence::new(device, true)?,
        })
    }
}

/// Finish a frame whose swapchain image has already been acquired
///
/// The fence is reset only once recording has succeeded, right before the
/// submit that signals it again. If any step fails, `release` consumes the
/// pending acquire with an empty submission; it is asked to signal the fence
/// only when the fence was already reset. The frame's fence therefore never
/// stays unsignaled after an error, and the next wait on it returns.
pub fn submit_acquired<R>(
    record: impl FnOnce() -> VulkanResult<R>,
    reset_fence: impl FnOnce() -> VulkanResult<()>,
    submit: impl FnOnce(R) -> VulkanResult<()>,
    release: impl FnOnce(bool) -> VulkanResult<()>,
) -> VulkanResult<()> {
    let recorded = match record() {
        Ok(recorded) => recorded,
        Err(e) => return Err(after_release(e, release(false))),
    };
    if let Err(e) = reset_fence() {
        return Err(after_release(e, release(false)));
    }
    submit(recorded).map_err(|e| after_release(e, release(true)))
}

fn after_release(error: VulkanError, released: VulkanResult<()>) -> VulkanError {
    if let Err(e) = released {
        warn!("Could not release acquired image after failed frame: {}", e);
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn run(fail_at: Option<&'static str>) -> (VulkanResult<()>, Vec<&'static str>) {
        let calls = RefCell::new(Vec::new());
        let step = |name: &'static str| {
            calls.borrow_mut().push(name);
            if fail_at == Some(name) {
                Err(VulkanError::new(name).with_code(vk::Result::ERROR_OUT_OF_HOST_MEMORY))
            } else {
                Ok(())
            }
        };
        let result = submit_acquired(
            || step("record").map(|()| 7u32),
            || step("reset"),
            |recorded| {
                assert_eq!(recorded, 7);
                step("submit")
            },
            |signal_fence| step(if signal_fence { "release+fence" } else { "release" }),
        );
        (result, calls.into_inner())
    }

    #[test]
    fn test_successful_frame_resets_fence_before_submit() {
        let (result, calls) = run(None);
        assert!(result.is_ok());
        assert_eq!(calls, ["record", "reset", "submit"]);
    }

    #[test]
    fn test_failed_recording_keeps_fence_signaled() {
        let (result, calls) = run(Some("record"));
        let err = result.unwrap_err();
        assert_eq!(err.code(), Some(vk::Result::ERROR_OUT_OF_HOST_MEMORY));
        assert_eq!(calls, ["record", "release"]);
    }

    #[test]
    fn test_failed_submit_signals_fence_through_release() {
        let (result, calls) = run(Some("submit"));
        assert!(result.unwrap_err().to_string().contains("submit"));
        assert_eq!(calls, ["record", "reset", "submit", "release+fence"]);
    }

    #[test]
    fn test_failed_release_reports_original_error() {
        let calls = RefCell::new(Vec::new());
        let result = submit_acquired(
            || Err::<(), _>(VulkanError::new("record")),
            || Ok(()),
            |()| Ok(()),
            |_| {
                calls.borrow_mut().push("release");
                Err(VulkanError::new("release"))
            },
        );
        assert!(result.unwrap_err().to_string().contains("record"));
        assert_eq!(calls.into_inner(), ["release"]);
    }
}
