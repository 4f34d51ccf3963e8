//! Process-scoped platform instance

use std::marker::PhantomData;

use ash::Entry;
use log::info;

use super::{BackendPair, GraphicsApi, Toolkit};
use crate::lifecycle::{LifecycleError, SlotClaim, PROCESS_INSTANCE};

/// Instance initialization errors
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    /// Lifecycle contract violation, such as a second live instance
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// No backend pair was selected before the instance was requested
    #[error("no backend selected; call platform::select first")]
    NotSelected,

    /// The windowing toolkit failed to initialize
    #[error("{toolkit} initialization failed: {reason}")]
    Toolkit {
        /// Toolkit that failed
        toolkit: Toolkit,
        /// Toolkit diagnostic
        reason: String,
    },

    /// The Vulkan loader library could not be loaded
    #[error("Vulkan loader unavailable: {0}")]
    VulkanLoader(String),
}

/// Initialized toolkit state shared by every window
pub(crate) enum ToolkitContext {
    Glfw(glfw::Glfw),
    Sdl {
        video: sdl2::VideoSubsystem,
        sdl: sdl2::Sdl,
    },
}

/// Process-scoped handle for the selected backend pair
///
/// Holds the toolkit context and, for Vulkan, the loaded entry points. At
/// most one exists per process; windows borrow it, so it cannot be dropped
/// while any window is alive.
pub struct Instance {
    // Field order is teardown order; the slot is released last
    toolkit: ToolkitContext,
    vulkan: Option<Entry>,
    backend: BackendPair,
    _claim: SlotClaim,
    _not_send: PhantomData<*const ()>,
}

impl Instance {
    pub(crate) fn new(backend: BackendPair) -> Result<Self, InstanceError> {
        let claim = PROCESS_INSTANCE.claim()?;

        let toolkit = match backend.toolkit {
            Toolkit::Glfw => glfw::init(glfw::log_errors)
                .map(ToolkitContext::Glfw)
                .map_err(|e| toolkit_error(Toolkit::Glfw, e))?,
            Toolkit::Sdl => {
                let sdl = sdl2::init().map_err(|e| toolkit_error(Toolkit::Sdl, e))?;
                let video = sdl.video().map_err(|e| toolkit_error(Toolkit::Sdl, e))?;
                ToolkitContext::Sdl { video, sdl }
            }
        };

        let vulkan = match backend.api {
            GraphicsApi::OpenGl => None,
            GraphicsApi::Vulkan => {
                let entry = unsafe { Entry::load() }.map_err(|e| InstanceError::VulkanLoader(e.to_string()))?;
                Some(entry)
            }
        };

        info!("Instance initialized: {} on {}", backend.api, backend.toolkit);
        Ok(Self {
            toolkit,
            vulkan,
            backend,
            _claim: claim,
            _not_send: PhantomData,
        })
    }

    /// Backend pair the instance was created for
    pub fn backend(&self) -> BackendPair {
        self.backend
    }

    pub(crate) fn toolkit(&self) -> &ToolkitContext {
        &self.toolkit
    }

    pub(crate) fn vulkan_entry(&self) -> Option<&Entry> {
        self.vulkan.as_ref()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        info!("Instance terminated: {} on {}", self.backend.api, self.backend.toolkit);
    }
}

fn toolkit_error(toolkit: Toolkit, reason: impl ToString) -> InstanceError {
    InstanceError::Toolkit {
        toolkit,
        reason: reason.to_string(),
    }
}
