//! Buffer management for vertex data and uniforms
//!
//! The wrapper is built with null handles and filled in step by step, so a
//! failure after the buffer exists but before its memory is bound still
//! frees everything through `Drop`. Destroying a null handle is a no-op.

use std::marker::PhantomData;

use ash::{vk, Device};

use super::find_memory_type;
use crate::render::backends::vulkan::{VkResultExt, VulkanError, VulkanResult};

/// Buffer wrapper with memory management
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and bind freshly allocated memory to it
    pub fn new(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        if size == 0 {
            return Err(VulkanError::new("Failed to create buffer").with_message("size is zero"));
        }

        let mut wrapper = Self {
            device: device.clone(),
            buffer: vk::Buffer::null(),
            memory: vk::DeviceMemory::null(),
            size,
        };

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        wrapper.buffer = unsafe { device.create_buffer(&buffer_info, None) }
            .or_vk(&format!("create {size} byte buffer"))?;

        let requirements = unsafe { device.get_buffer_memory_requirements(wrapper.buffer) };
        let memory_type_index = find_memory_type(memory_properties, requirements.memory_type_bits, properties)?;
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        wrapper.memory = unsafe { device.allocate_memory(&alloc_info, None) }
            .or_vk(&format!("allocate {} bytes of buffer memory", requirements.size))?;

        unsafe { device.bind_buffer_memory(wrapper.buffer, wrapper.memory, 0) }.or_vk("bind buffer memory")?;
        Ok(wrapper)
    }

    /// Copy bytes to the start of a host-visible buffer
    pub fn write_bytes(&self, bytes: &[u8]) -> VulkanResult<()> {
        if bytes.len() as vk::DeviceSize > self.size {
            return Err(VulkanError::new("Failed to write buffer")
                .with_message(&format!("{} bytes exceed {} byte buffer", bytes.len(), self.size)));
        }
        unsafe {
            let mapped = self
                .device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .or_vk("map buffer memory")?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.cast::<u8>(), bytes.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Host-visible buffer holding `data`
    pub fn with_data<T: bytemuck::Pod>(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        data: &[T],
        usage: vk::BufferUsageFlags,
    ) -> VulkanResult<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let buffer = Self::new(
            device,
            memory_properties,
            bytes.len() as vk::DeviceSize,
            usage,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        buffer.write_bytes(bytes)?;
        Ok(buffer)
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Vertex buffer specifically for vertex data
pub struct VertexBuffer {
    buffer: Buffer,
}

impl VertexBuffer {
    /// Upload vertices
    pub fn new<T: bytemuck::Pod>(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        vertices: &[T],
    ) -> VulkanResult<Self> {
        let buffer = Buffer::with_data(device, memory_properties, vertices, vk::BufferUsageFlags::VERTEX_BUFFER)?;
        Ok(Self { buffer })
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }
}

/// Index buffer for 32-bit indices
pub struct IndexBuffer {
    buffer: Buffer,
}

impl IndexBuffer {
    /// Upload indices
    pub fn new(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        indices: &[u32],
    ) -> VulkanResult<Self> {
        let buffer = Buffer::with_data(device, memory_properties, indices, vk::BufferUsageFlags::INDEX_BUFFER)?;
        Ok(Self { buffer })
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }
}

/// Uniform buffer holding one `T`
pub struct UniformBuffer<T> {
    buffer: Buffer,
    _phantom: PhantomData<T>,
}

impl<T: bytemuck::Pod> UniformBuffer<T> {
    /// Allocate space for one value
    pub fn new(device: &Device, memory_properties: &vk::PhysicalDeviceMemoryProperties) -> VulkanResult<Self> {
        let buffer = Buffer::new(
            device,
            memory_properties,
            std::mem::size_of::<T>() as vk::DeviceSize,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        Ok(Self {
            buffer,
            _phantom: PhantomData,
        })
    }

    /// Overwrite the stored value
    pub fn update(&self, data: &T) -> VulkanResult<()> {
        self.buffer.write_bytes(bytemuck::bytes_of(data))
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Size of the stored value
    pub fn range(&self) -> vk::DeviceSize {
        self.buffer.size()
    }
}
