use crate::os;
use crate::Error;

use serde::{Deserialize, Serialize};
use std::any::Any;

/// Implemets this interface with a Direct3D11 backend.
#[cfg(target_os = "windows")]
pub mod d3d11;

/// Recording backend which issues no gpu work, used for headless testing.
pub mod null;

/// Structure to specify the viewport set at the start of a frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    /// Top left x coordinate.
    pub x: f32,
    /// Top left y coordinate.
    pub y: f32,
    /// Width of the viewport rectangle.
    pub width: f32,
    /// Height of the viewport rectangle (Y is down).
    pub height: f32,
    /// Minimum depth of the viewport. Ranges between 0 and 1.
    pub min_depth: f32,
    /// Maximum depth of the viewport. Ranges between 0 and 1.
    pub max_depth: f32,
}

/// Format for resource types (textures / buffers).
/// n = normalised unsigned integer,
/// u = unsigned integer,
/// f = float
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    Unknown,
    R16u,
    R32u,
    RGB32f,
    RGBA8n,
    RGB10A2n,
    D24nS8u,
}

/// Describes how the buffer will be bound to the pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
    Constant,
}

bitflags! {
    /// CPU Access flags for buffers or textures.
    pub struct CpuAccessFlags: u8 {
        const NONE = 0b00000000;
        const READ = 0b00000001;
        const WRITE = 0b00000010;
    }
}

bitflags! {
    /// Options for device creation.
    #[derive(Default)]
    pub struct DeviceFlags: u8 {
        const NONE = 0b00000000;
        /// Enables the api validation layer
        const DEBUG = 0b00000001;
    }
}

/// Information to create a buffer through `Device::create_buffer`.
#[derive(Debug, Copy, Clone)]
pub struct BufferInfo {
    /// Indicates how the buffer will be used on the GPU.
    pub usage: BufferUsage,
    /// Used to indicate if we want to read or write from the CPU, use NONE if possible for best performance
    pub cpu_access: CpuAccessFlags,
    /// Data format of the buffer, this is only required for index buffers and can be `Format::Unknown` otherwise
    pub format: Format,
    /// The stride of a vertex or structure in bytes.
    pub stride: usize,
    /// The number of array elements
    pub num_elements: usize,
}

/// Shader type determines the pipeline stage a shader is bound to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderType {
    Vertex,
    Fragment,
}

/// Information required to create a shader from precompiled byte code.
#[derive(Debug, Copy, Clone)]
pub struct ShaderInfo {
    pub shader_type: ShaderType,
}

/// Describes a single element inside the vertex layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputElementInfo {
    /// Semantic name in the shader, ie: POSITION
    pub semantic: String,
    /// Semantic index, ie: TEXCOORD1
    pub index: u32,
    pub format: Format,
    /// Vertex buffer slot this element is read from
    pub input_slot: u32,
    /// Byte offset of the element inside the vertex
    pub aligned_byte_offset: u32,
}

/// Primitive topology for the input assembler.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
    LineList,
}

/// Information to create a pipeline through `Device::create_render_pipeline`.
pub struct RenderPipelineInfo<'stack, D: Device> {
    /// Vertex shader
    pub vs: &'stack D::Shader,
    /// Vertex shader byte code, the input layout is validated against it
    pub vs_byte_code: &'stack [u8],
    /// Fragment (pixel) shader
    pub fs: &'stack D::Shader,
    /// Vertex layout
    pub input_layout: Vec<InputElementInfo>,
    pub topology: Topology,
    /// Enables depth testing with a less than comparison and depth writes
    pub depth_test: bool,
}

/// Values to clear colour render targets with, in the 0-1 range.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct ClearColour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Information to create a device.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub flags: DeviceFlags,
    /// Optional name of gpu adaptor, use None for the default / primary device
    pub adapter_name: Option<String>,
}

/// Information to create a swap chain.
#[derive(Debug, Copy, Clone)]
pub struct SwapChainInfo {
    /// Number of buffers in the swap chain
    pub num_buffers: u32,
    /// Must be a RGBA8n or RGB10A2n format
    pub format: Format,
    /// Colour the back buffer is cleared to at the start of each frame
    pub clear_colour: ClearColour,
    pub width: u32,
    pub height: u32,
    /// Present sync interval
    pub sync_interval: u32,
}

/// Information to create a depth stencil target and its view.
#[derive(Debug, Copy, Clone)]
pub struct DepthStencilInfo {
    pub width: u32,
    pub height: u32,
    /// Must be a depth format, ie. `Format::D24nS8u`
    pub format: Format,
}

/// Device is the main interface to the gpu, it creates resources and, because
/// the api draws through an immediate context, it records and submits draw calls.
pub trait Device: 'static + Sized + Any {
    type SwapChain: SwapChain<Self>;
    type DepthStencil: DepthStencil<Self>;
    type Shader: Shader<Self>;
    type RenderPipeline: RenderPipeline<Self>;
    type Buffer: Buffer<Self>;
    /// Create a new gpu device
    fn create(info: &DeviceInfo) -> Result<Self, Error>;
    /// Create a swap chain for `window` along with a render target view of its back buffer
    fn create_swap_chain<A: os::App>(
        &mut self,
        info: &SwapChainInfo,
        window: &A::Window,
    ) -> Result<Self::SwapChain, Error>;
    /// Create a depth stencil texture and its view
    fn create_depth_stencil(&mut self, info: &DepthStencilInfo) -> Result<Self::DepthStencil, Error>;
    /// Create a shader from precompiled byte code
    fn create_shader(&mut self, info: &ShaderInfo, byte_code: &[u8]) -> Result<Self::Shader, Error>;
    /// Create a render pipeline, including the input layout
    fn create_render_pipeline(
        &mut self,
        info: &RenderPipelineInfo<Self>,
    ) -> Result<Self::RenderPipeline, Error>;
    /// Create a buffer with optional initial `data`
    fn create_buffer<T: Sized>(
        &mut self,
        info: &BufferInfo,
        data: Option<&[T]>,
    ) -> Result<Self::Buffer, Error>;
    /// Overwrite the contents of a cpu writable buffer
    fn update_buffer<T: Sized>(&mut self, buffer: &Self::Buffer, data: &[T]) -> Result<(), Error>;
    /// Bind the swap chain back buffer and `depth_stencil`, set the viewport and clear both
    fn begin_frame(
        &mut self,
        swap_chain: &Self::SwapChain,
        depth_stencil: &Self::DepthStencil,
        viewport: &Viewport,
    );
    fn set_render_pipeline(&mut self, pipeline: &Self::RenderPipeline);
    fn set_vertex_buffer(&mut self, buffer: &Self::Buffer, slot: u32);
    fn set_index_buffer(&mut self, buffer: &Self::Buffer);
    /// Bind a constant buffer to the vertex shader at `slot`
    fn set_constant_buffer(&mut self, buffer: &Self::Buffer, slot: u32);
    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32);
}

/// A swap chain is connected to a window and presents the back buffer
pub trait SwapChain<D: Device>: 'static + Sized + Any {
    /// Returns the clear colour the back buffer is cleared to in `begin_frame`
    fn get_clear_colour(&self) -> ClearColour;
    fn get_num_buffers(&self) -> u32;
    /// Present the back buffer
    fn swap(&mut self, device: &D) -> Result<(), Error>;
}

/// Depth stencil texture and view
pub trait DepthStencil<D: Device>: 'static + Sized + Any {}

/// An opaque shader program
pub trait Shader<D: Device>: 'static + Sized + Any {}

/// An opaque pipeline: shaders, input layout and fixed function state
pub trait RenderPipeline<D: Device>: 'static + Sized + Any {}

/// An opaque buffer resource
pub trait Buffer<D: Device>: 'static + Sized + Any {
    fn get_info(&self) -> &BufferInfo;
}

impl From<os::Rect<i32>> for Viewport {
    fn from(rect: os::Rect<i32>) -> Viewport {
        Viewport {
            x: rect.x as f32,
            y: rect.y as f32,
            width: rect.width as f32,
            height: rect.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Returns the size in bytes of a single element of `format`
pub fn block_size_for_format(format: Format) -> u32 {
    match format {
        Format::Unknown => 0,
        Format::R16u => 2,
        Format::R32u => 4,
        Format::RGB32f => 12,
        Format::RGBA8n => 4,
        Format::RGB10A2n => 4,
        Format::D24nS8u => 4,
    }
}

/// Returns the total size of the buffer described by `info` in bytes
pub fn buffer_size_bytes(info: &BufferInfo) -> usize {
    info.stride * info.num_elements
}

/// Validates `info` against the element type `T` and optional initial `data`.
/// Constant buffers must be sized in multiples of 16 bytes.
pub fn validate_buffer_info<T: Sized>(info: &BufferInfo, data: Option<&[T]>) -> Result<(), Error> {
    if info.stride == 0 || info.num_elements == 0 {
        return Err(Error::new("buffer must have a non zero stride and element count"));
    }
    if info.usage == BufferUsage::Index {
        let format_size = block_size_for_format(info.format) as usize;
        if format_size == 0 || format_size != info.stride {
            return Err(Error::new(format!(
                "index buffer stride {} does not match format {:?}", info.stride, info.format
            )));
        }
    }
    if info.usage == BufferUsage::Constant && buffer_size_bytes(info) % 16 != 0 {
        return Err(Error::new(format!(
            "constant buffer size {} must be a multiple of 16", buffer_size_bytes(info)
        )));
    }
    if let Some(data) = data {
        let data_size = std::mem::size_of_val(data);
        if data_size != buffer_size_bytes(info) {
            return Err(Error::new(format!(
                "buffer data size {} does not match buffer size {}", data_size, buffer_size_bytes(info)
            )));
        }
    }
    Ok(())
}

/// Validates that the elements of a vertex layout fit inside `stride` and do not overlap
pub fn validate_input_layout(layout: &[InputElementInfo], stride: usize) -> Result<(), Error> {
    let mut ranges = layout.iter().map(|e| {
        let start = e.aligned_byte_offset;
        (start, start + block_size_for_format(e.format), &e.semantic)
    }).collect::<Vec<_>>();
    ranges.sort();
    let mut cursor = 0;
    for (start, end, semantic) in ranges {
        if start < cursor {
            return Err(Error::new(format!("input element {} overlaps the previous element", semantic)));
        }
        if end as usize > stride {
            return Err(Error::new(format!("input element {} exceeds vertex stride {}", semantic, stride)));
        }
        cursor = end;
    }
    Ok(())
}

/// Take a slice of sized types and return a u8 slice covering all of them
pub fn slice_as_u8_slice<T: Sized>(p: &[T]) -> &[u8] {
    unsafe {
        ::std::slice::from_raw_parts(p.as_ptr() as *const u8, std::mem::size_of_val(p))
    }
}
