use super::BufferInfo;
use super::ClearColour;
use super::DepthStencilInfo;
use super::DeviceInfo;
use super::RenderPipelineInfo;
use super::ShaderInfo;
use super::SwapChainInfo;
use super::Viewport;
use crate::os;
use crate::Error;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Creation steps which can be made to fail with `Device::fail_at`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    SwapChain,
    DepthStencil,
    Shader,
    RenderPipeline,
    Buffer,
    UpdateBuffer,
    Present,
}

#[derive(Default)]
struct State {
    calls: Vec<String>,
    live: usize,
    created: usize,
    counts: HashMap<Step, usize>,
    fail_at: Option<(Step, usize)>,
}

impl State {
    /// Counts an occurence of `step` and returns an error if it was asked to fail
    fn check(&mut self, step: Step) -> Result<(), Error> {
        let count = self.counts.entry(step).or_insert(0);
        *count += 1;
        if self.fail_at == Some((step, *count)) {
            self.calls.push(format!("fail {:?}", step));
            return Err(Error::new(format!("*** ERROR: null device failed at {:?} ***", step)));
        }
        Ok(())
    }
}

/// Shared view of a null device's state, stays valid after the device and its resources are dropped
#[derive(Clone)]
pub struct Recorder {
    state: Rc<RefCell<State>>,
}

impl Recorder {
    /// Every call made on the device and its resources, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Number of resources (including the device) currently alive
    pub fn live_resources(&self) -> usize {
        self.state.borrow().live
    }

    /// Number of resources (including the device) ever created
    pub fn created_resources(&self) -> usize {
        self.state.borrow().created
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

/// Keeps a resource counted as alive until dropped
struct Tracked {
    name: &'static str,
    state: Rc<RefCell<State>>,
}

impl Tracked {
    fn new(name: &'static str, state: &Rc<RefCell<State>>) -> Self {
        {
            let mut s = state.borrow_mut();
            s.live += 1;
            s.created += 1;
            s.calls.push(format!("create {}", name));
        }
        Tracked {
            name,
            state: state.clone(),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.live -= 1;
        s.calls.push(format!("release {}", self.name));
    }
}

/// Description of the only adapter a null device can be created on
pub const ADAPTER_NAME: &str = "null adapter";

fn shader_name(shader_type: super::ShaderType) -> &'static str {
    match shader_type {
        super::ShaderType::Vertex => "vertex_shader",
        super::ShaderType::Fragment => "pixel_shader",
    }
}

fn buffer_name(usage: super::BufferUsage) -> &'static str {
    match usage {
        super::BufferUsage::Vertex => "vertex_buffer",
        super::BufferUsage::Index => "index_buffer",
        super::BufferUsage::Constant => "constant_buffer",
    }
}

pub struct Device {
    state: Rc<RefCell<State>>,
    adapter_name: String,
    _tracked: Tracked,
}

pub struct SwapChain {
    info: SwapChainInfo,
    _tracked: Tracked,
}

pub struct DepthStencil {
    _info: DepthStencilInfo,
    _tracked: Tracked,
}

pub struct Shader {
    _info: ShaderInfo,
    _tracked: Tracked,
}

pub struct RenderPipeline {
    _tracked: Tracked,
}

pub struct Buffer {
    info: BufferInfo,
    _tracked: Tracked,
}

impl Device {
    /// Make the `nth` occurence (starting at 1) of `step` return an error
    pub fn fail_at(&mut self, step: Step, nth: usize) {
        self.state.borrow_mut().fail_at = Some((step, nth));
    }

    /// Returns the description of the adapter the device was created on
    pub fn get_adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Returns a handle which can inspect this device's calls and resources
    pub fn recorder(&self) -> Recorder {
        Recorder {
            state: self.state.clone(),
        }
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn check(&self, step: Step) -> Result<(), Error> {
        self.state.borrow_mut().check(step)
    }
}

impl super::Device for Device {
    type SwapChain = SwapChain;
    type DepthStencil = DepthStencil;
    type Shader = Shader;
    type RenderPipeline = RenderPipeline;
    type Buffer = Buffer;

    fn create(info: &DeviceInfo) -> Result<Self, Error> {
        if let Some(name) = &info.adapter_name {
            if !ADAPTER_NAME.contains(name.as_str()) {
                return Err(Error::new(format!("*** ERROR: No adapter named {} ***", name)));
            }
        }
        let state = Rc::new(RefCell::new(State::default()));
        let tracked = Tracked::new("device", &state);
        Ok(Device {
            state,
            adapter_name: ADAPTER_NAME.to_string(),
            _tracked: tracked,
        })
    }

    fn create_swap_chain<A: os::App>(
        &mut self,
        info: &SwapChainInfo,
        _window: &A::Window,
    ) -> Result<SwapChain, Error> {
        self.check(Step::SwapChain)?;
        Ok(SwapChain {
            info: *info,
            _tracked: Tracked::new("swap_chain", &self.state),
        })
    }

    fn create_depth_stencil(&mut self, info: &DepthStencilInfo) -> Result<DepthStencil, Error> {
        self.check(Step::DepthStencil)?;
        if info.format != super::Format::D24nS8u {
            return Err(Error::new("depth stencil requires a depth format"));
        }
        Ok(DepthStencil {
            _info: *info,
            _tracked: Tracked::new("depth_stencil", &self.state),
        })
    }

    fn create_shader(&mut self, info: &ShaderInfo, byte_code: &[u8]) -> Result<Shader, Error> {
        self.check(Step::Shader)?;
        if byte_code.is_empty() {
            return Err(Error::new("*** ERROR: Failed to create shader from empty byte code ***"));
        }
        Ok(Shader {
            _info: *info,
            _tracked: Tracked::new(shader_name(info.shader_type), &self.state),
        })
    }

    fn create_render_pipeline(&mut self, info: &RenderPipelineInfo<Self>) -> Result<RenderPipeline, Error> {
        self.check(Step::RenderPipeline)?;
        if info.input_layout.is_empty() {
            return Err(Error::new("*** ERROR: Failed to create input layout ***"));
        }
        Ok(RenderPipeline {
            _tracked: Tracked::new("render_pipeline", &self.state),
        })
    }

    fn create_buffer<T: Sized>(&mut self, info: &BufferInfo, data: Option<&[T]>) -> Result<Buffer, Error> {
        self.check(Step::Buffer)?;
        super::validate_buffer_info(info, data)?;
        Ok(Buffer {
            info: *info,
            _tracked: Tracked::new(buffer_name(info.usage), &self.state),
        })
    }

    fn update_buffer<T: Sized>(&mut self, buffer: &Buffer, data: &[T]) -> Result<(), Error> {
        self.check(Step::UpdateBuffer)?;
        if !buffer.info.cpu_access.contains(super::CpuAccessFlags::WRITE) {
            return Err(Error::new("buffer was not created with cpu write access"));
        }
        let size = super::slice_as_u8_slice(data).len();
        if size > super::buffer_size_bytes(&buffer.info) {
            return Err(Error::new("update exceeds buffer size"));
        }
        self.record(format!("update_buffer {}", size));
        Ok(())
    }

    fn begin_frame(&mut self, swap_chain: &SwapChain, _depth_stencil: &DepthStencil, viewport: &Viewport) {
        let cc = swap_chain.info.clear_colour;
        self.record(format!(
            "begin_frame {}x{} clear({}, {}, {}, {})", viewport.width, viewport.height, cc.r, cc.g, cc.b, cc.a
        ));
    }

    fn set_render_pipeline(&mut self, _pipeline: &RenderPipeline) {
        self.record("set_render_pipeline".to_string());
    }

    fn set_vertex_buffer(&mut self, _buffer: &Buffer, slot: u32) {
        self.record(format!("set_vertex_buffer {}", slot));
    }

    fn set_index_buffer(&mut self, _buffer: &Buffer) {
        self.record("set_index_buffer".to_string());
    }

    fn set_constant_buffer(&mut self, _buffer: &Buffer, slot: u32) {
        self.record(format!("set_constant_buffer {}", slot));
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        self.record(format!("draw_indexed {} {} {}", index_count, start_index, base_vertex));
    }
}

impl super::SwapChain<Device> for SwapChain {
    fn get_clear_colour(&self) -> ClearColour {
        self.info.clear_colour
    }

    fn get_num_buffers(&self) -> u32 {
        self.info.num_buffers
    }

    fn swap(&mut self, device: &Device) -> Result<(), Error> {
        device.check(Step::Present)?;
        device.record(format!("present {}", self.info.sync_interval));
        Ok(())
    }
}

impl super::DepthStencil<Device> for DepthStencil {}
impl super::Shader<Device> for Shader {}
impl super::RenderPipeline<Device> for RenderPipeline {}

impl super::Buffer<Device> for Buffer {
    fn get_info(&self) -> &BufferInfo {
        &self.info
    }
}
