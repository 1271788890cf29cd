use super::BufferInfo;
use super::BufferUsage;
use super::ClearColour;
use super::CpuAccessFlags;
use super::DepthStencilInfo;
use super::DeviceFlags;
use super::DeviceInfo;
use super::Format;
use super::RenderPipelineInfo;
use super::ShaderInfo;
use super::ShaderType;
use super::SwapChainInfo;
use super::Topology;
use super::Viewport;
use crate::os;
use crate::os::NativeHandle;
use crate::os::Window;
use crate::Error;

use windows::{
    core::{Interface, PCSTR},
    Win32::Foundation::*,
    Win32::Graphics::Direct3D::*,
    Win32::Graphics::Direct3D11::*,
    Win32::Graphics::Dxgi::Common::*,
    Win32::Graphics::Dxgi::*,
};

use std::ffi::CString;

pub struct Device {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    dxgi_factory: IDXGIFactory2,
    adapter_name: String,
}

pub struct SwapChain {
    info: SwapChainInfo,
    swap_chain: IDXGISwapChain1,
    back_buffer_view: ID3D11RenderTargetView,
}

pub struct DepthStencil {
    _texture: ID3D11Texture2D,
    view: ID3D11DepthStencilView,
}

pub enum Shader {
    Vertex(ID3D11VertexShader),
    Fragment(ID3D11PixelShader),
}

pub struct RenderPipeline {
    vs: ID3D11VertexShader,
    ps: ID3D11PixelShader,
    input_layout: ID3D11InputLayout,
    depth_stencil_state: ID3D11DepthStencilState,
    rasterizer_state: ID3D11RasterizerState,
    topology: D3D_PRIMITIVE_TOPOLOGY,
}

pub struct Buffer {
    info: BufferInfo,
    buffer: ID3D11Buffer,
}

/// Wraps a windows error with the failing step so the diagnostic says which step failed
fn step_error(step: &str, err: windows::core::Error) -> Error {
    Error::new(format!("*** ERROR: {} ({}) ***", step, err.message()))
}

fn to_dxgi_format(format: Format) -> DXGI_FORMAT {
    match format {
        Format::Unknown => DXGI_FORMAT_UNKNOWN,
        Format::R16u => DXGI_FORMAT_R16_UINT,
        Format::R32u => DXGI_FORMAT_R32_UINT,
        Format::RGB32f => DXGI_FORMAT_R32G32B32_FLOAT,
        Format::RGBA8n => DXGI_FORMAT_R8G8B8A8_UNORM,
        Format::RGB10A2n => DXGI_FORMAT_R10G10B10A2_UNORM,
        Format::D24nS8u => DXGI_FORMAT_D24_UNORM_S8_UINT,
    }
}

fn to_d3d11_topology(topology: Topology) -> D3D_PRIMITIVE_TOPOLOGY {
    match topology {
        Topology::TriangleList => D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
        Topology::TriangleStrip => D3D11_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP,
        Topology::LineList => D3D11_PRIMITIVE_TOPOLOGY_LINELIST,
    }
}

fn to_d3d11_bind_flags(usage: BufferUsage) -> D3D11_BIND_FLAG {
    match usage {
        BufferUsage::Vertex => D3D11_BIND_VERTEX_BUFFER,
        BufferUsage::Index => D3D11_BIND_INDEX_BUFFER,
        BufferUsage::Constant => D3D11_BIND_CONSTANT_BUFFER,
    }
}

fn adapter_description(desc: &[u16]) -> String {
    let len = desc.iter().position(|c| *c == 0).unwrap_or(desc.len());
    String::from_utf16_lossy(&desc[..len])
}

/// Finds an adapter whose description contains `name`
fn find_adapter(factory: &IDXGIFactory2, name: &str) -> Result<IDXGIAdapter, Error> {
    unsafe {
        let mut i = 0;
        while let Ok(adapter) = factory.EnumAdapters1(i) {
            let desc = adapter.GetDesc1()?;
            if adapter_description(&desc.Description).contains(name) {
                return Ok(adapter.cast()?);
            }
            i += 1;
        }
    }
    Err(Error::new(format!("*** ERROR: No adapter named {} ***", name)))
}

impl Device {
    /// Returns the description of the adapter the device was created on
    pub fn get_adapter_name(&self) -> &str {
        &self.adapter_name
    }
}

impl super::Device for Device {
    type SwapChain = SwapChain;
    type DepthStencil = DepthStencil;
    type Shader = Shader;
    type RenderPipeline = RenderPipeline;
    type Buffer = Buffer;

    fn create(info: &DeviceInfo) -> Result<Self, Error> {
        unsafe {
            let dxgi_factory : IDXGIFactory2 = CreateDXGIFactory1()
                .map_err(|e| step_error("Failed to create DXGI factory", e))?;

            let adapter = match &info.adapter_name {
                Some(name) => Some(find_adapter(&dxgi_factory, name)?),
                None => None
            };
            // an explicit adapter requires the unknown driver type
            let driver_type = if adapter.is_some() {
                D3D_DRIVER_TYPE_UNKNOWN
            }
            else {
                D3D_DRIVER_TYPE_HARDWARE
            };

            let mut flags = D3D11_CREATE_DEVICE_FLAG(0);
            if info.flags.contains(DeviceFlags::DEBUG) {
                flags |= D3D11_CREATE_DEVICE_DEBUG;
            }

            let feature_levels = [D3D_FEATURE_LEVEL_11_1];
            let mut device = None;
            let mut context = None;
            D3D11CreateDevice(
                adapter.as_ref(),
                driver_type,
                HMODULE::default(),
                flags,
                Some(&feature_levels),
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            ).map_err(|e| step_error("Device creation failed", e))?;

            let device : ID3D11Device = device.ok_or_else(|| Error::new("*** ERROR: Device creation failed ***"))?;
            let context = context.ok_or_else(|| Error::new("*** ERROR: Device creation failed ***"))?;

            let dxgi_device : IDXGIDevice = device.cast()?;
            let adapter_name = adapter_description(&dxgi_device.GetAdapter()?.GetDesc()?.Description);
            log::info!("created d3d11 device on {}", adapter_name);

            Ok(Device {
                device,
                context,
                dxgi_factory,
                adapter_name,
            })
        }
    }

    fn create_swap_chain<A: os::App>(
        &mut self,
        info: &SwapChainInfo,
        window: &A::Window,
    ) -> Result<SwapChain, Error> {
        unsafe {
            let hwnd = HWND(window.get_native_handle().get_isize() as _);
            let swap_effect = if info.num_buffers > 1 {
                DXGI_SWAP_EFFECT_FLIP_DISCARD
            }
            else {
                DXGI_SWAP_EFFECT_DISCARD
            };
            let desc = DXGI_SWAP_CHAIN_DESC1 {
                Width: info.width,
                Height: info.height,
                Format: to_dxgi_format(info.format),
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: info.num_buffers,
                SwapEffect: swap_effect,
                ..Default::default()
            };

            let swap_chain = self.dxgi_factory.CreateSwapChainForHwnd(
                &self.device,
                hwnd,
                &desc,
                None,
                None,
            ).map_err(|e| step_error("Failed to create swap chain", e))?;

            let back_buffer : ID3D11Texture2D = swap_chain.GetBuffer(0)
                .map_err(|e| step_error("Failed to get back buffer", e))?;

            let mut back_buffer_view = None;
            self.device.CreateRenderTargetView(&back_buffer, None, Some(&mut back_buffer_view))
                .map_err(|e| step_error("Failed create back buffer view", e))?;
            let back_buffer_view = back_buffer_view
                .ok_or_else(|| Error::new("*** ERROR: Failed create back buffer view ***"))?;

            log::debug!("created swap chain {}x{} {:?}", info.width, info.height, info.format);
            Ok(SwapChain {
                info: *info,
                swap_chain,
                back_buffer_view,
            })
        }
    }

    fn create_depth_stencil(&mut self, info: &DepthStencilInfo) -> Result<DepthStencil, Error> {
        unsafe {
            let desc = D3D11_TEXTURE2D_DESC {
                Width: info.width,
                Height: info.height,
                MipLevels: 1,
                ArraySize: 1,
                Format: to_dxgi_format(info.format),
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Usage: D3D11_USAGE_DEFAULT,
                BindFlags: D3D11_BIND_DEPTH_STENCIL.0 as u32,
                CPUAccessFlags: Default::default(),
                MiscFlags: Default::default(),
            };
            let mut texture = None;
            self.device.CreateTexture2D(&desc, None, Some(&mut texture))
                .map_err(|e| step_error("Failed create depth buffer", e))?;
            let texture = texture.ok_or_else(|| Error::new("*** ERROR: Failed create depth buffer ***"))?;

            let view_desc = D3D11_DEPTH_STENCIL_VIEW_DESC {
                Format: desc.Format,
                ViewDimension: D3D11_DSV_DIMENSION_TEXTURE2D,
                Anonymous: D3D11_DEPTH_STENCIL_VIEW_DESC_0 {
                    Texture2D: D3D11_TEX2D_DSV { MipSlice: 0 },
                },
                ..Default::default()
            };
            let mut view = None;
            self.device.CreateDepthStencilView(&texture, Some(&view_desc), Some(&mut view))
                .map_err(|e| step_error("Failed create depth buffer view", e))?;
            let view = view.ok_or_else(|| Error::new("*** ERROR: Failed create depth buffer view ***"))?;

            log::debug!("created depth stencil {}x{}", info.width, info.height);
            Ok(DepthStencil {
                _texture: texture,
                view,
            })
        }
    }

    fn create_shader(&mut self, info: &ShaderInfo, byte_code: &[u8]) -> Result<Shader, Error> {
        unsafe {
            match info.shader_type {
                ShaderType::Vertex => {
                    let mut vs = None;
                    self.device.CreateVertexShader(byte_code, None, Some(&mut vs))
                        .map_err(|e| step_error("Failed to create vertex shader", e))?;
                    vs.map(Shader::Vertex).ok_or_else(|| Error::new("*** ERROR: Failed to create vertex shader ***"))
                }
                ShaderType::Fragment => {
                    let mut ps = None;
                    self.device.CreatePixelShader(byte_code, None, Some(&mut ps))
                        .map_err(|e| step_error("Failed to create pixel shader", e))?;
                    ps.map(Shader::Fragment).ok_or_else(|| Error::new("*** ERROR: Failed to create pixel shader ***"))
                }
            }
        }
    }

    fn create_render_pipeline(&mut self, info: &RenderPipelineInfo<Self>) -> Result<RenderPipeline, Error> {
        let vs = match info.vs {
            Shader::Vertex(vs) => vs.clone(),
            _ => return Err(Error::new("render pipeline vs must be a vertex shader"))
        };
        let ps = match info.fs {
            Shader::Fragment(ps) => ps.clone(),
            _ => return Err(Error::new("render pipeline fs must be a pixel shader"))
        };

        // semantic names must outlive the CreateInputLayout call
        let semantics = info.input_layout.iter()
            .map(|e| CString::new(e.semantic.as_str()).map_err(|e| Error::new(e.to_string())))
            .collect::<Result<Vec<_>, Error>>()?;

        let elements = info.input_layout.iter().zip(&semantics).map(|(e, semantic)| {
            D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(semantic.as_ptr() as _),
                SemanticIndex: e.index,
                Format: to_dxgi_format(e.format),
                InputSlot: e.input_slot,
                AlignedByteOffset: e.aligned_byte_offset,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            }
        }).collect::<Vec<_>>();

        unsafe {
            let mut input_layout = None;
            self.device.CreateInputLayout(&elements, info.vs_byte_code, Some(&mut input_layout))
                .map_err(|e| step_error("Failed to create input layout", e))?;
            let input_layout = input_layout.ok_or_else(|| Error::new("*** ERROR: Failed to create input layout ***"))?;

            let depth_desc = D3D11_DEPTH_STENCIL_DESC {
                DepthEnable: BOOL::from(info.depth_test),
                DepthWriteMask: D3D11_DEPTH_WRITE_MASK_ALL,
                DepthFunc: D3D11_COMPARISON_LESS,
                StencilEnable: FALSE,
                ..Default::default()
            };
            let mut depth_stencil_state = None;
            self.device.CreateDepthStencilState(&depth_desc, Some(&mut depth_stencil_state))
                .map_err(|e| step_error("Failed to create depth stencil state", e))?;
            let depth_stencil_state = depth_stencil_state
                .ok_or_else(|| Error::new("*** ERROR: Failed to create depth stencil state ***"))?;

            let raster_desc = D3D11_RASTERIZER_DESC {
                FillMode: D3D11_FILL_SOLID,
                CullMode: D3D11_CULL_BACK,
                FrontCounterClockwise: FALSE,
                DepthClipEnable: TRUE,
                ..Default::default()
            };
            let mut rasterizer_state = None;
            self.device.CreateRasterizerState(&raster_desc, Some(&mut rasterizer_state))
                .map_err(|e| step_error("Failed to create rasterizer state", e))?;
            let rasterizer_state = rasterizer_state
                .ok_or_else(|| Error::new("*** ERROR: Failed to create rasterizer state ***"))?;

            Ok(RenderPipeline {
                vs,
                ps,
                input_layout,
                depth_stencil_state,
                rasterizer_state,
                topology: to_d3d11_topology(info.topology),
            })
        }
    }

    fn create_buffer<T: Sized>(&mut self, info: &BufferInfo, data: Option<&[T]>) -> Result<Buffer, Error> {
        super::validate_buffer_info(info, data)?;

        let (usage, cpu_access) = if info.cpu_access.contains(CpuAccessFlags::WRITE) {
            (D3D11_USAGE_DYNAMIC, D3D11_CPU_ACCESS_WRITE.0 as u32)
        }
        else if data.is_some() {
            (D3D11_USAGE_IMMUTABLE, 0)
        }
        else {
            (D3D11_USAGE_DEFAULT, 0)
        };

        let desc = D3D11_BUFFER_DESC {
            ByteWidth: super::buffer_size_bytes(info) as u32,
            Usage: usage,
            BindFlags: to_d3d11_bind_flags(info.usage).0 as u32,
            CPUAccessFlags: cpu_access,
            MiscFlags: Default::default(),
            StructureByteStride: 0,
        };

        let initial_data = data.map(|data| D3D11_SUBRESOURCE_DATA {
            pSysMem: data.as_ptr() as *const _,
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        });

        unsafe {
            let mut buffer = None;
            self.device.CreateBuffer(
                &desc,
                initial_data.as_ref().map(|d| d as *const D3D11_SUBRESOURCE_DATA),
                Some(&mut buffer)
            ).map_err(|e| step_error("Failed to create buffer", e))?;
            let buffer = buffer.ok_or_else(|| Error::new("*** ERROR: Failed to create buffer ***"))?;
            log::debug!("created {:?} buffer of {} bytes", info.usage, desc.ByteWidth);
            Ok(Buffer {
                info: *info,
                buffer,
            })
        }
    }

    fn update_buffer<T: Sized>(&mut self, buffer: &Buffer, data: &[T]) -> Result<(), Error> {
        if !buffer.info.cpu_access.contains(CpuAccessFlags::WRITE) {
            return Err(Error::new("buffer was not created with cpu write access"));
        }
        let bytes = super::slice_as_u8_slice(data);
        if bytes.len() > super::buffer_size_bytes(&buffer.info) {
            return Err(Error::new("update exceeds buffer size"));
        }
        unsafe {
            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            self.context.Map(&buffer.buffer, 0, D3D11_MAP_WRITE_DISCARD, 0, Some(&mut mapped))
                .map_err(|e| step_error("Failed to map buffer", e))?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.pData as *mut u8, bytes.len());
            self.context.Unmap(&buffer.buffer, 0);
        }
        Ok(())
    }

    fn begin_frame(&mut self, swap_chain: &SwapChain, depth_stencil: &DepthStencil, viewport: &Viewport) {
        let d3d11_viewport = D3D11_VIEWPORT {
            TopLeftX: viewport.x,
            TopLeftY: viewport.y,
            Width: viewport.width,
            Height: viewport.height,
            MinDepth: viewport.min_depth,
            MaxDepth: viewport.max_depth,
        };
        let cc = swap_chain.info.clear_colour;
        unsafe {
            self.context.OMSetRenderTargets(
                Some(&[Some(swap_chain.back_buffer_view.clone())]),
                &depth_stencil.view,
            );
            self.context.RSSetViewports(Some(&[d3d11_viewport]));
            self.context.ClearRenderTargetView(&swap_chain.back_buffer_view, &[cc.r, cc.g, cc.b, cc.a]);
            self.context.ClearDepthStencilView(
                &depth_stencil.view,
                (D3D11_CLEAR_DEPTH.0 | D3D11_CLEAR_STENCIL.0) as u32,
                1.0,
                0,
            );
        }
    }

    fn set_render_pipeline(&mut self, pipeline: &RenderPipeline) {
        unsafe {
            self.context.IASetInputLayout(&pipeline.input_layout);
            self.context.IASetPrimitiveTopology(pipeline.topology);
            self.context.VSSetShader(&pipeline.vs, None);
            self.context.PSSetShader(&pipeline.ps, None);
            self.context.OMSetDepthStencilState(&pipeline.depth_stencil_state, 0);
            self.context.RSSetState(&pipeline.rasterizer_state);
        }
    }

    fn set_vertex_buffer(&mut self, buffer: &Buffer, slot: u32) {
        let stride = buffer.info.stride as u32;
        let offset = 0;
        unsafe {
            self.context.IASetVertexBuffers(
                slot,
                1,
                Some(&Some(buffer.buffer.clone())),
                Some(&stride),
                Some(&offset),
            );
        }
    }

    fn set_index_buffer(&mut self, buffer: &Buffer) {
        unsafe {
            self.context.IASetIndexBuffer(&buffer.buffer, to_dxgi_format(buffer.info.format), 0);
        }
    }

    fn set_constant_buffer(&mut self, buffer: &Buffer, slot: u32) {
        unsafe {
            self.context.VSSetConstantBuffers(slot, Some(&[Some(buffer.buffer.clone())]));
        }
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        unsafe {
            self.context.DrawIndexed(index_count, start_index, base_vertex);
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            self.context.ClearState();
            self.context.Flush();
        }
        log::debug!("released d3d11 device");
    }
}

impl super::SwapChain<Device> for SwapChain {
    fn get_clear_colour(&self) -> ClearColour {
        self.info.clear_colour
    }

    fn get_num_buffers(&self) -> u32 {
        self.info.num_buffers
    }

    fn swap(&mut self, _device: &Device) -> Result<(), Error> {
        unsafe {
            self.swap_chain.Present(self.info.sync_interval, Default::default())
                .ok()
                .map_err(|e| step_error("Failed to present", e))
        }
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
