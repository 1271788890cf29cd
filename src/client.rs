use crate::camera;
use crate::gfx;
use crate::os;
use crate::primitives;
use crate::CubeInfo;
use crate::Error;

use gfx::SwapChain;
use os::Window;

/// Constant buffer slot the transforms are bound to in the vertex shader
pub const TRANSFORMS_SLOT: u32 = 0;

/// Every gpu resource the sample creates after the device, released together.
/// Fields are declared in reverse creation order so they drop last created first
pub struct CubeResources<D: gfx::Device> {
    pub transforms: camera::Transforms,
    pub constant_buffer: D::Buffer,
    pub mesh: primitives::Mesh<D>,
    pub pipeline: D::RenderPipeline,
    pub ps: D::Shader,
    pub vs: D::Shader,
    pub depth_stencil: D::DepthStencil,
    pub swap_chain: D::SwapChain,
    /// Covers the swap chain and depth buffer, which keep their initial size
    pub viewport: gfx::Viewport,
}

/// The sample context: owns the app, main window, device and cube resources.
/// Resources are released by `release`, which `Drop` calls, so every exit path releases them
pub struct Client<D: gfx::Device, A: os::App> {
    pub main_window: A::Window,
    pub app: A,
    pub info: CubeInfo,
    device: Option<D>,
    resources: Option<CubeResources<D>>,
    frame_count: u64,
}

impl<D, A> Client<D, A> where D: gfx::Device, A: os::App {
    /// Create the app, window and device from `info` and set up all cube resources
    pub fn create(info: CubeInfo) -> Result<Self, Error> {
        let app = A::create(os::AppInfo {
            name: info.name.to_string(),
        });
        match app {
            Ok(app) => Self::create_with_app(app, info),
            Err(e) => {
                log::error!("{}", e);
                A::emit_debug_string(&e.msg);
                Err(e)
            }
        }
    }

    /// Create the window and device for an existing `app` and set up all cube resources
    pub fn create_with_app(mut app: A, info: CubeInfo) -> Result<Self, Error> {
        let window = app.create_window(os::WindowInfo {
            title: info.title.to_string(),
            rect: info.window_rect,
            visible: false,
        });
        let mut window = match window {
            Ok(window) => window,
            Err(e) => {
                report_fatal(&app, &e);
                return Err(e);
            }
        };

        let mut flags = gfx::DeviceFlags::NONE;
        if info.debug_device {
            flags |= gfx::DeviceFlags::DEBUG;
        }

        let device = D::create(&gfx::DeviceInfo {
            flags,
            adapter_name: info.adapter_name.clone(),
        });

        match device {
            Ok(device) => Self::from_parts(app, window, device, info),
            Err(e) => {
                report_fatal(&app, &e);
                window.close();
                Err(e)
            }
        }
    }

    /// Set up the cube resources with an already created app, window and device.
    /// On failure everything created so far is released, the window is destroyed and the error returned
    pub fn from_parts(app: A, main_window: A::Window, device: D, info: CubeInfo) -> Result<Self, Error> {
        let mut client = Client {
            app,
            main_window,
            info,
            device: Some(device),
            resources: None,
            frame_count: 0,
        };

        match client.setup() {
            Ok(()) => {
                client.main_window.show();
                log::info!("setup complete");
                Ok(client)
            }
            Err(e) => {
                client.release();
                report_fatal(&client.app, &e);
                client.main_window.close();
                Err(e)
            }
        }
    }

    /// Creates all resources in a fixed order, stopping at the first failure
    fn setup(&mut self) -> Result<(), Error> {
        let device = self.device.as_mut().ok_or_else(|| Error::new("device was released"))?;

        let viewport_rect = self.main_window.get_viewport_rect();
        let width = viewport_rect.width.max(1) as u32;
        let height = viewport_rect.height.max(1) as u32;

        let swap_chain = device.create_swap_chain::<A>(&gfx::SwapChainInfo {
            num_buffers: self.info.num_buffers,
            format: gfx::Format::RGB10A2n,
            clear_colour: self.info.clear_colour,
            width,
            height,
            sync_interval: self.info.sync_interval,
        }, &self.main_window)?;
        log::debug!("created swap chain");

        let depth_stencil = device.create_depth_stencil(&gfx::DepthStencilInfo {
            width,
            height,
            format: gfx::Format::D24nS8u,
        })?;
        log::debug!("created depth stencil");

        let (vs_data, ps_data) = crate::load_shader_binaries(&self.info)?;
        let vs = device.create_shader(&gfx::ShaderInfo {
            shader_type: gfx::ShaderType::Vertex,
        }, &vs_data)?;
        let ps = device.create_shader(&gfx::ShaderInfo {
            shader_type: gfx::ShaderType::Fragment,
        }, &ps_data)?;
        log::debug!("created shaders");

        let input_layout = primitives::vertex_input_layout();
        gfx::validate_input_layout(&input_layout, std::mem::size_of::<primitives::Vertex>())?;
        let pipeline = device.create_render_pipeline(&gfx::RenderPipelineInfo {
            vs: &vs,
            vs_byte_code: &vs_data,
            fs: &ps,
            input_layout,
            topology: gfx::Topology::TriangleList,
            depth_test: true,
        })?;
        log::debug!("created render pipeline");

        let mesh = primitives::create_cube_mesh(device)?;
        log::debug!("created cube mesh with {} indices", mesh.num_indices);

        let transforms = camera::Transforms::new(&self.info.camera, viewport_rect.aspect());
        let constants = [transforms.as_constants()];
        let constant_buffer = device.create_buffer(&gfx::BufferInfo {
            usage: gfx::BufferUsage::Constant,
            cpu_access: gfx::CpuAccessFlags::WRITE,
            format: gfx::Format::Unknown,
            stride: std::mem::size_of::<camera::TransformConstants>(),
            num_elements: 1,
        }, None::<&[camera::TransformConstants]>)?;
        device.update_buffer(&constant_buffer, &constants)?;
        log::debug!("created transforms constant buffer");

        self.resources = Some(CubeResources {
            transforms,
            constant_buffer,
            mesh,
            pipeline,
            ps,
            vs,
            depth_stencil,
            swap_chain,
            viewport: gfx::Viewport::from(os::Rect {
                x: 0,
                y: 0,
                width: width as i32,
                height: height as i32,
            }),
        });
        Ok(())
    }

    /// Issue the single draw for this frame and present it
    pub fn draw_frame(&mut self) -> Result<(), Error> {
        let (device, resources) = match (self.device.as_mut(), self.resources.as_mut()) {
            (Some(device), Some(resources)) => (device, resources),
            _ => return Err(Error::new("cannot draw after release")),
        };

        device.begin_frame(&resources.swap_chain, &resources.depth_stencil, &resources.viewport);
        device.set_render_pipeline(&resources.pipeline);
        device.set_vertex_buffer(&resources.mesh.vb, 0);
        device.set_index_buffer(&resources.mesh.ib);
        device.set_constant_buffer(&resources.constant_buffer, TRANSFORMS_SLOT);
        device.draw_indexed(resources.mesh.num_indices, 0, 0);
        resources.swap_chain.swap(device)?;

        self.frame_count += 1;
        Ok(())
    }

    /// Pump messages and draw until the window is closed or a quit message arrives.
    /// Resources are released before returning, on success or failure
    pub fn run(mut self) -> Result<(), Error> {
        let result = self.run_loop();
        if let Err(e) = &result {
            report_fatal(&self.app, e);
            self.main_window.close();
        }
        self.release();
        result
    }

    fn run_loop(&mut self) -> Result<(), Error> {
        while self.app.run() {
            self.main_window.update(&mut self.app);
            if self.main_window.is_closed() {
                continue;
            }
            if self.app.is_key_pressed(self.info.close_key) {
                log::info!("{:?} pressed, closing", self.info.close_key);
                self.main_window.close();
                continue;
            }
            self.draw_frame()?;
        }
        log::info!("quit after {} frames", self.frame_count);
        Ok(())
    }

    /// Drop all gpu resources and then the device. Safe to call more than once
    pub fn release(&mut self) {
        if self.resources.take().is_some() {
            log::debug!("released cube resources");
        }
        if self.device.take().is_some() {
            log::debug!("released device");
        }
    }

    pub fn is_released(&self) -> bool {
        self.device.is_none() && self.resources.is_none()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn get_device(&self) -> Option<&D> {
        self.device.as_ref()
    }

    pub fn get_resources(&self) -> Option<&CubeResources<D>> {
        self.resources.as_ref()
    }
}

impl<D, A> Drop for Client<D, A> where D: gfx::Device, A: os::App {
    fn drop(&mut self) {
        self.release();
    }
}

/// Emits a fatal diagnostic to the log and the platform debug output
fn report_fatal<A: os::App>(app: &A, err: &Error) {
    log::error!("{}", err);
    app.output_debug_string(&err.msg);
}
