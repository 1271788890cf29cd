/// Operating system module.
pub mod os;

/// Graphics module.
pub mod gfx;

/// Geometry primitives, the cube data and its structural checks
pub mod primitives;

/// World, view and projection transforms
pub mod camera;

/// The explicitly owned context which sets up, draws and tears down the sample
pub mod client;

/// Use bitmask for flags
#[macro_use]
extern crate bitflags;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional json file which can override `CubeInfo` defaults
pub const CONFIG_FILE: &str = "cube_config.json";

/// Environment variable which can point at an alternative config file
pub const CONFIG_ENV: &str = "D3D11_CUBE_CONFIG";

/// Generic errors for modules to define their own
pub struct Error {
    pub msg: String,
}

impl Error {
    /// Create an error from anything which can become a string
    pub fn new(msg: impl Into<String>) -> Self {
        Error {
            msg: msg.into()
        }
    }
}

/// Generic debug for errors
impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for Error {}

// conversion for windows-rs win32 errors
#[cfg(target_os = "windows")]
impl From<windows::core::Error> for Error {
    fn from(err: windows::core::Error) -> Error {
        Error {
            msg: err.message(),
        }
    }
}

// std errors
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error {
            msg: err.to_string()
        }
    }
}

// config parse errors
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error {
            msg: err.to_string()
        }
    }
}

/// Serialisable camera placement used to fill the view and projection transforms
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CameraInfo {
    /// Eye position in world space
    pub eye: [f32; 3],
    /// Point the camera looks at
    pub at: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32
}

impl Default for CameraInfo {
    fn default() -> Self {
        CameraInfo {
            eye: [3.0, 3.0, -5.0],
            at: [0.0, 0.0, 0.0],
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0
        }
    }
}

/// Information to create the sample: app, window, device and the cube resources.
/// Serialisable so it can be overridden from `cube_config.json`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CubeInfo {
    /// Name of the registered window class
    pub name: String,
    /// Window title
    pub title: String,
    /// Window rect {pos_x pos_y, width, height}, negative position means let the os decide
    pub window_rect: os::Rect<i32>,
    /// Clear colour of the back buffer
    pub clear_colour: gfx::ClearColour,
    /// Enables the d3d debug layer
    pub debug_device: bool,
    /// Optional name of the gpu adapter to use, None for the default / primary device
    pub adapter_name: Option<String>,
    /// Number of buffers in the swap chain
    pub num_buffers: u32,
    /// Present sync interval, 1 waits for vblank, 0 presents immediately
    pub sync_interval: u32,
    /// Key which closes the window
    pub close_key: os::Key,
    /// Directory which holds the data, relative to the working directory
    pub data_path: String,
    /// Precompiled vertex shader, relative to `data_path`
    pub vertex_shader: String,
    /// Precompiled pixel shader, relative to `data_path`
    pub pixel_shader: String,
    pub camera: CameraInfo
}

impl Default for CubeInfo {
    fn default() -> Self {
        CubeInfo {
            name: "AppWindow".to_string(),
            title: "D3D11Cube".to_string(),
            window_rect: os::Rect {
                x: -1,
                y: -1,
                width: 1280,
                height: 720
            },
            clear_colour: gfx::ClearColour {
                r: 0.45,
                g: 0.55,
                b: 0.60,
                a: 1.00,
            },
            debug_device: cfg!(debug_assertions),
            adapter_name: None,
            num_buffers: 1,
            sync_interval: 1,
            close_key: os::Key::Escape,
            data_path: "data".to_string(),
            vertex_shader: "shaders/cube_vs.cso".to_string(),
            pixel_shader: "shaders/cube_ps.cso".to_string(),
            camera: CameraInfo::default()
        }
    }
}

impl CubeInfo {
    /// Load info from a json file, fields missing from the file keep their defaults.
    /// A missing file yields the defaults, a malformed one is an error
    pub fn load(filepath: impl AsRef<Path>) -> Result<Self, Error> {
        let filepath = filepath.as_ref();
        if !filepath.exists() {
            log::debug!("no config at {}, using defaults", filepath.display());
            return Ok(CubeInfo::default());
        }
        let data = std::fs::read(filepath)?;
        let info = Self::from_json(&data).map_err(|e| {
            Error::new(format!("*** ERROR: Failed to parse {}: {} ***", filepath.display(), e.msg))
        })?;
        log::info!("loaded config from {}", filepath.display());
        Ok(info)
    }

    /// Parse info from json bytes
    pub fn from_json(data: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Returns the config file to read, `D3D11_CUBE_CONFIG` or `cube_config.json`
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Returns the full path of an asset inside `data_path`
    pub fn get_data_path(&self, asset: &str) -> PathBuf {
        get_data_path(&self.data_path, asset)
    }
}

/// Returns the path of `asset` inside the data directory `data_path`
pub fn get_data_path(data_path: impl AsRef<Path>, asset: &str) -> PathBuf {
    data_path.as_ref().join(asset)
}

/// Reads the precompiled vertex and pixel shaders named in `info`
pub fn load_shader_binaries(info: &CubeInfo) -> Result<(Vec<u8>, Vec<u8>), Error> {
    let read = |asset: &str| -> Result<Vec<u8>, Error> {
        let filepath = info.get_data_path(asset);
        std::fs::read(&filepath).map_err(|e| {
            Error::new(format!("*** ERROR: Failed to read shader {}: {} ***", filepath.display(), e))
        })
    };
    let vs = read(&info.vertex_shader)?;
    let ps = read(&info.pixel_shader)?;
    log::debug!("loaded shaders vs: {} bytes, ps: {} bytes", vs.len(), ps.len());
    Ok((vs, ps))
}

/// Platform backends and commonly used traits
pub mod prelude {
    #[doc(hidden)]
    pub use crate::{
        gfx,
        os,
        primitives,
        camera,
        client::Client,
        CubeInfo,
        Error,

        gfx::Device,
        gfx::SwapChain,
        os::App,
        os::Window,
        os::NativeHandle,
    };

    #[cfg(target_os = "windows")]
    pub use crate::os::win32 as os_platform;
    #[cfg(target_os = "windows")]
    pub use crate::gfx::d3d11 as gfx_platform;

    #[cfg(not(target_os = "windows"))]
    pub use crate::os::null as os_platform;
    #[cfg(not(target_os = "windows"))]
    pub use crate::gfx::null as gfx_platform;
}
