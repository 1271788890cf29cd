use serde::{Deserialize, Serialize};
use std::any::Any;

use crate::Error;

/// Implements this interface for windows win32 platfrom
#[cfg(target_os = "windows")]
pub mod win32;

/// Headless implementation which can be driven from tests
pub mod null;

/// Describes a rectangle starting at the top left corner specified by x,y
/// with the size of width and height.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

/// 2D size
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Size<T> {
    pub x: T,
    pub y: T,
}

/// Keys the sample responds to
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Space,
    Enter,
}

/// Information to create an application
#[derive(Clone)]
pub struct AppInfo {
    /// Name of the app, also used to register the window class
    pub name: String,
}

/// Filled out to specify various window parameters
/// when a window is created by `App::create_window`
#[derive(Clone)]
pub struct WindowInfo {
    pub title: String,
    /// Negative x or y lets the os choose the position
    pub rect: Rect<i32>,
    /// Show the window as soon as it is created
    pub visible: bool,
}

/// Native handle of a window which graphics backends can consume
pub trait NativeHandle<A: App> {
    fn get_isize(&self) -> isize;
}

/// An interface which all platforms need to implement
/// for general operating system calls
pub trait App: 'static + Any + Sized {
    type Window: Window<Self>;
    type NativeHandle: NativeHandle<Self>;
    /// Create the application instance, registering any window classes it needs
    fn create(info: AppInfo) -> Result<Self, Error>;
    /// Create a new operating system window
    fn create_window(&mut self, info: WindowInfo) -> Result<Self::Window, Error>;
    /// Pump all pending messages without blocking, returns false once a quit message was received
    fn run(&mut self) -> bool;
    /// Returns true if `key` went down during the last call to `run`
    fn is_key_pressed(&self, key: Key) -> bool;
    /// Emit a diagnostic string to the platform debug output
    fn output_debug_string(&self, msg: &str);
    /// Emit a diagnostic string to the platform debug output when no app could be created
    fn emit_debug_string(msg: &str);
}

/// An instance of an operating system window
pub trait Window<A: App>: Any + Sized {
    /// Make the window visible
    fn show(&self);
    /// Refresh the cached window rect from the os
    fn update(&mut self, app: &mut A);
    /// Destroy the window, the app will receive a quit message as a result
    fn close(&mut self);
    /// True once the window has been destroyed
    fn is_closed(&self) -> bool;
    fn get_size(&self) -> Size<i32>;
    /// Returns the client area of the window with the origin at 0,0
    fn get_viewport_rect(&self) -> Rect<i32>;
    fn get_native_handle(&self) -> A::NativeHandle;
}

impl Default for WindowInfo {
    fn default() -> Self {
        WindowInfo {
            title: "D3D11Cube".to_string(),
            rect: Rect {
                x: -1,
                y: -1,
                width: 1280,
                height: 720
            },
            visible: false
        }
    }
}

impl<T> Rect<T> where T: Copy + Into<f64> {
    /// Width divided by height
    pub fn aspect(&self) -> f32 {
        let h : f64 = self.height.into();
        if h == 0.0 {
            return 1.0;
        }
        (self.width.into() / h) as f32
    }
}
