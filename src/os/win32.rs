use windows::{
    core::PCSTR,
    Win32::Foundation::*,
    Win32::Graphics::Gdi::{ValidateRect, COLOR_WINDOW, HBRUSH},
    Win32::System::Diagnostics::Debug::OutputDebugStringA,
    Win32::System::LibraryLoader::GetModuleHandleA,
    Win32::UI::Input::KeyboardAndMouse::*,
    Win32::UI::WindowsAndMessaging::*,
};

use super::AppInfo;
use super::Key;
use super::Rect;
use super::Size;
use super::WindowInfo;
use super::Window as _;
use crate::Error;

use std::cell::RefCell;
use std::ffi::CString;

pub struct App {
    window_class: CString,
    hinstance: HINSTANCE,
}

pub struct Window {
    info: WindowInfo,
    hwnd: HWND,
}

#[derive(Clone, Copy)]
pub struct NativeHandle {
    hwnd: HWND,
}

impl Window {
    pub fn get_hwnd(&self) -> HWND {
        self.hwnd
    }
}

impl super::NativeHandle<App> for NativeHandle {
    fn get_isize(&self) -> isize {
        self.hwnd.0 as isize
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        super::Window::<App>::close(self);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        unsafe {
            let _ = UnregisterClassA(PCSTR(self.window_class.as_ptr() as _), self.hinstance);
        }
    }
}

/// State written by the window procedure and read by the message loop
#[derive(Default)]
struct ProcData {
    keys_pressed: Vec<Key>,
}

thread_local! {
    static PROC_DATA: RefCell<ProcData> = RefCell::new(ProcData::default());
}

fn to_cstring(s: &str) -> Result<CString, Error> {
    CString::new(s).map_err(|e| Error::new(e.to_string()))
}

fn key_from_virtual_key(vk: VIRTUAL_KEY) -> Option<Key> {
    match vk {
        VK_ESCAPE => Some(Key::Escape),
        VK_SPACE => Some(Key::Space),
        VK_RETURN => Some(Key::Enter),
        _ => None
    }
}

impl super::App for App {
    type Window = Window;
    type NativeHandle = NativeHandle;

    fn create(info: AppInfo) -> Result<Self, Error> {
        unsafe {
            let window_class = to_cstring(&info.name)?;
            let instance : HINSTANCE = GetModuleHandleA(None)?.into();

            let wc = WNDCLASSA {
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(wndproc),
                hInstance: instance,
                hIcon: LoadIconW(None, IDI_APPLICATION)?,
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                hbrBackground: HBRUSH((COLOR_WINDOW.0 + 1) as isize as _),
                lpszClassName: PCSTR(window_class.as_ptr() as _),
                ..Default::default()
            };

            if RegisterClassA(&wc) == 0 {
                return Err(Error::new("*** ERROR: Failed to register WNDCLASS ***"));
            }
            log::debug!("registered window class {}", info.name);

            Ok(App {
                window_class,
                hinstance: instance,
            })
        }
    }

    fn create_window(&mut self, info: WindowInfo) -> Result<Window, Error> {
        let title = to_cstring(&info.title)?;
        let (x, y) = if info.rect.x < 0 || info.rect.y < 0 {
            (CW_USEDEFAULT, CW_USEDEFAULT)
        }
        else {
            (info.rect.x, info.rect.y)
        };
        unsafe {
            let hwnd = CreateWindowExA(
                WINDOW_EX_STYLE::default(),
                PCSTR(self.window_class.as_ptr() as _),
                PCSTR(title.as_ptr() as _),
                WS_OVERLAPPEDWINDOW,
                x,
                y,
                info.rect.width,
                info.rect.height,
                None,
                None,
                self.hinstance,
                None,
            ).map_err(|_| Error::new("*** ERROR: Failed to create window ***"))?;

            let mut window = Window {
                hwnd,
                info,
            };
            if window.info.visible {
                super::Window::<App>::show(&window);
            }
            super::Window::<App>::update(&mut window, self);
            Ok(window)
        }
    }

    fn run(&mut self) -> bool {
        PROC_DATA.with(|data| data.borrow_mut().keys_pressed.clear());
        unsafe {
            let mut msg = MSG::default();
            let mut quit = false;
            while PeekMessageA(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageA(&msg);
                if msg.message == WM_QUIT {
                    quit = true;
                    break;
                }
            }
            !quit
        }
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        PROC_DATA.with(|data| data.borrow().keys_pressed.contains(&key))
    }

    fn output_debug_string(&self, msg: &str) {
        Self::emit_debug_string(msg);
    }

    fn emit_debug_string(msg: &str) {
        if let Ok(msg) = CString::new(format!("{}\n", msg)) {
            unsafe {
                OutputDebugStringA(PCSTR(msg.as_ptr() as _));
            }
        }
    }
}

impl super::Window<App> for Window {
    fn show(&self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOW);
        }
    }

    fn update(&mut self, _app: &mut App) {
        if self.is_closed() {
            return;
        }
        unsafe {
            let mut client_rect = RECT::default();
            if GetClientRect(self.hwnd, &mut client_rect).is_ok() {
                self.info.rect.width = client_rect.right - client_rect.left;
                self.info.rect.height = client_rect.bottom - client_rect.top;
            }
            let mut win_rect = RECT::default();
            if GetWindowRect(self.hwnd, &mut win_rect).is_ok() {
                self.info.rect.x = win_rect.left;
                self.info.rect.y = win_rect.top;
            }
        }
    }

    fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        unsafe {
            if let Err(e) = DestroyWindow(self.hwnd) {
                log::warn!("failed to destroy window: {}", e.message());
            }
        }
    }

    fn is_closed(&self) -> bool {
        unsafe {
            !IsWindow(self.hwnd).as_bool()
        }
    }

    fn get_size(&self) -> Size<i32> {
        Size {
            x: self.info.rect.width,
            y: self.info.rect.height,
        }
    }

    fn get_viewport_rect(&self) -> Rect<i32> {
        Rect {
            x: 0,
            y: 0,
            width: self.info.rect.width,
            height: self.info.rect.height,
        }
    }

    fn get_native_handle(&self) -> NativeHandle {
        NativeHandle {
            hwnd: self.hwnd
        }
    }
}

extern "system" fn wndproc(window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        match message {
            WM_KEYDOWN => {
                if let Some(key) = key_from_virtual_key(VIRTUAL_KEY(wparam.0 as u16)) {
                    PROC_DATA.with(|data| data.borrow_mut().keys_pressed.push(key));
                }
                LRESULT(0)
            }
            WM_PAINT => {
                let _ = ValidateRect(window, None);
                LRESULT(0)
            }
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcA(window, message, wparam, lparam),
        }
    }
}
