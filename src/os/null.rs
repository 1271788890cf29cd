use super::AppInfo;
use super::Key;
use super::Rect;
use super::Size;
use super::WindowInfo;
use crate::Error;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Messages a null app can be fed to emulate an os message queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    KeyDown(Key),
    Quit,
}

#[derive(Default)]
struct Queue {
    pending: VecDeque<Message>,
    pressed: Vec<Key>,
    quit: bool,
    debug_output: Vec<String>,
    num_runs: usize,
}

/// Headless app, all windows created from it share its message queue
#[derive(Clone)]
pub struct App {
    name: String,
    queue: Rc<RefCell<Queue>>,
}

#[derive(Clone)]
pub struct Window {
    info: WindowInfo,
    visible: Rc<RefCell<bool>>,
    closed: bool,
    queue: Rc<RefCell<Queue>>,
}

#[derive(Clone, Copy)]
pub struct NativeHandle;

impl App {
    /// Queue a key press which will be seen by the next `run`
    pub fn push_key(&self, key: Key) {
        self.queue.borrow_mut().pending.push_back(Message::KeyDown(key));
    }

    /// Queue a quit message, as if the os asked the app to exit
    pub fn request_quit(&self) {
        self.queue.borrow_mut().pending.push_back(Message::Quit);
    }

    /// All strings passed to `output_debug_string`
    pub fn debug_output(&self) -> Vec<String> {
        self.queue.borrow().debug_output.clone()
    }

    /// Number of times `run` has been called
    pub fn num_runs(&self) -> usize {
        self.queue.borrow().num_runs
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }
}

impl Window {
    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    /// Change the client size, as if the user dragged the window border
    pub fn resize(&mut self, width: i32, height: i32) {
        self.info.rect.width = width;
        self.info.rect.height = height;
    }
}

impl super::NativeHandle<App> for NativeHandle {
    fn get_isize(&self) -> isize {
        0
    }
}

impl super::App for App {
    type Window = Window;
    type NativeHandle = NativeHandle;

    fn create(info: AppInfo) -> Result<Self, Error> {
        Ok(App {
            name: info.name,
            queue: Rc::new(RefCell::new(Queue::default())),
        })
    }

    fn create_window(&mut self, info: WindowInfo) -> Result<Window, Error> {
        if info.rect.width <= 0 || info.rect.height <= 0 {
            return Err(Error::new("*** ERROR: Failed to create window ***"));
        }
        let visible = info.visible;
        Ok(Window {
            info,
            visible: Rc::new(RefCell::new(visible)),
            closed: false,
            queue: self.queue.clone(),
        })
    }

    fn run(&mut self) -> bool {
        let mut queue = self.queue.borrow_mut();
        queue.num_runs += 1;
        queue.pressed.clear();
        while let Some(msg) = queue.pending.pop_front() {
            match msg {
                Message::KeyDown(key) => queue.pressed.push(key),
                Message::Quit => {
                    queue.quit = true;
                    break;
                }
            }
        }
        !queue.quit
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        self.queue.borrow().pressed.contains(&key)
    }

    fn output_debug_string(&self, msg: &str) {
        Self::emit_debug_string(msg);
        self.queue.borrow_mut().debug_output.push(msg.to_string());
    }

    fn emit_debug_string(msg: &str) {
        eprintln!("{}", msg);
    }
}

impl super::Window<App> for Window {
    fn show(&self) {
        *self.visible.borrow_mut() = true;
    }

    fn update(&mut self, _app: &mut App) {}

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        *self.visible.borrow_mut() = false;
        self.queue.borrow_mut().pending.push_back(Message::Quit);
    }

    fn is_closed(&self) -> bool {
        self.closed
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
        NativeHandle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::App as _;
    use crate::os::Window as _;

    fn create_app() -> App {
        App::create(AppInfo { name: "null".to_string() }).unwrap()
    }

    #[test]
    fn key_presses_last_one_run() {
        let mut app = create_app();
        app.push_key(Key::Escape);
        assert!(app.run());
        assert!(app.is_key_pressed(Key::Escape));
        assert!(!app.is_key_pressed(Key::Space));
        assert!(app.run());
        assert!(!app.is_key_pressed(Key::Escape));
    }

    #[test]
    fn closing_window_quits_app() {
        let mut app = create_app();
        let mut window = app.create_window(WindowInfo::default()).unwrap();
        assert!(app.run());
        window.close();
        window.close();
        assert!(window.is_closed());
        assert!(!app.run());
        assert!(!app.run());
    }

    #[test]
    fn zero_sized_window_fails() {
        let mut app = create_app();
        let info = WindowInfo {
            rect: Rect { x: 0, y: 0, width: 0, height: 720 },
            ..Default::default()
        };
        assert!(app.create_window(info).is_err());
    }
}
