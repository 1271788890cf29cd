use d3d11_cube::prelude::*;
use d3d11_cube::gfx::null::Step;

use std::path::PathBuf;

type NullClient = Client<gfx::null::Device, os::null::App>;

/// Writes placeholder shader binaries into a per test data directory
fn create_data_dir(name: &str) -> Result<PathBuf, Error> {
    let dir = std::env::temp_dir().join("d3d11_cube_tests").join(name);
    std::fs::create_dir_all(dir.join("shaders"))?;
    std::fs::write(dir.join("shaders/cube_vs.cso"), b"vs byte code")?;
    std::fs::write(dir.join("shaders/cube_ps.cso"), b"ps byte code")?;
    Ok(dir)
}

fn create_info(name: &str) -> Result<CubeInfo, Error> {
    Ok(CubeInfo {
        data_path: create_data_dir(name)?.to_string_lossy().to_string(),
        ..Default::default()
    })
}

fn create_parts(info: &CubeInfo) -> Result<(os::null::App, os::null::Window, gfx::null::Device), Error> {
    let mut app = os::null::App::create(os::AppInfo {
        name: info.name.to_string(),
    })?;
    let window = app.create_window(os::WindowInfo {
        title: info.title.to_string(),
        rect: info.window_rect,
        visible: false,
    })?;
    let device = gfx::null::Device::create(&gfx::DeviceInfo::default())?;
    Ok((app, window, device))
}

#[test]
fn create_client() -> Result<(), Error> {
    let client = NullClient::create(create_info("create_client")?)?;
    assert!(!client.is_released());
    assert!(client.main_window.is_visible());
    assert_eq!(client.frame_count(), 0);
    let resources = client.get_resources().unwrap();
    assert_eq!(resources.mesh.num_indices, 36);
    assert_eq!(resources.swap_chain.get_num_buffers(), 1);
    assert_eq!(resources.swap_chain.get_clear_colour(), client.info.clear_colour);
    Ok(())
}

#[test]
fn setup_creates_resources_in_order() -> Result<(), Error> {
    let info = create_info("setup_order")?;
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let _client = NullClient::from_parts(app, window, device, info)?;

    let creates : Vec<String> = recorder.calls().into_iter()
        .filter(|c| c.starts_with("create") || c.starts_with("update"))
        .collect();
    assert_eq!(creates, vec![
        "create device",
        "create swap_chain",
        "create depth_stencil",
        "create vertex_shader",
        "create pixel_shader",
        "create render_pipeline",
        "create vertex_buffer",
        "create index_buffer",
        "create constant_buffer",
        "update_buffer 192",
    ]);
    assert_eq!(recorder.live_resources(), 9);
    Ok(())
}

#[test]
fn release_is_idempotent() -> Result<(), Error> {
    let info = create_info("release_twice")?;
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let mut client = NullClient::from_parts(app, window, device, info)?;

    client.release();
    assert!(client.is_released());
    assert_eq!(recorder.live_resources(), 0);
    let calls = recorder.calls().len();

    client.release();
    assert_eq!(recorder.live_resources(), 0);
    assert_eq!(recorder.calls().len(), calls);
    assert_eq!(recorder.calls().last().map(|c| c.as_str()), Some("release device"));

    assert!(client.draw_frame().is_err());
    drop(client);
    assert_eq!(recorder.calls().len(), calls);
    Ok(())
}

#[test]
fn release_is_reverse_creation_order() -> Result<(), Error> {
    let info = create_info("release_order")?;
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let mut client = NullClient::from_parts(app, window, device, info)?;

    let created : Vec<String> = recorder.calls().iter()
        .filter_map(|c| c.strip_prefix("create ").map(|r| format!("release {}", r)))
        .rev()
        .collect();

    let setup_calls = recorder.calls().len();
    client.release();
    let released = recorder.calls()[setup_calls..].to_vec();
    assert_eq!(released, created);
    assert_eq!(released.first().map(|c| c.as_str()), Some("release constant_buffer"));
    assert_eq!(released.last().map(|c| c.as_str()), Some("release device"));
    Ok(())
}

#[test]
fn drop_releases_everything() -> Result<(), Error> {
    let info = create_info("drop_releases")?;
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let client = NullClient::from_parts(app, window, device, info)?;
    assert!(recorder.live_resources() > 0);
    drop(client);
    assert_eq!(recorder.live_resources(), 0);
    assert_eq!(recorder.created_resources(), 9);
    Ok(())
}

#[test]
fn draw_frame_issues_single_draw() -> Result<(), Error> {
    let info = create_info("draw_frame")?;
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let mut client = NullClient::from_parts(app, window, device, info)?;

    let setup_calls = recorder.calls().len();
    client.draw_frame()?;
    let frame : Vec<String> = recorder.calls()[setup_calls..].to_vec();
    assert_eq!(frame, vec![
        "begin_frame 1280x720 clear(0.45, 0.55, 0.6, 1)",
        "set_render_pipeline",
        "set_vertex_buffer 0",
        "set_index_buffer",
        "set_constant_buffer 0",
        "draw_indexed 36 0 0",
        "present 1",
    ]);

    client.draw_frame()?;
    assert_eq!(client.frame_count(), 2);
    assert_eq!(recorder.count_calls("draw_indexed"), 2);
    assert_eq!(recorder.count_calls("present"), 2);
    Ok(())
}

#[test]
fn sync_interval_is_passed_to_present() -> Result<(), Error> {
    let info = CubeInfo {
        sync_interval: 0,
        ..create_info("sync_interval")?
    };
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let mut client = NullClient::from_parts(app, window, device, info)?;
    client.draw_frame()?;
    assert_eq!(recorder.count_calls("present 0"), 1);
    Ok(())
}

#[test]
fn failed_setup_releases_everything() -> Result<(), Error> {
    let steps = [
        (Step::SwapChain, 1),
        (Step::DepthStencil, 1),
        (Step::Shader, 1),
        (Step::Shader, 2),
        (Step::RenderPipeline, 1),
        (Step::Buffer, 1),
        (Step::Buffer, 2),
        (Step::Buffer, 3),
        (Step::UpdateBuffer, 1),
    ];
    for (step, nth) in steps {
        let info = create_info("failed_setup")?;
        let (app, window, mut device) = create_parts(&info)?;
        device.fail_at(step, nth);
        let recorder = device.recorder();
        let mut observer = app.clone();

        let result = NullClient::from_parts(app, window, device, info);
        assert!(result.is_err(), "{:?} {} should fail setup", step, nth);
        assert_eq!(recorder.live_resources(), 0, "{:?} {} leaked resources", step, nth);

        // the error is reported and the window destroyed, which quits the app
        assert_eq!(observer.debug_output().len(), 1);
        assert!(observer.debug_output()[0].contains("ERROR"));
        assert!(!observer.run());
    }
    Ok(())
}

#[test]
fn missing_shaders_fail_setup() -> Result<(), Error> {
    let info = CubeInfo {
        data_path: std::env::temp_dir().join("d3d11_cube_tests").join("empty").to_string_lossy().to_string(),
        ..Default::default()
    };
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let err = NullClient::from_parts(app, window, device, info).err().unwrap();
    assert!(err.msg.contains("Failed to read shader"));
    assert_eq!(recorder.live_resources(), 0);
    assert_eq!(recorder.count_calls("create vertex_shader"), 0);
    Ok(())
}

#[test]
fn zero_sized_window_fails_create() -> Result<(), Error> {
    let info = CubeInfo {
        window_rect: os::Rect { x: -1, y: -1, width: 0, height: 0 },
        ..Default::default()
    };
    assert!(NullClient::create(info.clone()).is_err());

    let app = os::null::App::create(os::AppInfo {
        name: info.name.to_string(),
    })?;
    let observer = app.clone();
    let err = NullClient::create_with_app(app, info).err().unwrap();
    assert!(err.msg.contains("Failed to create window"));
    assert_eq!(observer.debug_output(), vec![err.msg]);
    Ok(())
}

#[test]
fn failed_device_closes_window() -> Result<(), Error> {
    let info = CubeInfo {
        adapter_name: Some("discrete gpu".to_string()),
        ..create_info("failed_device")?
    };
    let app = os::null::App::create(os::AppInfo {
        name: info.name.to_string(),
    })?;
    let mut observer = app.clone();

    let err = NullClient::create_with_app(app, info).err().unwrap();
    assert!(err.msg.contains("No adapter named discrete gpu"));
    assert_eq!(observer.debug_output().len(), 1);
    // the window was destroyed, so the app only sees a quit
    assert!(!observer.run());
    Ok(())
}

#[test]
fn adapter_name_selects_device() -> Result<(), Error> {
    let info = CubeInfo {
        adapter_name: Some("null".to_string()),
        ..create_info("adapter_name")?
    };
    let client = NullClient::create(info)?;
    let device = client.get_device().unwrap();
    assert_eq!(device.get_adapter_name(), gfx::null::ADAPTER_NAME);
    Ok(())
}

#[test]
fn viewport_keeps_initial_size_after_resize() -> Result<(), Error> {
    let info = create_info("resize")?;
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let mut client = NullClient::from_parts(app, window, device, info)?;

    client.main_window.resize(640, 480);
    client.draw_frame()?;
    assert_eq!(recorder.count_calls("begin_frame 1280x720"), 1);
    assert_eq!(recorder.count_calls("begin_frame 640x480"), 0);
    Ok(())
}

#[test]
fn close_key_ends_run() -> Result<(), Error> {
    let info = create_info("close_key")?;
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let observer = app.clone();
    let client = NullClient::from_parts(app, window, device, info)?;

    observer.push_key(os::Key::Escape);
    client.run()?;

    assert_eq!(recorder.count_calls("draw_indexed"), 0);
    assert_eq!(recorder.live_resources(), 0);
    assert_eq!(observer.num_runs(), 2);
    Ok(())
}

#[test]
fn other_keys_do_not_close() -> Result<(), Error> {
    let info = create_info("other_keys")?;
    let (app, window, mut device) = create_parts(&info)?;
    // stop the loop on the second present
    device.fail_at(Step::Present, 2);
    let recorder = device.recorder();
    let observer = app.clone();
    let client = NullClient::from_parts(app, window, device, info)?;

    observer.push_key(os::Key::Space);
    assert!(client.run().is_err());
    assert_eq!(recorder.count_calls("draw_indexed"), 2);
    assert_eq!(recorder.count_calls("present"), 1);
    Ok(())
}

#[test]
fn quit_message_ends_run() -> Result<(), Error> {
    let info = create_info("quit_message")?;
    let (app, window, device) = create_parts(&info)?;
    let recorder = device.recorder();
    let observer = app.clone();
    let client = NullClient::from_parts(app, window, device, info)?;

    observer.request_quit();
    client.run()?;
    assert_eq!(recorder.count_calls("draw_indexed"), 0);
    assert_eq!(recorder.live_resources(), 0);
    Ok(())
}

#[test]
fn failed_present_releases_and_reports() -> Result<(), Error> {
    let info = create_info("failed_present")?;
    let (app, window, mut device) = create_parts(&info)?;
    device.fail_at(Step::Present, 3);
    let recorder = device.recorder();
    let mut observer = app.clone();
    let client = NullClient::from_parts(app, window, device, info)?;

    let err = client.run().err().unwrap();
    assert!(err.msg.contains("Present"));
    assert_eq!(recorder.count_calls("present"), 2);
    assert_eq!(recorder.live_resources(), 0);
    assert_eq!(observer.debug_output().len(), 1);
    assert!(!observer.run());
    Ok(())
}

#[test]
#[cfg(target_os = "windows")]
fn create_d3d11_device_and_window() -> Result<(), Error> {
    use d3d11_cube::gfx::d3d11;
    use d3d11_cube::os::win32;

    let mut app = win32::App::create(os::AppInfo {
        name: "d3d11_cube_test".to_string(),
    })?;
    let window = app.create_window(os::WindowInfo {
        title: "d3d11_cube_test".to_string(),
        rect: os::Rect { x: 0, y: 0, width: 640, height: 480 },
        visible: false,
    })?;
    let mut device = d3d11::Device::create(&gfx::DeviceInfo::default())?;
    assert!(!device.get_adapter_name().is_empty());
    let mut swap_chain = device.create_swap_chain::<win32::App>(&gfx::SwapChainInfo {
        num_buffers: 1,
        format: gfx::Format::RGB10A2n,
        clear_colour: CubeInfo::default().clear_colour,
        width: 640,
        height: 480,
        sync_interval: 0,
    }, &window)?;
    let depth_stencil = device.create_depth_stencil(&gfx::DepthStencilInfo {
        width: 640,
        height: 480,
        format: gfx::Format::D24nS8u,
    })?;
    let mesh = primitives::create_cube_mesh(&mut device)?;
    assert_eq!(mesh.num_indices, 36);
    let viewport = gfx::Viewport::from(window.get_viewport_rect());
    device.begin_frame(&swap_chain, &depth_stencil, &viewport);
    swap_chain.swap(&device)?;
    Ok(())
}
