use d3d11_cube::prelude::*;
use d3d11_cube::primitives::*;

use maths_rs::prelude::*;

use std::collections::HashSet;

fn centroid(tri: [u16; 3]) -> Vec3f {
    let mut c = Vec3f::zero();
    for i in tri {
        let p = CUBE_VERTICES[i as usize].position;
        c = c + Vec3f::new(p[0], p[1], p[2]);
    }
    c / 3.0
}

#[test]
fn cube_counts() {
    assert_eq!(CUBE_VERTICES.len(), 8);
    assert_eq!(CUBE_INDICES.len(), 36);
    assert_eq!(triangles(&CUBE_INDICES).count(), 12);
    assert!(CUBE_INDICES.iter().all(|i| (*i as usize) < CUBE_VERTICES.len()));
}

#[test]
fn cube_uses_every_corner() {
    let used : HashSet<u16> = CUBE_INDICES.iter().cloned().collect();
    assert_eq!(used.len(), 8);
}

#[test]
fn cube_corners_are_unit_and_distinct() {
    let mut seen = HashSet::new();
    for v in &CUBE_VERTICES {
        assert!(v.position.iter().all(|c| *c == 1.0 || *c == -1.0));
        assert!(v.colour.iter().all(|c| (0.0..=1.0).contains(c)));
        seen.insert(v.position.map(|c| c as i32));
    }
    assert_eq!(seen.len(), 8);
}

#[test]
fn cube_is_closed_manifold() {
    assert!(is_closed_manifold(&CUBE_INDICES));
    let edges = edge_use_counts(&CUBE_INDICES);
    assert_eq!(edges.len(), 18);
    assert!(edges.values().all(|c| *c == 2));

    // euler characteristic of a sphere: V - E + F = 2
    let v = CUBE_VERTICES.len() as i32;
    let e = edges.len() as i32;
    let f = triangles(&CUBE_INDICES).count() as i32;
    assert_eq!(v - e + f, 2);
}

#[test]
fn cube_faces_point_outward() {
    for tri in triangles(&CUBE_INDICES) {
        let n = face_normal(&CUBE_VERTICES, tri);
        assert!(dot(n, centroid(tri)) > 0.0, "triangle {:?} faces inward", tri);
    }
}

#[test]
fn cube_is_visible_from_default_camera() {
    let transforms = camera::Transforms::new(&d3d11_cube::CameraInfo::default(), 1280.0 / 720.0);
    for v in &CUBE_VERTICES {
        let p = v.position;
        let clip = transforms.to_clip(Vec3f::new(p[0], p[1], p[2]));
        assert!(clip.w > 0.0);
        let ndc = Vec3f::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w);
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!(ndc.z >= 0.0 && ndc.z <= 1.0);
    }
}

#[test]
fn config_defaults() {
    let info = CubeInfo::default();
    assert_eq!(info.num_buffers, 1);
    assert_eq!(info.sync_interval, 1);
    assert_eq!(info.clear_colour, gfx::ClearColour { r: 0.45, g: 0.55, b: 0.60, a: 1.0 });
    assert_eq!(info.debug_device, cfg!(debug_assertions));
    assert_eq!(info.vertex_shader, "shaders/cube_vs.cso");
    assert_eq!(info.pixel_shader, "shaders/cube_ps.cso");
    assert_eq!(info.adapter_name, None);
}

#[test]
fn config_partial_json_keeps_defaults() -> Result<(), Error> {
    let info = CubeInfo::from_json(br#"{
        "title": "cube",
        "window_rect": { "x": 10, "y": 20, "width": 640, "height": 480 },
        "close_key": "Space",
        "camera": { "fov_degrees": 45.0 }
    }"#)?;
    assert_eq!(info.title, "cube");
    assert_eq!(info.window_rect, os::Rect { x: 10, y: 20, width: 640, height: 480 });
    assert_eq!(info.close_key, os::Key::Space);
    assert_eq!(info.camera.fov_degrees, 45.0);
    assert_eq!(info.camera.eye, d3d11_cube::CameraInfo::default().eye);
    assert_eq!(info.name, "AppWindow");
    Ok(())
}

#[test]
fn config_rejects_bad_json() {
    assert!(CubeInfo::from_json(b"{ \"title\": ").is_err());
    assert!(CubeInfo::from_json(br#"{ "titel": "typo" }"#).is_err());
    assert!(CubeInfo::from_json(br#"{ "close_key": "F13" }"#).is_err());
}

#[test]
fn config_load_missing_file_is_default() -> Result<(), Error> {
    let path = std::env::temp_dir().join("d3d11_cube_tests_missing").join("nope.json");
    let info = CubeInfo::load(&path)?;
    assert_eq!(info, CubeInfo::default());
    Ok(())
}

#[test]
fn config_load_malformed_file_errors() -> Result<(), Error> {
    let dir = std::env::temp_dir().join("d3d11_cube_tests_malformed");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("cube_config.json");
    std::fs::write(&path, "not json")?;
    let err = CubeInfo::load(&path).unwrap_err();
    assert!(err.msg.contains("Failed to parse"));
    Ok(())
}

#[test]
fn missing_shaders_error() {
    let info = CubeInfo {
        data_path: std::env::temp_dir().join("d3d11_cube_tests_no_shaders").to_string_lossy().to_string(),
        ..Default::default()
    };
    let err = d3d11_cube::load_shader_binaries(&info).unwrap_err();
    assert!(err.msg.contains("Failed to read shader"));
}
