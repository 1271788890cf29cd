use crate::CameraInfo;

use maths_rs::prelude::*;

/// Left handed perspective projection with y up, mapping view space z in near..far to depth 0..1
pub fn create_perspective_projection_lh(fov: f32, aspect: f32, near: f32, far: f32) -> Mat4f {
    let ys = 1.0 / f32::tan(fov * 0.5);
    let xs = ys / aspect;
    let zs = far / (far - near);
    Mat4f::from((
        Vec4f::new(xs, 0.0, 0.0, 0.0),
        Vec4f::new(0.0, ys, 0.0, 0.0),
        Vec4f::new(0.0, 0.0, zs, -near * zs),
        Vec4f::new(0.0, 0.0, 1.0, 0.0)
    ))
}

/// Left handed view matrix at `eye` looking towards `at`
pub fn create_look_at_lh(eye: Vec3f, at: Vec3f, up: Vec3f) -> Mat4f {
    let zaxis = normalize(at - eye);
    let xaxis = normalize(cross(up, zaxis));
    let yaxis = cross(zaxis, xaxis);
    Mat4f::from((
        Vec4f::new(xaxis.x, xaxis.y, xaxis.z, -dot(xaxis, eye)),
        Vec4f::new(yaxis.x, yaxis.y, yaxis.z, -dot(yaxis, eye)),
        Vec4f::new(zaxis.x, zaxis.y, zaxis.z, -dot(zaxis, eye)),
        Vec4f::new(0.0, 0.0, 0.0, 1.0)
    ))
}

/// World, view and projection for the cube, filled once at setup
#[derive(Debug, Copy, Clone)]
pub struct Transforms {
    pub world: Mat4f,
    pub view: Mat4f,
    pub projection: Mat4f,
}

/// Gpu layout of `Transforms`, rows are uploaded as is and read as `row_major` in the vertex shader
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransformConstants {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

fn to_rows(m: &Mat4f) -> [[f32; 4]; 4] {
    let rows = [m.get_row(0), m.get_row(1), m.get_row(2), m.get_row(3)];
    rows.map(|r| [r.x, r.y, r.z, r.w])
}

impl Transforms {
    /// Identity world, view from `camera` and a projection for `aspect`
    pub fn new(camera: &CameraInfo, aspect: f32) -> Self {
        let eye = Vec3f::new(camera.eye[0], camera.eye[1], camera.eye[2]);
        let at = Vec3f::new(camera.at[0], camera.at[1], camera.at[2]);
        Transforms {
            world: Mat4f::identity(),
            view: create_look_at_lh(eye, at, Vec3f::unit_y()),
            projection: create_perspective_projection_lh(
                f32::deg_to_rad(camera.fov_degrees), aspect, camera.near, camera.far
            ),
        }
    }

    pub fn as_constants(&self) -> TransformConstants {
        TransformConstants {
            world: to_rows(&self.world),
            view: to_rows(&self.view),
            projection: to_rows(&self.projection),
        }
    }

    /// Transform an object space position to clip space
    pub fn to_clip(&self, pos: Vec3f) -> Vec4f {
        self.projection * (self.view * (self.world * Vec4f::new(pos.x, pos.y, pos.z, 1.0)))
    }
}
