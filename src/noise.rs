//! 3D simplex noise on the host.
//!
//! Same algorithm as `noise3` in [`shader::NOISE_WGSL`](crate::shader::NOISE_WGSL),
//! so the reference backend follows the same flow field as the GPU.
//! Results agree to float precision, not bit for bit.

use glam::{Vec2, Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute4(x: Vec4) -> Vec4 {
    mod289_4((x * 34.0 + 1.0) * x)
}

fn taylor_inv_sqrt4(r: Vec4) -> Vec4 {
    Vec4::splat(1.792_842_9) - 0.853_734_73 * r
}

/// `step(edge, x)`: 0 where `x < edge`, else 1.
fn step3(edge: Vec3, x: Vec3) -> Vec3 {
    Vec3::select(x.cmplt(edge), Vec3::ZERO, Vec3::ONE)
}

fn step4(edge: Vec4, x: Vec4) -> Vec4 {
    Vec4::select(x.cmplt(edge), Vec4::ZERO, Vec4::ONE)
}

/// Simplex noise in roughly `[-1, 1]`.
pub fn noise3(v: Vec3) -> f32 {
    let c = Vec2::new(1.0 / 6.0, 1.0 / 3.0);
    let d = Vec4::new(0.0, 0.5, 1.0, 2.0);

    // First corner
    let mut i = (v + v.dot(Vec3::splat(c.y))).floor();
    let x0 = v - i + i.dot(Vec3::splat(c.x));

    // Other corners
    let g = step3(x0.yzx(), x0);
    let l = Vec3::ONE - g;
    let i1 = g.min(l.zxy());
    let i2 = g.max(l.zxy());

    let x1 = x0 - i1 + c.x;
    let x2 = x0 - i2 + c.y;
    let x3 = x0 - d.y;

    // Permutations
    i = mod289_3(i);
    let p = permute4(
        permute4(
            permute4(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + i.y
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + i.x
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    // Gradients: 7x7 points over a square, mapped onto an octahedron
    let n_ = 0.142_857_15;
    let ns = n_ * d.wyz() - d.xzx();

    let j = p - 49.0 * (p * ns.z * ns.z).floor();

    let x_ = (j * ns.z).floor();
    let y_ = (j - 7.0 * x_).floor();

    let x = x_ * ns.x + ns.y;
    let y = y_ * ns.x + ns.y;
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + 1.0;
    let s1 = b1.floor() * 2.0 + 1.0;
    let sh = -step4(h, Vec4::ZERO);

    let a0 = b0.xzyw() + s0.xzyw() * sh.xxyy();
    let a1 = b1.xzyw() + s1.xzyw() * sh.zzww();

    let mut p0 = Vec3::new(a0.x, a0.y, h.x);
    let mut p1 = Vec3::new(a0.z, a0.w, h.y);
    let mut p2 = Vec3::new(a1.x, a1.y, h.z);
    let mut p3 = Vec3::new(a1.z, a1.w, h.w);

    let norm = taylor_inv_sqrt4(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    let m = (Vec4::splat(0.6) - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3)))
        .max(Vec4::ZERO);
    let m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}
