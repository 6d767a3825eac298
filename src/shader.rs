//! WGSL sources and the uniform blocks that feed them.
//!
//! The compute shader advances the state texture exactly like
//! [`flow::advance`](crate::flow::advance); the render shader draws one
//! instanced quad per live particle.

use bytemuck::{Pod, Zeroable};

use crate::flow::{FLOW_COMPONENT_OFFSETS, FLOW_TIME_SCALE};

/// Workgroup edge of the compute shader (8x8 invocations).
pub const WORKGROUP_SIZE: u32 = 8;

/// Vertices per sprite quad.
pub const QUAD_VERTICES: u32 = 6;

/// 3D simplex noise, same algorithm as [`noise3`](crate::noise::noise3).
pub const NOISE_WGSL: &str = r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn noise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0 / 6.0, 1.0 / 3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    var i = floor(v + dot(v, vec3(C.y)));
    let x0 = v - i + dot(i, vec3(C.x));

    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.x;
    let x2 = x0 - i2 + C.y;
    let x3 = x0 - D.yyy;

    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
      + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
      + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    let n_ = 0.142857142857;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);

    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);

    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    var m = max(0.6 - vec4<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m * m, vec4<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2), dot(p3, x3)));
}
"#;

const COMPUTE_BODY_WGSL: &str = r#"
struct SimUniforms {
    time: f32,
    delta_time: f32,
    influence: f32,
    strength: f32,
    frequency: f32,
    count: u32,
    side: u32,
    _pad: u32,
};

@group(0) @binding(0)
var<uniform> sim: SimUniforms;

@group(0) @binding(1)
var current_state: texture_2d<f32>;

@group(0) @binding(2)
var base_state: texture_2d<f32>;

@group(0) @binding(3)
var next_state: texture_storage_2d<rgba32float, write>;

@compute @workgroup_size(8, 8)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= sim.side || id.y >= sim.side {
        return;
    }

    let texel = vec2<i32>(id.xy);
    let current = textureLoad(current_state, texel, 0);

    // Padding texels are copied through untouched.
    if id.y * sim.side + id.x >= sim.count {
        textureStore(next_state, texel, current);
        return;
    }

    let anchor = textureLoad(base_state, texel, 0).xyz;
    let reach = sim.strength * sim.delta_time;

    let pull = (anchor - current.xyz) * min(reach, 1.0);
    let flow = flow_direction(current.xyz, sim.time, sim.frequency) * reach;
    let displacement = mix(pull, flow, vec3<f32>(sim.influence));

    textureStore(next_state, texel, vec4<f32>(current.xyz + displacement, current.w));
}
"#;

/// WGSL for the flow field, built from the host constants.
pub fn flow_wgsl() -> String {
    let [o0, o1, o2] = FLOW_COMPONENT_OFFSETS;
    format!(
        r#"
fn flow_direction(position: vec3<f32>, time: f32, frequency: f32) -> vec3<f32> {{
    let t = vec3<f32>(time * {scale:?});
    let p = position * frequency;
    let field = vec3<f32>(
        noise3(p + vec3<f32>({:?}, {:?}, {:?}) + t),
        noise3(p + vec3<f32>({:?}, {:?}, {:?}) + t),
        noise3(p + vec3<f32>({:?}, {:?}, {:?}) + t),
    );
    let len = length(field);
    if len > 0.0 {{
        return field / len;
    }}
    return vec3<f32>(0.0);
}}
"#,
        o0[0],
        o0[1],
        o0[2],
        o1[0],
        o1[1],
        o1[2],
        o2[0],
        o2[1],
        o2[2],
        scale = FLOW_TIME_SCALE,
    )
}

/// Complete compute shader: noise, flow field and the state advance.
pub fn compute_shader() -> String {
    format!("{}\n{}\n{}", NOISE_WGSL, flow_wgsl(), COMPUTE_BODY_WGSL)
}

/// Point sprite shader. Instance `i` reads texel `(i mod S, i div S)`.
pub const RENDER_WGSL: &str = r#"
struct RenderUniforms {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    resolution: vec2<f32>,
    particle_size: f32,
    radius_scale: f32,
    color: vec4<f32>,
    side: u32,
    count: u32,
    _pad: vec2<u32>,
};

@group(0) @binding(0)
var<uniform> uniforms: RenderUniforms;

@group(0) @binding(1)
var state: texture_2d<f32>;

@group(0) @binding(2)
var<storage, read> size_factors: array<f32>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) corner: vec2<f32>,
};

const MIN_DEPTH: f32 = 0.0001;

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vertex_index];

    let texel = vec2<i32>(i32(instance_index % uniforms.side), i32(instance_index / uniforms.side));
    let position = vec4<f32>(textureLoad(state, texel, 0).xyz, 1.0);

    let depth = max(-(uniforms.view * position).z, MIN_DEPTH);
    let size_px = uniforms.particle_size * size_factors[instance_index]
        * uniforms.resolution.y * uniforms.radius_scale / depth;

    var clip = uniforms.view_proj * position;
    clip = vec4<f32>(clip.xy + corner * size_px / uniforms.resolution * clip.w, clip.zw);

    var out: VertexOutput;
    out.clip_position = clip;
    out.corner = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if dot(in.corner, in.corner) > 1.0 {
        discard;
    }
    return uniforms.color;
}
"#;

/// Uniform block of the compute shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SimUniforms {
    pub time: f32,
    pub delta_time: f32,
    pub influence: f32,
    pub strength: f32,
    pub frequency: f32,
    pub count: u32,
    pub side: u32,
    pub _pad: u32,
}

/// Uniform block of the render shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    pub particle_size: f32,
    pub radius_scale: f32,
    /// RGB sprite colour, alpha = canvas opacity.
    pub color: [f32; 4],
    pub side: u32,
    pub count: u32,
    pub _pad: [u32; 2],
}
