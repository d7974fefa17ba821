/// The fixed textured-mesh program.
///
/// Group 0 holds the per-draw matrices behind a dynamic offset; group 1 holds
/// the bound texture and its sampler. Matrices arrive with OpenGL clip depth,
/// so the vertex stage folds `[-w, w]` into wgpu's `[0, w]`.
pub const TEXTURED_MESH_SHADER: &str = r#"
struct DrawUniforms {
    projection: mat4x4<f32>,
    model: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> draw: DrawUniforms;

@group(1) @binding(0)
var color_texture: texture_2d<f32>;
@group(1) @binding(1)
var color_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) texcoord: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) texcoord: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var clip = draw.projection * draw.model * vec4<f32>(vertex.position, 1.0);
    clip.z = (clip.z + clip.w) * 0.5;

    var out: VertexOutput;
    out.clip_position = clip;
    out.texcoord = vertex.texcoord;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(color_texture, color_sampler, input.texcoord);
}
"#;
