/// WGSL for both surface kinds. `fs_lit` evaluates
/// [`crate::shading::shade`], with the material kind read from
/// `object.params`.
pub(crate) const SHADER: &str = r#"
struct GlobalUniform {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    light_position: vec4<f32>,
    glow_color: vec4<f32>,
}

struct ObjectUniform {
    model_view: mat4x4<f32>,
    normal: mat3x4<f32>,
    base_color: vec4<f32>,
    // ambient, specular exponent, metallic, lit
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) view_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let view_position = object.model_view * vec4<f32>(input.position, 1.0);
    out.position = globals.projection * view_position;
    out.view_pos = view_position.xyz;

    let view_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;
    out.normal = normalize(view_normal);
    return out;
}

@fragment
fn fs_lit(input: VertexOutput) -> @location(0) vec4<f32> {
    let base = object.base_color.rgb;
    let light = (globals.view * vec4<f32>(globals.light_position.xyz, 1.0)).xyz;
    let normal = normalize(input.normal);
    let light_dir = normalize(light - input.view_pos);

    let ambient = object.params.x * base;
    let diffuse = max(dot(normal, light_dir), 0.0) * base;

    let view_dir = normalize(-input.view_pos);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), object.params.y);
    let tint = mix(vec3<f32>(1.0), base, object.params.z);

    return vec4<f32>(ambient + diffuse + spec * tint, 1.0);
}

@fragment
fn fs_unlit(input: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(globals.glow_color.rgb, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_parses_and_validates() {
        let module = naga::front::wgsl::parse_str(SHADER)
            .unwrap_or_else(|err| panic!("{}", err.emit_to_string(SHADER)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .expect("shader validates");

        let stages: Vec<_> = module
            .entry_points
            .iter()
            .map(|entry| (entry.name.as_str(), entry.stage))
            .collect();
        assert_eq!(
            stages,
            [
                ("vs_main", naga::ShaderStage::Vertex),
                ("fs_lit", naga::ShaderStage::Fragment),
                ("fs_unlit", naga::ShaderStage::Fragment),
            ]
        );
    }
}
