//! GLSL sources and the headless half of shader compilation.
//!
//! [`compile_stage`] runs the naga GLSL frontend and validator over one stage,
//! [`link_program`] checks that the fragment inputs are fed by the vertex
//! outputs. The GPU side (`gpu::pipeline`) compiles the same sources again
//! through `wgpu`; doing the work here first gives us readable diagnostics
//! instead of a device validation error.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use wgpu::naga;

/// Pass-through vertex shader: position as-is, texture coordinate forwarded.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec3 position;
layout(location = 1) in vec2 texCoord;

layout(location = 0) out vec2 vertexTexCoord;

void main() {
    gl_Position = vec4(position.x, position.y, position.z, 1.0);
    vertexTexCoord = texCoord;
}
";

/// Samples `texture1` and mixes it toward opaque black by `mixValue`.
///
/// Group 0 holds the per-frame uniform block, group 1 the texture bound to
/// unit 0 for the current draw.
pub const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 vertexTexCoord;
layout(location = 0) out vec4 fragmentColor;

layout(std140, set = 0, binding = 0) uniform BlendParams {
    float mixValue;
} params;

layout(set = 1, binding = 0) uniform texture2D texture1;
layout(set = 1, binding = 1) uniform sampler texture1Sampler;

void main() {
    vec4 texColor1 = texture(sampler2D(texture1, texture1Sampler), vertexTexCoord);
    fragmentColor = mix(texColor1, vec4(0.0, 0.0, 0.0, 1.0), params.mixValue);
}
";

/// Pipeline stage a GLSL source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Errors raised while compiling or linking the shader pair.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    #[error("{stage} shader compilation failed:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program linking failed:\n{0}")]
    Link(String),
}

impl ShaderError {
    /// The backend info log without the summary line.
    pub fn info_log(&self) -> &str {
        match self {
            Self::Compile { log, .. } => log,
            Self::Link(log) => log,
        }
    }
}

/// A parsed and validated shader stage.
#[derive(Debug)]
pub struct CompiledStage {
    stage: ShaderStage,
    source: String,
    module: naga::Module,
}

impl CompiledStage {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn interface(&self, direction: Direction) -> BTreeMap<u32, InterfaceSlot> {
        let mut slots = BTreeMap::new();
        let Some(entry) = self
            .module
            .entry_points
            .iter()
            .find(|entry| entry.stage == self.stage.to_naga())
        else {
            return slots;
        };

        match direction {
            Direction::Outputs => {
                if let Some(result) = &entry.function.result {
                    collect_locations(
                        &self.module,
                        result.ty,
                        result.binding.as_ref(),
                        None,
                        &mut slots,
                    );
                }
            }
            Direction::Inputs => {
                for argument in &entry.function.arguments {
                    collect_locations(
                        &self.module,
                        argument.ty,
                        argument.binding.as_ref(),
                        argument.name.as_deref(),
                        &mut slots,
                    );
                }
            }
        }
        slots
    }
}

/// Vertex and fragment stages whose interfaces match.
#[derive(Debug)]
pub struct LinkedProgram {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
}

#[derive(Clone, Copy)]
enum Direction {
    Inputs,
    Outputs,
}

#[derive(Debug, Clone)]
struct InterfaceSlot {
    name: Option<String>,
    ty: naga::TypeInner,
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    name: Option<&str>,
    slots: &mut BTreeMap<u32, InterfaceSlot>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            slots.insert(
                *location,
                InterfaceSlot {
                    name: name.map(str::to_owned),
                    ty: module.types[ty].inner.clone(),
                },
            );
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        member.name.as_deref(),
                        slots,
                    );
                }
            }
        }
    }
}

/// Parses and validates one GLSL stage.
///
/// # Errors
///
/// Returns [`ShaderError::Compile`] with the numbered source and the
/// frontend/validator log when the stage is rejected.
pub fn compile_stage(source: &str, stage: ShaderStage) -> Result<CompiledStage, ShaderError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(stage.to_naga());
    let module = frontend.parse(&options, source).map_err(|errors| {
        let log = errors
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        ShaderError::Compile {
            stage,
            log: format_shader_error(source, &log),
        }
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    if let Err(error) = validator.validate(&module) {
        return Err(ShaderError::Compile {
            stage,
            log: format_shader_error(source, &error_chain(&error)),
        });
    }

    if !module.entry_points.iter().any(|entry| entry.stage == stage.to_naga()) {
        return Err(ShaderError::Compile {
            stage,
            log: format!("no {stage} entry point found"),
        });
    }

    tracing::trace!(%stage, "shader stage compiled");
    Ok(CompiledStage {
        stage,
        source: source.to_owned(),
        module,
    })
}

/// Links a vertex and a fragment stage into one program.
///
/// # Errors
///
/// Returns [`ShaderError::Link`] when the stages are swapped or when a
/// fragment input has no vertex output of the same type at its location.
pub fn link_program(
    vertex: CompiledStage,
    fragment: CompiledStage,
) -> Result<LinkedProgram, ShaderError> {
    if vertex.stage != ShaderStage::Vertex {
        return Err(ShaderError::Link(format!(
            "expected a vertex stage, got a {} stage",
            vertex.stage
        )));
    }
    if fragment.stage != ShaderStage::Fragment {
        return Err(ShaderError::Link(format!(
            "expected a fragment stage, got a {} stage",
            fragment.stage
        )));
    }

    let outputs = vertex.interface(Direction::Outputs);
    let inputs = fragment.interface(Direction::Inputs);
    let mut problems = Vec::new();
    for (location, input) in &inputs {
        let label = input.name.as_deref().unwrap_or("<unnamed>");
        match outputs.get(location) {
            None => problems.push(format!(
                "fragment input `{label}` at location {location} is not written by the vertex stage"
            )),
            Some(output) if output.ty != input.ty => problems.push(format!(
                "fragment input `{label}` at location {location} has type {:?}, vertex output has {:?}",
                input.ty, output.ty
            )),
            Some(_) => {}
        }
    }

    if !problems.is_empty() {
        return Err(ShaderError::Link(problems.join("\n")));
    }

    tracing::trace!(varyings = inputs.len(), "shader program linked");
    Ok(LinkedProgram { vertex, fragment })
}

/// Compiles and links both stages.
///
/// # Errors
///
/// Returns the first compile error, or the link error.
pub fn compile_program(vertex_src: &str, fragment_src: &str) -> Result<LinkedProgram, ShaderError> {
    let vertex = compile_stage(vertex_src, ShaderStage::Vertex)?;
    let fragment = compile_stage(fragment_src, ShaderStage::Fragment)?;
    link_program(vertex, fragment)
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str("\n  caused by: ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Prepends right-aligned line numbers to `source` and appends `log`.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().max(1).to_string().len();
    let numbered = lines
        .iter()
        .enumerate()
        .map(|(index, line)| format!("{:>width$}: {line}", index + 1))
        .collect::<Vec<_>>()
        .join("\n");

    match (numbered.is_empty(), log.is_empty()) {
        (true, true) => String::new(),
        (true, false) => log.to_owned(),
        (false, true) => numbered,
        (false, false) => format!("{numbered}\n\n{log}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shaders_compile_and_link() {
        let program = compile_program(VERTEX_SHADER_GLSL, FRAGMENT_SHADER_GLSL)
            .expect("built-in shader pair should link");
        assert_eq!(program.vertex.stage(), ShaderStage::Vertex);
        assert_eq!(program.fragment.stage(), ShaderStage::Fragment);
        assert!(program.fragment.source().contains("mixValue"));
    }

    #[test]
    fn syntax_error_reports_stage_and_numbered_source() {
        let broken = "#version 450\nvoid main() {\n    gl_Position = vec4(1.0\n}\n";
        let err = compile_stage(broken, ShaderStage::Vertex).unwrap_err();
        match &err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(*stage, ShaderStage::Vertex);
                assert!(log.contains("1: #version 450"), "missing numbered source:\n{log}");
            }
            other => panic!("expected compile error, got {other:?}"),
        }
        assert!(err.to_string().contains("vertex shader compilation failed"));
    }

    #[test]
    fn unknown_identifier_fails_fragment_compile() {
        let source = r"#version 450
layout(location = 0) out vec4 fragmentColor;
void main() {
    fragmentColor = undefinedColor;
}
";
        let err = compile_stage(source, ShaderStage::Fragment).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
    }

    #[test]
    fn missing_varying_fails_to_link() {
        let vertex = r"#version 450
layout(location = 0) in vec3 position;
void main() {
    gl_Position = vec4(position, 1.0);
}
";
        let err = compile_program(vertex, FRAGMENT_SHADER_GLSL).unwrap_err();
        match err {
            ShaderError::Link(log) => {
                assert!(log.contains("location 0"), "unexpected log: {log}");
            }
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_varying_type_fails_to_link() {
        let vertex = r"#version 450
layout(location = 0) in vec3 position;
layout(location = 0) out vec4 vertexTexCoord;
void main() {
    gl_Position = vec4(position, 1.0);
    vertexTexCoord = vec4(0.0);
}
";
        let err = compile_program(vertex, FRAGMENT_SHADER_GLSL).unwrap_err();
        assert!(matches!(err, ShaderError::Link(_)), "got {err:?}");
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let vertex = compile_stage(VERTEX_SHADER_GLSL, ShaderStage::Vertex).unwrap();
        let fragment = compile_stage(FRAGMENT_SHADER_GLSL, ShaderStage::Fragment).unwrap();
        let err = link_program(fragment, vertex).unwrap_err();
        assert!(err.info_log().contains("expected a vertex stage"));
    }

    #[test]
    fn format_shader_error_right_aligns_line_numbers() {
        let source = (1..=12)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let formatted = format_shader_error(&source, "err");
        let lines: Vec<&str> = formatted.lines().collect();
        assert!(lines[0].starts_with(" 1: "), "got: '{}'", lines[0]);
        assert!(lines[9].starts_with("10: "), "got: '{}'", lines[9]);
        assert!(formatted.ends_with("err"));
    }

    #[test]
    fn format_shader_error_handles_empty_inputs() {
        assert_eq!(format_shader_error("", ""), "");
        assert_eq!(format_shader_error("", "log"), "log");
        assert_eq!(format_shader_error("a", ""), "1: a");
    }
}
