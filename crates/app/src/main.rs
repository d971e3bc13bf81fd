//! Entry point for objview: logging + CLI flags, asset loading, run loop.

use anyhow::{Context, Result, bail};

use asset::{MeshData, ShaderPair};
use platform::AppConfig;

/// Flags understood by the binary. Anything unknown is left for winit.
#[derive(Debug, Default)]
struct Flags {
    backend: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    model: Option<String>,
    vertex_shader: Option<String>,
    fragment_shader: Option<String>,
}

fn parse_flags(args: impl Iterator<Item = String>) -> Flags {
    let mut flags = Flags::default();
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            flags.backend = Some(val.to_ascii_lowercase());
        } else if let Some(val) = arg.strip_prefix("--size=") {
            if let Some((w, h)) = val.split_once('x').or_else(|| val.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (w.parse::<u32>(), h.parse::<u32>()) {
                    flags.width = Some(pw);
                    flags.height = Some(ph);
                }
            }
        } else if let Some(val) = arg.strip_prefix("--width=") {
            flags.width = val.parse::<u32>().ok();
        } else if let Some(val) = arg.strip_prefix("--height=") {
            flags.height = val.parse::<u32>().ok();
        } else if let Some(val) = arg.strip_prefix("--model=") {
            flags.model = Some(val.to_string());
        } else if let Some(val) = arg.strip_prefix("--vertex-shader=") {
            flags.vertex_shader = Some(val.to_string());
        } else if let Some(val) = arg.strip_prefix("--fragment-shader=") {
            flags.fragment_shader = Some(val.to_string());
        }
    }
    flags
}

fn backends_from_flag(flag: Option<&str>) -> wgpu::Backends {
    match flag {
        None | Some("auto") => wgpu::Backends::all(),
        Some("vulkan") | Some("vk") => wgpu::Backends::VULKAN,
        Some("dx12") | Some("d3d12") => wgpu::Backends::DX12,
        Some("metal") | Some("mtl") => wgpu::Backends::METAL,
        Some("gl") | Some("opengl") | Some("gles") => wgpu::Backends::GL,
        Some(other) => {
            log::warn!("Unknown backend '{other}', falling back to auto");
            wgpu::Backends::all()
        }
    }
}

fn load_mesh(flags: &Flags) -> Result<MeshData> {
    match &flags.model {
        Some(path) => asset::obj::load_obj_from_path(path)
            .with_context(|| format!("Failed to load model '{path}'")),
        None => {
            log::info!("No --model given, using the built-in triangle");
            Ok(MeshData::primitive_triangle())
        }
    }
}

fn load_shaders(flags: &Flags) -> Result<ShaderPair> {
    match (&flags.vertex_shader, &flags.fragment_shader) {
        (Some(vs), Some(fs)) => {
            ShaderPair::from_paths(vs, fs).context("Failed to load shader sources")
        }
        (None, None) => Ok(renderer::builtin_shader_pair()),
        _ => bail!("--vertex-shader and --fragment-shader must be given together"),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let flags = parse_flags(std::env::args().skip(1));
    let backends = backends_from_flag(flags.backend.as_deref());
    let width = flags.width.unwrap_or(1280).max(1);
    let height = flags.height.unwrap_or(720).max(1);
    log::info!("Starting objview. Backend: {backends:?}, window_size={width}x{height}");

    let mesh = load_mesh(&flags)?;
    let shaders = load_shaders(&flags)?;

    let config = AppConfig {
        width,
        height,
        title: "objview".into(),
        backends,
    };
    platform::run(config, mesh, shaders)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_of(args: &[&str]) -> Flags {
        parse_flags(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_size_and_model() {
        let flags = flags_of(&["--size=800x600", "--model=suzanne.obj"]);
        assert_eq!(flags.width, Some(800));
        assert_eq!(flags.height, Some(600));
        assert_eq!(flags.model.as_deref(), Some("suzanne.obj"));
    }

    #[test]
    fn width_and_height_override_separately() {
        let flags = flags_of(&["--width=640", "--height=480"]);
        assert_eq!(flags.width, Some(640));
        assert_eq!(flags.height, Some(480));
    }

    #[test]
    fn backend_names_map_to_backends() {
        assert_eq!(backends_from_flag(Some("vulkan")), wgpu::Backends::VULKAN);
        assert_eq!(backends_from_flag(Some("gl")), wgpu::Backends::GL);
        assert_eq!(backends_from_flag(Some("auto")), wgpu::Backends::all());
        assert_eq!(backends_from_flag(None), wgpu::Backends::all());
        assert_eq!(backends_from_flag(Some("bogus")), wgpu::Backends::all());
    }

    #[test]
    fn lone_shader_flag_is_rejected() {
        let flags = flags_of(&["--vertex-shader=mesh.vert.wgsl"]);
        assert!(load_shaders(&flags).is_err());
    }

    #[test]
    fn default_mesh_is_the_primitive_triangle() {
        let mesh = load_mesh(&Flags::default()).expect("builtin mesh");
        assert_eq!(mesh, MeshData::primitive_triangle());
    }
}
