use std::path::Path;
use std::process::Command;

/// (source, entry point, profile, output)
const SHADERS: [(&str, &str, &str, &str); 2] = [
    ("data/shaders/cube_vs.hlsl", "main", "vs_5_0", "data/shaders/cube_vs.cso"),
    ("data/shaders/cube_ps.hlsl", "main", "ps_5_0", "data/shaders/cube_ps.cso"),
];

fn compile_shader(fxc: &str, src: &str, entry: &str, profile: &str, out: &str) -> Result<(), String> {
    let output = Command::new(fxc)
        .arg("/nologo")
        .arg("/T").arg(profile)
        .arg("/E").arg(entry)
        .arg("/Fo").arg(out)
        .arg(src)
        .output()
        .map_err(|e| format!("failed to run {}: {}", fxc, e))?;

    println!("{}", String::from_utf8_lossy(&output.stdout));
    if !output.status.success() {
        return Err(format!("{} failed for {}:\n{}", fxc, src, String::from_utf8_lossy(&output.stderr)));
    }
    Ok(())
}

fn main() {
    for (src, _, _, _) in SHADERS {
        println!("cargo:rerun-if-changed={}", src);
    }
    println!("cargo:rerun-if-env-changed=FXC");

    if std::env::var("CARGO_FEATURE_BUILD_SHADERS").is_ok() {
        let fxc = std::env::var("FXC").unwrap_or_else(|_| "fxc".to_string());
        for (src, entry, profile, out) in SHADERS {
            if !Path::new(src).exists() {
                panic!("missing shader source {}", src);
            }
            if let Err(e) = compile_shader(&fxc, src, entry, profile, out) {
                panic!("{}", e);
            }
        }
    }
}
