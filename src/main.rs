use d3d11_cube::prelude::*;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
}

/// Errors from here on are reported by the client before they are returned
#[cfg(target_os = "windows")]
fn run(info: CubeInfo) -> Result<(), Error> {
    log::info!("starting {} ({}x{})", info.title, info.window_rect.width, info.window_rect.height);
    let client = Client::<gfx_platform::Device, os_platform::App>::create(info)?;
    client.run()
}

#[cfg(not(target_os = "windows"))]
fn run(_info: CubeInfo) -> Result<(), Error> {
    let err = Error::new("*** ERROR: Direct3D 11 is only available on windows ***");
    log::error!("{}", err);
    Err(err)
}

fn main() {
    init_logging();
    let info = match CubeInfo::load(CubeInfo::config_path()) {
        Ok(info) => info,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    if run(info).is_err() {
        std::process::exit(1);
    }
}
