use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("jvmbridge {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: jvmbridge");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("JVMBRIDGE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "limits: max_payload={} max_depth={} max_frame={}",
        jvmbridge_wire::DEFAULT_MAX_PAYLOAD,
        jvmbridge_wire::DEFAULT_MAX_DEPTH,
        jvmbridge_rows::DEFAULT_MAX_FRAME_SIZE
    );
    println!("type_tags: {}", jvmbridge_wire::tag::REGISTRY.len());

    Ok(SUCCESS)
}
