use lanpacket_frame::{MAX_FRAME_SIZE, MAX_SUBPACKET_BODY};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("lanpacket {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: lanpacket");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("LANPACKET_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("max_frame_size: {MAX_FRAME_SIZE}");
    println!("max_subpacket_body: {MAX_SUBPACKET_BODY}");

    Ok(SUCCESS)
}
