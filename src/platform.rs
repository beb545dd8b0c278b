use crate::types::*;

/// Maps a Rust target OS name to the spelling the Go catalog uses.
pub fn go_os(os: &str) -> String {
    match os {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

/// Maps a Rust target architecture to the spelling the Go catalog uses.
pub fn go_arch(arch: &str) -> String {
    match arch {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        "x86" => "386".to_string(),
        "arm" => "armv6l".to_string(),
        "powerpc64" => "ppc64".to_string(),
        "powerpc64le" => "ppc64le".to_string(),
        "loongarch64" => "loong64".to_string(),
        other => other.to_string(),
    }
}

pub fn get_system_info() -> PlatformInfo {
    let os = go_os(std::env::consts::OS);
    let arch = go_arch(std::env::consts::ARCH);
    tracing::trace!("Detected platform {}/{}", os, arch);
    PlatformInfo { os, arch }
}

/// Keeps stable releases that ship an archive for `platform`, preserving
/// catalog order.
pub fn compatible_releases(releases: Vec<Release>, platform: &PlatformInfo) -> Vec<Release> {
    releases
        .into_iter()
        .filter(|r| r.stable && r.is_compatible(platform))
        .collect()
}
