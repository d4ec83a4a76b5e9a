use std::process::Command;

/// Build identity for the startup log line, e.g. `a1b2c3d4` or `a1b2c3d4-dirty`.
fn describe_build() -> Option<String> {
    let out = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()
        .filter(|out| out.status.success())?;
    let id = String::from_utf8(out.stdout).ok()?;
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_owned())
}

fn main() {
    let build_id = describe_build().unwrap_or_else(|| "unknown".to_owned());
    println!("cargo:rustc-env=GIT_HASH={build_id}");
    for watched in [".git/HEAD", ".git/index"] {
        println!("cargo:rerun-if-changed={watched}");
    }
}
