use std::process::Command;

fn main() {
    // 0.1.<commits>, with a +dirty suffix for uncommitted work
    let commits = git_output(&["rev-list", "--count", "HEAD"])
        .and_then(|out| out.trim().parse::<u32>().ok())
        .unwrap_or(0);
    let dirty = git_output(&["status", "--porcelain"])
        .map(|out| !out.trim().is_empty())
        .unwrap_or(false);

    let suffix = if dirty { "+dirty" } else { "" };
    println!("cargo:rustc-env=LIFEORG_VERSION=0.1.{commits}{suffix}");

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-changed=.git/index");
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}
