use chrono::Utc;
use std::process::Command;

/// Run git in the crate directory, returning trimmed stdout on success.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    // Source tarballs have no repository; the version then reads "x.y.z (release)".
    let Some(hash) = git(&["rev-parse", "--short", "HEAD"]) else {
        println!("cargo:rustc-env=BUILD_HASH=release");
        println!("cargo:rerun-if-changed=build.rs");
        return;
    };

    // Modified tracked files; untracked ones don't count.
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|status| !status.is_empty());
    let build_hash = if dirty {
        format!("{hash}-dirty-{}", Utc::now().format("%Y%m%d"))
    } else {
        hash
    };
    println!("cargo:rustc-env=BUILD_HASH={build_hash}");

    // Rebuild when HEAD moves or the index changes.
    if let Some(git_dir) = git(&["rev-parse", "--absolute-git-dir"]) {
        println!("cargo:rerun-if-changed={git_dir}/HEAD");
        println!("cargo:rerun-if-changed={git_dir}/index");
    }
}
