use std::process::Command;

fn main() {
    let commit_hash = std::env::var("GIT_COMMIT_SHA").unwrap_or_else(|_| {
        Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output()
            .ok()
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|hash| hash.trim().to_string())
            .unwrap_or_else(|| String::from("unknown"))
    });
    println!("cargo:rustc-env=COMMIT_HASH={commit_hash}");
}
