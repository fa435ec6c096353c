use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

// cli.rs only needs clap + clap_complete, both build-dependencies.
#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir: PathBuf = std::env::var_os("OUT_DIR")
        .expect("OUT_DIR not set by Cargo")
        .into();
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir).and_then(|()| {
        let cmd = cli::Cli::command();
        write_manpages(&cmd, cmd.get_name(), &man_dir)
    }) {
        panic!("failed to generate man pages in {}: {e}", man_dir.display());
    }
}

/// Write `<prefix>.1` for `cmd`, then `<prefix>-<sub>.1` for every visible
/// subcommand, recursively.
fn write_manpages(cmd: &clap::Command, prefix: &str, dir: &Path) -> io::Result<()> {
    let page = cmd.clone().name(prefix.to_owned());
    let mut buf = Vec::new();
    clap_mangen::Man::new(page).render(&mut buf)?;
    fs::write(dir.join(format!("{prefix}.1")), buf)?;

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        write_manpages(sub, &format!("{prefix}-{}", sub.get_name()), dir)?;
    }
    Ok(())
}
