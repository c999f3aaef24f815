use std::fs;
use std::path::Path;

use clap::CommandFactory;

// cli.rs only depends on clap + clap_complete, so it can be compiled here
// on its own to render man pages.
#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        println!("cargo::warning=OUT_DIR not set, skipping man pages");
        return;
    };
    let man_dir = Path::new(&out_dir).join("man");
    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo::warning=cannot create {}: {e}", man_dir.display());
        return;
    }

    render(&cli::Cli::command(), &man_dir, "");
}

/// One page per command, named `peerly-<sub>-<sub>.1`.
fn render(cmd: &clap::Command, dir: &Path, prefix: &str) {
    let name = if prefix.is_empty() {
        cmd.get_name().to_owned()
    } else {
        format!("{prefix}-{}", cmd.get_name())
    };

    let mut buf = Vec::new();
    let page = clap_mangen::Man::new(cmd.clone().name(name.clone()));
    if let Err(e) = page.render(&mut buf) {
        println!("cargo::warning=man page for {name} failed: {e}");
        return;
    }
    if let Err(e) = fs::write(dir.join(format!("{name}.1")), buf) {
        println!("cargo::warning=cannot write man page for {name}: {e}");
        return;
    }

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        render(sub, dir, &name);
    }
}
