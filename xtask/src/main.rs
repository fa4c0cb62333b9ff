use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Generate a sample workspace with inventories and playbooks
    Demo {
        /// Where to create the sample tree
        #[arg(default_value = "demo-workspace")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Demo { path } => generate_demo(&path)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn generate_demo(root: &Path) -> Result<()> {
    fs::create_dir_all(root.join("inventories/production"))?;
    fs::create_dir_all(root.join("inventories/staging"))?;
    fs::create_dir_all(root.join("playbooks/roles"))?;

    fs::write(
        root.join("inventories/production/hosts"),
        "[web]\nweb-01\nweb-02\n\n[db]\ndb-01\n",
    )?;
    fs::write(root.join("inventories/staging/hosts.ini"), "[web]\nstage-web-01\n")?;
    fs::write(
        root.join("playbooks/site.yml"),
        "---\n- hosts: web\n  become: true\n  roles:\n    - common\n",
    )?;
    fs::write(
        root.join("playbooks/db.yaml"),
        "---\n- hosts: db\n  become: true\n  tasks:\n    - name: ping\n      ping:\n",
    )?;

    println!("sample workspace created at {}", root.display());
    Ok(())
}
