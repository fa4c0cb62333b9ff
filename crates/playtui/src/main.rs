use std::io;
use std::panic;
use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{LeaveAlternateScreen, disable_raw_mode};

use playtui::infra::console;
use playtui::ui::app::UiApp;

/// Browse inventories and playbooks side by side, then launch runs.
#[derive(Parser, Debug)]
#[command(name = "playtui")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal browser and launcher for playbook runs", long_about = None)]
struct Args {
    /// Workspace root to scan for inventories and playbooks
    #[arg(value_name = "ROOT", default_value = ".")]
    root: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("cannot resolve workspace root {}", args.root.display()))?;
    ensure!(root.is_dir(), "workspace root is not a directory: {}", root.display());

    let buffer = console::install();

    // Restore the terminal before the default panic output runs.
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut app = UiApp::new(root, buffer)?;
    app.run()
}
