//! `clink` launcher binary (out-of-core CLI surface): argument parsing
//! mirroring `ox-bin::Args`, logging/panic-hook setup mirroring
//! `ox-bin::AppStartup`, settings discovery, and assembly of the editor
//! module stack. `clink --cfgdir <path>` runs the interactive editor loop
//! against stdin/stdout; `clink testbed --hook` drives the same loop over a
//! scripted byte sequence for tests that simulate the hook path without a
//! real injected process.

mod history_recall;
mod logging;
mod match_refresh;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clink_editor::{EditorModule, LineEditor};
use clink_history::{default_history_path, HistoryStore};
use clink_match::ClassicMatchUi;
use clink_readline::ReadlineModule;
use clink_scroller::Scroller;
use clink_settings::Registry;
use history_recall::HistoryRecallModule;
use match_refresh::MatchRefreshModule;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "clink", about = "Readline-style line editing for cmd.exe")]
struct Args {
    /// Directory holding `settings` and `history`; defaults to the
    /// platform config dir (spec: `clink --cfgdir <path>`).
    #[arg(long = "cfgdir")]
    cfgdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Non-interactive harness used by tests to simulate the hook path:
    /// reads a scripted byte sequence from stdin, drives one `edit()` call
    /// to completion, and prints the resulting line.
    Testbed {
        #[arg(long)]
        hook: bool,
    },
    /// Injects the Clink DLL into a running shell process (the external
    /// launcher's half of the hook/interception layer; the injected
    /// module installs the actual `ReadConsoleW`/`WriteConsoleW` hooks).
    Inject {
        pid: i32,
        #[arg(long = "dll")]
        dll_path: String,
    },
}

fn cfg_dir(args: &Args) -> PathBuf {
    args.cfgdir.clone().unwrap_or_else(clink_settings::discover_settings_path)
}

fn load_registry(cfg_dir: &PathBuf) -> Result<(Registry, Vec<(String, String)>)> {
    let mut registry = Registry::new();
    settings::register_known_settings(&mut registry)?;
    let settings_path = cfg_dir.join("settings");
    let unknown = registry.load_from(&settings_path).unwrap_or_default();
    Ok((registry, unknown))
}

/// Builds the module stack in the order `LineEditor::new` will bind them
/// in: `MatchRefreshModule` ahead of `ClassicMatchUi` so Tab's match
/// generation runs before the UI module inspects the result (dispatch at a
/// shared chord follows original bind order), then history recall,
/// readline, and the scroller. Each module's own `module_index` must equal
/// its position here, since the dispatch loop indexes straight into this
/// vector.
fn build_modules(registry: &Registry, history: HistoryStore) -> Vec<Box<dyn EditorModule>> {
    vec![
        Box::new(MatchRefreshModule::new(0)),
        Box::new(ClassicMatchUi::new(1, registry)),
        Box::new(HistoryRecallModule::new(2, history)),
        Box::new(ReadlineModule::new(3)),
        Box::new(Scroller::new(4)),
    ]
}

fn run_testbed(registry: &Registry, modules: Vec<Box<dyn EditorModule>>, hook: bool) -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin().read_to_end(&mut input).context("reading testbed input from stdin")?;
    let mut iter = input.into_iter();

    // `--hook` simulates the state the real launcher would be in after
    // injection and prompt capture: the prompt text already carries the
    // hidden tag a real hook install would have written.
    let prompt = if hook { clink_host::tag("testbed> ") } else { "testbed> ".to_string() };

    let mut editor = LineEditor::new(registry, modules);
    let result = editor
        .edit(&prompt, registry, || iter.next())
        .context("running the editor loop over scripted input")?;

    println!("{}", result.text);
    info!(target = "cli.testbed", eof = result.eof, hook, "testbed_complete");
    Ok(())
}

fn run_inject(pid: i32, dll_path: &str) -> Result<()> {
    let process = clink_winproc::Process::new(pid);
    process.pause().context("suspending target process threads")?;
    let outcome = process.inject_module(dll_path);
    process.unpause().context("resuming target process threads")?;
    outcome.context("injecting clink module into target process")?;
    info!(target = "cli.inject", pid, dll_path, "module_injected");
    Ok(())
}

fn run_interactive(registry: &Registry, modules: Vec<Box<dyn EditorModule>>) -> Result<()> {
    let mut stdin = std::io::stdin();
    let mut editor = LineEditor::new(registry, modules);
    let mut byte_buf = [0u8; 1];
    let result = editor.edit("clink$ ", registry, || {
        if stdin.read_exact(&mut byte_buf).is_ok() {
            Some(byte_buf[0])
        } else {
            None
        }
    })?;
    println!("{}", result.text);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg_dir = cfg_dir(&args);
    std::fs::create_dir_all(&cfg_dir).ok();

    let _log_guard = logging::configure_logging(&cfg_dir);
    logging::install_panic_hook();

    let (registry, unknown_settings) = load_registry(&cfg_dir)?;
    let history_path = if args.cfgdir.is_some() {
        cfg_dir.join("history")
    } else {
        default_history_path(&registry)
    };

    let result = match args.command {
        Some(Command::Testbed { hook }) => {
            let history = HistoryStore::new(history_path, &registry, true);
            run_testbed(&registry, build_modules(&registry, history), hook)
        }
        Some(Command::Inject { pid, dll_path }) => run_inject(pid, &dll_path),
        None => {
            let history = HistoryStore::new(history_path, &registry, true);
            run_interactive(&registry, build_modules(&registry, history))
        }
    };

    let settings_path = cfg_dir.join("settings");
    let _ = registry.save_to(&settings_path, &unknown_settings);
    result
}
