use clap::{Parser, Subcommand};
use jsgroup::group::JsGroup;
use jsgroup::modes::GenerationMode;
use jsgroup::resource::{DirOrigin, ResourceFetcher};
use jsgroup::state::StateManifest;
use jsgroup::{config, generate, output};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "jsgroup")]
#[command(about = "Directive-aware JavaScript bundler")]
#[command(long_about = "\
Directive-aware JavaScript bundler

A group of JavaScript sources is rooted at one start file. Comment
directives stitch the files into one artifact per generation mode:

  //#include util/helpers.js     # splice a file in place (relative path)
  //#if PRODUCTION,TESTING       # keep the span only in the listed modes
  ...
  //#end
  //#version                     # expands to the configured version string

Each configured mode produces {group}_{mode}.js plus a compatibility
sibling {group}_{mode}_compat.js in the destination directory. Production
bodies are minified; a runtime engine is prepended and external libraries
are appended when configured under [resources].

Artifacts are written read-only and skipped on rebuild when already newer
than every source file. A content hash persisted alongside the artifacts
lets 'check' and 'build' detect unchanged sources across runs.

Run 'jsgroup gen-config' to generate a documented jsgroup.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Path to the build config file
    #[arg(long, default_value = "jsgroup.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse sources and generate artifacts for all configured modes
    Build {
        /// Regenerate even when sources and artifacts are unchanged
        #[arg(long)]
        force: bool,
    },
    /// Report whether artifacts are stale, without building
    Check,
    /// Print the combined source for one mode to stdout
    Render {
        /// Mode to render
        #[arg(long, default_value = "development")]
        mode: GenerationMode,
    },
    /// Print a stock jsgroup.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build { force } => {
            let config = config::load_config(&cli.config)?;
            let base = base_dir(&cli.config);
            let dest = base.join(&config.dest);

            let mut group = JsGroup::from_config(&config, base);
            println!("==> Parsing {}", base.join(&config.source_root).display());
            group.parse()?;

            let stored = StateManifest::load(&dest).map(|m| m.group_hash);
            if !force && !group.is_stale(stored.as_ref()) {
                output::print_check_output(group.name(), false);
                return Ok(());
            }
            if force {
                generate::clear_targets(&dest, group.name(), group.modes())?;
            }

            println!("==> Generating \u{2192} {}", dest.display());
            let fetcher = ResourceFetcher::new(
                base.join(&config.resources.cache_dir),
                DirOrigin::new(base.join(&config.resources.origin)),
            );
            let report = group.generate(&dest, &fetcher, &config.resources)?;
            output::print_build_output(group.name(), &report);

            if let Some(hash) = group.hash() {
                StateManifest::new(hash.clone()).save(&dest)?;
            }
            group.post_process();
            println!("==> Build complete: {}", dest.display());
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            let base = base_dir(&cli.config);
            let dest = base.join(&config.dest);

            let mut group = JsGroup::from_config(&config, base);
            group.parse()?;

            let stored = StateManifest::load(&dest).map(|m| m.group_hash);
            let stale = group.is_stale(stored.as_ref());
            output::print_check_output(group.name(), stale);
            if stale {
                std::process::exit(1);
            }
        }
        Command::Render { mode } => {
            let config = config::load_config(&cli.config)?;
            let base = base_dir(&cli.config);

            let mut group = JsGroup::from_config(&config, base);
            group.parse()?;
            print!("{}", group.render_for(mode)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Paths in the config file resolve relative to the file's directory.
fn base_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}
