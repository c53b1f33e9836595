use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use eyewear_overlay::capture::ReplayCapture;
use eyewear_overlay::cli::{
    handle_config_action, list_assets, Args, Command, ConfigAction, OutputFormat, RunArgs,
};
use eyewear_overlay::config::Config;
use eyewear_overlay::engine::MarkerParams;
use eyewear_overlay::event_loop::{FrameLoop, Shutdown};
use eyewear_overlay::input::spawn_stdin_selector;
use eyewear_overlay::renderer::{JsonRenderer, Renderer, TextRenderer};
use eyewear_overlay::selection::{Catalog, SelectionState};
use eyewear_overlay::source::{load_poses, ReplaySource};

/// Initialize env_logger. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

/// Load config. An explicit --config must exist; the default location may be absent.
fn load_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    match args.config {
        Some(ref path) => Ok(Config::load_from_explicit(path.clone())?),
        None => match Config::load(None) {
            Ok(c) => Ok(c),
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using default settings.", e);
                Ok(Config::default())
            }
        },
    }
}

/// Resolve the startup overlay: CLI > config > first catalog entry.
fn initial_selection(
    catalog: &Catalog,
    cli_asset: Option<&str>,
    config: &Config,
) -> Result<SelectionState, Box<dyn Error>> {
    match cli_asset.or(config.overlay.asset.as_deref()) {
        Some(name) => {
            let asset = catalog
                .find(name)
                .ok_or_else(|| format!("Unknown overlay '{}'. Run 'eyewear-overlay assets' to list them", name))?;
            Ok(SelectionState::with_initial(asset))
        }
        None => Ok(SelectionState::new(catalog)),
    }
}

fn run_replay(run: RunArgs, config: &Config) -> Result<(), Box<dyn Error>> {
    let poses = load_poses(&run.poses)?;
    if poses.is_empty() {
        return Err(format!("No poses recorded in {}", run.poses.display()).into());
    }
    log::info!("Loaded {} poses from {}", poses.len(), run.poses.display());

    let catalog = Arc::new(config.catalog()?);
    let selection = Arc::new(initial_selection(&catalog, run.asset.as_deref(), config)?);

    let mut settings = config.loop_settings();
    if let Some(ms) = run.interval_ms {
        settings.tick_interval = Duration::from_millis(ms.max(1));
    }
    if run.markers && settings.markers.is_none() {
        settings.markers = Some(MarkerParams::default());
    }

    let shutdown = Shutdown::new();
    let ctrlc_shutdown = shutdown.clone();
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, shutting down...");
        ctrlc_shutdown.trigger();
    })?;

    let geometry = config.geometry();
    let capture = ReplayCapture::new(poses.len(), geometry)
        .looping(run.looping)
        .shutdown_when_exhausted(shutdown.clone());

    let mut source = ReplaySource::new(poses)
        .with_latency(Duration::from_millis(run.latency_ms.unwrap_or(0)));
    if run.flip || config.detector.flip_horizontal {
        source = source.flip_horizontal(geometry.detector.width);
    }

    let renderer: Box<dyn Renderer> = match run.format {
        OutputFormat::Text => Box::new(TextRenderer::new(std::io::stdout())),
        OutputFormat::Json => Box::new(JsonRenderer::new(std::io::stdout())),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let stats = runtime.block_on(async {
        if !run.no_input {
            spawn_stdin_selector(catalog.clone(), selection.clone());
        }

        #[cfg(feature = "hotkeys")]
        let _hotkeys = {
            let mut hotkeys =
                eyewear_overlay::hotkeys::SelectionHotkeys::new(catalog.clone(), selection.clone());
            if let Err(e) = hotkeys.start() {
                log::warn!("Hotkeys disabled: {}", e);
            }
            hotkeys
        };

        let mut frame_loop = FrameLoop::new(capture, source, renderer, catalog.clone(), selection.clone())
            .with_settings(settings);
        frame_loop.run(&shutdown).await
    });

    // The stdin reader may be parked in a blocking read.
    runtime.shutdown_background();

    if !stats.ready {
        return Err("Session ended before the overlay became ready".into());
    }
    Ok(())
}

fn run_assets(config: &Config) -> Result<(), Box<dyn Error>> {
    let catalog = config.catalog()?;
    list_assets(&catalog, config.overlay.asset.as_deref());
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    // `config init` must work before any config file exists.
    let creating_config = matches!(
        args.command,
        Some(Command::Config {
            action: ConfigAction::Init
        })
    );
    let loaded = if creating_config {
        Ok(Config::default())
    } else {
        load_config(&args)
    };
    let config = match loaded {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Some(Command::Run(run)) => run_replay(run, &config),
        Some(Command::Assets) => run_assets(&config),
        Some(Command::Config { action }) => {
            handle_config_action(action, &config, args.config.as_deref()).map_err(Box::<dyn Error>::from)
        }
        None => {
            println!("eyewear-overlay {}", env!("CARGO_PKG_VERSION"));
            println!("Eyewear AR overlay driven by pose keypoints\n");
            println!("USAGE:");
            println!("    eyewear-overlay <COMMAND>\n");
            println!("COMMANDS:");
            println!("    run <POSES>   Replay a recorded pose stream through the overlay loop");
            println!("    assets        List the selectable overlays");
            println!("    config        Show or create the config file");
            println!("    help          Print this message or the help of a subcommand\n");
            println!("Run 'eyewear-overlay --help' for more details.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
