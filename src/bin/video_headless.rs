//! Retro Video Headless Runner
//!
//! Runs a JSON script of screen operations against an emulated adapter and
//! prints the resulting display as text or as a JSON snapshot.

use std::io::{self, Read};
use std::process::ExitCode;

use retro_video::app::{open_clipboard, Config};
use retro_video::core::{Adapter, Screen};
use retro_video::headless::{parse_script, run_script};
use retro_video::render::{backend_chain, builtin_backends, init_backend, render_channel, RenderThread};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Parse command line arguments
    let mut adapter: Option<Adapter> = None;
    let mut config_file: Option<String> = None;
    let mut input_file: Option<String> = None;
    let mut output_format = OutputFormat::Text;
    let mut system_clipboard = false;
    let mut show_help = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-a" | "--adapter" => {
                i += 1;
                if i < args.len() {
                    match parse_adapter(&args[i]) {
                        Some(a) => adapter = Some(a),
                        None => {
                            eprintln!("Unknown adapter '{}'", args[i]);
                            return ExitCode::FAILURE;
                        },
                    }
                }
            },
            "-c" | "--config" => {
                i += 1;
                if i < args.len() {
                    config_file = Some(args[i].clone());
                }
            },
            "-f" | "--file" => {
                i += 1;
                if i < args.len() {
                    input_file = Some(args[i].clone());
                }
            },
            "-j" | "--json" => {
                output_format = OutputFormat::Json;
            },
            "-t" | "--text" => {
                output_format = OutputFormat::Text;
            },
            "-s" | "--system-clipboard" => {
                system_clipboard = true;
            },
            "-h" | "--help" => {
                show_help = true;
            },
            _ => {
                // Treat as input file if no flag
                if input_file.is_none() && !args[i].starts_with('-') {
                    input_file = Some(args[i].clone());
                }
            },
        }
        i += 1;
    }

    if show_help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let mut config = match &config_file {
        Some(path) => match Config::load(std::path::Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error reading config '{}': {}", path, e);
                return ExitCode::FAILURE;
            },
        },
        None => Config::load_or_default(),
    };
    if let Some(adapter) = adapter {
        config.adapter = adapter;
    }

    // Read script
    let input = match &input_file {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path, e);
                return ExitCode::FAILURE;
            },
        },
        None => {
            let mut data = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut data) {
                eprintln!("Error reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            data
        },
    };
    let script = match parse_script(&input) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Error parsing script: {}", e);
            return ExitCode::FAILURE;
        },
    };

    // Start the display
    let settings = config.screen_settings();
    let start_mode = match settings.start_mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error creating screen: {}", e);
            return ExitCode::FAILURE;
        },
    };
    let chain = backend_chain(&builtin_backends(), &config.backends);
    let backend = match init_backend(&chain, &config, &start_mode) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Error starting display: {}", e);
            return ExitCode::FAILURE;
        },
    };
    let (sender, receiver) = render_channel();
    let render = match RenderThread::spawn(backend, receiver, config.tick()) {
        Ok(render) => render,
        Err(e) => {
            eprintln!("Error starting display: {}", e);
            return ExitCode::FAILURE;
        },
    };
    let mut screen = match Screen::new(settings, sender) {
        Ok(screen) => screen,
        Err(e) => {
            eprintln!("Error creating screen: {}", e);
            return ExitCode::FAILURE;
        },
    };

    // Run script
    let mut clipboard = open_clipboard(system_clipboard);
    let result = run_script(&mut screen, &script, clipboard.as_mut());
    let snapshot = screen.snapshot();
    screen.shutdown();
    drop(screen);
    if let Err(e) = render.join() {
        eprintln!("Error stopping display: {}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = result {
        eprintln!("Script failed: {}", e);
        return ExitCode::FAILURE;
    }

    // Output result
    match output_format {
        OutputFormat::Text => {
            let mode = screen_mode_label(&snapshot.mode);
            println!("Display State ({}):", mode);
            println!("Cursor: ({}, {})", snapshot.cursor.row, snapshot.cursor.col);
            println!("Pages: active {}, visible {}", snapshot.active_page, snapshot.visible_page);
            match clipboard.get_text() {
                Ok(text) if !text.is_empty() => println!("Clipboard: {:?}", text),
                Ok(_) => {},
                Err(e) => eprintln!("Error reading clipboard: {}", e),
            }
            println!("---");
            print!("{}", snapshot.to_text());
            println!("---");
        },
        OutputFormat::Json => match snapshot.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing snapshot: {}", e);
                return ExitCode::FAILURE;
            },
        },
    }

    ExitCode::SUCCESS
}

#[derive(Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_adapter(name: &str) -> Option<Adapter> {
    let adapter = match name.to_ascii_lowercase().as_str() {
        "cga" => Adapter::Cga,
        "ega" => Adapter::Ega,
        "ega_mono" | "ega-mono" => Adapter::EgaMono,
        "vga" => Adapter::Vga,
        "tandy" => Adapter::Tandy,
        "pcjr" => Adapter::Pcjr,
        "mda" => Adapter::Mda,
        _ => return None,
    };
    Some(adapter)
}

fn screen_mode_label(key: &retro_video::core::ModeKey) -> String {
    format!("{:?} SCREEN {}, {} columns", key.adapter, key.number, key.text_width)
}

fn print_help() {
    println!("Retro Video Headless Runner");
    println!();
    println!("Usage: video-headless [OPTIONS] [SCRIPT_FILE]");
    println!();
    println!("Options:");
    println!("  -a, --adapter <NAME>  Adapter: cga, ega, ega_mono, vga, tandy, pcjr, mda");
    println!("  -c, --config <PATH>   Read configuration from file");
    println!("  -f, --file <PATH>     Read script from file");
    println!("  -j, --json            Output snapshot as JSON");
    println!("  -t, --text            Output display text (default)");
    println!("  -s, --system-clipboard  Copy to the desktop clipboard (needs the clipboard feature)");
    println!("  -h, --help            Show this help message");
    println!();
    println!("The script is a JSON array of operations, read from stdin if no file is given:");
    println!("  [{{\"op\": \"screen\", \"number\": 1}}, {{\"op\": \"pset\", \"x\": 5, \"y\": 5, \"attr\": 3}}]");
    println!();
    println!("Environment:");
    println!("  RUST_LOG              Log filter (default: warn)");
}
