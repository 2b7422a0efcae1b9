// main.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mediactl::device::DeviceInfo;
use mediactl::{MediaDevice, MediaError, MediaSession, Result, SessionConfig, TopologyFormat};

#[derive(Parser, Debug)]
#[command(name = "media-ctl")]
#[command(author = "Stéphane Cerveau")]
#[command(version)]
#[command(about = "Media controller topology inspection and configuration")]
struct Args {
    /// Media device node
    #[arg(
        short,
        long,
        env = "MEDIA_CTL_DEVICE",
        default_value = mediactl::config::DEFAULT_MEDIA_DEVICE
    )]
    device: PathBuf,

    /// Print the device node associated with the named entity
    #[arg(short, long)]
    entity: Option<String>,

    /// Print the active format of a pad, e.g. '"Sensor":0'
    #[arg(long = "get-format", value_name = "PAD")]
    get_format: Option<String>,

    /// Comma-separated list of formats to setup
    #[arg(short = 'f', long, value_name = "FORMATS")]
    formats: Option<String>,

    /// Comma-separated list of link descriptors to setup
    #[arg(short = 'l', long, value_name = "LINKS")]
    links: Option<String>,

    /// Reset all links to inactive
    #[arg(short, long)]
    reset: bool,

    /// Modify links interactively
    #[arg(short, long)]
    interactive: bool,

    /// Print the device topology (implies --verbose)
    #[arg(short = 'p', long)]
    print_topology: bool,

    /// Print the device topology as a dot graph
    #[arg(long)]
    print_dot: bool,

    /// Print the device topology as JSON
    #[arg(long)]
    print_json: bool,

    /// Be verbose
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn is_verbose(&self) -> bool {
        self.verbose || self.print_topology
    }
}

fn init_logging(verbose: bool) {
    let directive = if verbose {
        "mediactl=debug"
    } else {
        "mediactl=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_writer(io::stderr)
        .init();
}

fn print_device_info(info: &DeviceInfo) {
    println!(
        "Media controller API version {}\n",
        DeviceInfo::version_string(info.media_version)
    );
    println!("Media device information");
    println!("------------------------");
    println!("driver          {}", info.driver);
    println!("model           {}", info.model);
    println!("serial          {}", info.serial);
    println!("bus info        {}", info.bus_info);
    println!("hw revision     0x{:x}", info.hw_revision);
    println!(
        "driver version  {}\n",
        DeviceInfo::version_string(info.driver_version)
    );
}

/// Echo the descriptor with a caret under the offending character.
fn show_error_position(input: &str, err: &MediaError) {
    if let Some(offset) = err.offset() {
        eprintln!("{}", input);
        eprintln!("{:>width$}", "^", width = offset + 1);
    }
}

fn print_topology<D: MediaDevice>(session: &mut MediaSession<D>, args: &Args) -> Result<()> {
    let formats = [
        (args.print_topology, TopologyFormat::Text),
        (args.print_dot, TopologyFormat::Dot),
        (args.print_json, TopologyFormat::Json),
    ];

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (_, format) in formats.iter().filter(|(wanted, _)| *wanted) {
        session.write_topology(&mut out, *format)?;
    }
    out.flush()?;
    Ok(())
}

fn interactive<D: MediaDevice>(session: &mut MediaSession<D>) -> Result<()> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| MediaError::Io(io::Error::other(format!("Failed to create editor: {}", e))))?;

    loop {
        match rl.readline("Enter a link to modify or enter to stop\n") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    break;
                }
                let _ = rl.add_history_entry(trimmed);
                if let Err(e) = session.setup_links(&line) {
                    show_error_position(&line, &e);
                    error!("{}", e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                return Err(MediaError::Io(io::Error::other(format!(
                    "Readline error: {}",
                    e
                ))))
            }
        }
    }

    Ok(())
}

fn run<D: MediaDevice>(session: &mut MediaSession<D>, args: &Args) -> Result<()> {
    if args.is_verbose() {
        let info = session.device_info()?;
        print_device_info(&info);
    }

    if let Some(name) = &args.entity {
        match session.entity_devnode(name)? {
            Some(devnode) => println!("{}", devnode.display()),
            None => {
                return Err(MediaError::NotFound(format!(
                    "device node of entity '{}'",
                    name
                )))
            }
        }
    }

    if let Some(descriptor) = &args.get_format {
        let pad = session.parse_pad(descriptor).inspect_err(|e| {
            show_error_position(descriptor, e);
        })?;
        println!("{}", session.pad_format(pad)?);
    }

    print_topology(session, args)?;

    if args.reset {
        let count = session.reset_all_links()?;
        info!("{} link(s) reset", count);
    }

    if let Some(links) = &args.links {
        session.setup_links(links).inspect_err(|e| {
            show_error_position(links, e);
        })?;
    }

    if let Some(formats) = &args.formats {
        session.setup_formats(formats).inspect_err(|e| {
            show_error_position(formats, e);
        })?;
    }

    if args.interactive {
        interactive(session)?;
    }

    Ok(())
}

#[cfg(target_os = "linux")]
fn open_and_run(args: &Args) -> Result<()> {
    let config = SessionConfig::new(&args.device);
    let mut session = MediaSession::open(config)?;
    run(&mut session, args)
}

#[cfg(not(target_os = "linux"))]
fn open_and_run(args: &Args) -> Result<()> {
    Err(MediaError::NotFound(format!(
        "media controller support for {}",
        SessionConfig::new(&args.device).device.display()
    )))
}

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        let _ = Args::command().print_help();
        return ExitCode::FAILURE;
    }

    let args = Args::parse();
    init_logging(args.is_verbose());

    match open_and_run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
