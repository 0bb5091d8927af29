// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use matriarch_ctl::connection::{TrafficFilter, TrafficLog};
use matriarch_ctl::midi::{MidirTransport, SimulatedDevice, Transport};
use matriarch_ctl::params::{self, ParameterDef};
use matriarch_ctl::{ConnectionManager, PortList, Settings};

/// Parameters read by `--test`: unit id, note priority, MIDI channel,
/// pitch bend range, paraphony mode
const SAMPLE_PARAMETERS: [u8; 5] = [0, 3, 10, 37, 55];

fn print_usage() {
    println!("Matriarch Controller - global parameter editor");
    println!();
    println!("Usage: matriarch-ctl [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  --list-ports            List available MIDI inputs and outputs");
    println!("  --params                Print the parameter catalog");
    println!("  --test                  Connect, probe the instrument and read sample parameters");
    println!("  --query <ID>            Read one parameter");
    println!("  --query-all             Read every parameter");
    println!("  --set <ID> <VALUE>      Write one parameter");
    println!("  --reset-defaults        Write the factory default of every parameter");
    println!("  --monitor [SECS]        Print incoming MIDI traffic (default 30 seconds)");
    println!("  --help                  Show this help message");
    println!();
    println!("Options:");
    println!("  --config <PATH>         Load settings from a TOML file");
    println!("  --input <NAME>          MIDI input port name");
    println!("  --output <NAME>         MIDI output port name");
    println!("  --simulate              Talk to a simulated instrument instead of hardware");
    println!("  --debug                 Verbose logging");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    ListPorts,
    Params,
    Test,
    Query(u8),
    QueryAll,
    Set(u8, i32),
    ResetDefaults,
    Monitor(u64),
    Help,
}

#[derive(Debug, Default)]
struct Options {
    command: Option<Command>,
    config: Option<PathBuf>,
    input: Option<String>,
    output: Option<String>,
    simulate: bool,
    debug: bool,
}

fn next_value<'a>(args: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a String> {
    args.next()
        .ok_or_else(|| anyhow!("{} requires a value", flag))
}

fn parse_id(text: &str) -> Result<u8> {
    text.parse()
        .map_err(|_| anyhow!("Invalid parameter id: {}", text))
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter().peekable();

    while let Some(arg) = iter.next() {
        let command = match arg.as_str() {
            "--list-ports" => Command::ListPorts,
            "--params" => Command::Params,
            "--test" => Command::Test,
            "--query" => Command::Query(parse_id(next_value(&mut iter, arg)?)?),
            "--query-all" => Command::QueryAll,
            "--set" => {
                let id = parse_id(next_value(&mut iter, arg)?)?;
                let raw = next_value(&mut iter, arg)?;
                let value = raw
                    .parse()
                    .map_err(|_| anyhow!("Invalid value: {}", raw))?;
                Command::Set(id, value)
            }
            "--reset-defaults" => Command::ResetDefaults,
            "--monitor" => {
                let operand = iter
                    .peek()
                    .filter(|next| !next.starts_with("--"))
                    .map(|next| next.to_string());
                let secs = match operand {
                    Some(text) => {
                        iter.next();
                        text.parse()
                            .map_err(|_| anyhow!("Invalid duration: {}", text))?
                    }
                    None => 30,
                };
                Command::Monitor(secs)
            }
            "--help" | "-h" => Command::Help,
            "--config" => {
                options.config = Some(PathBuf::from(next_value(&mut iter, arg)?));
                continue;
            }
            "--input" => {
                options.input = Some(next_value(&mut iter, arg)?.clone());
                continue;
            }
            "--output" => {
                options.output = Some(next_value(&mut iter, arg)?.clone());
                continue;
            }
            "--simulate" => {
                options.simulate = true;
                continue;
            }
            "--debug" => {
                options.debug = true;
                continue;
            }
            other => bail!("Unknown option: {}", other),
        };

        if options.command.is_some() {
            bail!("Only one command may be given");
        }
        options.command = Some(command);
    }

    Ok(options)
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("matriarch_ctl={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// First port whose name mentions the instrument
fn detect_port(names: &[String]) -> Option<String> {
    names
        .iter()
        .find(|name| name.to_lowercase().contains("matriarch"))
        .cloned()
}

fn resolve_ports(options: &Options, settings: &Settings, ports: &PortList) -> Result<(String, String)> {
    let input = options
        .input
        .clone()
        .or_else(|| settings.midi.input_port.clone())
        .or_else(|| detect_port(&ports.inputs))
        .ok_or_else(|| anyhow!("No MIDI input selected; use --input or --list-ports"))?;
    let output = options
        .output
        .clone()
        .or_else(|| settings.midi.output_port.clone())
        .or_else(|| detect_port(&ports.outputs))
        .ok_or_else(|| anyhow!("No MIDI output selected; use --output or --list-ports"))?;
    Ok((input, output))
}

fn connect(options: &Options, settings: &Settings) -> Result<ConnectionManager> {
    let transport: Arc<dyn Transport> = if options.simulate {
        Arc::new(SimulatedDevice::new())
    } else {
        Arc::new(MidirTransport::new())
    };

    let manager = ConnectionManager::new(transport, settings.clone());
    manager.on_error(|message| eprintln!("Error: {}", message));

    let (input, output) = resolve_ports(options, settings, &manager.list_ports())?;
    println!("Connecting to MIDI ports...");
    println!("  Input:  {}", input);
    println!("  Output: {}", output);
    if !manager.connect(&input, &output) {
        bail!("Failed to connect to MIDI ports");
    }
    Ok(manager)
}

fn lookup(parameter_id: u8) -> Result<&'static ParameterDef> {
    params::get(parameter_id).ok_or_else(|| anyhow!("Unknown parameter id: {}", parameter_id))
}

fn list_ports(options: &Options) -> Result<()> {
    let transport: Box<dyn Transport> = if options.simulate {
        Box::new(SimulatedDevice::new())
    } else {
        Box::new(MidirTransport::new())
    };

    let inputs = transport.list_inputs().context("Failed to list MIDI inputs")?;
    let outputs = transport.list_outputs().context("Failed to list MIDI outputs")?;

    println!("MIDI Inputs:");
    if inputs.is_empty() {
        println!("  (none)");
    }
    for (i, name) in inputs.iter().enumerate() {
        println!("  {}: {}", i + 1, name);
    }
    println!("MIDI Outputs:");
    if outputs.is_empty() {
        println!("  (none)");
    }
    for (i, name) in outputs.iter().enumerate() {
        println!("  {}: {}", i + 1, name);
    }
    Ok(())
}

fn print_params() {
    for (category, defs) in params::by_category() {
        println!("{}", category);
        for def in defs {
            let (min, max) = def.bounds();
            println!(
                "  {:>3}  {:<40} default {:<28} [{}-{}]",
                def.id,
                def.name,
                def.display(def.default),
                min,
                max
            );
        }
        println!();
    }
}

fn run_test(manager: &ConnectionManager) -> Result<()> {
    let log = Arc::new(TrafficLog::new());
    manager.record_traffic(Arc::clone(&log));

    println!("\nTesting communication with Matriarch...");
    if !manager.test_connection() {
        println!("Communication test FAILED!");
        println!("Make sure:");
        println!("  - Matriarch is powered on");
        println!("  - MIDI cables are properly connected");
        println!("  - Matriarch MIDI settings are correct");
        bail!("No response from instrument");
    }
    println!("Communication test PASSED!");

    println!("\nQuerying sample parameters...");
    for id in SAMPLE_PARAMETERS {
        let def = lookup(id)?;
        println!("\nQuerying: {}", def.name);
        match manager.query_one(id, None) {
            Some(value) => println!("  Result: {} ({})", value, def.display(value)),
            None => println!("  Result: FAILED (timeout or error)"),
        }
        thread::sleep(manager.settings().query.delay());
    }

    let lines = log.lines(&TrafficFilter::default());
    println!("\nRecent MIDI Messages ({}):", lines.len());
    for line in lines.iter().rev().take(10).rev() {
        println!("  {}", line);
    }
    Ok(())
}

fn query_one(manager: &ConnectionManager, parameter_id: u8) -> Result<()> {
    let def = lookup(parameter_id)?;
    let value = manager
        .try_query(parameter_id, None)
        .with_context(|| format!("Failed to read {}", def.name))?;
    println!("{} ({}): {} ({})", def.name, def.id, value, def.display(value));
    Ok(())
}

fn query_all(manager: &ConnectionManager) -> Result<()> {
    let ids = params::ids();
    let retries = manager.settings().query.retry_count;

    let mut results = manager.query_all(&ids, retries, |done, total| {
        eprint!("\rQuerying parameters: {}/{}", done, total);
    });
    eprintln!();

    let failed = results.failed_ids();
    if !failed.is_empty() {
        info!("Retrying {} failed parameters", failed.len());
        results.merge(manager.query_all(&failed, retries, |_, _| {}));
    }

    for (id, value) in results.iter() {
        let def = lookup(id)?;
        match value {
            Some(value) => println!(
                "  {:>3}  {:<40} {}{}",
                id,
                def.name,
                def.display(value),
                if def.is_customized(value) { " *" } else { "" }
            ),
            None => println!("  {:>3}  {:<40} (no response)", id, def.name),
        }
    }

    let failed = results.failed_ids();
    println!(
        "\n{} of {} parameters read",
        results.len() - failed.len(),
        results.len()
    );
    if !failed.is_empty() {
        println!("Failed: {:?}", failed);
    }
    Ok(())
}

fn set_parameter(manager: &ConnectionManager, parameter_id: u8, value: i32) -> Result<()> {
    let def = lookup(parameter_id)?;
    manager
        .try_set_parameter(parameter_id, value)
        .with_context(|| format!("Failed to set {}", def.name))?;

    // Sets are not acknowledged, so read the value back
    thread::sleep(manager.settings().query.delay());
    match manager.query_one(parameter_id, None) {
        Some(readback) => println!("{} = {} ({})", def.name, readback, def.display(readback)),
        None => println!("{} set; read-back timed out", def.name),
    }
    Ok(())
}

fn reset_defaults(manager: &ConnectionManager) {
    let results = manager.reset_to_defaults();
    let failed = results.failed_ids();
    println!(
        "Reset {} of {} parameters to defaults",
        results.len() - failed.len(),
        results.len()
    );
    if !failed.is_empty() {
        println!("Failed: {:?}", failed);
    }
}

fn monitor(manager: &ConnectionManager, secs: u64) {
    manager.on_raw_traffic(|text, _| println!("{}", text));
    manager.on_parameter_update(|id, value| {
        if let Some(def) = params::get(id) {
            println!("  -> {} = {}", def.name, def.display(value));
        }
    });

    println!("Monitoring MIDI input for {} seconds (press Ctrl+C to stop)...", secs);
    println!();
    thread::sleep(Duration::from_secs(secs));
    println!();
    println!("Monitor complete!");
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    init_logging(options.debug);

    let Some(command) = options.command.clone() else {
        println!("Matriarch Controller");
        println!("Run with --help for usage information");
        return Ok(());
    };

    let settings = match &options.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match command {
        Command::Help => print_usage(),
        Command::ListPorts => list_ports(&options)?,
        Command::Params => print_params(),
        Command::Test => {
            let manager = connect(&options, &settings)?;
            let result = run_test(&manager);
            manager.disconnect();
            result?;
            println!("\nTest completed successfully!");
        }
        Command::Query(id) => query_one(&connect(&options, &settings)?, id)?,
        Command::QueryAll => query_all(&connect(&options, &settings)?)?,
        Command::Set(id, value) => set_parameter(&connect(&options, &settings)?, id, value)?,
        Command::ResetDefaults => reset_defaults(&connect(&options, &settings)?),
        Command::Monitor(secs) => monitor(&connect(&options, &settings)?, secs),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        let options = parse_args(&args(&["--set", "37", "5", "--simulate"])).unwrap();
        assert_eq!(options.command, Some(Command::Set(37, 5)));
        assert!(options.simulate);

        let options = parse_args(&args(&["--reset-defaults", "--simulate"])).unwrap();
        assert_eq!(options.command, Some(Command::ResetDefaults));

        let options = parse_args(&args(&["--monitor"])).unwrap();
        assert_eq!(options.command, Some(Command::Monitor(30)));

        let options = parse_args(&args(&["--monitor", "5", "--debug"])).unwrap();
        assert_eq!(options.command, Some(Command::Monitor(5)));
        assert!(options.debug);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&["--query"])).is_err());
        assert!(parse_args(&args(&["--query", "x"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["--test", "--params"])).is_err());
    }

    #[test]
    fn test_detect_port() {
        let names = args(&["IAC Bus 1", "Moog Matriarch MIDI 1"]);
        assert_eq!(detect_port(&names).as_deref(), Some("Moog Matriarch MIDI 1"));
        assert_eq!(detect_port(&args(&["IAC Bus 1"])), None);
    }

    #[test]
    fn test_resolve_prefers_flags() {
        let ports = PortList {
            inputs: args(&["Moog Matriarch"]),
            outputs: args(&["Moog Matriarch"]),
        };
        let options = Options {
            input: Some("Other In".to_string()),
            ..Options::default()
        };
        let (input, output) = resolve_ports(&options, &Settings::default(), &ports).unwrap();
        assert_eq!(input, "Other In");
        assert_eq!(output, "Moog Matriarch");
    }
}
