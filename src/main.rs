//! Voreen CLI - Processor Networks
//!
//! Inspect the registry, validate and evaluate network documents.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use voreen::prelude::*;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("voreen");

    let (config_path, rest) = match split_config_flag(&args[1.min(args.len())..]) {
        Ok(split) => split,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage(program);
            std::process::exit(2);
        }
    };

    let config = match config_path {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: cannot read {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => EngineConfig::default(),
    };

    env_logger::Builder::new()
        .parse_filters(&config.logging.level)
        .parse_default_env()
        .init();

    if rest.is_empty() {
        print_usage(program);
        return;
    }

    let result = match rest[0].as_str() {
        "list" => list_processors(&config),
        "info" => match rest.get(1) {
            Some(class) => processor_info(&config, class),
            None => Err(anyhow::anyhow!("please specify a processor class")),
        },
        "validate" => match rest.get(1) {
            Some(path) => validate_document(&config, path),
            None => Err(anyhow::anyhow!("please specify a network document")),
        },
        "run" => match rest.get(1) {
            Some(path) => run_document(&config, path, rest.get(2).map(String::as_str)),
            None => Err(anyhow::anyhow!("please specify a network document")),
        },
        "demo" => match rest.get(1) {
            Some(path) => write_demo(&config, path),
            None => Err(anyhow::anyhow!("please specify an output path")),
        },
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(program);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Remove `--config <file>` from the arguments.
fn split_config_flag(args: &[String]) -> Result<(Option<PathBuf>, Vec<String>)> {
    let mut config = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            match iter.next() {
                Some(path) => config = Some(PathBuf::from(path)),
                None => bail!("--config needs a file"),
            }
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((config, rest))
}

fn print_usage(program: &str) {
    println!("Voreen v{}", voreen::VERSION);
    println!();
    println!("Usage: {} [--config <file.toml>] <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                 List all registered processors and evaluators");
    println!("  info <class>         Show ports and properties of a processor class");
    println!("  validate <doc>       Load and validate a network document");
    println!("  run <doc> [passes]   Evaluate a network document (default: 1 pass)");
    println!("  demo <out.json>      Write an example network document");
    println!("  help                 Show this help message");
}

fn list_processors(config: &EngineConfig) -> Result<()> {
    let registry = config.registry()?;
    let processors = registry.processors();

    println!("Processors ({} total):", processors.len());
    for (category, classes) in processors.grouped_by_category() {
        println!("  {}", category.display_name());
        for metadata in classes {
            println!("    {} - {}", metadata.class_name, metadata.description);
        }
    }
    println!();
    println!("Link evaluators:");
    for class in registry.evaluators().known_classes() {
        match registry.evaluators().display_name(class) {
            Some(name) => println!("    {} ({})", class, name),
            None => println!("    {}", class),
        }
    }
    Ok(())
}

fn processor_info(config: &EngineConfig, class: &str) -> Result<()> {
    let registry = config.registry()?;
    let Some(metadata) = registry.processors().metadata(class) else {
        bail!("processor '{}' not found, use 'list' to see available classes", class);
    };

    println!("Processor: {}", metadata.class_name);
    println!("Category: {}", metadata.category.display_name());
    if metadata.end_processor {
        println!("End processor: yes");
    }
    println!();
    println!("  {}", metadata.description);
    println!();

    if !metadata.inports.is_empty() {
        println!("Inports:");
        for port in &metadata.inports {
            let mut flags = Vec::new();
            if port.optional {
                flags.push("optional");
            }
            if port.multiple {
                flags.push("multiple");
            }
            if port.feedback {
                flags.push("feedback");
            }
            let flags = if flags.is_empty() { String::new() } else { format!(" ({})", flags.join(", ")) };
            println!("  {} [{}]{}", port.name, port.kind, flags);
        }
        println!();
    }

    if !metadata.outports.is_empty() {
        println!("Outports:");
        for port in &metadata.outports {
            println!("  {} [{}]", port.name, port.kind);
        }
        println!();
    }

    if !metadata.properties.is_empty() {
        println!("Properties:");
        for property in &metadata.properties {
            let bounds = property
                .bounds()
                .map(|(min, max)| format!(" in [{}, {}]", min, max))
                .unwrap_or_default();
            println!("  {} [{}] = {}{}", property.id(), property.kind(), property.get(), bounds);
            for option in property.options() {
                println!("    - {} ({})", option.key, option.label);
            }
        }
    }
    Ok(())
}

fn load_network(registry: &Registry, path: &str) -> Result<ProcessorNetwork> {
    let document = NetworkDocument::load(path).with_context(|| format!("reading {}", path))?;
    let network = document
        .instantiate(registry)
        .with_context(|| format!("loading {}", path))?;
    Ok(network)
}

fn validate_document(config: &EngineConfig, path: &str) -> Result<()> {
    let registry = config.registry()?;
    let network = load_network(&registry, path)?;
    let report = ValidationPipeline::default().validate(&network);

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    if !report.can_execute() {
        for line in report.detailed_errors() {
            eprintln!("{}", line);
        }
        bail!(report.summary());
    }
    println!("{}", report.summary());
    Ok(())
}

fn run_document(config: &EngineConfig, path: &str, passes: Option<&str>) -> Result<()> {
    let passes: usize = match passes {
        Some(p) => p.parse().with_context(|| format!("invalid pass count '{}'", p))?,
        None => 1,
    };
    let registry = config.registry()?;
    let mut network = load_network(&registry, path)?;

    let options = config.evaluator_options().with_progress(|update| match update {
        ProgressUpdate::ProcessorStarted { name, index, total, .. } => {
            println!("  [{}/{}] {}", index + 1, total, name);
        }
        ProgressUpdate::ProcessorFailed { message, .. } => {
            eprintln!("  failed: {}", message);
        }
        _ => {}
    });
    let mut evaluator = NetworkEvaluator::with_options(options);
    if let Err(e) = evaluator.initialize_network(&mut network) {
        eprintln!("warning: {}", e);
    }

    for pass in 1..=passes {
        println!("Pass {}:", pass);
        let report = evaluator.process(&mut network)?;
        println!(
            "  processed {}, skipped {}, failed {}",
            report.processed.len(),
            report.skipped.len(),
            report.failed.len()
        );
    }

    evaluator.deinitialize_network(&mut network);
    Ok(())
}

fn write_demo(config: &EngineConfig, path: &str) -> Result<()> {
    let registry = config.registry()?;
    let mut network = ProcessorNetwork::new().with_name("Demo");

    let source = network.add(&registry, "ImageSource", None)?;
    let blur = network.add(&registry, "Blur", None)?;
    let colormap = network.add(&registry, "ColorMap", None)?;
    let colorize = network.add(&registry, "Colorize", None)?;
    let canvas = network.add(&registry, "Canvas", None)?;

    network.connect(source, "image.output", blur, "image.input")?;
    network.connect(blur, "image.output", colorize, "image.input")?;
    network.connect(colormap, "cp.colormap", colorize, "cp.colormap")?;
    network.connect(colorize, "image.output", canvas, "image.input")?;

    network.set("ImageSource", "pattern", Value::Option("gradient".into()))?;
    network.set("Blur", "sigma", Value::Float(2.0))?;
    let width = network.key("ImageSource", "width")?;
    let height = network.key("ImageSource", "height")?;
    network.link_with(&registry, width, height, None)?;

    network.to_document().save(path)?;
    println!("Wrote {} processor(s) to {}", network.len(), path);
    Ok(())
}
