use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser};
use log::{info, warn};
use nc2drift::cli::{Cli, Commands, OutputFormat, TranscodeArgs, merge_job_config, render_template};
use nc2drift::info::{
    get_netcdf_info, missing_cf_metadata, print_file_info_csv, print_file_info_human,
    print_file_info_json, print_file_info_yaml,
};
use nc2drift::input::JobConfig;
use nc2drift::log::{
    config_echo, show_batch_report, show_farewell_with_timing, show_greeting,
    show_transcode_summary,
};
use nc2drift::simulation::CommandEngine;
use nc2drift::{process_transcode_job, run_simulations};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Transcode(args) => transcode(cli.config.as_deref(), &args, quiet),
        Commands::Info {
            file,
            detailed,
            variable,
            format,
            check,
        } => inspect(&file, variable.as_deref(), detailed, &format, check),
        Commands::Simulate {
            start,
            engine,
            engine_args,
            no_progress,
        } => simulate(cli.config.as_deref(), start, engine, engine_args, !no_progress && !quiet, quiet),
        Commands::Validate {
            config_file,
            detailed,
        } => validate(config_file.or(cli.config), detailed),
        Commands::Template {
            template_type,
            output,
            format,
        } => {
            let rendered = render_template(&template_type, &format)?;
            write_or_print(output.as_deref(), &rendered)
        }
        Commands::Completions { shell, output } => {
            let mut command = Cli::command();
            match output {
                Some(path) => {
                    let mut file = fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    clap_complete::generate(shell, &mut command, "nc2drift", &mut file);
                }
                None => clap_complete::generate(shell, &mut command, "nc2drift", &mut std::io::stdout()),
            }
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<JobConfig> {
    JobConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn transcode(config_path: Option<&Path>, args: &TranscodeArgs, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    if !quiet {
        show_greeting(&config_path.map_or("command line".to_string(), |p| p.display().to_string()));
    }

    let base = config_path.map(load_config).transpose()?;
    let config = merge_job_config(base, args)?;
    config.validate().context("Invalid configuration")?;
    if !quiet {
        config_echo(&config);
    }

    if !Path::new(&config.input_path).exists() {
        bail!("Input file not found: {}", config.input_path);
    }
    if Path::new(&config.output_path).exists() && !args.force {
        bail!(
            "Output file {} already exists, use --force to overwrite",
            config.output_path
        );
    }

    if args.dry_run {
        info!("Dry run: configuration is valid, nothing written");
        return Ok(());
    }

    let summary = process_transcode_job(&config)
        .with_context(|| format!("Failed to transcode {}", config.input_path))?;
    if !quiet {
        show_transcode_summary(&summary);
        show_farewell_with_timing(start_time.elapsed());
    }
    Ok(())
}

fn inspect(
    file: &Path,
    variable: Option<&str>,
    detailed: bool,
    format: &OutputFormat,
    check: bool,
) -> Result<()> {
    let info = get_netcdf_info(file, variable, detailed)?;
    match format {
        OutputFormat::Human => print_file_info_human(&info),
        OutputFormat::Json => print_file_info_json(&info)?,
        OutputFormat::Yaml => print_file_info_yaml(&info)?,
        OutputFormat::Csv => print_file_info_csv(&info),
    }

    if check {
        let problems = missing_cf_metadata(&info);
        if !problems.is_empty() {
            for problem in &problems {
                warn!("{}", problem);
            }
            bail!("{} CF metadata problem(s) in {}", problems.len(), file.display());
        }
    }
    Ok(())
}

fn simulate(
    config_path: Option<&Path>,
    start: DateTime<Utc>,
    engine: Option<String>,
    engine_args: Vec<String>,
    show_progress: bool,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();
    let Some(config_path) = config_path else {
        bail!("simulate needs a configuration file (--config or NC2DRIFT_CONFIG)");
    };
    let config = load_config(config_path)?;
    config.validate().context("Invalid configuration")?;

    let mut engine = match (engine, config.simulation.as_ref().and_then(|s| s.engine_command.as_ref())) {
        (Some(program), _) => CommandEngine::new(&program, engine_args),
        (None, Some(command)) => CommandEngine::from_command(command),
        (None, None) => bail!("No engine program given (--engine or simulation.engine_command)"),
    };

    let report = run_simulations(&config, start, &mut engine, show_progress)
        .context("Failed to prepare simulations")?;
    if !quiet {
        show_batch_report(&report);
        show_farewell_with_timing(start_time.elapsed());
    }

    if !report.is_complete_success() {
        bail!(
            "{} of {} simulations failed",
            report.failed().len(),
            report.len()
        );
    }
    Ok(())
}

fn validate(config_file: Option<PathBuf>, detailed: bool) -> Result<()> {
    let Some(path) = config_file else {
        bail!("No configuration file given");
    };
    let config = load_config(&path)?;
    config.validate().context("Configuration is invalid")?;

    println!("✅ {} is valid", path.display());
    if detailed {
        config_echo(&config);
        if !Path::new(&config.input_path).exists() {
            warn!("input file {} does not exist", config.input_path);
        }
        if let Some(simulation) = &config.simulation {
            for reader in &simulation.readers {
                if !reader.exists() {
                    warn!("reader dataset {} does not exist", reader.display());
                }
            }
        }
    }
    Ok(())
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
