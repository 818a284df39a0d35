//! # CLI Integration Tests
//!
//! Argument parsing for every subcommand, plus template output and
//! completion generation.

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    use crate::cli::{
        Cli, Commands, ConfigFormat, OutputFormat, TemplateType, merge_job_config,
        render_template,
    };
    use crate::input::JobConfig;

    /// Test basic CLI argument parsing
    #[test]
    fn test_cli_help() {
        let result = Cli::try_parse_from(["nc2drift", "--help"]);
        assert!(result.is_err()); // --help causes early exit with "error"

        let help = result.unwrap_err().to_string();
        assert!(help.contains("transcode"));
        assert!(help.contains("simulate"));
    }

    #[test]
    fn test_cli_version() {
        let result = Cli::try_parse_from(["nc2drift", "--version"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    /// Test global flags
    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "nc2drift",
            "--verbose",
            "--config",
            "/path/to/baltic.yaml",
            "template",
            "basic",
        ]);

        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/baltic.yaml")));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["nc2drift", "-v", "-q", "template", "basic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_transcode_command_basic() {
        let cli = Cli::parse_from([
            "nc2drift",
            "transcode",
            "wind.nc",
            "baltic.nc",
            "--bbox",
            "9.5:30.5:53.5:61.0",
        ]);

        let Commands::Transcode(args) = &cli.command else {
            panic!("Expected Transcode command");
        };
        assert_eq!(args.input.as_deref(), Some("wind.nc"));
        assert_eq!(args.output.as_deref(), Some("baltic.nc"));
        let bbox = args.bbox.unwrap();
        assert_eq!((bbox.lon_min, bbox.lon_max), (9.5, 30.5));
        assert_eq!((bbox.lat_min, bbox.lat_max), (53.5, 61.0));
        assert!(!args.force);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_transcode_command_with_overrides() {
        let cli = Cli::parse_from([
            "nc2drift",
            "transcode",
            "era5.nc",
            "out.nc",
            "--bbox",
            "-10,5,40,45",
            "--speed-var",
            "ws",
            "--direction-var",
            "wd",
            "--time-var",
            "time",
            "--lat-var",
            "lat",
            "--lon-var",
            "lon",
            "--expected-units",
            "m s**-1",
            "--compression",
            "9",
            "--force",
            "--dry-run",
        ]);

        let Commands::Transcode(args) = &cli.command else {
            panic!("Expected Transcode command");
        };
        assert_eq!(args.bbox.map(|b| b.lon_min), Some(-10.0));
        assert!(args.force);
        assert!(args.dry_run);

        let config = merge_job_config(None, args).unwrap();
        assert_eq!(config.variables.speed, "ws");
        assert_eq!(config.variables.direction, "wd");
        assert_eq!(config.variables.time, "time");
        assert_eq!(config.variables.latitude, "lat");
        assert_eq!(config.variables.longitude, "lon");
        assert_eq!(config.expected_speed_units.as_deref(), Some("m s**-1"));
        assert_eq!(config.compression_level, 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_transcode_rejects_bad_values() {
        assert!(
            Cli::try_parse_from(["nc2drift", "transcode", "a.nc", "b.nc", "--bbox", "1:2:3"])
                .is_err()
        );
        assert!(
            Cli::try_parse_from([
                "nc2drift",
                "transcode",
                "a.nc",
                "b.nc",
                "--bbox",
                "0:1:0:1",
                "--compression",
                "10"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_info_command() {
        let cli = Cli::parse_from([
            "nc2drift", "info", "wind.nc", "--detailed", "-n", "si10", "--format", "yaml",
            "--check",
        ]);

        if let Commands::Info {
            file,
            detailed,
            variable,
            format,
            check,
        } = &cli.command
        {
            assert_eq!(file, &PathBuf::from("wind.nc"));
            assert!(*detailed);
            assert_eq!(variable.as_deref(), Some("si10"));
            assert_eq!(format, &OutputFormat::Yaml);
            assert!(*check);
        } else {
            panic!("Expected Info command");
        }

        let cli = Cli::parse_from(["nc2drift", "info", "wind.nc"]);
        if let Commands::Info { format, check, .. } = &cli.command {
            assert_eq!(format, &OutputFormat::Human);
            assert!(!*check);
        } else {
            panic!("Expected Info command");
        }
    }

    #[test]
    fn test_simulate_command() {
        let cli = Cli::parse_from([
            "nc2drift",
            "--config",
            "baltic.yaml",
            "simulate",
            "--start",
            "2021-01-01",
            "--engine",
            "python3",
            "--engine-arg",
            "run_drift.py",
            "--engine-arg",
            "--verbose",
            "--no-progress",
        ]);

        if let Commands::Simulate {
            start,
            engine,
            engine_args,
            no_progress,
        } = &cli.command
        {
            assert_eq!(start.to_rfc3339(), "2021-01-01T00:00:00+00:00");
            assert_eq!(engine.as_deref(), Some("python3"));
            assert_eq!(engine_args, &vec!["run_drift.py".to_string(), "--verbose".to_string()]);
            assert!(*no_progress);
        } else {
            panic!("Expected Simulate command");
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_simulate_requires_start() {
        assert!(Cli::try_parse_from(["nc2drift", "simulate"]).is_err());
        assert!(Cli::try_parse_from(["nc2drift", "simulate", "--start", "soon"]).is_err());
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["nc2drift", "validate", "baltic.json", "--detailed"]);

        if let Commands::Validate {
            config_file,
            detailed,
        } = &cli.command
        {
            assert_eq!(config_file, &Some(PathBuf::from("baltic.json")));
            assert!(*detailed);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_template_command() {
        let cli = Cli::parse_from([
            "nc2drift",
            "template",
            "simulation",
            "--format",
            "yaml",
            "-o",
            "sim.yaml",
        ]);

        if let Commands::Template {
            template_type,
            output,
            format,
        } = &cli.command
        {
            assert_eq!(template_type, &TemplateType::Simulation);
            assert_eq!(output, &Some(PathBuf::from("sim.yaml")));
            assert_eq!(format, &ConfigFormat::Yaml);
        } else {
            panic!("Expected Template command");
        }

        assert!(Cli::try_parse_from(["nc2drift", "template", "ocean"]).is_err());
    }

    #[test]
    fn test_baltic_template_content() {
        let json = render_template(&TemplateType::Baltic, &ConfigFormat::Json).unwrap();
        let config = JobConfig::from_json(&json).unwrap();
        assert_eq!(config.bounding_box.lon_min, 9.5);
        assert_eq!(config.bounding_box.lat_max, 61.0);
        assert_eq!(config.variables.speed, "si10");
        assert_eq!(config.variables.direction, "wdir10");
        assert!(config.simulation.is_none());

        let yaml = render_template(&TemplateType::Simulation, &ConfigFormat::Yaml).unwrap();
        assert!(yaml.contains("Stockholm"));
        assert!(yaml.contains("wind_stranding_output"));
    }

    #[test]
    fn test_completions_generation() {
        for shell in [
            clap_complete::Shell::Bash,
            clap_complete::Shell::Zsh,
            clap_complete::Shell::Fish,
        ] {
            let mut command = Cli::command();
            let mut buffer = Vec::new();
            clap_complete::generate(shell, &mut command, "nc2drift", &mut buffer);
            let script = String::from_utf8(buffer).unwrap();
            assert!(script.contains("nc2drift"));
            assert!(script.contains("transcode"));
        }

        let cli = Cli::parse_from(["nc2drift", "completions", "zsh", "-o", "_nc2drift"]);
        if let Commands::Completions { output, .. } = &cli.command {
            assert_eq!(output, &Some(PathBuf::from("_nc2drift")));
        } else {
            panic!("Expected Completions command");
        }
    }
}
