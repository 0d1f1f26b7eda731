mod output;

use clap::{Arg, ArgAction, ArgMatches, Command};
use flowgraph_core::{BuildOptions, FlowgraphErrorExt, Source, build_graph_with_options, verify};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use output::{FormatStyle, OutputFormat};

fn main() -> ExitCode {
    let cli = Command::new("flowgraph")
        .version("0.1.0")
        .about("Lower s-expression AST dumps to control-flow graphs");

    let cli = setup_cli(cli);
    let matches = cli.get_matches();
    dispatch_commands(&matches)
}

/// Sets up the CLI with subcommands and arguments.
fn setup_cli(cli: Command) -> Command {
    cli.subcommand(
        Command::new("build")
            .about("Build the control-flow graph of an AST dump")
            .arg(
                Arg::new("file")
                    .help("The s-expression file to read")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("format")
                    .help("Output format: text, json, summary or rows")
                    .short('f')
                    .long("format")
                    .value_parser(clap::value_parser!(String))
                    .default_value("text")
                    .value_name("FORMAT"),
            )
            .arg(
                Arg::new("config")
                    .help("JSON file with build options")
                    .short('c')
                    .long("config")
                    .value_parser(clap::value_parser!(PathBuf))
                    .value_name("FILE"),
            )
            .arg(
                Arg::new("max-depth")
                    .help("Override the AST nesting limit")
                    .long("max-depth")
                    .value_parser(clap::value_parser!(usize))
                    .value_name("N"),
            )
            .arg(
                Arg::new("verify")
                    .help("Check graph invariants after building")
                    .long("verify")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("output")
                    .help("Specify the output file")
                    .short('o')
                    .long("output")
                    .value_parser(clap::value_parser!(PathBuf))
                    .value_name("FILE"),
            ),
    )
}

/// Dispatches the command based on the parsed arguments.
fn dispatch_commands(matches: &ArgMatches) -> ExitCode {
    let style = FormatStyle::default();
    match matches.subcommand() {
        Some(("build", sub_m)) => match run_build(sub_m, &style) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{}", output::render_error(e.as_ref(), &style));
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("No valid subcommand was used. Use --help for more information.");
            ExitCode::FAILURE
        }
    }
}

fn run_build(sub_m: &ArgMatches, style: &FormatStyle) -> Result<ExitCode, Box<dyn FlowgraphErrorExt>> {
    let file = match sub_m.get_one::<String>("file") {
        Some(file) => PathBuf::from(file),
        None => return Ok(ExitCode::FAILURE),
    };
    let format_name = sub_m.get_one::<String>("format").map(String::as_str).unwrap_or("text");
    let format = match OutputFormat::from_str(format_name) {
        Some(format) => format,
        None => {
            eprintln!("{}", style.error.apply_to(format!("Unknown output format: {}", format_name)));
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut options = match sub_m.get_one::<PathBuf>("config") {
        Some(path) => BuildOptions::from_file(path).map_err(|e| Box::new(e) as Box<dyn FlowgraphErrorExt>)?,
        None => BuildOptions::default(),
    };
    if let Some(depth) = sub_m.get_one::<usize>("max-depth") {
        options.max_depth = *depth;
    }
    options.validate().map_err(|e| Box::new(e) as Box<dyn FlowgraphErrorExt>)?;

    let source = Source::from_path(file)?;
    let graph = build_graph_with_options(&source, options)?;

    let rendered = match output::render_graph(&graph, format) {
        Ok(rendered) => rendered,
        Err(message) => {
            eprintln!("{}", style.error.apply_to(message));
            return Ok(ExitCode::FAILURE);
        }
    };
    match sub_m.get_one::<PathBuf>("output") {
        Some(path) => {
            if let Err(e) = fs::write(path, &rendered) {
                eprintln!("{}", style.error.apply_to(format!("Failed to write {}: {}", path.display(), e)));
                return Ok(ExitCode::FAILURE);
            }
        }
        None => {
            if matches!(format, OutputFormat::Text | OutputFormat::Summary) {
                println!("{}", style.title.apply_to(&source.name));
            }
            println!("{}", rendered);
        }
    }

    if sub_m.get_flag("verify") {
        let violations = verify(&graph);
        eprintln!("{}", output::render_violations(&violations, style));
        if !violations.is_empty() {
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}
