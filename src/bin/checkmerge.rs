use std::fs;
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};

use checkmerge::analysis::registry::Registry;
use checkmerge::diff::{self, MergeDiffResult};
use checkmerge::parser::ParserRegistry;
use checkmerge::report::{Report, ReportSettings};
use checkmerge::tree_matcher::TreeMatcher;

/// Analyzes source-code merges for semantic conflicts a textual merge would miss.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct CliArgs {
    /// Verbosity
    #[clap(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Show the structural diff between two files
    Diff {
        /// Path to the base file
        base: PathBuf,
        /// Path to the file to compare against
        other: PathBuf,
    },
    /// Analyze a three-way merge for semantic conflicts
    Analyze {
        /// The parser to use. Run `list-parsers` to see the available parsers.
        #[clap(short, long, default_value = "sexpr")]
        parser: String,
        /// The analysis to run. Repeat this option to run multiple. Defaults to all
        /// registered analyses. Run `list-analysis` to see what's available.
        #[clap(short, long = "analysis")]
        analyses: Vec<String>,
        /// Path to the base revision
        base: PathBuf,
        /// Path to the other revision
        other: PathBuf,
        /// Path to the common ancestor. Defaults to `base` (a degenerate two-way
        /// comparison) when omitted.
        ancestor: Option<PathBuf>,
    },
    /// Lists the available parsers and analyses
    ListPlugins {
        /// Included for parity with the plugin model; CheckMerge has no disabled
        /// built-in plugins today, so this always prints nothing.
        #[clap(long)]
        disabled: bool,
    },
    /// Lists the available parsers
    ListParsers,
    /// Lists the available analysis algorithms
    ListAnalysis,
}

fn main() {
    let args = CliArgs::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(if args.verbose { 3 } else { 2 })
        .init()
        .unwrap();

    match real_main(args) {
        Ok(code) => exit(code),
        Err(message) => {
            eprintln!("checkmerge: {message}");
            exit(1)
        }
    }
}

fn real_main(args: CliArgs) -> Result<i32, String> {
    match args.command {
        CliCommand::Diff { base, other } => cmd_diff(&base, &other),
        CliCommand::Analyze {
            parser,
            analyses,
            base,
            other,
            ancestor,
        } => cmd_analyze(&parser, &analyses, &base, &other, ancestor.as_deref()),
        CliCommand::ListPlugins { disabled } => {
            cmd_list_plugins(disabled);
            Ok(0)
        }
        CliCommand::ListParsers => {
            cmd_list_parsers();
            Ok(0)
        }
        CliCommand::ListAnalysis => {
            cmd_list_analysis();
            Ok(0)
        }
    }
}

fn read_tree(parser_key: &str, path: &std::path::Path) -> Result<checkmerge::ir::Tree, String> {
    let registry = ParserRegistry::with_defaults();
    let parser = registry
        .get(parser_key)
        .ok_or_else(|| format!("no parser named '{parser_key}' is registered"))?;
    let contents = fs::read_to_string(path).map_err(|e| format!("reading '{}': {e}", path.display()))?;
    parser.parse(&contents).map_err(|e| e.to_string())
}

fn cmd_diff(base: &std::path::Path, other: &std::path::Path) -> Result<i32, String> {
    let base_tree = read_tree("sexpr", base)?;
    let other_tree = read_tree("sexpr", other)?;

    let result = diff::diff(&base_tree, &other_tree, &TreeMatcher::default());
    for change in result.changes() {
        println!("{change:?}");
    }
    Ok(0)
}

fn cmd_analyze(
    parser_key: &str,
    analyses: &[String],
    base: &std::path::Path,
    other: &std::path::Path,
    ancestor: Option<&std::path::Path>,
) -> Result<i32, String> {
    let base_tree = read_tree(parser_key, base)?;
    let other_tree = read_tree(parser_key, other)?;
    let ancestor_tree = match ancestor {
        Some(path) => read_tree(parser_key, path)?,
        None => read_tree(parser_key, base)?,
    };

    let matcher = TreeMatcher::default();
    let base_vs_ancestor = diff::diff(&base_tree, &ancestor_tree, &matcher);
    let other_vs_ancestor = diff::diff(&other_tree, &ancestor_tree, &matcher);
    let merge = MergeDiffResult::new(base_vs_ancestor, other_vs_ancestor, &matcher);

    let registry = Registry::with_defaults();
    for key in analyses {
        if registry.get(key).is_none() {
            return Err(format!("no analysis named '{key}' is registered"));
        }
    }

    let results = registry.run_all(&merge, analyses);
    let found_conflicts = !results.is_empty();
    let report = Report::new(results);
    let settings = ReportSettings::default();

    for metrics in report.metrics() {
        println!(
            "{}: {} (max {:.2}, avg {:.2})",
            metrics.tag.name(),
            metrics.count.value,
            metrics.max_severity.value,
            metrics.avg_severity.value,
        );
    }
    for conflict in report.conflicts() {
        println!(
            "[{}] severity {:.2}: base={:?} other={:?}",
            conflict.tag.name(),
            conflict.severity,
            conflict.base_locations(&base_tree, settings.loose_locations),
            conflict.other_locations(&other_tree, settings.loose_locations),
        );
    }

    Ok(if found_conflicts { 1 } else { 0 })
}

fn cmd_list_plugins(disabled: bool) {
    let analyses = Registry::with_defaults();
    if disabled {
        let disabled: Vec<_> = analyses.disabled().collect();
        if disabled.is_empty() {
            println!("No disabled plugins.");
        } else {
            for (key, reason) in disabled {
                println!("  {key}: {reason}");
            }
        }
        return;
    }
    let parsers = ParserRegistry::with_defaults();
    println!(
        "Found plugins: {}",
        parsers.iter().count() + analyses.iter().count()
    );
    for parser in parsers.iter() {
        println!("  {} (parser): {}", parser.key(), parser.description());
    }
    for analysis in analyses.iter() {
        println!("  {} (analysis): {}", analysis.key(), analysis.description());
    }
}

fn cmd_list_parsers() {
    let registry = ParserRegistry::with_defaults();
    println!("Available parsers: {}", registry.iter().count());
    for parser in registry.iter() {
        println!("  {}: {}", parser.key(), parser.description());
    }
}

fn cmd_list_analysis() {
    let registry = Registry::with_defaults();
    println!("Available analysis algorithms: {}", registry.iter().count());
    for analysis in registry.iter() {
        println!("  {}: {}", analysis.key(), analysis.description());
    }
}
