//! phasegate CLI: decision-gate validation for phased initiatives.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use phasegate::config::GateConfig;
use phasegate::fact::FactStore;
use phasegate::phase::Phase;
use phasegate::report::validation_report;
use phasegate::resolve::{Evaluation, FailedTerm, GateEngine};
use phasegate::trail::{DecisionRecord, DecisionSink, Impact, JsonlSink, Reversibility};

#[derive(Parser)]
#[command(name = "phasegate", version, about = "Decision-gate validation engine")]
struct Cli {
    /// Engine configuration (TOML). Builtin rules and thresholds when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with the default thresholds.
    Init {
        /// Target path.
        #[arg(default_value = "phasegate.toml")]
        path: PathBuf,
    },

    /// Evaluate a goal against a JSON fact file.
    Evaluate {
        /// JSON fact document: {"initiative": {"relation": value, ...}}.
        #[arg(long)]
        facts: PathBuf,

        /// Goal name, e.g. canProceedToP3.
        #[arg(long)]
        goal: String,

        /// Initiative key. Optional when the fact file holds exactly one.
        #[arg(long)]
        initiative: Option<String>,

        /// Print the evaluation as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Decide the gate into a phase. Exits with status 1 on HALT.
    Gate {
        #[arg(long)]
        facts: PathBuf,

        /// Phase to enter (p1..p5).
        #[arg(long)]
        to: Phase,

        #[arg(long)]
        initiative: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Run a numeric validator on raw figures.
    Numeric {
        /// roi, ltv_cac, margin or payback_months.
        metric: String,

        /// Validator inputs in order (e.g. revenue costs).
        #[arg(allow_negative_numbers = true, num_args = 2)]
        inputs: Vec<f64>,
    },

    /// Classify a value on a categorical axis.
    Classify {
        axis: String,
        value: String,
    },

    /// Apply the budget rule for a phase.
    Budget {
        #[arg(long)]
        phase: Phase,

        #[arg(long)]
        spent: f64,

        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        profit: f64,
    },

    /// List goal definitions and their dependencies.
    Goals,

    /// Render a markdown validation report.
    Report {
        #[arg(long)]
        facts: PathBuf,

        #[arg(long)]
        initiative: Option<String>,

        /// Include the gate into this phase.
        #[arg(long)]
        phase: Option<Phase>,
    },

    /// Append a decision to a JSONL decision trail.
    Decide {
        /// Trail file (created if missing).
        #[arg(long)]
        trail: PathBuf,

        #[arg(long)]
        initiative: String,

        #[arg(long)]
        topic: String,

        #[arg(long)]
        chosen: String,

        /// Comma-separated alternatives that were considered.
        #[arg(long, value_delimiter = ',')]
        alternatives: Vec<String>,

        #[arg(long, default_value = "")]
        rationale: String,

        /// Conditions under which the choice stays viable.
        #[arg(long, default_value = "")]
        conditions: String,

        #[arg(long, default_value = "0.7")]
        confidence: f64,

        #[arg(long, default_value = "high")]
        impact: Impact,

        #[arg(long, default_value = "medium")]
        reversibility: Reversibility,

        /// Attach the outcome of this gate, evaluated against --facts.
        #[arg(long, requires = "facts")]
        gate: Option<Phase>,

        #[arg(long)]
        facts: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => {
            GateConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }

        Commands::Evaluate {
            facts,
            goal,
            initiative,
            json,
        } => {
            let engine = load_engine(cli.config.as_deref())?;
            let store = load_facts(&engine, &facts)?;
            let initiative = pick_initiative(&store, initiative)?;
            let eval = engine.evaluate_goal(&store, &goal, &initiative)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&eval).into_diagnostic()?);
            } else {
                print_evaluation(&eval);
            }
        }

        Commands::Gate {
            facts,
            to,
            initiative,
            json,
        } => {
            let engine = load_engine(cli.config.as_deref())?;
            let store = load_facts(&engine, &facts)?;
            let initiative = pick_initiative(&store, initiative)?;
            let decision = engine.evaluate_gate(&store, to, &initiative)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&decision).into_diagnostic()?
                );
            } else {
                println!("{}: {}", decision.title(), decision.verdict());
                if let Some(failure) = &decision.evaluation.failing_term {
                    print_trace(failure, 1);
                }
            }
            if !decision.proceed() {
                std::process::exit(1);
            }
        }

        Commands::Numeric { metric, inputs } => {
            let engine = load_engine(cli.config.as_deref())?;
            let outcome = engine.validate_numeric(&metric, &inputs)?;
            println!(
                "{}: {:.4} (threshold {}) {}",
                outcome.metric,
                outcome.computed,
                outcome.threshold,
                if outcome.passed { "PASS" } else { "FAIL" }
            );
        }

        Commands::Classify { axis, value } => {
            let engine = load_engine(cli.config.as_deref())?;
            let c = engine.explain(&axis, &value)?;
            let source = if c.matched { "listed" } else { "axis default" };
            println!("{} on {}: {} ({source})", c.value, c.axis, c.verdict);
            if let Some(advice) = &c.advice {
                println!("  {advice}");
            }
        }

        Commands::Budget {
            phase,
            spent,
            profit,
        } => {
            let engine = load_engine(cli.config.as_deref())?;
            let outcome = engine.check_budget(phase, spent, profit)?;
            println!(
                "{phase} budget ({:?}): {} against cap {} {}",
                outcome.stage,
                outcome.computed,
                outcome.cap,
                if outcome.passed { "PASS" } else { "FAIL" }
            );
        }

        Commands::Goals => {
            let engine = load_engine(cli.config.as_deref())?;
            let rules = engine.rules();
            println!("Goals ({}):", rules.goals().len());
            for def in rules.goals() {
                let deps = rules.dependencies(&def.name)?;
                print!("  {}", def.name);
                if !def.description.is_empty() {
                    print!(" - {}", def.description);
                }
                println!();
                if !deps.is_empty() {
                    println!("      depends on: {}", deps.join(", "));
                }
            }
        }

        Commands::Report {
            facts,
            initiative,
            phase,
        } => {
            let engine = load_engine(cli.config.as_deref())?;
            let store = load_facts(&engine, &facts)?;
            let initiative = pick_initiative(&store, initiative)?;
            println!("{}", validation_report(&engine, &store, &initiative, phase)?);
        }

        Commands::Decide {
            trail,
            initiative,
            topic,
            chosen,
            alternatives,
            rationale,
            conditions,
            confidence,
            impact,
            reversibility,
            gate,
            facts,
        } => {
            let mut record = DecisionRecord::new(&initiative, topic, chosen, confidence)
                .with_alternatives(alternatives)
                .with_rationale(rationale)
                .with_conditions(conditions)
                .with_impact(impact)
                .with_reversibility(reversibility);

            if let (Some(phase), Some(facts)) = (gate, facts) {
                let engine = load_engine(cli.config.as_deref())?;
                let store = load_facts(&engine, &facts)?;
                let decision = engine.evaluate_gate(&store, phase, &initiative)?;
                record = record.with_gate(&decision.evaluation);
            }

            if let Some(parent) = trail.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).into_diagnostic()?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&trail)
                .into_diagnostic()?;
            JsonlSink::new(file).record(&record)?;
            println!("Decision logged to {}", trail.display());
        }
    }

    Ok(())
}

fn load_engine(config: Option<&Path>) -> Result<GateEngine> {
    match config {
        Some(path) => Ok(GateEngine::new(&GateConfig::load(path)?)?),
        None => Ok(GateEngine::builtin()),
    }
}

fn load_facts(engine: &GateEngine, path: &Path) -> Result<FactStore> {
    let content = std::fs::read_to_string(path).into_diagnostic()?;
    let mut store = engine.fact_store();
    store.load_json(&content)?;
    Ok(store)
}

fn pick_initiative(store: &FactStore, explicit: Option<String>) -> Result<String> {
    if let Some(initiative) = explicit {
        return Ok(initiative);
    }
    match store.initiatives() {
        [only] => Ok(only.clone()),
        [] => miette::bail!("the fact file holds no initiatives"),
        many => miette::bail!(
            "the fact file holds {} initiatives ({}); pick one with --initiative",
            many.len(),
            many.join(", ")
        ),
    }
}

fn print_evaluation(eval: &Evaluation) {
    let status = if eval.satisfied {
        "satisfied"
    } else {
        "not satisfied"
    };
    println!("{}({}): {status}", eval.goal, eval.initiative);
    if let Some(failure) = &eval.failing_term {
        print_trace(failure, 1);
    }
}

fn print_trace(failure: &FailedTerm, depth: usize) {
    println!(
        "{}{} [{}]: {}",
        "  ".repeat(depth),
        failure.goal,
        failure.term,
        failure.reason
    );
    if let Some(cause) = &failure.cause {
        print_trace(cause, depth + 1);
    }
}
