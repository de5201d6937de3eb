use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use counton::calculator::{
    Evaluator, FreeTextCalculator, Keypad, KeypadEvent, Outcome, SUGGESTIONS, ScientificFn,
    Variant,
};
use counton::config::Config;
use counton::formula::{Formula, FormulaLibrary};
use counton::marks::{self, Assessment};
use counton::store::{FileStore, KeyValueStore, MemoryStore};

type SharedStore = Arc<dyn KeyValueStore>;

#[derive(Parser)]
#[command(name = "counton", version, about = "Calculator, grapher and mark aggregator")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file for history, settings and formulas
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Keep everything in memory for this run
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate free text: a calculation, a function of x, or a question
    Eval { text: Vec<String> },
    /// Interactive free-text calculator
    Repl,
    /// Feed keys to the keypad calculator, e.g. `3 + 4 + 5 =`
    Keypad {
        #[arg(long)]
        scientific: bool,
        #[arg(allow_hyphen_values = true)]
        keys: Vec<String>,
    },
    /// Print the sampled points of a function of x
    Plot { expression: Vec<String> },
    /// Show or clear the calculation history
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Show or set result precision (0-14 significant digits)
    Precision { value: Option<u8> },
    /// List the example inputs
    Suggestions,
    /// Manage saved formulas
    Formula {
        #[command(subcommand)]
        action: FormulaCommand,
    },
    /// Weighted mark from `name:obtained/total@weightage` entries
    Marks { assessments: Vec<String> },
}

#[derive(Subcommand)]
enum FormulaCommand {
    Add {
        name: String,
        expression: String,
        /// Comma-separated variable names
        variables: String,
    },
    List,
    Remove { index: usize },
    /// Evaluate with `name=value` pairs
    Eval { index: usize, values: Vec<String> },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    counton::logging::init(&config.logging);

    let store = open_store(&cli, &config)?;
    store.subscribe(Box::new(|key: &str, value: &str| {
        debug!(key, bytes = value.len(), "store updated");
    }));

    match cli.command.unwrap_or(Command::Repl) {
        Command::Eval { text } => {
            let mut evaluator = Evaluator::with_config(store, &config.evaluator);
            print_outcome(&evaluator.submit(&text.join(" ")));
        }
        Command::Repl => {
            let evaluator = Evaluator::with_config(store, &config.evaluator);
            repl(FreeTextCalculator::new(evaluator))?;
        }
        Command::Keypad { scientific, keys } => {
            let variant = if scientific {
                Variant::Scientific
            } else {
                Variant::Basic
            };
            let mut keypad = Keypad::new(variant);
            for key in &keys {
                keypad.press_all(keypad_events(key)?);
            }
            println!("{}", keypad.display());
        }
        Command::Plot { expression } => {
            let mut evaluator = Evaluator::with_config(store, &config.evaluator);
            match evaluator.submit(&expression.join(" ")) {
                Outcome::Graph { plot: Ok(plot), .. } => {
                    for point in &plot.points {
                        println!("{}\t{}", point.x, point.y);
                    }
                }
                other => bail!("not plottable: {}", other.display()),
            }
        }
        Command::History { clear } => {
            let mut evaluator = Evaluator::with_config(store, &config.evaluator);
            if clear {
                evaluator.clear_history();
                println!("Calculation history has been cleared.");
            } else {
                for item in evaluator.history().items() {
                    println!("{}\t{}", item.input, item.result);
                }
            }
        }
        Command::Precision { value } => {
            let mut evaluator = Evaluator::with_config(store, &config.evaluator);
            if let Some(value) = value {
                evaluator.set_precision(value);
            }
            println!("{}", evaluator.settings().precision);
        }
        Command::Suggestions => {
            for suggestion in SUGGESTIONS {
                println!("{suggestion}");
            }
        }
        Command::Formula { action } => formula(FormulaLibrary::load(store), action)?,
        Command::Marks { assessments } => {
            let assessments = if assessments.is_empty() {
                Assessment::defaults()
            } else {
                assessments
                    .iter()
                    .map(|raw| parse_assessment(raw))
                    .collect::<Result<Vec<_>>>()?
            };
            let summary = marks::aggregate(&assessments);
            for issue in &summary.issues {
                eprintln!("warning: {issue}");
            }
            if summary.is_valid() {
                println!("Final internal mark: {summary}");
            } else {
                println!("Unverified mark: {summary}");
            }
        }
    }

    Ok(())
}

fn open_store(cli: &Cli, config: &Config) -> Result<SharedStore> {
    if cli.ephemeral {
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = cli
        .store
        .clone()
        .or_else(|| config.storage.path.clone())
        .or_else(FileStore::default_path);

    match path {
        Some(path) => {
            let store = FileStore::open(&path)
                .with_context(|| format!("Failed to open store {}", path.display()))?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryStore::new())),
    }
}

fn repl(mut calc: FreeTextCalculator<SharedStore>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            ":quit" | ":q" => break,
            ":history" => {
                for item in calc.evaluator().history().items() {
                    println!("  {}  =  {}", item.input, item.result);
                }
            }
            ":clear" => {
                calc.evaluator_mut().clear_history();
                println!("Calculation history has been cleared.");
            }
            other => {
                if let Some(value) = other.strip_prefix(":precision") {
                    match value.trim().parse::<u8>() {
                        Ok(value) => calc.evaluator_mut().set_precision(value),
                        Err(_) => eprintln!("precision must be 0-14"),
                    }
                    continue;
                }
                calc.input_mut().set_text(other);
                let outcome = calc.submit();
                print_outcome(outcome);
                if calc.evaluator().celebration().is_some() {
                    println!("  🎉");
                }
            }
        }
    }

    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Graph { plot: Ok(plot), .. } => {
            let (lo, hi) = plot
                .points
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p.y), hi.max(p.y))
                });
            println!(
                "[Graph] {} points, y in [{lo}, {hi}]",
                plot.points.len()
            );
        }
        other => println!("{}", other.display()),
    }
}

/// Turn one command-line token into keypad events.
fn keypad_events(token: &str) -> Result<Vec<KeypadEvent>> {
    let scientific = match token {
        "sin" => Some(ScientificFn::Sin),
        "cos" => Some(ScientificFn::Cos),
        "tan" => Some(ScientificFn::Tan),
        "log" => Some(ScientificFn::Log),
        "ln" => Some(ScientificFn::Ln),
        "sqrt" | "√" => Some(ScientificFn::Sqrt),
        "sq" | "x2" | "x²" => Some(ScientificFn::Square),
        "pi" | "π" => Some(ScientificFn::Pi),
        _ => None,
    };
    if let Some(f) = scientific {
        return Ok(vec![KeypadEvent::Scientific(f)]);
    }

    match token {
        "C" | "AC" | "clear" => return Ok(vec![KeypadEvent::Clear]),
        "back" => return Ok(vec![KeypadEvent::Backspace]),
        _ => {}
    }

    if let Some(event) = KeypadEvent::from_key(token) {
        return Ok(vec![event]);
    }

    token
        .chars()
        .map(|c| {
            KeypadEvent::from_key(c.encode_utf8(&mut [0; 4]))
                .with_context(|| format!("unknown key '{c}' in '{token}'"))
        })
        .collect()
}

fn parse_assessment(raw: &str) -> Result<Assessment> {
    let (rest, weightage) = raw
        .rsplit_once('@')
        .with_context(|| format!("expected name:obtained/total@weightage, got '{raw}'"))?;
    let (name, score) = rest
        .rsplit_once(':')
        .with_context(|| format!("missing ':' in '{raw}'"))?;
    let (obtained, total) = score
        .split_once('/')
        .with_context(|| format!("missing '/' in '{raw}'"))?;

    let number = |field: &str| -> Result<f64> {
        field
            .trim()
            .parse()
            .with_context(|| format!("'{field}' is not a number"))
    };

    Ok(Assessment::new(
        name.trim(),
        number(obtained)?,
        number(total)?,
        number(weightage)?,
    ))
}

fn formula(mut library: FormulaLibrary<SharedStore>, action: FormulaCommand) -> Result<()> {
    match action {
        FormulaCommand::Add {
            name,
            expression,
            variables,
        } => {
            library.add(Formula::define(&name, &expression, &variables)?)?;
            println!("Formula saved successfully!");
        }
        FormulaCommand::List => {
            for (index, formula) in library.formulas().iter().enumerate() {
                println!(
                    "{index}: {} = {}  [{}]",
                    formula.name,
                    formula.expression,
                    formula.variables.join(", ")
                );
            }
        }
        FormulaCommand::Remove { index } => {
            let removed = library.remove(index)?;
            println!("Removed {}", removed.name);
        }
        FormulaCommand::Eval { index, values } => {
            let inputs = values
                .iter()
                .map(|pair| {
                    pair.split_once('=')
                        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                        .with_context(|| format!("expected name=value, got '{pair}'"))
                })
                .collect::<Result<HashMap<_, _>>>()?;
            println!("{}", library.evaluate(index, &inputs)?);
        }
    }
    Ok(())
}
