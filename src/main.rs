use clap::{Parser as ClapParser, Subcommand};
use sqlmold::{
    Config, Dialect,
    cli::{self, CliError, EvalOptions, EvalResult, RenderOptions},
};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "sqlmold")]
#[command(about = "sqlmold - Render dynamic SQL templates and evaluate condition expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a SQL template to SQL text and arguments
    Render {
        /// Template text with #{} and ${} markers
        template: String,

        /// Conditional WHERE clause, 'TEST => SQL' (repeatable)
        #[arg(short, long = "when")]
        clauses: Vec<String>,

        /// JSON parameters (reads from stdin if not provided)
        #[arg(short, long)]
        params: Option<String>,

        /// Placeholder dialect (overrides SQLMOLD_DIALECT)
        #[arg(short, long)]
        dialect: Option<Dialect>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Evaluate a condition expression
    Eval {
        /// The expression to evaluate
        expression: String,

        /// JSON parameters (reads from stdin if not provided)
        #[arg(short, long)]
        params: Option<String>,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// Show documentation, optionally for one topic
    Docs {
        /// Topic name (omit to list topics)
        topic: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            template,
            clauses,
            params,
            dialect,
            pretty,
        } => run_render(template, clauses, params, dialect, pretty),
        Commands::Eval {
            expression,
            params,
            syntax_only,
        } => run_eval(expression, params, syntax_only),
        Commands::Docs { topic: None } => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Docs { topic: Some(topic) } => cli::get_doc_topic(&topic).map(|content| {
            print!("{}", content);
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Parameters from the flag, else from piped stdin.
fn read_params(params: Option<String>) -> Result<Option<String>, CliError> {
    match params {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_render(
    template: String,
    clauses: Vec<String>,
    params: Option<String>,
    dialect: Option<Dialect>,
    pretty: bool,
) -> Result<(), CliError> {
    let mut config = Config::from_env()?;
    if let Some(dialect) = dialect {
        config = config.with_dialect(dialect);
    }

    let options = RenderOptions {
        template,
        clauses,
        params: read_params(params)?,
    };
    let output = cli::execute_render(&options, &config)?;

    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}

fn run_eval(expression: String, params: Option<String>, syntax_only: bool) -> Result<(), CliError> {
    let config = Config::from_env()?;
    let params = if syntax_only {
        None
    } else {
        read_params(params)?
    };

    let options = EvalOptions {
        expression,
        params,
        syntax_only,
    };

    match cli::execute_eval(&options, &config)? {
        EvalResult::SyntaxValid => println!("Syntax is valid"),
        EvalResult::Success(output) => println!("{}", serde_json::to_string(&output)?),
    }
    Ok(())
}
