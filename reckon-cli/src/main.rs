//! Reckon CLI - evaluate and check Reckon expressions from the command line.
//! Reckon CLI - 在命令行中求值和检查 Reckon 表达式。

mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use reckon_eval::{EvaluateOptions, NumericPreference};
use tracing_subscriber::{EnvFilter, fmt};

/// Main CLI structure.
/// 主 CLI 结构体。
#[derive(Parser)]
#[command(name = "reckon")]
#[command(author, version, about = "Reckon - an embeddable async expression language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output. / 启用详细输出。
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output. / 抑制输出。
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Available CLI commands.
/// 可用的 CLI 命令。
#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression. / 求值表达式。
    Eval {
        /// The expression to evaluate. / 要求值的表达式。
        expr: String,

        #[command(flatten)]
        flags: EvalFlags,
    },

    /// Check an expression for syntax errors. / 检查表达式的语法错误。
    Check {
        /// The expression to check. / 要检查的表达式。
        expr: String,
    },

    /// Start an interactive REPL. / 启动交互式 REPL。
    Repl {
        #[command(flatten)]
        flags: EvalFlags,
    },
}

/// Evaluation switches shared by `eval` and `repl`.
/// `eval` 与 `repl` 共用的求值选项。
#[derive(Args, Clone, Default)]
pub struct EvalFlags {
    /// Bind a parameter, `name=value`. Repeating a name builds a list.
    /// 绑定参数 `name=value`；重复同名参数会构成列表。
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Match names and compare text case-insensitively. / 忽略大小写。
    #[arg(long)]
    pub ignore_case: bool,

    /// Parse without the shared expression cache. / 不使用表达式缓存。
    #[arg(long)]
    pub no_cache: bool,

    /// Round midpoints away from zero. / 中点远离零舍入。
    #[arg(long)]
    pub round_away: bool,

    /// Mix float and decimal operands as floating point. / 混合运算使用浮点数。
    #[arg(long)]
    pub float_preference: bool,

    /// Evaluate once per element of the list parameters. / 按列表参数逐元素求值。
    #[arg(long)]
    pub iterate: bool,
}

impl EvalFlags {
    pub fn options(&self) -> EvaluateOptions {
        let mut options = EvaluateOptions::empty();
        options.set(EvaluateOptions::IGNORE_CASE, self.ignore_case);
        options.set(EvaluateOptions::NO_CACHE, self.no_cache);
        options.set(EvaluateOptions::ROUND_AWAY_FROM_ZERO, self.round_away);
        options.set(EvaluateOptions::ITERATE_PARAMETERS, self.iterate);
        options
    }

    pub fn preference(&self) -> NumericPreference {
        if self.float_preference {
            NumericPreference::FloatingPoint
        } else {
            NumericPreference::Decimal
        }
    }
}

/// Install the stderr log subscriber. `RECKON_LOG` wins over `RUST_LOG`;
/// the default level is `warn`.
/// 安装日志订阅器。
fn init_logging(verbose: bool) {
    let directives = std::env::var("RECKON_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| if verbose { "debug" } else { "warn" }.to_string());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main entry point.
/// 主入口点。
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Eval { expr, flags } => commands::eval::run(&expr, &flags, cli.verbose).await,
        Commands::Check { expr } => commands::check::run(&expr, cli.verbose),
        Commands::Repl { flags } => commands::repl::run(&flags).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            output::error(&e);
        }
        std::process::exit(1);
    }
}
