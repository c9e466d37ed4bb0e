//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_strategy_adapter::{strategy_from_config, FileStrategyAdapter};
use crate::adapters::json_store_adapter::JsonStoreAdapter;
use crate::domain::backtest::{run_batch, BacktestReport, BatchOutcome};
use crate::domain::error::QuantbackError;
use crate::domain::optimizer::{
    optimize, CancelToken, Objective, OptimizationConfig, ParameterRange,
};
use crate::domain::parameters::StrategyDefinition;
use crate::domain::price_bar::PriceBar;
use crate::domain::simulator::ExecutionConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::result_port::ResultPort;
use crate::ports::strategy_port::StrategyPort;

#[derive(Parser, Debug)]
#[command(name = "quantback", about = "Quantitative strategy backtester and optimizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over the configured instruments
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated instrument codes, overriding the config file
        #[arg(long)]
        codes: Option<String>,
        /// Strategy id to load from the strategy directory instead of the
        /// config file's own strategy sections
        #[arg(long)]
        strategy: Option<String>,
        /// Directory to persist JSON reports into
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Grid-search strategy parameters
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        codes: Option<String>,
        #[arg(long)]
        strategy: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a strategy configuration file
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// List instrument codes available in the data directory
    ListCodes {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            codes,
            strategy,
            output,
        } => run_backtest_command(&config, codes.as_deref(), strategy.as_deref(), output.as_ref()),
        Command::Optimize {
            config,
            codes,
            strategy,
            output,
        } => run_optimize_command(&config, codes.as_deref(), strategy.as_deref(), output.as_ref()),
        Command::Validate { strategy } => run_validate(&strategy),
        Command::ListCodes { config } => run_list_codes(&config),
    }
}

fn fail(err: &QuantbackError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, QuantbackError> {
    FileConfigAdapter::from_file(path).map_err(|e| QuantbackError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn require_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, QuantbackError> {
    let raw = config
        .get_string("backtest", key)
        .ok_or_else(|| QuantbackError::ConfigMissing {
            section: "backtest".into(),
            key: key.into(),
        })?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| QuantbackError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason: format!("expected YYYY-MM-DD, got '{}': {}", raw.trim(), e),
    })
}

pub fn build_window(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), QuantbackError> {
    let start = require_date(config, "start_date")?;
    let end = require_date(config, "end_date")?;
    if start > end {
        return Err(QuantbackError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: format!("start {start} is after end {end}"),
        });
    }
    Ok((start, end))
}

pub fn build_execution(config: &dyn ConfigPort) -> Result<ExecutionConfig, QuantbackError> {
    let defaults = ExecutionConfig::default();
    let exec = ExecutionConfig {
        commission_rate: config.get_double("execution", "commission_rate", defaults.commission_rate),
        min_commission: config.get_double("execution", "min_commission", defaults.min_commission),
        lot_size: config.get_int("execution", "lot_size", defaults.lot_size),
    };
    if exec.commission_rate < 0.0 || exec.min_commission < 0.0 {
        return Err(QuantbackError::ConfigInvalid {
            section: "execution".into(),
            key: "commission_rate".into(),
            reason: "commission must not be negative".into(),
        });
    }
    if exec.lot_size <= 0 {
        return Err(QuantbackError::ConfigInvalid {
            section: "execution".into(),
            key: "lot_size".into(),
            reason: "lot size must be positive".into(),
        });
    }
    Ok(exec)
}

fn parse_range(
    config: &dyn ConfigPort,
    key: &str,
    default: ParameterRange,
) -> Result<ParameterRange, QuantbackError> {
    let Some(raw) = config.get_string("optimize", key) else {
        return Ok(default);
    };
    let parts: Vec<u32> = raw
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| QuantbackError::ConfigInvalid {
            section: "optimize".into(),
            key: key.into(),
            reason: format!("expected 'min,max,step', got '{raw}': {e}"),
        })?;
    if parts.len() != 3 {
        return Err(QuantbackError::ConfigInvalid {
            section: "optimize".into(),
            key: key.into(),
            reason: format!("expected 'min,max,step', got '{raw}'"),
        });
    }
    Ok(ParameterRange::new(parts[0], parts[1], parts[2]))
}

pub fn build_optimization(config: &dyn ConfigPort) -> Result<OptimizationConfig, QuantbackError> {
    let defaults = OptimizationConfig::default();

    let objective = match config.get_string("optimize", "objective") {
        Some(raw) => raw
            .parse::<Objective>()
            .map_err(|reason| QuantbackError::ConfigInvalid {
                section: "optimize".into(),
                key: "objective".into(),
                reason,
            })?,
        None => defaults.objective,
    };

    let max_concurrency = config.get_int(
        "optimize",
        "max_concurrency",
        defaults.max_concurrency as i64,
    );
    let max_concurrency =
        usize::try_from(max_concurrency).map_err(|_| QuantbackError::ConfigInvalid {
            section: "optimize".into(),
            key: "max_concurrency".into(),
            reason: format!("{max_concurrency} is not a valid worker count"),
        })?;

    Ok(OptimizationConfig {
        objective,
        short_period: parse_range(config, "short_period", defaults.short_period)?,
        long_period: parse_range(config, "long_period", defaults.long_period)?,
        rsi_overbought: parse_range(config, "rsi_overbought", defaults.rsi_overbought)?,
        rsi_oversold: parse_range(config, "rsi_oversold", defaults.rsi_oversold)?,
        max_concurrency,
    })
}

pub fn resolve_codes(code_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    let raw = match code_override {
        Some(raw) => raw.to_string(),
        None => config
            .get_string("backtest", "codes")
            .unwrap_or_default(),
    };
    raw.split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn fetch_series(
    port: &dyn PriceDataPort,
    codes: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(String, Vec<PriceBar>)>, QuantbackError> {
    let mut series = Vec::with_capacity(codes.len());
    for code in codes {
        let bars = port.fetch_history(code, start, end)?;
        series.push((code.clone(), bars));
    }
    Ok(series)
}

fn data_dir(config: &dyn ConfigPort) -> Result<PathBuf, QuantbackError> {
    config
        .get_string("data", "csv_dir")
        .map(PathBuf::from)
        .ok_or_else(|| QuantbackError::ConfigMissing {
            section: "data".into(),
            key: "csv_dir".into(),
        })
}

/// Either the strategy embedded in the config file, or a named definition
/// resolved through the strategy port against `[data] strategy_dir`.
fn load_strategy_definition(
    config: &dyn ConfigPort,
    strategy_id: Option<&str>,
) -> Result<StrategyDefinition, QuantbackError> {
    match strategy_id {
        Some(id) => {
            let dir = config
                .get_string("data", "strategy_dir")
                .map(PathBuf::from)
                .ok_or_else(|| QuantbackError::ConfigMissing {
                    section: "data".into(),
                    key: "strategy_dir".into(),
                })?;
            FileStrategyAdapter::new(dir).load_strategy(id)
        }
        None => strategy_from_config("config", config),
    }
}

fn print_report(report: &BacktestReport) {
    println!(
        "{}: return {:+.2}% (annualized {:+.2}%), sharpe {:.2}, max drawdown {:.2}%, \
         trades {} ({} winning, win rate {:.1}%), final capital {:.2}",
        report.code,
        report.total_return * 100.0,
        report.annualized_return * 100.0,
        report.sharpe_ratio,
        report.max_drawdown * 100.0,
        report.total_trades,
        report.winning_trades,
        report.win_rate * 100.0,
        report.final_capital,
    );
}

fn print_batch_summary(outcome: &BatchOutcome) {
    for skipped in &outcome.skipped {
        eprintln!("skipped {}: {}", skipped.code, skipped.reason);
    }
    if outcome.reports.len() < 2 {
        return;
    }

    let profitable = outcome
        .reports
        .iter()
        .filter(|r| r.total_return > 0.0)
        .count();
    let mean_return = outcome
        .reports
        .iter()
        .map(|r| r.total_return)
        .sum::<f64>()
        / outcome.reports.len() as f64;
    let best = outcome
        .reports
        .iter()
        .max_by(|a, b| a.total_return.total_cmp(&b.total_return))
        .expect("non-empty");
    let worst = outcome
        .reports
        .iter()
        .min_by(|a, b| a.total_return.total_cmp(&b.total_return))
        .expect("non-empty");

    println!(
        "summary: {} instruments, {} profitable, mean return {:+.2}%, best {}, worst {}",
        outcome.reports.len(),
        profitable,
        mean_return * 100.0,
        best.code,
        worst.code,
    );
}

fn run_backtest_command(
    config_path: &PathBuf,
    code_override: Option<&str>,
    strategy_id: Option<&str>,
    output: Option<&PathBuf>,
) -> ExitCode {
    let result = (|| -> Result<(), QuantbackError> {
        let config = load_config(config_path)?;
        let strategy = load_strategy_definition(&config, strategy_id)?;
        let exec = build_execution(&config)?;
        let (start, end) = build_window(&config)?;

        let codes = resolve_codes(code_override, &config);
        if codes.is_empty() {
            return Err(QuantbackError::ConfigMissing {
                section: "backtest".into(),
                key: "codes".into(),
            });
        }

        let port = CsvPriceAdapter::new(data_dir(&config)?);
        let series = fetch_series(&port, &codes, start, end)?;
        let outcome = run_batch(&series, &strategy, &exec);

        if outcome.reports.is_empty() {
            return Err(QuantbackError::NoData {
                code: codes.join(","),
            });
        }

        for report in &outcome.reports {
            print_report(report);
        }
        print_batch_summary(&outcome);

        if let Some(dir) = output {
            let store = JsonStoreAdapter::new(dir.clone());
            for report in &outcome.reports {
                store.persist_backtest(report)?;
            }
        }
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

fn run_optimize_command(
    config_path: &PathBuf,
    code_override: Option<&str>,
    strategy_id: Option<&str>,
    output: Option<&PathBuf>,
) -> ExitCode {
    let result = (|| -> Result<(), QuantbackError> {
        let config = load_config(config_path)?;
        let strategy = load_strategy_definition(&config, strategy_id)?;
        let exec = build_execution(&config)?;
        let (start, end) = build_window(&config)?;
        let optimization = build_optimization(&config)?;

        let codes = resolve_codes(code_override, &config);
        if codes.is_empty() {
            return Err(QuantbackError::ConfigMissing {
                section: "backtest".into(),
                key: "codes".into(),
            });
        }

        let port = CsvPriceAdapter::new(data_dir(&config)?);
        let series = fetch_series(&port, &codes, start, end)?;

        let cancel = CancelToken::new();
        let outcome = optimize(&strategy, &series, &optimization, &exec, &cancel)?;

        println!(
            "evaluated {} of {} candidates (objective: {:?})",
            outcome.evaluated_candidates, outcome.total_candidates, outcome.objective,
        );
        match &outcome.best {
            Some(best) => {
                println!(
                    "best: short {} / long {}, rsi {}..{}, objective value {:.6}, {} trades",
                    best.parameters.short_period,
                    best.parameters.long_period,
                    best.parameters.rsi_oversold,
                    best.parameters.rsi_overbought,
                    best.objective_value,
                    best.total_trades,
                );
            }
            None => {
                eprintln!("no candidate could be evaluated");
            }
        }

        if let Some(dir) = output {
            JsonStoreAdapter::new(dir.clone()).persist_optimization(&outcome)?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

fn run_validate(strategy_path: &PathBuf) -> ExitCode {
    let result = (|| -> Result<(), QuantbackError> {
        let config = load_config(strategy_path)?;
        let name = strategy_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "strategy".to_string());
        let strategy = strategy_from_config(&name, &config)?;
        println!(
            "ok: {} ({}) short {} / long {}, initial capital {:.2}",
            strategy.name,
            strategy.kind,
            strategy.parameters.short_period,
            strategy.parameters.long_period,
            strategy.initial_capital,
        );
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

fn run_list_codes(config_path: &PathBuf) -> ExitCode {
    let result = (|| -> Result<(), QuantbackError> {
        let config = load_config(config_path)?;
        let port = CsvPriceAdapter::new(data_dir(&config)?);
        for code in port.list_codes()? {
            println!("{code}");
        }
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}
