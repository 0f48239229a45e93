use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use tlnorm::assembler::RunReport;
use tlnorm::config::{Args, RunConfig};
use tlnorm::description::DescriptionBuilder;
use tlnorm::logging::{self, LogConfig, LogLevel};
use tlnorm::output::{self, FlatSink, PostgresSink, Sink};
use tlnorm::pipeline;
use tlnorm::schemas::Registry;

const EXIT_FAILURE: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_NO_MATCH: u8 = 3;
const EXIT_NO_EVENTS: u8 = 4;

fn main() -> ExitCode {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let log_config = LogConfig::builder()
        .level(config.log_level)
        .format(config.log_format)
        .log_dir(&config.output)
        .file_level(LogLevel::Debug)
        .build();
    // flushes the log file on drop
    let _guard = match logging::init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let start_time = Instant::now();
    let code = match run(&config, start_time) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Fatal error");
            ExitCode::from(EXIT_FAILURE)
        }
    };
    info!(
        elapsed = %format!("{:.3}s", start_time.elapsed().as_secs_f64()),
        "Total runtime"
    );
    code
}

fn run(config: &RunConfig, start_time: Instant) -> Result<ExitCode> {
    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        "Starting timeline normalization"
    );

    let registry = Registry::builtin()?;
    let descriptions = DescriptionBuilder::new(config.format.delimiter());
    let pipeline = pipeline::builtin(&registry, descriptions)?.with_threads(config.threads);

    let (timeline, report) = pipeline.run(&config.input);

    if !report.any_matched() {
        warn!("No EZTools CSVs found");
        println!("No EZTools CSVs found!");
        return Ok(ExitCode::from(EXIT_NO_MATCH));
    }
    if timeline.is_empty() {
        warn!("No data parsed successfully");
        println!("No data parsed successfully!");
        return Ok(ExitCode::from(EXIT_NO_EVENTS));
    }

    let sinks = build_sinks(config);
    let outcomes = output::write_all(&sinks, &timeline);

    let mut any_ok = false;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(rows) => {
                any_ok = true;
                println!("{}: {rows} events written", outcome.sink);
            }
            Err(e) => println!("{}: failed ({e})", outcome.sink),
        }
    }

    if config.benchmark {
        print_benchmark_results(&report, start_time.elapsed());
    }

    if any_ok {
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Output failed. Check logs for details.");
        Ok(ExitCode::from(EXIT_FAILURE))
    }
}

fn build_sinks(config: &RunConfig) -> Vec<Sink> {
    let mut sinks = Vec::new();
    if config.output_type.wants_flat() {
        sinks.push(Sink::Flat(FlatSink::new(
            &config.output,
            config.format,
            config.layout,
        )));
    }
    if config.output_type.wants_postgres() {
        if let Some(url) = &config.db_url {
            sinks.push(Sink::Postgres(PostgresSink::new(url.as_str())));
        }
    }
    sinks
}

fn print_benchmark_results(report: &RunReport, duration: Duration) {
    let duration_secs = duration.as_secs_f64();
    let input_mb = report.bytes_in as f64 / (1024.0 * 1024.0);
    let throughput_mbs = input_mb / duration_secs;
    let throughput_rows = report.rows_in as f64 / duration_secs;
    let throughput_events = report.events_out as f64 / duration_secs;

    eprintln!("\n=== BENCHMARK RESULTS ===");
    eprintln!("Files processed: {}", report.files_processed);
    eprintln!("Input size: {:.2} MB", input_mb);
    eprintln!("Total rows: {}", report.rows_in);
    eprintln!("Timeline events: {}", report.events_out);
    eprintln!("Processing time: {:.3}s", duration_secs);
    eprintln!("Throughput: {:.2} MB/s", throughput_mbs);
    eprintln!("Throughput: {:.0} rows/s", throughput_rows);
    eprintln!("Throughput: {:.0} events/s", throughput_events);
    if report.rows_in > 0 {
        eprintln!(
            "Row success rate: {:.1}%",
            ((report.rows_in - report.rows_dropped - report.rows_malformed) as f64
                / report.rows_in as f64)
                * 100.0
        );
    }
}
