/*!

The `meshvc-sim` command line: walks a directory tree of scenario cases
(each a `config.yml` + `scenario.yml` pair), runs every one it finds over
its own hyperperiod, and reports progress with an `indicatif` bar the
way a batch experiment runner over many configurations would (§4.6, §4.9).

*/

use std::path::{Path,PathBuf};
use clap::Parser;
use indicatif::{ProgressBar,ProgressStyle};
use tracing::{info,warn,error};
use crate::error::Error;
use crate::config::NocConfig;
use crate::scenario::ScenarioFile;
use crate::traffic::hyperperiod;
use crate::analytical;
use crate::scheduler;
use crate::trace;

#[derive(Parser,Debug)]
#[command(name="meshvc-sim", about="Cycle-accurate 2D-mesh NoC simulator with virtual-channel flow control")]
pub struct Cli
{
	/// Root directory to search for `config.yml`/`scenario.yml` case pairs.
	pub root: PathBuf,

	/// Verbose tracing output (`debug` level). Mutually exclusive with `--info`.
	#[arg(short='d',long="debug",conflicts_with="info")]
	pub debug: bool,

	/// Informational tracing output (`info` level). Mutually exclusive with `--debug`.
	#[arg(short='i',long="info",conflicts_with="debug")]
	pub info: bool,
}

impl Cli
{
	/// The `tracing` filter directive selected by `--debug`/`--info`, falling
	/// back to `RUST_LOG` and then to `warn` (§4.9).
	pub fn tracing_filter(&self) -> String
	{
		if self.debug { "debug".to_string() }
		else if self.info { "info".to_string() }
		else { std::env::var("RUST_LOG").unwrap_or_else(|_|"warn".to_string()) }
	}
}

struct Case
{
	directory: PathBuf,
	config_path: PathBuf,
	scenario_path: PathBuf,
}

/// Each immediate subdirectory of `root` containing both `config.yml` and
/// `scenario.yml` becomes one case; any other immediate subdirectory is
/// skipped with a warning (§4.9) rather than descended into further.
fn find_cases(root:&Path) -> Vec<Case>
{
	let mut cases = Vec::new();
	let Ok(entries) = std::fs::read_dir(root) else { return cases; };
	for entry in entries.flatten()
	{
		let dir = entry.path();
		if !dir.is_dir()
		{
			continue;
		}
		let config_path = dir.join("config.yml");
		let scenario_path = dir.join("scenario.yml");
		if config_path.is_file() && scenario_path.is_file()
		{
			cases.push(Case{ directory: dir, config_path, scenario_path });
		}
		else
		{
			warn!(directory = %dir.display(), "skipping subdirectory missing config.yml or scenario.yml");
		}
	}
	cases
}

/// Exit code convention (§6): `0` every case ran and every released instance
/// arrived, `1` at least one case ran to completion but left instances stuck
/// at its horizon, `2` a case could not be loaded or simulated at all.
pub fn run(cli:&Cli) -> i32
{
	let cases = find_cases(&cli.root);
	info!(num_cases = cases.len(), root = %cli.root.display(), "discovered simulation cases");

	let progress = ProgressBar::new(cases.len() as u64);
	progress.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").unwrap_or_else(|_|ProgressStyle::default_bar()));

	let mut had_load_error = false;
	let mut had_missed_instances = false;

	for case in &cases
	{
		progress.set_message(case.directory.display().to_string());
		match run_case(case)
		{
			Ok(missed) => had_missed_instances |= missed,
			Err(err) =>
			{
				error!(case = %case.directory.display(), error = %err, "case failed");
				had_load_error = true;
			},
		}
		progress.inc(1);
	}
	progress.finish();

	if had_load_error { 2 } else if had_missed_instances { 1 } else { 0 }
}

/// Runs one case over its own hyperperiod, writing `result_analysis.csv` and
/// `result_simulation.csv` alongside its input files. Returns whether any
/// instance was still outstanding when the horizon elapsed.
fn run_case(case:&Case) -> Result<bool,Error>
{
	let config = NocConfig::from_file(&case.config_path)?;
	let scenario = ScenarioFile::from_file(&case.scenario_path)?;
	let messages = scenario.resolve(&config)?;

	trace::write_analysis(&case.directory.join("result_analysis.csv"),&config,&messages)?;

	// Horizon = one hyperperiod plus the longest analytical latency any
	// message could plausibly incur, so the last release of the hyperperiod
	// has a fair chance to arrive before the run is cut off (§4.9 scenario 5).
	let max_latency = messages.iter().map(|m|analytical::estimate_latency(&config,m)).max().unwrap_or(0);
	let horizon = hyperperiod(&messages) + max_latency;
	let result = scheduler::run(config,&messages,horizon);
	trace::write_simulation(&case.directory.join("result_simulation.csv"),&result.arrived,&result.stuck)?;

	Ok(!result.stuck.is_empty())
}
