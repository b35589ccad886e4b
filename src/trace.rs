/*!

Result sinks: writes the per-message analytical latency estimate and the
per-instance simulated outcome to plain CSV files (§4.6). Result tables are
written by hand with `File` and `write!` rather than through a CSV crate.

*/

use std::fs::File;
use std::io::Write;
use std::path::Path;
use crate::error::Error;
use crate::config::NocConfig;
use crate::traffic::{Message,MessageInstance};
use crate::analytical;

/// Writes `result_analysis.csv`: one row per message with its analytical
/// latency estimate against the whole scenario's contention.
pub fn write_analysis(path:&Path, config:&NocConfig, messages:&[Message]) -> Result<(),Error>
{
	let mut file = File::create(path).map_err(|e| crate::error!(could_not_open_file,path.to_path_buf(),e))?;
	writeln!(file,"id,period,size,deadline,src_i,src_j,dest_i,dest_j,analytical_latency")
		.map_err(|e| crate::error!(could_not_open_file,path.to_path_buf(),e))?;
	for message in messages
	{
		let latency = analytical::estimate_latency(config,message);
		writeln!(file,"{},{},{},{},{},{},{},{},{}",
			message.id,message.period,message.size,message.deadline,
			message.src.i,message.src.j,message.dest.i,message.dest.j,latency)
			.map_err(|e| crate::error!(could_not_open_file,path.to_path_buf(),e))?;
	}
	Ok(())
}

/// Writes `result_simulation.csv`: one row per *arrived* message instance,
/// with its observed latency and deadline outcome. Instances still
/// outstanding at the horizon (`stuck`) are not written as data rows — they
/// are only counted, in a trailing `# missed: N` comment line (§4.8).
pub fn write_simulation(path:&Path, arrived:&[MessageInstance], stuck:&[MessageInstance]) -> Result<(),Error>
{
	let mut file = File::create(path).map_err(|e| crate::error!(could_not_open_file,path.to_path_buf(),e))?;
	writeln!(file,"message_id,instance,depart_cycle,arrival_cycle,latency,deadline_met")
		.map_err(|e| crate::error!(could_not_open_file,path.to_path_buf(),e))?;
	for instance in arrived
	{
		writeln!(file,"{},{},{},{},{},{}",
			instance.message_id,
			instance.instance,
			instance.depart_cycle.map(|c|c.to_string()).unwrap_or_default(),
			instance.arrival_cycle.map(|c|c.to_string()).unwrap_or_default(),
			instance.latency().map(|l|l.to_string()).unwrap_or_default(),
			instance.deadline_met().map(|met|met.to_string()).unwrap_or_default(),
		).map_err(|e| crate::error!(could_not_open_file,path.to_path_buf(),e))?;
	}
	writeln!(file,"# missed: {}",stuck.len()).map_err(|e| crate::error!(could_not_open_file,path.to_path_buf(),e))?;
	Ok(())
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::{Arbitration,PreemptionPolicy};
	use crate::traffic::Coord;

	fn sample_config() -> NocConfig
	{
		NocConfig{
			dimension: 4,
			number_of_vc: 2,
			vc_buffer_size: 4,
			quantum: vec![2,2],
			arbitration: Arbitration::RoundRobin,
			preemption: PreemptionPolicy::Forbid,
			network_access_latency: 1,
			seed: 0,
		}
	}

	#[test]
	fn write_analysis_produces_one_row_per_message()
	{
		let dir = std::env::temp_dir().join(format!("meshvc-sim-test-analysis-{}",std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("result_analysis.csv");
		let messages = vec![
			Message{ id:0, period:100, offset:0, deadline:100, size:64, src:Coord::new(0,0), dest:Coord::new(0,1), priority:0 },
			Message{ id:1, period:100, offset:0, deadline:100, size:64, src:Coord::new(0,0), dest:Coord::new(1,1), priority:0 },
		];
		write_analysis(&path,&sample_config(),&messages).unwrap();
		let text = std::fs::read_to_string(&path).unwrap();
		assert_eq!(text.lines().count(),3);
		std::fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn write_simulation_reports_stuck_instances_as_a_trailing_comment_not_rows()
	{
		let dir = std::env::temp_dir().join(format!("meshvc-sim-test-simulation-{}",std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("result_simulation.csv");

		let mut arrived = crate::traffic::MessageInstance::new(
			&Message{ id:0, period:100, offset:0, deadline:100, size:64, src:Coord::new(0,0), dest:Coord::new(0,1), priority:0 },
			0,0,
		);
		arrived.depart_cycle = Some(0);
		arrived.arrival_cycle = Some(5);
		let stuck = crate::traffic::MessageInstance::new(
			&Message{ id:1, period:100, offset:0, deadline:100, size:64, src:Coord::new(0,0), dest:Coord::new(1,1), priority:0 },
			0,0,
		);

		write_simulation(&path,&[arrived],&[stuck]).unwrap();
		let text = std::fs::read_to_string(&path).unwrap();
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines.len(),3);
		assert_eq!(lines[2],"# missed: 1");
		std::fs::remove_dir_all(&dir).ok();
	}
}
