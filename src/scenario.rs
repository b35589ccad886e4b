/*!

Traffic scenario loading: either an explicit list of periodic messages, or
a compact description (`task` graph plus a target utilization `load`) that
gets expanded into one via the UUniFast generator (§4.6, §4.7).

*/

use std::path::Path;
use serde::Deserialize;
use crate::error::Error;
use crate::traffic::{Coord,Message};
use crate::config::{NocConfig,PreemptionPolicy};

/// A coordinate as it appears in a scenario file: `{i: .., j: ..}`, matching
/// `examples/original_source/input/generation.py`'s `m['src']`/`m['dest']`.
#[derive(Debug,Clone,Copy,Deserialize)]
pub struct CoordSpec
{
	pub i: usize,
	pub j: usize,
}

impl From<CoordSpec> for Coord
{
	fn from(spec:CoordSpec) -> Coord
	{
		Coord::new(spec.i,spec.j)
	}
}

#[derive(Debug,Clone,Deserialize)]
pub struct MessageSpec
{
	pub id: usize,
	pub period: u64,
	#[serde(default)]
	pub offset: u64,
	pub deadline: u64,
	pub size: u32,
	pub src: CoordSpec,
	pub dest: CoordSpec,
	#[serde(default)]
	pub priority: usize,
}

impl MessageSpec
{
	pub fn into_message(self) -> Message
	{
		Message{
			id: self.id,
			period: self.period,
			offset: self.offset,
			deadline: self.deadline,
			size: self.size,
			src: self.src.into(),
			dest: self.dest.into(),
			priority: self.priority,
		}
	}
}

/// How an auto-generated scenario's task graph and target load are described.
#[derive(Debug,Clone,Deserialize)]
pub struct GeneratedSpec
{
	/// Number of independent periodic flows to generate.
	pub task: usize,
	/// Generation method name. The only method this crate (or the original
	/// generator it was distilled from) implements is `"UuniFast"`.
	pub method: String,
	/// Target aggregate utilization in `(0,1]`, distributed over `task`
	/// flows by UUniFast (§4.7).
	pub load: f64,
}

/// A scenario file is either an explicit message list (keyed `scenario:`) or
/// a generator spec (keyed `task:`/`method:`/`load:`), matching the two
/// branches of `examples/original_source/gen/generation.py`'s `scenario`
/// method. `#[serde(untagged)]` lets either shape parse without an extra
/// wrapper key, since the original format has none.
#[derive(Debug,Clone,Deserialize)]
#[serde(untagged)]
pub enum ScenarioFile
{
	Scenario{ scenario: Vec<MessageSpec> },
	Generated(GeneratedSpec),
}

impl ScenarioFile
{
	pub fn from_file(path:&Path) -> Result<ScenarioFile,Error>
	{
		let text = std::fs::read_to_string(path).map_err(|e| crate::error!(could_not_open_file,path.to_path_buf(),e))?;
		serde_yaml_ng::from_str(&text).map_err(|e| crate::error!(could_not_parse_file,path.to_path_buf(),e))
	}

	/// Resolves this file into a concrete list of messages, running the
	/// UUniFast generator if this is a `Generated` spec (§4.7), then
	/// validates every message against `config` (§4.1 scenario invariants).
	pub fn resolve(self, config:&NocConfig) -> Result<Vec<Message>,Error>
	{
		let messages = match self
		{
			ScenarioFile::Scenario{ scenario } => scenario.into_iter().map(MessageSpec::into_message).collect(),
			ScenarioFile::Generated(spec) =>
			{
				if spec.method != "UuniFast"
				{
					return Err(crate::error!(scenario_invalid,format!("unknown generation method {:?}, only \"UuniFast\" is supported",spec.method)));
				}
				crate::uunifast::generate(&spec,config)?
			},
		};
		validate_all(&messages,config)?;
		Ok(messages)
	}
}

fn validate_all(messages:&[Message], config:&NocConfig) -> Result<(),Error>
{
	for message in messages
	{
		message.validate(config.dimension)?;
		if config.arbitration==crate::config::Arbitration::PriorityPreempt && config.preemption==PreemptionPolicy::BufferSuspended && message.priority >= config.number_of_vc
		{
			return Err(crate::error!(scenario_invalid,format!(
				"message {}: priority {} has no matching VC (number_of_vc={})",
				message.id,message.priority,config.number_of_vc
			)));
		}
	}
	let mut ids: Vec<usize> = messages.iter().map(|m|m.id).collect();
	ids.sort_unstable();
	if ids.windows(2).any(|pair|pair[0]==pair[1])
	{
		return Err(crate::error!(scenario_invalid,"message ids must be unique".to_string()));
	}
	Ok(())
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::Arbitration;

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

	fn sample_spec(id:usize) -> MessageSpec
	{
		MessageSpec{ id, period:100, offset:0, deadline:100, size:64, src:CoordSpec{i:0,j:0}, dest:CoordSpec{i:0,j:1}, priority:0 }
	}

	#[test]
	fn explicit_scenario_resolves_directly()
	{
		let file = ScenarioFile::Scenario{ scenario: vec![sample_spec(0),sample_spec(1)] };
		let messages = file.resolve(&sample_config()).unwrap();
		assert_eq!(messages.len(),2);
	}

	#[test]
	fn rejects_duplicate_ids()
	{
		let file = ScenarioFile::Scenario{ scenario: vec![sample_spec(0),sample_spec(0)] };
		assert!(file.resolve(&sample_config()).is_err());
	}

	#[test]
	fn rejects_out_of_mesh_coordinates()
	{
		let mut spec = sample_spec(0);
		spec.dest = CoordSpec{i:10,j:10};
		let file = ScenarioFile::Scenario{ scenario: vec![spec] };
		assert!(file.resolve(&sample_config()).is_err());
	}

	#[test]
	fn parses_the_on_disk_explicit_scenario_shape()
	{
		let yaml = "scenario:\n  - id: 0\n    period: 100\n    offset: 0\n    deadline: 100\n    size: 64\n    src: {i: 0, j: 0}\n    dest: {i: 0, j: 1}\n";
		let file: ScenarioFile = serde_yaml_ng::from_str(yaml).unwrap();
		let messages = file.resolve(&sample_config()).unwrap();
		assert_eq!(messages.len(),1);
		assert_eq!(messages[0].dest,crate::traffic::Coord::new(0,1));
	}

	#[test]
	fn parses_the_on_disk_generated_scenario_shape()
	{
		let yaml = "task: 3\nmethod: UuniFast\nload: 0.5\n";
		let file: ScenarioFile = serde_yaml_ng::from_str(yaml).unwrap();
		let messages = file.resolve(&sample_config()).unwrap();
		assert_eq!(messages.len(),3);
	}

	#[test]
	fn rejects_an_unknown_generation_method()
	{
		let file = ScenarioFile::Generated(GeneratedSpec{ task:2, method:"Bogus".to_string(), load:0.5 });
		assert!(file.resolve(&sample_config()).is_err());
	}
}
