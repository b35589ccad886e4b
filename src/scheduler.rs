/*!

Drives a whole simulation run: builds the [`Noc`] and one [`Pe`] per
router, releases every message on schedule, ticks the network forward to a
configured horizon, and reports which instances never arrived (§4.4, §4.6).

*/

use std::collections::HashMap;
use tracing::{info,warn};
use crate::config::NocConfig;
use crate::traffic::Message;
use crate::noc::Noc;
use crate::mesh_router::RouterId;
use crate::pe::{Pe,record_arrivals};

/// Outcome of a complete simulation run.
pub struct RunResult
{
	pub cycles_run: u64,
	/// Every instance that was released and did arrive, in arrival order.
	pub arrived: Vec<crate::traffic::MessageInstance>,
	/// Instances still in flight (or never promoted to injection) when the
	/// horizon elapsed.
	pub stuck: Vec<crate::traffic::MessageInstance>,
}

/// Runs `messages` over a mesh built from `config` for `horizon` cycles.
/// Every message's releases within `[0,horizon)` (§4.3 `releases_within`)
/// are handed to their source PE in advance; `tick` is then called once per
/// cycle until the horizon elapses.
pub fn run(config:NocConfig, messages:&[Message], horizon:u64) -> RunResult
{
	let mut noc = Noc::new(config);
	let mut pes: HashMap<RouterId,Pe> = HashMap::new();
	for i in 0..noc.config.dimension
	{
		for j in 0..noc.config.dimension
		{
			let coord = crate::traffic::Coord::new(i,j);
			let router_id = noc.router_id(coord);
			pes.insert(router_id,Pe::new(coord,router_id));
		}
	}

	// Pre-compute every (message, release_cycle) pair and group by cycle so
	// `run` only has to look up the current cycle's releases on each tick.
	let mut releases_by_cycle: HashMap<u64,Vec<(usize,u64)>> = HashMap::new();
	for message in messages
	{
		for (instance_number,release_cycle) in message.releases_within(horizon).into_iter().enumerate()
		{
			releases_by_cycle.entry(release_cycle).or_default().push((message.id,instance_number as u64));
		}
	}
	let messages_by_id: HashMap<usize,&Message> = messages.iter().map(|m|(m.id,m)).collect();

	info!(horizon,num_messages = messages.len(), "starting simulation run");

	for cycle in 0..horizon
	{
		if let Some(releases) = releases_by_cycle.get(&cycle)
		{
			for (message_id,instance_number) in releases
			{
				let message = messages_by_id[message_id];
				let router_id = noc.router_id(message.src);
				pes.get_mut(&router_id).expect("every coordinate has a PE").release(message,*instance_number,cycle);
			}
		}
		for pe in pes.values_mut()
		{
			pe.step(&mut noc,cycle);
		}
		noc.tick();
		record_arrivals(&mut noc,&mut pes,noc.cycle);
	}

	let mut arrived = Vec::new();
	let mut stuck = Vec::new();
	for mut pe in pes.into_values()
	{
		for instance in std::mem::take(&mut pe.departed)
		{
			if instance.has_arrived() { arrived.push(instance); } else { stuck.push(instance); }
		}
		// Instances that never finished departing (still queued behind an
		// earlier release, or mid-injection) at the horizon are just as stuck
		// as ones that departed but never arrived.
		stuck.extend(pe.drain_undeparted());
	}
	arrived.sort_by_key(|instance|instance.arrival_cycle.unwrap_or(u64::MAX));

	if !stuck.is_empty()
	{
		warn!(stuck_instances = stuck.len(), "simulation horizon elapsed with instances still in flight");
	}

	RunResult{ cycles_run: horizon, arrived, stuck }
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
			dimension: 2,
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
	fn single_message_arrives_within_a_short_horizon()
	{
		let message = Message{ id:0, period:1000, offset:0, deadline:100, size:32, src:Coord::new(0,0), dest:Coord::new(0,1), priority:0 };
		let result = run(sample_config(),&[message],50);
		assert_eq!(result.arrived.len(),1);
		assert!(result.stuck.is_empty());
	}

	#[test]
	fn too_short_a_horizon_reports_a_stuck_instance()
	{
		let message = Message{ id:0, period:1000, offset:0, deadline:100, size:32, src:Coord::new(0,0), dest:Coord::new(1,1), priority:0 };
		let result = run(sample_config(),&[message],2);
		assert_eq!(result.arrived.len(),0);
		assert_eq!(result.stuck.len(),1);
	}

	#[test]
	#[tracing_test::traced_test]
	fn a_stuck_instance_is_logged_as_a_warning()
	{
		let message = Message{ id:0, period:1000, offset:0, deadline:100, size:32, src:Coord::new(0,0), dest:Coord::new(1,1), priority:0 };
		run(sample_config(),&[message],2);
		assert!(tracing_test::logs_contain("instances still in flight"));
	}
}
