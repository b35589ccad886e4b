/*!

A cheap, topology-aware latency estimate used to sanity-check (and, for
large scenarios, stand in for) full cycle-accurate simulation (§4.5).

The formula was distilled from an `EndToEndLatency`-style estimator that is
not itself part of this crate's retrieved reference material, so its shape
here is a documented reconstruction (see `SPEC_FULL.md` §4.5, resolved): two
router access latencies for injection/ejection, the Manhattan hop distance
`nR`, and a queuing term `nI * oV * FLITS_PER_PACKET` that charges a full
VC-buffer's worth of flits for every group of `num_vc` packets the message
itself is segmented into (`nI = ceil(num_packets / num_vc)`, `oV =
VCBufferSize`). This is purely a function of the message and the static
config — unlike simulation, it never looks at other messages' contention.

*/

use crate::config::NocConfig;
use crate::traffic::{Coord,Message,FLITS_PER_PACKET};

/// Estimated end-to-end latency, in cycles, for one instance of `message`:
/// `2*NETWORK_ACCESS_LATENCY + nR + nI*oV*FLITS_PER_PACKET` (§4.5 resolved).
pub fn estimate_latency(config:&NocConfig, message:&Message) -> u64
{
	let n_r = message.src.manhattan_distance(&message.dest) as u64;
	let network_access_latency = config.network_access_latency;
	let num_vc = config.number_of_vc.max(1) as u64;
	let o_v = config.vc_buffer_size as u64;

	// nI: how many full rounds of `num_vc` packets this message's own
	// packets stack up into before the last one gets a turn.
	let num_packets = message.num_packets() as u64;
	let n_i = num_packets.div_ceil(num_vc);
	let n_l = n_r + n_i*o_v*(FLITS_PER_PACKET as u64);

	network_access_latency*2 + n_l
}

/// Convenience overload taking raw coordinates, for callers that have not
/// built a full [`Message`] (e.g. the CLI's quick per-scenario estimate).
pub fn estimate_latency_between(config:&NocConfig, src:Coord, dest:Coord, size:u32) -> u64
{
	let stub = Message{ id:0, period:1, offset:0, deadline:1, size, src, dest, priority:0 };
	estimate_latency(config,&stub)
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::{Arbitration,PreemptionPolicy};

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
	fn a_single_packet_message_costs_one_queuing_round()
	{
		let config = sample_config();
		// size=0 -> num_packets = ceil(0/128)+2 = 2 packets over 2 VCs -> nI = 1.
		let latency = estimate_latency_between(&config,Coord::new(0,0),Coord::new(0,3),0);
		let expected = 2*1 + 3 + 1*4*(FLITS_PER_PACKET as u64);
		assert_eq!(latency,expected);
	}

	#[test]
	fn more_packets_than_vcs_add_a_second_queuing_round()
	{
		let config = sample_config();
		// size=200 -> num_packets = ceil(200/128)+2 = 4 packets over 2 VCs -> nI = 2.
		let latency = estimate_latency_between(&config,Coord::new(0,0),Coord::new(0,1),200);
		let expected = 2*1 + 1 + 2*4*(FLITS_PER_PACKET as u64);
		assert_eq!(latency,expected);
	}
}
