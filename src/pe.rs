/*!

The processing elements attached to each router: periodic traffic sources
that release [`MessageInstance`]s and inject their flits into the mesh
(§4.3), and the sinks that record arrivals ejected by the router pipeline.

A source enforces same-flow ordering (§4.3 Non-goals / invariants): two
releases of the *same* message never have their flits interleaved in the
network, so a new release waits behind the previous one until it has
finished departing before its own head flit is presented to the router.
Distinct messages originating at the same PE are free to interleave,
since each competes for VC allocation independently like any other flow.

*/

use std::collections::{HashMap,VecDeque};
use crate::traffic::{Message,MessageInstance,FlitKind};
use crate::noc::Noc;
use crate::mesh_router::RouterId;

/// One message instance still being handed off to the router, flit by flit.
struct InFlightInjection
{
	instance: MessageInstance,
	remaining: VecDeque<crate::traffic::Flit>,
	/// VC id granted to the packet currently being injected, `None` until its
	/// head flit is admitted.
	vc_hint: Option<usize>,
}

/// A single PE's outgoing traffic: the source side of §4.3.
pub struct Pe
{
	pub coord: crate::traffic::Coord,
	router_id: RouterId,
	/// Releases of each message not yet promoted to `in_flight`, kept in
	/// release order so same-flow packets never interleave.
	pending: HashMap<usize,VecDeque<MessageInstance>>,
	in_flight: Vec<InFlightInjection>,
	/// Completed instances, moved here once every flit has been handed to
	/// the router (still awaiting arrival, recorded separately on ejection).
	pub departed: Vec<MessageInstance>,
}

impl Pe
{
	pub fn new(coord:crate::traffic::Coord, router_id:RouterId) -> Pe
	{
		Pe{ coord, router_id, pending: HashMap::new(), in_flight: Vec::new(), departed: Vec::new() }
	}

	/// Records a new release of `message` as instance number `instance` at
	/// `release_cycle`. Promotes it to active injection immediately unless an
	/// earlier instance of the same message is still departing.
	pub fn release(&mut self, message:&Message, instance:u64, release_cycle:u64)
	{
		let message_instance = MessageInstance::new(message,instance,release_cycle);
		let queue = self.pending.entry(message.id).or_default();
		let was_empty = queue.is_empty() && !self.in_flight.iter().any(|f|f.instance.message_id==message.id);
		queue.push_back(message_instance);
		if was_empty
		{
			self.promote_next(message.id);
		}
	}

	/// Every instance this PE knows about that never finished departing: still
	/// waiting behind an earlier release of the same message, or mid-injection
	/// when the caller stops driving `step`. Consumed once, at the end of a
	/// run, to report these alongside `departed`-but-never-arrived instances
	/// as stuck (§4.4, §7 deadlock-suspected).
	pub fn drain_undeparted(&mut self) -> Vec<MessageInstance>
	{
		let mut instances: Vec<MessageInstance> = self.pending.drain().flat_map(|(_,queue)|queue).collect();
		instances.extend(self.in_flight.drain(..).map(|injection|injection.instance));
		instances
	}

	fn promote_next(&mut self, message_id:usize)
	{
		if let Some(queue) = self.pending.get_mut(&message_id)
		{
			if let Some(instance) = queue.pop_front()
			{
				let remaining: VecDeque<_> = instance.packets.iter().flat_map(|packet|packet.flits.iter().cloned()).collect();
				self.in_flight.push(InFlightInjection{ instance, remaining, vc_hint:None });
			}
		}
	}

	/// Attempts to push as many flits as will fit into the router's
	/// injection bank this cycle. Stops a given in-flight injection at its
	/// first refused flit so ordering within the packet is preserved.
	pub fn step(&mut self, noc:&mut Noc, cycle:u64)
	{
		let mut finished_message_ids = Vec::new();
		for injection in &mut self.in_flight
		{
			while let Some(flit) = injection.remaining.front().cloned()
			{
				// A fresh packet (no VC granted yet) must wait until no earlier
				// packet of this same message is still sitting in the source's own
				// input VCs (PE injection ordering constraint).
				if injection.vc_hint.is_none() && noc.pe_port_holds_message(self.router_id,injection.instance.message_id)
				{
					break;
				}
				match noc.try_inject(self.router_id,injection.vc_hint,flit)
				{
					Some(vc_id) =>
					{
						let sent = injection.remaining.pop_front().expect("front was just peeked");
						// Stamped only once, on the very first flit this instance ever
						// gets to actually hand off — not merely attempt — matching
						// §4.2's "depart_time... stamped on the head flit" when it is
						// accepted, not when injection is first considered.
						if injection.instance.depart_cycle.is_none()
						{
							injection.instance.depart_cycle = Some(cycle);
						}
						injection.vc_hint = if sent.kind==FlitKind::Tail { None } else { Some(vc_id) };
					},
					None => break,
				}
			}
			if injection.remaining.is_empty()
			{
				finished_message_ids.push(injection.instance.message_id);
			}
		}
		if !finished_message_ids.is_empty()
		{
			let finished: Vec<InFlightInjection> = {
				let mut kept = Vec::new();
				let mut finished = Vec::new();
				for injection in self.in_flight.drain(..)
				{
					if injection.remaining.is_empty() { finished.push(injection); } else { kept.push(injection); }
				}
				self.in_flight = kept;
				finished
			};
			for injection in finished
			{
				let message_id = injection.instance.message_id;
				self.departed.push(injection.instance);
				self.promote_next(message_id);
			}
		}
	}
}

/// Records arrivals ejected anywhere in the mesh this cycle (§4.3):
/// completes the matching departed instance's `arrival_cycle` once the last
/// flit of its last packet lands. A flit's destination router is not
/// generally the router its own PE is attached to issuing the injection, so
/// every ejection is matched against every PE's `departed` list by message
/// identity rather than only the ejecting router's own PE.
pub fn record_arrivals(noc:&mut Noc, pe_by_router:&mut HashMap<RouterId,Pe>, cycle:u64)
{
	let mut completed_flits = Vec::new();
	for arrivals in noc.ejected.iter_mut()
	{
		for flit in arrivals.drain(..)
		{
			if flit.kind==FlitKind::Tail && flit.is_last_packet
			{
				completed_flits.push(flit);
			}
		}
	}
	for flit in completed_flits
	{
		for pe in pe_by_router.values_mut()
		{
			if let Some(instance) = pe.departed.iter_mut().find(|instance|
				instance.message_id==flit.message_id && instance.instance==flit.instance && instance.arrival_cycle.is_none())
			{
				instance.arrival_cycle = Some(cycle);
				break;
			}
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::traffic::Coord;

	fn sample_message() -> Message
	{
		Message{ id:0, period:100, offset:0, deadline:100, size:32, src:Coord::new(0,0), dest:Coord::new(0,0), priority:0 }
	}

	#[test]
	fn second_release_waits_for_first_to_finish_departing()
	{
		let mut pe = Pe::new(Coord::new(0,0),0);
		let message = sample_message();
		pe.release(&message,0,0);
		pe.release(&message,1,100);
		assert_eq!(pe.in_flight.len(),1);
		assert_eq!(pe.pending.get(&0).unwrap().len(),1);
	}

	#[test]
	fn distinct_messages_both_promote_immediately()
	{
		let mut pe = Pe::new(Coord::new(0,0),0);
		let message_a = sample_message();
		let mut message_b = sample_message();
		message_b.id = 1;
		pe.release(&message_a,0,0);
		pe.release(&message_b,0,0);
		assert_eq!(pe.in_flight.len(),2);
	}

	#[test]
	fn a_later_packets_head_waits_for_an_earlier_packets_tail_to_clear_the_source_vcs()
	{
		use crate::config::{NocConfig,Arbitration,PreemptionPolicy};
		use crate::noc::Noc;

		// Two VCs are free at the source, so without the ordering gate the
		// framing packet's head flit could slip into the second VC the very
		// same cycle the first packet's tail is still sitting, undelivered, in
		// the first.
		let config = NocConfig{
			dimension: 2,
			number_of_vc: 2,
			vc_buffer_size: 4,
			quantum: vec![4,4],
			arbitration: Arbitration::RoundRobin,
			preemption: PreemptionPolicy::Forbid,
			network_access_latency: 1,
			seed: 0,
		};
		let mut noc = Noc::new(config);
		let router_id = noc.router_id(Coord::new(0,0));
		// size=128 -> 3 packets (1 payload + head/tail framing), 4 flits each.
		let message = Message{ id:0, period:1000, offset:0, deadline:1000, size:128, src:Coord::new(0,0), dest:Coord::new(1,1), priority:0 };
		let mut pe = Pe::new(Coord::new(0,0),router_id);
		pe.release(&message,0,0);
		pe.step(&mut noc,0);

		assert_eq!(pe.in_flight.len(),1);
		// Only the first packet's 4 flits were admitted; the other two packets
		// (8 flits) are still waiting behind the ordering gate.
		assert_eq!(pe.in_flight[0].remaining.len(),8);
	}
}
