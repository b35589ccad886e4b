/*!

The mesh network: a flat arena of [`RouterState`]s plus the wiring between
them, and the `tick` that advances the whole network by one cycle (§5).

`tick` is the one place that reaches across two different routers (to let
router A allocate a VC on router B's input bank, and then deposit a flit
there). Since `routers` is a flat `Vec` and `RouterId` is just a `usize`
(§9's arena design), each such access is a plain, short-lived index into
the vector rather than a borrow held across the whole step — no
`Rc<RefCell<_>>` bookkeeping needed to reach a neighbour.

*/

use crate::traffic::{Flit,Direction,Coord,FlitKind};
use crate::vc::PacketKey;
use crate::config::{NocConfig,Arbitration};
use crate::mesh_router::{RouterState,RouterId,OutputTarget,StagedArrival,Candidate};

pub struct Noc
{
	pub config: NocConfig,
	pub routers: Vec<RouterState>,
	/// Flits ejected to their destination PE this cycle, per router, drained
	/// by [`crate::pe`] after `tick` returns.
	pub ejected: Vec<Vec<Flit>>,
	pub cycle: u64,
}

fn direction_index(direction:Direction) -> usize
{
	match direction
	{
		Direction::North => 0,
		Direction::South => 1,
		Direction::East => 2,
		Direction::West => 3,
		Direction::Pe => 4,
	}
}

fn router_id_of(dimension:usize, coord:Coord) -> RouterId
{
	coord.i*dimension + coord.j
}

impl Noc
{
	/// Builds a `dimension x dimension` mesh: router `(i,j)` is wired to
	/// `(i-1,j)`/`(i+1,j)`/`(i,j-1)`/`(i,j+1)` where they exist, and to a dead
	/// end at the mesh boundary (§3).
	pub fn new(config:NocConfig) -> Noc
	{
		let dimension = config.dimension;
		let mut routers = Vec::with_capacity(dimension*dimension);
		for i in 0..dimension
		{
			for j in 0..dimension
			{
				let coord = Coord::new(i,j);
				let id = router_id_of(dimension,coord);
				let mut targets = [OutputTarget::DeadEnd;5];
				targets[direction_index(Direction::North)] = if i>0 { OutputTarget::Neighbor(router_id_of(dimension,Coord::new(i-1,j)),Direction::North) } else { OutputTarget::DeadEnd };
				targets[direction_index(Direction::South)] = if i+1<dimension { OutputTarget::Neighbor(router_id_of(dimension,Coord::new(i+1,j)),Direction::South) } else { OutputTarget::DeadEnd };
				targets[direction_index(Direction::West)] = if j>0 { OutputTarget::Neighbor(router_id_of(dimension,Coord::new(i,j-1)),Direction::West) } else { OutputTarget::DeadEnd };
				targets[direction_index(Direction::East)] = if j+1<dimension { OutputTarget::Neighbor(router_id_of(dimension,Coord::new(i,j+1)),Direction::East) } else { OutputTarget::DeadEnd };
				targets[direction_index(Direction::Pe)] = OutputTarget::Pe;
				routers.push(RouterState::new(id,coord,config.number_of_vc,config.vc_buffer_size,&config.quantum,targets));
			}
		}
		let ejected = vec![Vec::new();dimension*dimension];
		Noc{ config, routers, ejected, cycle:0 }
	}

	pub fn router_id(&self, coord:Coord) -> RouterId
	{
		router_id_of(self.config.dimension,coord)
	}

	/// Whether any VC in `router_id`'s Pe-facing input bank currently holds a
	/// flit of `message_id`. The PE injection gate (§4.2) consults this before
	/// starting a new packet's head flit, so two packets of the same message
	/// never sit in the source's own input VCs at the same time.
	pub fn pe_port_holds_message(&self, router_id:RouterId, message_id:usize) -> bool
	{
		let idx = direction_index(Direction::Pe);
		self.routers[router_id].ports[idx].vcs.iter().any(|vc|vc.holds_message(message_id))
	}

	/// Attempts to inject `flit` into `router_id`'s local Pe-facing input
	/// bank and, on success, returns the VC id it landed in. A head flit must
	/// be passed `vc_hint: None` and requests a fresh VC allocation; body and
	/// tail flits of the same packet must be passed `Some` of whatever VC id
	/// their packet's head flit was granted, since a packet's flits all
	/// travel the same VC (§4).
	pub fn try_inject(&mut self, router_id:RouterId, vc_hint:Option<usize>, flit:Flit) -> Option<usize>
	{
		let idx = direction_index(Direction::Pe);
		let port = &mut self.routers[router_id].ports[idx];
		match vc_hint
		{
			None =>
			{
				let owner = PacketKey::of(&flit);
				let vc_id = port.allocate(owner,flit.priority,self.config.arbitration,self.config.preemption)?;
				if port.vcs[vc_id].enqueue(flit) { Some(vc_id) } else { port.vcs[vc_id].release(); None }
			},
			Some(vc_id) => if port.vcs[vc_id].enqueue(flit) { Some(vc_id) } else { None },
		}
	}

	/// Advances the whole mesh by one cycle: merge last cycle's staged
	/// arrivals, compute routes and grant downstream VC allocations, arbitrate
	/// the switch at every router, and move the winning flit one hop. A flit
	/// moved this cycle is staged at its destination and not visible there
	/// until the *next* call to `tick` (§5).
	pub fn tick(&mut self)
	{
		self.cycle += 1;
		let cycle = self.cycle;
		for router in &mut self.routers
		{
			router.merge_staged_arrivals();
		}

		let num_routers = self.routers.len();
		for router_id in 0..num_routers
		{
			self.step_router(router_id,cycle);
		}
	}

	/// Phase 1+2: for every input VC at `router_id` whose head-of-line flit
	/// wants to leave this cycle, compute its output direction and ensure it
	/// holds a downstream allocation (granting one if this is a fresh
	/// packet's head flit). Grants against a neighbour router index a
	/// different element of `self.routers` than `router_id`, but each
	/// `self.routers[...]` access below is a separate, short-lived borrow —
	/// no two are held open at once — so plain indexing suffices without
	/// ever needing a `split_at_mut` pair.
	///
	/// Under round-robin, a newly eligible VC is folded into its output's
	/// persistent candidate queue and the returned arrays stay empty; under
	/// priority-preemptive, which clears its candidate set every cycle (§5),
	/// a fresh `Candidate` list is returned instead.
	fn build_candidates(&mut self, router_id:RouterId, cycle:u64) -> [Vec<Candidate>;5]
	{
		let arbitration = self.config.arbitration;
		let preemption = self.config.preemption;
		let targets = self.routers[router_id].targets;
		let mut candidates: [Vec<Candidate>;5] = Default::default();

		for in_dir_idx in 0..5
		{
			let num_vc = self.routers[router_id].ports[in_dir_idx].num_vc();
			for vc_id in 0..num_vc
			{
				let ready = {
					let vc = &self.routers[router_id].ports[in_dir_idx].vcs[vc_id];
					match vc.front()
					{
						Some(flit) if flit.can_move(cycle) => Some((self.routers[router_id].route_of(flit),flit.priority,PacketKey::of(flit))),
						_ => None,
					}
				};
				let Some((out_dir,priority,owner)) = ready else { continue; };
				let key = (in_dir_idx,vc_id);
				if !self.routers[router_id].downstream_allocation.contains_key(&key)
				{
					let granted = match targets[direction_index(out_dir)]
					{
						OutputTarget::DeadEnd => None,
						OutputTarget::Pe => Some(0usize),
						OutputTarget::Neighbor(neighbor_id,neighbor_side) =>
						{
							let opposite = neighbor_side.opposite();
							self.routers[neighbor_id].ports[direction_index(opposite)].allocate(owner,priority,arbitration,preemption)
						},
					};
					match granted
					{
						Some(downstream_vc) => { self.routers[router_id].downstream_allocation.insert(key,downstream_vc); },
						None => continue,
					}
				}
				let out_idx = direction_index(out_dir);
				match arbitration
				{
					Arbitration::RoundRobin => self.routers[router_id].rr_note_eligible(out_idx,in_dir_idx,vc_id),
					Arbitration::PriorityPreempt => candidates[out_idx].push(Candidate{ in_dir_idx, vc_id, priority }),
				}
			}
		}
		candidates
	}

	fn step_router(&mut self, router_id:RouterId, cycle:u64)
	{
		let arbitration = self.config.arbitration;
		let targets = self.routers[router_id].targets;
		let candidates = self.build_candidates(router_id,cycle);

		for out_idx in 0..5
		{
			let winner = match arbitration
			{
				Arbitration::RoundRobin => self.routers[router_id].rr_pop_winner(out_idx,cycle),
				Arbitration::PriorityPreempt => self.routers[router_id].arbitrate_public(&candidates[out_idx])
					.map(|pos|{ let candidate = &candidates[out_idx][pos]; (candidate.in_dir_idx,candidate.vc_id) }),
			};
			let Some((in_dir_idx,in_vc_id)) = winner else { continue; };

			// A head's downstream VC was just granted fresh and empty, but a
			// body/tail's downstream VC may since have filled up: §4.2 step 4
			// requires leaving the flit in place and waiting, not moving it.
			if let OutputTarget::Neighbor(neighbor_id,neighbor_side) = targets[out_idx]
			{
				let downstream_vc = *self.routers[router_id].downstream_allocation.get(&(in_dir_idx,in_vc_id)).expect("switch winner must already hold a downstream allocation");
				let opposite_idx = direction_index(neighbor_side.opposite());
				if self.routers[neighbor_id].ports[opposite_idx].vcs[downstream_vc].is_full()
				{
					if let Arbitration::RoundRobin = arbitration
					{
						self.routers[router_id].rr_retry(out_idx,in_dir_idx,in_vc_id);
					}
					continue;
				}
			}

			let mut flit = self.routers[router_id].ports[in_dir_idx].vcs[in_vc_id].dequeue().expect("candidate VC was non-empty when selected");
			flit.stamp(cycle);
			let is_tail = flit.kind==FlitKind::Tail;
			self.routers[router_id].ports[in_dir_idx].vcs[in_vc_id].credit_out();
			if let Arbitration::RoundRobin = arbitration
			{
				self.routers[router_id].rr_requeue_or_reset(out_idx,in_dir_idx,in_vc_id);
			}

			match targets[out_idx]
			{
				OutputTarget::DeadEnd => unreachable!("a candidate was built for a dead-end output"),
				OutputTarget::Pe =>
				{
					self.ejected[router_id].push(flit);
				},
				OutputTarget::Neighbor(neighbor_id,neighbor_side) =>
				{
					let downstream_vc = *self.routers[router_id].downstream_allocation.get(&(in_dir_idx,in_vc_id)).expect("switch winner must already hold a downstream allocation");
					let opposite = neighbor_side.opposite();
					self.routers[neighbor_id].inbound_staging[direction_index(opposite)].push(StagedArrival{ vc_id: downstream_vc, flit });
				},
			}

			// The tail flit has just been forwarded out of this router's own
			// (upstream, relative to this hop) VC: it is no longer occupied by this
			// packet, so release it and let any suspended packet resume (step 4).
			if is_tail
			{
				self.routers[router_id].downstream_allocation.remove(&(in_dir_idx,in_vc_id));
				self.routers[router_id].ports[in_dir_idx].vcs[in_vc_id].release();
				self.routers[router_id].ports[in_dir_idx].vcs[in_vc_id].resume_suspended();
			}
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::{Arbitration,PreemptionPolicy};
	use crate::traffic::Packet;

	fn sample_config(dimension:usize) -> NocConfig
	{
		NocConfig{
			dimension,
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
	fn two_by_two_mesh_wires_boundaries_to_dead_ends()
	{
		let noc = Noc::new(sample_config(2));
		let corner = noc.router_id(Coord::new(0,0));
		assert_eq!(noc.routers[corner].targets[direction_index(Direction::North)],OutputTarget::DeadEnd);
		assert_eq!(noc.routers[corner].targets[direction_index(Direction::West)],OutputTarget::DeadEnd);
		match noc.routers[corner].targets[direction_index(Direction::East)]
		{
			OutputTarget::Neighbor(id,Direction::East) => assert_eq!(id,noc.router_id(Coord::new(0,1))),
			other => panic!("expected eastward neighbor, got {:?}",other),
		}
	}

	#[test]
	fn single_hop_delivery_across_two_ticks()
	{
		let mut noc = Noc::new(sample_config(2));
		let src = noc.router_id(Coord::new(0,0));
		let dest = Coord::new(0,1);
		let packet = Packet::new(0,true,dest,0,0,0);
		let mut vc_hint = None;
		for flit in packet.flits
		{
			vc_hint = noc.try_inject(src,vc_hint,flit);
			assert!(vc_hint.is_some());
		}
		// Cycle 1: the head flit is admitted into the Pe bank and immediately
		// eligible for switch arbitration toward East.
		noc.tick();
		// A few more cycles for the remaining flits to drain across the hop.
		for _ in 0..4
		{
			noc.tick();
		}
		let dest_id = noc.router_id(dest);
		assert!(!noc.ejected[dest_id].is_empty());
	}
}
