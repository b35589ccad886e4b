/*!

A single router: one [`crate::port::InputPort`] bank per side (N/S/E/W) plus
one for the locally attached PE, and the per-cycle pipeline that moves
flits out of them (§4, §5). Route computation is a pure function of a
flit's destination and this router's own position, so unlike the lock and
credit state it never needs to be cached (§4.2): recomputing it every
cycle for the head-of-line flit is cheap and always consistent.

Crossing into a neighbouring router is handled one level up, in
[`crate::noc::Noc`], which is the only place that ever reaches across two
different `RouterState`s in the same step.

*/

use std::collections::{HashMap,VecDeque};
use crate::traffic::{Flit,Direction,Coord};
use crate::vc::PacketKey;
use crate::port::InputPort;
use crate::xy_routing;

/// Handle into [`crate::noc::Noc::routers`]. A plain index rather than a
/// reference-counted pointer, per the arena design note (§9): routers never
/// need to outlive the arena that owns them, and two distinct `RouterId`s
/// can be borrowed mutably at once by indexing, which `Rc<RefCell<_>>` would
/// make needlessly awkward.
pub type RouterId = usize;

/// Where a router's output in a given direction actually leads.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum OutputTarget
{
	Neighbor(RouterId,Direction),
	Pe,
	DeadEnd,
}

/// A flit in flight between two routers (or a router and its PE), staged on
/// arrival so it only becomes visible to the receiving side on the *next*
/// cycle (§5 ordering guarantee).
#[derive(Debug,Clone)]
pub struct StagedArrival
{
	pub vc_id: usize,
	pub flit: Flit,
}

/// Fixed order the five directions are swept in when building switch
/// arbitration candidate lists and doing round-robin credit bookkeeping.
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

#[derive(Debug,Clone)]
pub struct RouterState
{
	pub id: RouterId,
	pub coord: Coord,
	/// Input port bank, indexed by [`direction_index`].
	pub ports: [InputPort;5],
	/// Where this router's four mesh-facing outputs lead; `Pe` always leads
	/// to the locally attached processing element.
	pub targets: [OutputTarget;5],
	/// Flits that arrived during the previous cycle's switch traversal and
	/// are merged into `ports` at the start of this cycle.
	pub inbound_staging: [Vec<StagedArrival>;5],
	/// `(input_direction_index, input_vc_id) -> downstream_vc_id`, set once a
	/// head flit is granted a downstream VC and cleared when that packet's
	/// tail flit is forwarded (§4.1).
	pub downstream_allocation: HashMap<(usize,usize),usize>,
	/// Per-output-port round-robin candidate queue, used only under
	/// [`crate::config::Arbitration::RoundRobin`]. Persists across cycles (§5 "Per-cycle
	/// candidate queues"): a newly eligible `(in_dir_idx, vc_id)` joins the
	/// back, and a winner that still has credit and flits left is re-queued at
	/// the front so one packet's flits keep winning consecutively up to its
	/// VC's quantum before another contender gets a turn.
	rr_queues: [VecDeque<(usize,usize)>;5],
}

/// A flit at `(in_dir_idx, vc_id)` ready to be considered for switch
/// arbitration this cycle: present, not yet moved this cycle, and already
/// holding (or just now granted) a downstream VC allocation.
pub struct Candidate
{
	pub in_dir_idx: usize,
	pub vc_id: usize,
	pub priority: usize,
}

impl RouterState
{
	pub fn new(id:RouterId, coord:Coord, num_vc:usize, vc_size:usize, quantum:&[u32], targets:[OutputTarget;5]) -> RouterState
	{
		let ports = std::array::from_fn(|_| InputPort::new(num_vc,vc_size,quantum));
		RouterState{
			id,
			coord,
			ports,
			targets,
			inbound_staging: Default::default(),
			downstream_allocation: HashMap::new(),
			rr_queues: Default::default(),
		}
	}

	/// Merges flits staged by neighbours' switch traversal last cycle into
	/// this router's live input VC queues. Must run before route computation.
	pub fn merge_staged_arrivals(&mut self)
	{
		for idx in 0..5
		{
			for arrival in self.inbound_staging[idx].drain(..)
			{
				if !self.ports[idx].vcs[arrival.vc_id].enqueue(arrival.flit)
				{
					unreachable!("a flit was staged for a downstream VC with no reserved room");
				}
			}
		}
	}

	/// The output direction a flit currently at this router should take next.
	pub(crate) fn route_of(&self, flit:&Flit) -> Direction
	{
		if self.coord == flit.destination
		{
			Direction::Pe
		}
		else
		{
			xy_routing::next_direction(self.coord,flit.destination)
		}
	}

	/// Phase 3, priority-preemptive only: among the candidates contending for
	/// one output direction, pick the lowest `priority` value, ties broken by
	/// input direction index (§8 Scenario 3: lower id wins). The candidate set
	/// is rebuilt fresh every cycle under this policy, so there is nothing to
	/// persist here.
	pub fn arbitrate_public(&mut self, candidates:&[Candidate]) -> Option<usize>
	{
		if candidates.is_empty()
		{
			return None;
		}
		let mut best = 0;
		for (pos,candidate) in candidates.iter().enumerate()
		{
			if candidate.priority < candidates[best].priority
			{
				best = pos;
			}
		}
		if !self.ports[candidates[best].in_dir_idx].vcs[candidates[best].vc_id].has_credit()
		{
			for candidate in candidates
			{
				self.ports[candidate.in_dir_idx].vcs[candidate.vc_id].reset_credit();
			}
		}
		Some(best)
	}

	/// Round-robin: records that `(in_dir_idx, vc_id)` has a flit ready to
	/// leave via `out_idx` this cycle. A no-op if it is already queued there;
	/// otherwise it joins the **back** — a VC only re-enters contention this
	/// way once it has fallen out of the queue entirely (exhausted its
	/// quantum, or emptied) and come back with something new to send.
	pub fn rr_note_eligible(&mut self, out_idx:usize, in_dir_idx:usize, vc_id:usize)
	{
		let already_queued = self.rr_queues[out_idx].iter().any(|&(d,v)|d==in_dir_idx && v==vc_id);
		if !already_queued && self.ports[in_dir_idx].vcs[vc_id].has_credit()
		{
			self.rr_queues[out_idx].push_back((in_dir_idx,vc_id));
		}
	}

	/// Round-robin: pops `out_idx`'s next winner. Entries left stale by a VC
	/// that has since emptied or gone non-eligible (its flit not yet movable
	/// this cycle) are discarded rather than returned.
	pub fn rr_pop_winner(&mut self, out_idx:usize, cycle:u64) -> Option<(usize,usize)>
	{
		while let Some((in_dir_idx,vc_id)) = self.rr_queues[out_idx].pop_front()
		{
			let ready = self.ports[in_dir_idx].vcs[vc_id].front().map(|flit|flit.can_move(cycle)).unwrap_or(false);
			if !ready
			{
				continue;
			}
			return Some((in_dir_idx,vc_id));
		}
		None
	}

	/// Round-robin: after `(in_dir_idx, vc_id)`'s flit has moved and
	/// `credit_out` applied, either re-queues it at the **front** (still has
	/// budget and more flits of this packet to send — consecutive flits pass
	/// together up to quantum) or resets its credit for the next round (§4.2
	/// step 5).
	pub fn rr_requeue_or_reset(&mut self, out_idx:usize, in_dir_idx:usize, vc_id:usize)
	{
		let vc = &mut self.ports[in_dir_idx].vcs[vc_id];
		if vc.has_credit() && !vc.is_empty()
		{
			self.rr_queues[out_idx].push_front((in_dir_idx,vc_id));
		}
		else
		{
			vc.reset_credit();
		}
	}

	/// Round-robin: the elected `(in_dir_idx, vc_id)` turned out to be blocked
	/// this cycle by a full downstream VC (§4.2 step 4, "restore and wait").
	/// Puts it straight back at the front of `out_idx`'s queue without
	/// touching credit — nothing moved, so neither its quantum nor its
	/// eligibility should be affected.
	pub fn rr_retry(&mut self, out_idx:usize, in_dir_idx:usize, vc_id:usize)
	{
		self.rr_queues[out_idx].push_front((in_dir_idx,vc_id));
	}
}
