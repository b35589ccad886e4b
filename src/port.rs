/*!

Input ports: a bank of `nbvc` virtual channels plus the allocation policy
that picks a free VC for an incoming head flit (§4.1). Output ports are not
a separate owned struct here — they are wiring metadata held by the router
(`OutputTarget` in [`crate::noc`]) since the actual buffering lives on the
*downstream* input port.

*/

use crate::vc::{VirtualChannel,PacketKey};
use crate::config::{Arbitration,PreemptionPolicy};

/// A bank of virtual channels belonging to one side (N/S/E/W/PE) of a router.
#[derive(Debug,Clone)]
pub struct InputPort
{
	pub vcs: Vec<VirtualChannel>,
	/// Where the next round-robin sweep for a free VC should start, so
	/// repeated allocations on this port don't always favor VC 0.
	rr_pointer: usize,
}

impl InputPort
{
	pub fn new(num_vc:usize, vc_size:usize, quantum: &[u32]) -> InputPort
	{
		let vcs = (0..num_vc).map(|id| VirtualChannel::new(id,vc_size,quantum[id])).collect();
		InputPort{ vcs, rr_pointer: 0 }
	}

	pub fn num_vc(&self) -> usize
	{
		self.vcs.len()
	}

	/// `vc_allocator`: the next free (unlocked) VC by cyclic sweep of the bank.
	/// Returns `None` if every VC is locked.
	pub fn allocate_round_robin(&mut self, owner:PacketKey) -> Option<usize>
	{
		let n = self.vcs.len();
		for offset in 0..n
		{
			let idx = (self.rr_pointer+offset) % n;
			if self.vcs[idx].is_free()
			{
				self.vcs[idx].allocate(owner,0);
				self.rr_pointer = (idx+1) % n;
				return Some(idx);
			}
		}
		None
	}

	/// `priority_vc_allocator(prio)`: the free VC whose id equals the
	/// requested priority (modulo the bank size, so configurations with more
	/// priority levels than VCs still resolve to a concrete VC). If that VC
	/// is busy, preempt it when `policy` allows and the incumbent's priority
	/// is numerically worse (a higher number) than the requester's.
	pub fn allocate_priority(&mut self, owner:PacketKey, priority:usize, policy:PreemptionPolicy) -> Option<usize>
	{
		if self.vcs.is_empty()
		{
			return None;
		}
		let idx = priority % self.vcs.len();
		let vc = &mut self.vcs[idx];
		if vc.is_free()
		{
			vc.allocate(owner,priority);
			return Some(idx);
		}
		match policy
		{
			PreemptionPolicy::Forbid => None,
			PreemptionPolicy::BufferSuspended =>
			{
				let incumbent_priority = vc.current_priority().unwrap_or(usize::MAX);
				if priority < incumbent_priority && vc.preempt(owner,priority)
				{
					Some(idx)
				}
				else
				{
					None
				}
			},
		}
	}

	pub fn allocate(&mut self, owner:PacketKey, priority:usize, arbitration:Arbitration, policy:PreemptionPolicy) -> Option<usize>
	{
		match arbitration
		{
			Arbitration::RoundRobin => self.allocate_round_robin(owner),
			Arbitration::PriorityPreempt => self.allocate_priority(owner,priority,policy),
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn owner(id:usize) -> PacketKey
	{
		PacketKey{ message_id:id, instance:0, packet_index:0 }
	}

	#[test]
	fn round_robin_sweeps_before_reporting_full()
	{
		let mut port = InputPort::new(2,4,&[2,2]);
		assert_eq!(port.allocate_round_robin(owner(0)),Some(0));
		assert_eq!(port.allocate_round_robin(owner(1)),Some(1));
		assert_eq!(port.allocate_round_robin(owner(2)),None);
	}

	#[test]
	fn priority_allocator_targets_matching_vc_id()
	{
		let mut port = InputPort::new(2,4,&[2,2]);
		assert_eq!(port.allocate_priority(owner(0),0,PreemptionPolicy::Forbid),Some(0));
		assert_eq!(port.allocate_priority(owner(1),1,PreemptionPolicy::Forbid),Some(1));
	}

	#[test]
	fn priority_allocator_forbid_does_not_preempt()
	{
		let mut port = InputPort::new(1,4,&[2]);
		assert_eq!(port.allocate_priority(owner(5),0,PreemptionPolicy::Forbid),Some(0));
		assert_eq!(port.allocate_priority(owner(9),0,PreemptionPolicy::Forbid),None);
	}
}
