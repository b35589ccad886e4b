/*!

A virtual channel: a bounded FIFO of flits plus the credit and allocation-lock
bookkeeping described in §4.1. Enqueue/dequeue never panic or raise: every
operation returns an explicit success flag and the caller is responsible for
`restore`-ing a flit it failed to move downstream, mirroring hardware
wire-level accept signals (§9 Backpressure representation).

*/

use std::collections::VecDeque;
use crate::traffic::Flit;

/// Which packet, if any, currently owns a VC's allocation lock.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct PacketKey
{
	pub message_id: usize,
	pub instance: u64,
	pub packet_index: usize,
}

impl PacketKey
{
	pub fn of(flit:&Flit) -> PacketKey
	{
		PacketKey{ message_id: flit.message_id, instance: flit.instance, packet_index: flit.packet_index }
	}
}

/// A suspended packet's remaining flits, kept aside by the `BufferSuspended`
/// preemption policy (§9) until the preempting packet releases the VC.
#[derive(Debug,Clone)]
pub struct SuspendedPacket
{
	pub owner: PacketKey,
	pub flits: VecDeque<Flit>,
}

/// Bounded FIFO of flits with capacity `VC_SIZE`, a credit counter and an
/// allocation lock. `id` is this VC's priority rank: lower id wins
/// priority-preemptive arbitration.
#[derive(Debug,Clone)]
pub struct VirtualChannel
{
	pub id: usize,
	capacity: usize,
	quantum: u32,
	credit: u32,
	flits: VecDeque<Flit>,
	lock: Option<PacketKey>,
	/// Priority of whoever currently holds `lock`. Tracked separately from the
	/// VC's own `id` because, when more distinct message priorities exist than
	/// VCs, `priority_vc_allocator` maps several priorities onto the same VC id
	/// (§9) and the incumbent's priority may then differ from a new requester's.
	current_priority: Option<usize>,
	suspended: Option<SuspendedPacket>,
}

impl VirtualChannel
{
	pub fn new(id:usize, capacity:usize, quantum:u32) -> VirtualChannel
	{
		VirtualChannel{
			id,
			capacity,
			quantum,
			credit: quantum,
			flits: VecDeque::new(),
			lock: None,
			current_priority: None,
			suspended: None,
		}
	}

	pub fn len(&self) -> usize
	{
		self.flits.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.flits.is_empty()
	}

	pub fn is_full(&self) -> bool
	{
		self.flits.len() >= self.capacity
	}

	/// Accepts `flit` if there is room. Returns whether it was accepted.
	pub fn enqueue(&mut self, flit:Flit) -> bool
	{
		if self.is_full()
		{
			return false;
		}
		self.flits.push_back(flit);
		true
	}

	/// Removes and returns the head flit. The caller must `restore` it if the
	/// attempted downstream move does not succeed.
	pub fn dequeue(&mut self) -> Option<Flit>
	{
		self.flits.pop_front()
	}

	/// Puts a flit that failed to move back at the head of the queue.
	pub fn restore(&mut self, flit:Flit)
	{
		self.flits.push_front(flit);
	}

	pub fn front(&self) -> Option<&Flit>
	{
		self.flits.front()
	}

	/// Whether this VC is free to be allocated to a new packet (no lock, and
	/// no suspended packet waiting to resume).
	pub fn is_free(&self) -> bool
	{
		self.lock.is_none()
	}

	pub fn locked_to(&self) -> Option<PacketKey>
	{
		self.lock
	}

	/// Sets the allocation lock. Fails (returns `false`) if already locked to
	/// a different packet; locking to the same packet again is a no-op success.
	pub fn allocate(&mut self, owner:PacketKey, priority:usize) -> bool
	{
		match self.lock
		{
			None => { self.lock = Some(owner); self.current_priority = Some(priority); true },
			Some(current) if current==owner => true,
			Some(_) => false,
		}
	}

	/// The priority of whoever currently holds this VC's allocation lock, if any.
	pub fn current_priority(&self) -> Option<usize>
	{
		self.current_priority
	}

	/// Clears the allocation lock. Invoked when the tail flit has been
	/// forwarded, or when preemption completes.
	pub fn release(&mut self)
	{
		self.lock = None;
		self.current_priority = None;
	}

	/// Decrements the credit counter by one, saturating at zero.
	pub fn credit_out(&mut self)
	{
		self.credit = self.credit.saturating_sub(1);
	}

	pub fn credit(&self) -> u32
	{
		self.credit
	}

	/// Whether this VC still has transmission budget left in the current round.
	pub fn has_credit(&self) -> bool
	{
		self.credit > 0
	}

	/// Restores the credit counter to the VC's quantum for the next round.
	pub fn reset_credit(&mut self)
	{
		self.credit = self.quantum;
	}

	/// Takes ownership away from the current lock holder, stashing its
	/// remaining (not yet dequeued) flits in a side buffer, and hands the
	/// lock to `new_owner`. Used only by the `BufferSuspended` preemption
	/// policy (§9); the incumbent must not already be suspended.
	pub fn preempt(&mut self, new_owner:PacketKey, new_priority:usize) -> bool
	{
		let Some(incumbent) = self.lock else { self.lock = Some(new_owner); self.current_priority = Some(new_priority); return true; };
		if incumbent == new_owner
		{
			return true;
		}
		if self.suspended.is_some()
		{
			// Already holding a suspended packet; cannot suspend a second one.
			return false;
		}
		let remaining: VecDeque<Flit> = std::mem::take(&mut self.flits);
		self.suspended = Some(SuspendedPacket{ owner: incumbent, flits: remaining });
		self.lock = Some(new_owner);
		self.current_priority = Some(new_priority);
		true
	}

	/// After the preempting packet's tail releases the VC, splice a suspended
	/// packet's remaining flits back to the front of the queue and restore
	/// its lock. No-op if nothing is suspended.
	pub fn resume_suspended(&mut self)
	{
		if let Some(suspended) = self.suspended.take()
		{
			let resumed_priority = suspended.flits.front().map(|f|f.priority).unwrap_or(0);
			let mut resumed = suspended.flits;
			resumed.extend(std::mem::take(&mut self.flits));
			self.flits = resumed;
			self.lock = Some(suspended.owner);
			self.current_priority = Some(resumed_priority);
		}
	}

	pub fn has_suspended(&self) -> bool
	{
		self.suspended.is_some()
	}

	/// Whether any flit presently queued in this VC belongs to `message_id`.
	/// Used by the PE injection gate to enforce same-flow ordering at the
	/// source (§4.2 PE injection): a new packet of a message must not enter
	/// the mesh while an earlier packet of that same message is still
	/// sitting, undelivered, in one of the source's own input VCs.
	pub fn holds_message(&self, message_id:usize) -> bool
	{
		self.flits.iter().any(|f|f.message_id==message_id)
	}
}
