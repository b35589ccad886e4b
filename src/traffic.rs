/*!

The traffic data model: coordinates, flits, packets, messages and their periodic
releases (`MessageInstance`). Everything here is plain data; the behavior that
moves flits through the mesh lives in [`crate::mesh_router`] and [`crate::pe`].

*/

use crate::error::Error;

/// Size in bits of a single flit. Four flits make up one packet.
pub const FLIT_SIZE: u32 = 32;
/// Size in bits of a packet's payload portion.
pub const PACKET_SIZE: u32 = 128;
/// Number of flits in every packet: `ceil(PACKET_SIZE / FLIT_SIZE)`.
pub const FLITS_PER_PACKET: usize = (PACKET_SIZE.div_ceil(FLIT_SIZE)) as usize;

/// A router (or PE) location in the mesh, (row, column).
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub struct Coord
{
	pub i: usize,
	pub j: usize,
}

impl Coord
{
	pub fn new(i:usize,j:usize) -> Coord
	{
		Coord{i,j}
	}
	/// Manhattan distance to another coordinate. Used by XY routing's hop count
	/// and by the analytical latency formula.
	pub fn manhattan_distance(&self,other:&Coord) -> usize
	{
		self.i.abs_diff(other.i) + self.j.abs_diff(other.j)
	}
}

impl std::fmt::Display for Coord
{
	fn fmt(&self, f:&mut std::fmt::Formatter<'_>) -> std::fmt::Result
	{
		write!(f,"({},{})",self.i,self.j)
	}
}

/// The five directions a router may forward a flit through: the four
/// mesh-neighbour ports plus the locally attached processing element.
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum Direction
{
	North,
	South,
	East,
	West,
	Pe,
}

impl Direction
{
	/// All five directions, in a fixed arbitration-sweep order.
	pub const ALL: [Direction;5] = [Direction::North,Direction::South,Direction::East,Direction::West,Direction::Pe];

	/// The direction opposite this one on the mesh. `Pe` has no opposite and
	/// this should never be called on it.
	pub fn opposite(&self) -> Direction
	{
		match self
		{
			Direction::North => Direction::South,
			Direction::South => Direction::North,
			Direction::East => Direction::West,
			Direction::West => Direction::East,
			Direction::Pe => panic!("Direction::Pe has no opposite"),
		}
	}
}

/// Position of a flit within its packet.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum FlitKind
{
	Head,
	Body,
	Tail,
}

/// The atomic transport unit. `timestamp` is the cycle at which this flit last
/// moved, so the router pipeline can refuse to move the same flit twice in a
/// single cycle (§5 ordering guarantee).
#[derive(Debug,Clone)]
pub struct Flit
{
	/// Index of this flit within its packet, `0..FLITS_PER_PACKET`.
	pub index: usize,
	pub kind: FlitKind,
	/// Index of the owning packet within its message instance.
	pub packet_index: usize,
	/// True for the last packet of the message instance (the packet whose
	/// tail flit stamps the instance's arrival time).
	pub is_last_packet: bool,
	pub destination: Coord,
	/// Priority rank of the owning message; only consulted under
	/// priority-preemptive arbitration. Doubles as the VC id the flow prefers.
	pub priority: usize,
	/// Identity of the message instance this flit belongs to, for the PE's
	/// per-flow in-order injection check and for stamping depart/arrival times.
	pub message_id: usize,
	pub instance: u64,
	/// Cycle at which this flit last moved. `None` until its first move.
	pub timestamp: Option<u64>,
}

impl Flit
{
	/// Whether this flit is eligible to move in `current_cycle`: it must not
	/// have already moved in this very cycle.
	pub fn can_move(&self,current_cycle:u64) -> bool
	{
		self.timestamp != Some(current_cycle)
	}
	pub fn stamp(&mut self,current_cycle:u64)
	{
		self.timestamp = Some(current_cycle);
	}
}

/// A fixed, ordered sequence of flits. A packet is an indivisible routing
/// unit: all its flits traverse the same VC chain.
#[derive(Debug,Clone)]
pub struct Packet
{
	pub flits: Vec<Flit>,
}

impl Packet
{
	pub fn new(packet_index:usize, is_last_packet:bool, destination:Coord, priority:usize, message_id:usize, instance:u64) -> Packet
	{
		let flits = (0..FLITS_PER_PACKET).map(|index|
		{
			let kind = if index==0 { FlitKind::Head } else if index==FLITS_PER_PACKET-1 { FlitKind::Tail } else { FlitKind::Body };
			Flit{
				index,
				kind,
				packet_index,
				is_last_packet,
				destination,
				priority,
				message_id,
				instance,
				timestamp: None,
			}
		}).collect();
		Packet{ flits }
	}
}

/// A periodic real-time traffic flow between one source and one destination PE.
#[derive(Debug,Clone)]
pub struct Message
{
	pub id: usize,
	pub period: u64,
	pub offset: u64,
	pub deadline: u64,
	pub size: u32,
	pub src: Coord,
	pub dest: Coord,
	/// Priority rank used by priority-preemptive arbitration; also the VC id
	/// this flow's head flits request under that policy.
	pub priority: usize,
}

impl Message
{
	/// Number of packets this message is segmented into: the payload packets
	/// `ceil(size / PACKET_SIZE)` plus a head and tail framing packet.
	pub fn num_packets(&self) -> usize
	{
		self.size.div_ceil(PACKET_SIZE) as usize + 2
	}

	pub fn validate(&self, mesh_dimension:usize) -> Result<(),Error>
	{
		if self.size == 0
		{
			return Err(crate::error!(scenario_invalid,format!("message {}: size must be positive",self.id)));
		}
		if self.period == 0
		{
			return Err(crate::error!(scenario_invalid,format!("message {}: period must be positive",self.id)));
		}
		if self.deadline == 0
		{
			return Err(crate::error!(scenario_invalid,format!("message {}: deadline must be positive",self.id)));
		}
		if self.src == self.dest
		{
			return Err(crate::error!(scenario_invalid,format!("message {}: src and dest coincide at {}",self.id,self.src)));
		}
		for coord in [self.src,self.dest]
		{
			if coord.i >= mesh_dimension || coord.j >= mesh_dimension
			{
				return Err(crate::error!(scenario_invalid,format!("message {}: coordinate {} is outside the {}x{} mesh",self.id,coord,mesh_dimension,mesh_dimension)));
			}
		}
		Ok(())
	}

	/// Every release of this message within `[0,horizon)`, at `offset + k*period`.
	pub fn releases_within(&self, horizon:u64) -> Vec<u64>
	{
		let mut releases = Vec::new();
		let mut t = self.offset;
		while t < horizon
		{
			releases.push(t);
			t += self.period;
		}
		releases
	}
}

fn gcd(a:u64, b:u64) -> u64
{
	if b==0 { a } else { gcd(b,a%b) }
}

fn lcm(a:u64, b:u64) -> u64
{
	a / gcd(a,b) * b
}

/// The hyperperiod of a set of periodic messages: the least common multiple
/// of their periods, i.e. the shortest cycle count after which every
/// message's release pattern repeats. Used as the natural simulation
/// horizon (§4.9), grounded in `examples/original_source/gen/generation.py`'s
/// `hyperperiod` method. `1` for an empty message set.
pub fn hyperperiod(messages:&[Message]) -> u64
{
	messages.iter().map(|m|m.period).fold(1,lcm)
}

/// A concrete release of a [`Message`] at `offset + k*period`: the set of
/// packets actually traversing the mesh for this release, plus bookkeeping
/// for when the first flit departed and the last flit arrived.
#[derive(Debug,Clone)]
pub struct MessageInstance
{
	pub message_id: usize,
	pub instance: u64,
	pub release_cycle: u64,
	pub priority: usize,
	pub src: Coord,
	pub dest: Coord,
	pub deadline: u64,
	pub packets: Vec<Packet>,
	pub depart_cycle: Option<u64>,
	pub arrival_cycle: Option<u64>,
}

impl MessageInstance
{
	pub fn new(message:&Message, instance:u64, release_cycle:u64) -> MessageInstance
	{
		let num_packets = message.num_packets();
		let packets = (0..num_packets).map(|packet_index|
			Packet::new(packet_index, packet_index+1==num_packets, message.dest, message.priority, message.id, instance)
		).collect();
		MessageInstance{
			message_id: message.id,
			instance,
			release_cycle,
			priority: message.priority,
			src: message.src,
			dest: message.dest,
			deadline: message.deadline,
			packets,
			depart_cycle: None,
			arrival_cycle: None,
		}
	}

	pub fn has_arrived(&self) -> bool
	{
		self.arrival_cycle.is_some()
	}

	pub fn latency(&self) -> Option<u64>
	{
		match (self.depart_cycle,self.arrival_cycle)
		{
			(Some(d),Some(a)) => Some(a-d),
			_ => None,
		}
	}

	pub fn deadline_met(&self) -> Option<bool>
	{
		self.latency().map(|l| l <= self.deadline)
	}
}
