use meshvc_sim::config::{NocConfig,Arbitration,PreemptionPolicy};
use meshvc_sim::traffic::{Coord,Message};

/// Encapsulates the parameters needed to build a [`NocConfig`] for a test,
/// filled in with reasonable defaults so a test only needs to override what
/// it actually cares about.
pub struct NocConfigBuilder
{
	pub dimension: usize,
	pub number_of_vc: usize,
	pub vc_buffer_size: usize,
	pub quantum: Vec<u32>,
	pub arbitration: Arbitration,
	pub preemption: PreemptionPolicy,
	pub network_access_latency: u64,
	pub seed: u64,
}

impl Default for NocConfigBuilder
{
	fn default() -> NocConfigBuilder
	{
		NocConfigBuilder{
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
}

pub fn create_noc_config(arg:NocConfigBuilder) -> NocConfig
{
	NocConfig{
		dimension: arg.dimension,
		number_of_vc: arg.number_of_vc,
		vc_buffer_size: arg.vc_buffer_size,
		quantum: arg.quantum,
		arbitration: arg.arbitration,
		preemption: arg.preemption,
		network_access_latency: arg.network_access_latency,
		seed: arg.seed,
	}
}

/// Encapsulates the parameters needed to build a single periodic [`Message`].
pub struct MessageBuilder
{
	pub id: usize,
	pub period: u64,
	pub offset: u64,
	pub deadline: u64,
	pub size: u32,
	pub src: (usize,usize),
	pub dest: (usize,usize),
	pub priority: usize,
}

impl Default for MessageBuilder
{
	fn default() -> MessageBuilder
	{
		MessageBuilder{
			id: 0,
			period: 1000,
			offset: 0,
			deadline: 1000,
			size: 32,
			src: (0,0),
			dest: (0,1),
			priority: 0,
		}
	}
}

pub fn create_message(arg:MessageBuilder) -> Message
{
	Message{
		id: arg.id,
		period: arg.period,
		offset: arg.offset,
		deadline: arg.deadline,
		size: arg.size,
		src: Coord::new(arg.src.0,arg.src.1),
		dest: Coord::new(arg.dest.0,arg.dest.1),
		priority: arg.priority,
	}
}
