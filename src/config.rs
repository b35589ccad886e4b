/*!

Static simulation configuration: mesh dimension, per-VC buffer size, VC
count, round-robin quantum lengths and the arbitration/preemption policy
pair (§3, §9). Parsed from YAML with `serde` + `serde_yaml_ng`, the same
stack the wider example pack uses for its configuration files. The on-disk
shape (a nested `noc:` section plus a sibling `quantum:` mapping, camelCase
`numberOfVC`/`VCBufferSize` keys, `"RR"`/`"PRIORITY_PREEMPT"` arbitration
strings) mirrors `examples/original_source/gen/generation.py`'s `config`
method exactly, since that is the format this crate's scenario directories
are distilled from.

*/

use std::collections::BTreeMap;
use std::path::Path;
use serde::Deserialize;
use crate::error::Error;

/// Which allocator picks a free VC for an arriving head flit (§4.1). Parsed
/// by hand from the raw `arbitration` string in [`NocSection`] rather than
/// derived `Deserialize`, so an unrecognized value is reported as
/// `ErrorKind::ConfigInvalid` (§7) instead of a generic parse failure.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Arbitration
{
	/// `vc_allocator`: cyclic sweep over free VCs, no regard to message priority.
	RoundRobin,
	/// `priority_vc_allocator`: route a flow to the VC matching its priority,
	/// optionally preempting a lower-priority incumbent.
	PriorityPreempt,
}

/// Whether `PriorityPreempt` arbitration may suspend a busy VC's incumbent
/// packet to let a higher-priority packet through (§9 Open Question,
/// resolved). Parsed by hand for the same reason as [`Arbitration`].
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum PreemptionPolicy
{
	/// A busy VC is simply unavailable, regardless of priority.
	Forbid,
	/// A higher-priority requester suspends the incumbent into a side buffer
	/// and resumes it once the VC is released.
	BufferSuspended,
}

impl Default for PreemptionPolicy
{
	fn default() -> PreemptionPolicy
	{
		PreemptionPolicy::Forbid
	}
}

/// The `noc:` section of a config file.
#[derive(Debug,Clone,Deserialize)]
pub struct NocSection
{
	/// Mesh side length; the network has `dimension * dimension` routers.
	pub dimension: usize,
	/// Number of virtual channels per input port.
	#[serde(rename = "numberOfVC")]
	pub number_of_vc: usize,
	/// Flit capacity of every virtual channel's buffer.
	#[serde(rename = "VCBufferSize")]
	pub vc_buffer_size: usize,
	/// `"RR"` or `"PRIORITY_PREEMPT"`, hand-matched in [`NocConfig::from_raw`]
	/// so an unrecognized value surfaces as `ErrorKind::ConfigInvalid` rather
	/// than failing at the YAML-parse layer.
	pub arbitration: String,
	/// Ambient field beyond the original format: which preemption discipline
	/// `PriorityPreempt` arbitration uses (§9 Open Question, resolved). Only
	/// consulted when `arbitration` is `PriorityPreempt`. Hand-matched for the
	/// same reason as `arbitration`.
	#[serde(default = "default_preemption_policy")]
	pub preemption: String,
	/// Cycle latency of a single hop through a router's switch, added once per
	/// hop by the analytical latency formula (§4.5).
	#[serde(default = "default_network_access_latency")]
	pub network_access_latency: u64,
	/// RNG seed for synthetic scenario generation (UUniFast, §4.7).
	#[serde(default)]
	pub seed: u64,
}

fn default_network_access_latency() -> u64
{
	1
}

fn default_preemption_policy() -> String
{
	"forbid".to_string()
}

/// Top-level shape of a `config.yml` file: a `noc:` section plus a sibling
/// `quantum:` mapping keyed by VC id, exactly as
/// `examples/original_source/gen/generation.py`'s `config` method parses it.
#[derive(Debug,Clone,Deserialize)]
pub struct NocConfigFile
{
	pub noc: NocSection,
	/// Round-robin quantum, in flits, granted to VC `k` on each allocation
	/// round. A mapping (not a bare sequence) of length `numberOfVC`, keyed by
	/// VC id `0..numberOfVC`, mirroring the original's `quantum.items()` loop.
	pub quantum: BTreeMap<usize,u32>,
}

/// Validated configuration, ready to build a [`crate::noc::Noc`] from.
#[derive(Debug,Clone)]
pub struct NocConfig
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

impl NocConfig
{
	pub fn from_file(path:&Path) -> Result<NocConfig,Error>
	{
		let text = std::fs::read_to_string(path).map_err(|e| crate::error!(could_not_open_file,path.to_path_buf(),e))?;
		let raw: NocConfigFile = serde_yaml_ng::from_str(&text).map_err(|e| crate::error!(could_not_parse_file,path.to_path_buf(),e))?;
		NocConfig::from_raw(raw)
	}

	pub fn from_raw(raw:NocConfigFile) -> Result<NocConfig,Error>
	{
		let NocConfigFile{ noc, quantum } = raw;
		if noc.dimension == 0
		{
			return Err(crate::error!(config_invalid,"dimension must be positive".to_string()));
		}
		if noc.number_of_vc == 0
		{
			return Err(crate::error!(config_invalid,"numberOfVC must be positive".to_string()));
		}
		if noc.vc_buffer_size == 0
		{
			return Err(crate::error!(config_invalid,"VCBufferSize must be positive".to_string()));
		}
		let arbitration = match noc.arbitration.as_str()
		{
			"RR" => Arbitration::RoundRobin,
			"PRIORITY_PREEMPT" => Arbitration::PriorityPreempt,
			other => return Err(crate::error!(config_invalid,format!("unknown arbitration policy {:?}",other))),
		};
		let preemption = match noc.preemption.as_str()
		{
			"forbid" => PreemptionPolicy::Forbid,
			"buffer_suspended" => PreemptionPolicy::BufferSuspended,
			other => return Err(crate::error!(config_invalid,format!("unknown preemption policy {:?}",other))),
		};
		if quantum.len() != noc.number_of_vc
		{
			return Err(crate::error!(config_invalid,format!("quantum has {} entries but numberOfVC is {}",quantum.len(),noc.number_of_vc)));
		}
		let mut dense_quantum = Vec::with_capacity(noc.number_of_vc);
		for id in 0..noc.number_of_vc
		{
			let Some(&q) = quantum.get(&id) else
			{
				return Err(crate::error!(config_invalid,format!("quantum is missing an entry for VC id {}",id)));
			};
			if q == 0
			{
				return Err(crate::error!(config_invalid,"every quantum entry must be positive".to_string()));
			}
			dense_quantum.push(q);
		}
		Ok(NocConfig{
			dimension: noc.dimension,
			number_of_vc: noc.number_of_vc,
			vc_buffer_size: noc.vc_buffer_size,
			quantum: dense_quantum,
			arbitration,
			preemption,
			network_access_latency: noc.network_access_latency,
			seed: noc.seed,
		})
	}
}
