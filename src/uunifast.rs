/*!

UUniFast (Bini et al.): generates a set of per-task utilizations that sum
exactly to a target aggregate load, uniformly distributed over the
feasible simplex. Used to synthesize a scenario's periodic messages from a
compact `task`/`method`/`load` description (§4.7) rather than enumerating
each message by hand. Grounded in `examples/original_source/gen/generation.py`,
the original traffic generator this crate's scenario format was distilled from.

*/

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use crate::error::Error;
use crate::traffic::{Coord,Message,PACKET_SIZE};
use crate::config::NocConfig;
use crate::scenario::GeneratedSpec;

/// Candidate periods (in cycles) a generated message's period is drawn from,
/// verbatim from `examples/original_source/gen/generation.py`'s `period_array`.
const PERIOD_CANDIDATES: [u64;6] = [50,100,150,200,300,600];
/// Candidate offsets (in cycles) a generated message's phase is drawn from,
/// verbatim from the original's `offset_array`.
const OFFSET_CANDIDATES: [u64;6] = [0,10,15,30,60,80];

/// Splits `target_load` (a utilization in `(0,1]`) into `task_count`
/// per-task utilizations summing to it, via the classic UUniFast recurrence.
pub fn uunifast(task_count:usize, target_load:f64, rng:&mut StdRng) -> Vec<f64>
{
	let mut utilizations = Vec::with_capacity(task_count);
	let mut sum_remaining = target_load;
	for k in 1..task_count
	{
		let next_sum = sum_remaining * rng.random::<f64>().powf(1.0/((task_count-k) as f64));
		utilizations.push(sum_remaining - next_sum);
		sum_remaining = next_sum;
	}
	utilizations.push(sum_remaining);
	utilizations
}

/// Expands a [`GeneratedSpec`] into concrete [`Message`]s: `task` flows, each
/// assigned a random source/destination pair, a period and offset sampled
/// from the fixed candidate sets above, and a size such that `size/period`
/// matches its UUniFast share of `load`. The generator is seeded from
/// `config.seed` so two runs over the same config and spec produce
/// byte-identical scenarios. `spec.method` is validated by the caller
/// ([`crate::scenario::ScenarioFile::resolve`]) before this is reached.
pub fn generate(spec:&GeneratedSpec, config:&NocConfig) -> Result<Vec<Message>,Error>
{
	if spec.task == 0
	{
		return Err(crate::error!(scenario_invalid,"task count must be positive".to_string()));
	}
	if !(spec.load > 0.0 && spec.load <= 1.0)
	{
		return Err(crate::error!(scenario_invalid,"load must be in (0,1]".to_string()));
	}

	let mut rng = StdRng::seed_from_u64(config.seed);
	let utilizations = uunifast(spec.task,spec.load,&mut rng);
	let mut messages = Vec::with_capacity(spec.task);
	for (id,utilization) in utilizations.into_iter().enumerate()
	{
		let period = PERIOD_CANDIDATES[rng.random_range(0..PERIOD_CANDIDATES.len())];
		let offset = OFFSET_CANDIDATES[rng.random_range(0..OFFSET_CANDIDATES.len())];
		let size = ((utilization * period as f64).ceil() as u32).max(PACKET_SIZE);
		// Resolved Open Question (§4.7, DESIGN.md): deadline is uniform between
		// a load-derived lower bound and the period, rather than the original's
		// `randint(0, period+1)` in which the lower bound cancels out.
		let lower_bound = ((spec.load * period as f64) as u64).min(period);
		let deadline = lower_bound + rng.random_range(0..=period-lower_bound);
		let src = random_coord(config.dimension,&mut rng);
		let mut dest = random_coord(config.dimension,&mut rng);
		while dest == src
		{
			dest = random_coord(config.dimension,&mut rng);
		}
		messages.push(Message{ id, period, offset, deadline, size, src, dest, priority: id % config.number_of_vc.max(1) });
	}
	Ok(messages)
}

fn random_coord(dimension:usize, rng:&mut StdRng) -> Coord
{
	Coord::new(rng.random_range(0..dimension),rng.random_range(0..dimension))
}
