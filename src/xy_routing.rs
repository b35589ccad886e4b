/*!

Deterministic dimension-order (XY) routing (§4.2): a flit first travels
along its column (`j`) and only turns onto its row (`i`) once `j` matches
the destination. This never has to consult any network state, so it is a
pure function of position.

*/

use crate::traffic::{Coord,Direction};

/// The next hop direction for a flit presently at `here`, bound for `destination`.
/// Returns `Direction::Pe` once `here == destination`, meaning "eject locally".
pub fn next_direction(here:Coord, destination:Coord) -> Direction
{
	if here.j < destination.j
	{
		Direction::East
	}
	else if here.j > destination.j
	{
		Direction::West
	}
	else if here.i < destination.i
	{
		Direction::South
	}
	else if here.i > destination.i
	{
		Direction::North
	}
	else
	{
		Direction::Pe
	}
}
