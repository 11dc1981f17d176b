use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::Room;

/// Pick candidate rooms for `requested` capacity.
///
/// The catalog is shuffled so repeated contention does not keep landing on
/// the same low-id rooms. Rooms are then taken in shuffled order while the
/// running capacity is still `<= requested`; the check happens before each
/// room, so the last room taken may push the sum past the target.
///
/// Non-empty whenever `catalog` is. The result is not yet known to be free.
pub fn select_candidates<R: Rng + ?Sized>(catalog: &[Room], requested: u32, rng: &mut R) -> Vec<Room> {
    let mut shuffled = catalog.to_vec();
    shuffled.shuffle(rng);

    let mut total: u64 = 0;
    let mut selected = Vec::new();
    for room in shuffled {
        if total > u64::from(requested) {
            break;
        }
        total += u64::from(room.capacity);
        selected.push(room);
    }
    selected
}
