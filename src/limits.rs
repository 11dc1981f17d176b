/// Longest stay accepted by a single booking attempt, in nights.
pub const MAX_STAY_DAYS: u64 = 366;

pub const MAX_OCCUPANT_NAME_LEN: usize = 256;

pub const MAX_REQUESTED_CAPACITY: u32 = 10_000;

/// Upper bound on rooms accepted from a seed file.
pub const MAX_SEED_ROOMS: usize = 100_000;
