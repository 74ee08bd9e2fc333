/// Number of field positions in an activation pattern.
pub const FIELD_COUNT: usize = 8;

/// Period of the activation pattern: 2^FIELD_COUNT.
pub const PATTERN_PERIOD: u32 = 1 << FIELD_COUNT;

/// Width of one page window.
pub const PAGE_SIZE: u32 = 48;

/// Tolerance for the unity product of the frequency pair (constant[4] × constant[5]).
pub const UNITY_TOLERANCE: f64 = 1e-15;

/// Tolerance when re-deriving a defined constant from its expression.
pub const DRIFT_TOLERANCE: f64 = 1e-12;

/// Default iteration budget for a single factorization.
pub const DEFAULT_MAX_ITERATIONS: u64 = 100;

/// Minimum primality confidence for a cofactor to be reported as a probable prime.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.8;

/// Largest prime tried by the trial division stage (the primes below 256).
pub const TRIAL_PRIME_BOUND: u32 = 251;

/// Extra seeded Miller-Rabin rounds above the deterministic range.
pub const EXTRA_PRIMALITY_ROUNDS: u32 = 8;

/// Miller-Rabin bases that are deterministic below [`DETERMINISTIC_LIMIT`].
pub const DETERMINISTIC_BASES: [u32; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];

/// 3.317 × 10^24: the 13 prime bases 2..=41 decide primality exactly below this.
pub const DETERMINISTIC_LIMIT: u128 = 3_317_044_064_679_887_385_961_981;
