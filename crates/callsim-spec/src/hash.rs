//! Seed derivation and content hashing.
//!
//! Every stochastic stage of a render draws from its own random stream. The
//! stream seed is a pure function of the stage name, the render's global seed
//! and a per-stage local index:
//!
//! ```text
//! substream_seed = truncate_u32(BLAKE3(stage_name || 0x00 || global_seed || local_index))
//! ```
//!
//! Two renders with the same global seed therefore see the same randomness in
//! every stage, and adding or reordering stages never shifts another stage's
//! stream.

/// Derives the seed for one stochastic stage of a render.
///
/// # Arguments
/// * `stage_name` - Stable identifier of the stage (e.g. "dropout", "events")
/// * `global_seed` - The render's global seed
/// * `local_index` - Index distinguishing several uses of the same stage
///
/// # Returns
/// * A derived u32 seed
///
/// # Example
/// ```
/// use callsim_spec::hash::substream_seed;
///
/// let traffic = substream_seed("events", 42, 0);
/// let baby = substream_seed("events", 42, 1);
/// assert_ne!(traffic, baby);
/// assert_eq!(traffic, substream_seed("events", 42, 0));
/// ```
pub fn substream_seed(stage_name: &str, global_seed: u32, local_index: u32) -> u32 {
    let mut input = Vec::with_capacity(stage_name.len() + 9);
    input.extend_from_slice(stage_name.as_bytes());
    // Separator keeps ("ab", ..) and ("a", ..) from colliding on the same bytes
    input.push(0);
    input.extend_from_slice(&global_seed.to_le_bytes());
    input.extend_from_slice(&local_index.to_le_bytes());

    let hash = blake3::hash(&input);

    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&hash.as_bytes()[0..4]);
    u32::from_le_bytes(bytes)
}

/// Computes a BLAKE3 hash of arbitrary data.
///
/// # Returns
/// * A 64-character lowercase hexadecimal string
pub fn blake3_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}
