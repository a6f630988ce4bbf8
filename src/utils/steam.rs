//! Steam identity conversion

use crate::error::{StatsError, StatsResult};

/// Convert a textual Steam id into its 32-bit account id.
///
/// Accepts legacy `STEAM_X:Y:Z` (account id `Z * 2 + Y`) and
/// `[U:1:N]` (account id `N`).
pub fn account_id(steam_id: &str) -> StatsResult<i64> {
    let invalid = || StatsError::InvalidSteamId(steam_id.to_string());
    let trimmed = steam_id.trim();

    if let Some(rest) = trimmed.strip_prefix("STEAM_") {
        let mut parts = rest.split(':');
        let (Some(_universe), Some(y), Some(z), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let y: u32 = y.parse().map_err(|_| invalid())?;
        let z: u32 = z.parse().map_err(|_| invalid())?;
        if y > 1 {
            return Err(invalid());
        }
        let id = u64::from(z) * 2 + u64::from(y);
        return u32::try_from(id).map(i64::from).map_err(|_| invalid());
    }

    if let Some(inner) = trimmed
        .strip_prefix("[U:")
        .and_then(|s| s.strip_suffix(']'))
    {
        let (_universe, n) = inner.split_once(':').ok_or_else(invalid)?;
        let n: u32 = n.parse().map_err(|_| invalid())?;
        return Ok(i64::from(n));
    }

    Err(invalid())
}
