use anyhow::{Context as _, bail};

/// Parse a single Discord snowflake. Blank input yields `Ok(None)`.
///
/// Zero is rejected because serenity ids are non-zero by construction.
pub fn parse_snowflake(raw: &str) -> anyhow::Result<Option<u64>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let id = value
        .parse::<u64>()
        .with_context(|| format!("`{value}` is not a valid Discord id"))?;
    if id == 0 {
        bail!("Discord ids cannot be zero");
    }

    Ok(Some(id))
}

/// Parse a comma-separated snowflake list, skipping blank entries.
///
/// Order is preserved and repeated ids are kept only once.
pub fn parse_snowflake_list(raw: &str) -> anyhow::Result<Vec<u64>> {
    let mut ids = Vec::new();
    for entry in raw.split(',') {
        let Some(id) = parse_snowflake(entry)? else {
            continue;
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

/// Parse a positive number of seconds, falling back when missing or invalid.
pub fn parse_positive_secs(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}
