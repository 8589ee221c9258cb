//! The `@owner/name` shorthand used by the legacy single-segment lookup
//! endpoint (§6). Distinct from the lossy, slugified [`super::super::skill`]
//! identifier: this round-trips exactly, `parse(format(o, n)) == (o, n)`,
//! as long as neither `o` nor `n` contains a `/`.

pub fn format_identifier(owner: &str, name: &str) -> String {
    format!("@{owner}/{name}")
}

pub fn parse_identifier(identifier: &str) -> Option<(String, String)> {
    let stripped = identifier.strip_prefix('@').unwrap_or(identifier);
    let (owner, name) = stripped.split_once('/')?;
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let (owner, name) = ("acme", "widgets");
        let formatted = format_identifier(owner, name);
        assert_eq!(parse_identifier(&formatted), Some((owner.to_string(), name.to_string())));
    }

    #[test]
    fn rejects_bare_slug() {
        assert_eq!(parse_identifier("no-owner-segment"), None);
    }
}
