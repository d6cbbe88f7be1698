//! State code to upstream state name lookup

/// Two-letter state codes and the upper-case names the upstream filters on
pub const STATE_NAMES: [(&str, &str); 34] = [
    ("UP", "UTTAR PRADESH"),
    ("MP", "MADHYA PRADESH"),
    ("BR", "BIHAR"),
    ("AS", "ASSAM"),
    ("MH", "MAHARASHTRA"),
    ("GJ", "GUJARAT"),
    ("RJ", "RAJASTHAN"),
    ("TN", "TAMIL NADU"),
    ("CG", "CHHATTISGARH"),
    ("KA", "KARNATAKA"),
    ("TS", "TELANGANA"),
    ("OR", "ODISHA"),
    ("AP", "ANDHRA PRADESH"),
    ("PB", "PUNJAB"),
    ("JH", "JHARKHAND"),
    ("HR", "HARYANA"),
    ("AR", "ARUNACHAL PRADESH"),
    ("JK", "JAMMU AND KASHMIR"),
    ("MN", "MANIPUR"),
    ("UK", "UTTARAKHAND"),
    ("KL", "KERALA"),
    ("HP", "HIMACHAL PRADESH"),
    ("ML", "MEGHALAYA"),
    ("WB", "WEST BENGAL"),
    ("MZ", "MIZORAM"),
    ("NL", "NAGALAND"),
    ("TR", "TRIPURA"),
    ("SK", "SIKKIM"),
    ("AN", "ANDAMAN AND NICOBAR"),
    ("LA", "LADAKH"),
    ("PY", "PUDUCHERRY"),
    ("GA", "GOA"),
    ("DD", "DN HAVELI AND DD"),
    ("LD", "LAKSHADWEEP"),
];

/// Resolve a state code to the name used in upstream filters.
///
/// Unknown codes pass through trimmed, so a full state name also works.
/// Blank input resolves to `None`.
pub fn resolve_state_name(state_code: Option<&str>) -> Option<String> {
    let trimmed = state_code?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_uppercase();
    let name = STATE_NAMES
        .iter()
        .find(|(code, _)| *code == upper)
        .map_or(trimmed, |(_, name)| *name);
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_resolve_case_insensitively() {
        assert_eq!(resolve_state_name(Some("MP")).as_deref(), Some("MADHYA PRADESH"));
        assert_eq!(resolve_state_name(Some(" up ")).as_deref(), Some("UTTAR PRADESH"));
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(resolve_state_name(Some(" KERALA ")).as_deref(), Some("KERALA"));
    }

    #[test]
    fn test_blank_resolves_to_none() {
        assert_eq!(resolve_state_name(None), None);
        assert_eq!(resolve_state_name(Some("   ")), None);
    }

    #[test]
    fn test_table_has_unique_codes() {
        let mut codes: Vec<_> = STATE_NAMES.iter().map(|(c, _)| *c).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), STATE_NAMES.len());
    }
}
