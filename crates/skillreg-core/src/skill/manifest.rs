use skillreg_types::error::IngestError;
use skillreg_types::skill::SkillManifest;

/// Splits a `SKILL.md` document into its YAML frontmatter and markdown
/// body. The document must open with a `---` line; the frontmatter ends
/// at the next line that is exactly `---`.
pub fn extract_frontmatter(content: &str) -> Result<(&str, &str), IngestError> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
        .ok_or_else(|| IngestError::InvalidFrontmatter("missing opening ---".to_string()))?;

    let end = rest
        .find("\n---")
        .ok_or_else(|| IngestError::InvalidFrontmatter("missing closing ---".to_string()))?;

    let frontmatter = &rest[..end];
    let after = &rest[end + "\n---".len()..];
    let body = after.strip_prefix('\n').unwrap_or(after).strip_prefix("\r\n").unwrap_or(after);
    Ok((frontmatter, body))
}

/// Parses a `SKILL.md` document into its manifest and body (§4.5 step 3).
pub fn parse_skill_md(content: &str) -> Result<(SkillManifest, String), IngestError> {
    let (frontmatter, body) = extract_frontmatter(content)?;
    let manifest: SkillManifest = serde_yaml_ng::from_str(frontmatter)
        .map_err(|e| IngestError::InvalidFrontmatter(e.to_string()))?;
    Ok((manifest, body.to_string()))
}

fn match_root_remainder<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    if root.is_empty() {
        Some(path)
    } else {
        path.strip_prefix(root).and_then(|rest| rest.strip_prefix('/'))
    }
}

fn is_excluded_remainder(remainder: &str) -> bool {
    let mut components: Vec<&str> = remainder.split('/').collect();
    components.pop();
    components.iter().any(|c| c.starts_with('.'))
}

/// Whether `path` is a candidate `SKILL.md` under the curated discovery
/// roots, respecting the dot-folder exclusion and bounded depth (§4.5
/// step 2).
pub fn is_skill_candidate(path: &str, discovery_paths: &[String], max_depth: u32) -> bool {
    let basename = path.rsplit('/').next().unwrap_or(path);
    if !basename.eq_ignore_ascii_case("SKILL.md") {
        return false;
    }
    discovery_paths.iter().any(|root| {
        match_root_remainder(path, root)
            .map(|remainder| {
                !is_excluded_remainder(remainder) && remainder.matches('/').count() as u32 <= max_depth
            })
            .unwrap_or(false)
    })
}

/// Filters a flat list of repo file paths (as returned by the source
/// host's recursive tree listing) down to candidate `SKILL.md` files.
pub fn discover_skill_paths<'a>(
    all_paths: &'a [String],
    discovery_paths: &[String],
    max_depth: u32,
) -> Vec<&'a str> {
    all_paths
        .iter()
        .map(String::as_str)
        .filter(|p| is_skill_candidate(p, discovery_paths, max_depth))
        .collect()
}

/// The `skillPath` to record on the skill row: empty for repo-root
/// documents, else the directory containing `SKILL.md`.
pub fn skill_path_for(full_path: &str) -> String {
    match full_path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => String::new(),
    }
}

/// Picks a free slug given the set of slugs already in use by a
/// *different* skill identity (§4.5 step 4, §9 open question (a)).
pub fn assign_unique_slug(base_slug: &str, slug_in_use_by_other: impl Fn(&str) -> bool) -> String {
    if !slug_in_use_by_other(base_slug) {
        return base_slug.to_string();
    }
    let mut attempt = 0;
    loop {
        let candidate = skillreg_types::skill::disambiguate_slug(base_slug, attempt);
        if !slug_in_use_by_other(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_frontmatter_and_body() {
        let doc = "---\nname: Foo\ndescription: Does foo\n---\n# Foo\nBody text\n";
        let (fm, body) = extract_frontmatter(doc).expect("extract");
        assert!(fm.contains("name: Foo"));
        assert_eq!(body, "# Foo\nBody text\n");
    }

    #[test]
    fn rejects_missing_opening_marker() {
        let doc = "name: Foo\n---\n";
        assert!(extract_frontmatter(doc).is_err());
    }

    #[test]
    fn parses_manifest_fields() {
        let doc = "---\nname: Foo\ndescription: Does foo\nmodel: opus\nuser-invocable: true\n---\nbody\n";
        let (manifest, body) = parse_skill_md(doc).expect("parse");
        assert_eq!(manifest.name, "Foo");
        assert_eq!(manifest.model.as_deref(), Some("opus"));
        assert_eq!(manifest.user_invocable, Some(true));
        assert_eq!(body, "body\n");
    }

    fn default_roots() -> Vec<String> {
        skillreg_types::config::default_discovery_paths()
    }

    #[test]
    fn accepts_skill_under_skills_dir() {
        assert!(is_skill_candidate("skills/foo/SKILL.md", &default_roots(), 4));
    }

    #[test]
    fn accepts_skill_at_repo_root() {
        assert!(is_skill_candidate("SKILL.md", &default_roots(), 4));
    }

    #[test]
    fn rejects_dot_folder_at_any_depth() {
        assert!(!is_skill_candidate(
            ".claude/skills/bar/SKILL.md",
            &default_roots(),
            4
        ));
    }

    #[test]
    fn rejects_non_skill_basename() {
        assert!(!is_skill_candidate("skills/foo/README.md", &default_roots(), 4));
    }

    #[test]
    fn case_insensitive_basename() {
        assert!(is_skill_candidate("skills/foo/skill.md", &default_roots(), 4));
    }

    #[test]
    fn scenario_dot_folder_exclusion_yields_zero_candidates() {
        let paths = vec![".claude/skills/bar/SKILL.md".to_string()];
        let found = discover_skill_paths(&paths, &default_roots(), 4);
        assert!(found.is_empty());
    }

    #[test]
    fn unique_slug_disambiguates_on_collision() {
        let taken = ["acme-widget", "acme-widget-1"];
        let resolved = assign_unique_slug("acme-widget", |s| taken.contains(&s));
        assert_eq!(resolved, "acme-widget-2");
    }
}
