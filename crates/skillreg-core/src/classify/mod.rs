//! Classification Worker (C6): keyword scoring against the predefined
//! category table plus an optional AI-suggestion pass.

use std::future::Future;

use skillreg_types::category::{Category, CategoryKind, SkillCategory, OTHER_CATEGORY_SLUG};
use skillreg_types::error::ClassifyError;
use uuid::Uuid;

const CONTENT_SNIPPET_CHARS: usize = 4096;
const MAX_CATEGORIES: usize = 5;

/// An external text-model provider that proposes categories. No
/// implementation is wired into the core -- this is the trait seam a
/// provider plugs into without the worker changing (§4.6 step 2).
pub trait CategorySuggester: Send + Sync {
    /// Returns up to 5 slugs from `predefined` plus up to 2 new short
    /// slugs not on that list.
    fn suggest(
        &self,
        name: &str,
        description: &str,
        content_snippet: &str,
        predefined: &[Category],
    ) -> impl Future<Output = Result<Vec<String>, ClassifyError>> + Send;
}

/// The default no-op provider: classification stays self-contained
/// without any model execution in scope.
pub struct NoopSuggester;

impl CategorySuggester for NoopSuggester {
    async fn suggest(
        &self,
        _name: &str,
        _description: &str,
        _content_snippet: &str,
        _predefined: &[Category],
    ) -> Result<Vec<String>, ClassifyError> {
        Ok(Vec::new())
    }
}

pub struct ClassificationResult {
    pub categories: Vec<SkillCategory>,
    /// New `ai-suggested` category rows to insert-if-absent before the
    /// `SkillCategory` replace.
    pub new_ai_suggested: Vec<Category>,
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

fn score_keyword(category: &Category, haystack_lower: &str) -> f64 {
    category
        .keywords
        .iter()
        .map(|k| count_occurrences(haystack_lower, &k.to_lowercase()))
        .sum::<usize>() as f64
}

fn humanize(slug: &str) -> String {
    slug.replace('-', " ")
}

/// Produces 1-5 categories for a skill (§4.6). If the provider is absent
/// or fails, the keyword pass is authoritative; a skill that scores zero
/// and gets no suggestions receives `other`.
pub async fn classify<Sug: CategorySuggester>(
    skill_id: Uuid,
    name: &str,
    description: &str,
    content: &str,
    predefined: &[Category],
    suggester: Option<&Sug>,
) -> ClassificationResult {
    let snippet: String = content.chars().take(CONTENT_SNIPPET_CHARS).collect();
    let haystack = format!("{name} {description} {snippet}").to_lowercase();

    let mut scored: Vec<(String, f64)> = predefined
        .iter()
        .map(|c| (c.slug.clone(), score_keyword(c, &haystack)))
        .filter(|(_, score)| *score > 0.0)
        .collect();

    let mut new_ai_suggested = Vec::new();

    if let Some(suggester) = suggester {
        if let Ok(slugs) = suggester.suggest(name, description, &snippet, predefined).await {
            for slug in slugs {
                if predefined.iter().any(|c| c.slug == slug) {
                    if let Some(existing) = scored.iter_mut().find(|(s, _)| *s == slug) {
                        existing.1 += 1.0;
                    } else {
                        scored.push((slug, 1.0));
                    }
                } else {
                    scored.push((slug.clone(), 0.5));
                    new_ai_suggested.push(Category {
                        slug: slug.clone(),
                        name: humanize(&slug),
                        description: String::new(),
                        keywords: Vec::new(),
                        kind: CategoryKind::AiSuggested,
                    });
                }
            }
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(MAX_CATEGORIES);

    let categories = if scored.is_empty() {
        vec![SkillCategory {
            skill_id,
            category_slug: OTHER_CATEGORY_SLUG.to_string(),
            score: 1.0,
        }]
    } else {
        scored
            .into_iter()
            .map(|(category_slug, score)| SkillCategory {
                skill_id,
                category_slug,
                score,
            })
            .collect()
    };

    ClassificationResult {
        categories,
        new_ai_suggested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predefined() -> Vec<Category> {
        vec![
            Category {
                slug: "testing".into(),
                name: "Testing".into(),
                description: String::new(),
                keywords: vec!["test".into(), "pytest".into()],
                kind: CategoryKind::Predefined,
            },
            Category {
                slug: "web".into(),
                name: "Web".into(),
                description: String::new(),
                keywords: vec!["http".into(), "browser".into()],
                kind: CategoryKind::Predefined,
            },
        ]
    }

    #[tokio::test]
    async fn keyword_pass_picks_matching_category() {
        let result = classify::<NoopSuggester>(
            Uuid::nil(),
            "Pytest helper",
            "Runs unit tests",
            "uses pytest fixtures",
            &predefined(),
            None,
        )
        .await;
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[0].category_slug, "testing");
    }

    #[tokio::test]
    async fn no_match_yields_other() {
        let result = classify::<NoopSuggester>(
            Uuid::nil(),
            "Foo",
            "Does foo",
            "nothing relevant here",
            &predefined(),
            None,
        )
        .await;
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[0].category_slug, OTHER_CATEGORY_SLUG);
    }

    #[tokio::test]
    async fn truncates_to_five() {
        let many: Vec<Category> = (0..10)
            .map(|i| Category {
                slug: format!("cat{i}"),
                name: format!("Cat {i}"),
                description: String::new(),
                keywords: vec!["widget".into()],
                kind: CategoryKind::Predefined,
            })
            .collect();
        let result = classify::<NoopSuggester>(Uuid::nil(), "Widget", "a widget", "widget widget", &many, None)
            .await;
        assert!(result.categories.len() <= MAX_CATEGORIES);
    }
}
