//! Query normalization, term expansion, and intent classification.

use hybrid_rag_domain::{QueryIntent, SourceType};
use hybrid_rag_ports::{IntentClassifierPort, LogFields, LoggerPort};
use hybrid_rag_shared::{RequestContext, timeout_with_context};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Abbreviations and domain terms with the phrases they pull in.
///
/// Triggers and phrases are compared as lowercase token sequences.
const EXPANSIONS: &[(&str, &[&str])] = &[
    (
        "api",
        &["application programming interface", "REST API", "endpoint"],
    ),
    (
        "product requirements",
        &["PRD", "requirements document", "specification"],
    ),
    ("prd", &["product requirements document"]),
    ("ui", &["user interface"]),
    ("ux", &["user experience"]),
    ("db", &["database"]),
    ("k8s", &["kubernetes"]),
    ("ci", &["continuous integration"]),
    ("cd", &["continuous deployment"]),
    ("pr", &["pull request"]),
    ("mr", &["merge request"]),
    ("sso", &["single sign-on"]),
    ("auth", &["authentication", "authorization"]),
    ("repo", &["repository"]),
    ("config", &["configuration"]),
    ("docs", &["documentation"]),
];

/// Keywords that point at one source system.
const SOURCE_KEYWORDS: &[(SourceType, &[&str])] = &[
    (SourceType::Jira, &["jira", "ticket", "tickets", "bug", "bugs", "issue", "issues", "epic"]),
    (SourceType::Confluence, &["confluence", "wiki", "page", "pages", "space"]),
    (
        SourceType::Git,
        &["git", "commit", "commits", "branch", "repository", "function", "class", "code"],
    ),
    (
        SourceType::Documentation,
        &["documentation", "guide", "manual", "readme", "tutorial"],
    ),
];

const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of analyzing one raw query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedQuery {
    /// Raw caller input.
    pub original: Box<str>,
    /// Whitespace-normalized input.
    pub cleaned: Box<str>,
    /// Cleaned input plus expansion phrases.
    pub expanded: Box<str>,
    /// Classified intent (`General` on any classifier failure).
    pub intent: QueryIntent,
    /// Advisory source hint. Never used as a filter.
    pub source_hint: Option<SourceType>,
}

/// Query expander with an optional intent classifier.
#[derive(Clone, Default)]
pub struct QueryExpander {
    classifier: Option<Arc<dyn IntentClassifierPort>>,
    logger: Option<Arc<dyn LoggerPort>>,
    classify_timeout: Option<Duration>,
}

impl QueryExpander {
    /// Expander without a classifier; every query classifies as `General`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an intent classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifierPort>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Bound each classifier call.
    #[must_use]
    pub const fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = Some(timeout);
        self
    }

    /// Attach a logger for fallback diagnostics.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Pure term expansion. See [`expand_query`].
    #[must_use]
    pub fn expand(&self, query: &str) -> String {
        expand_query(query)
    }

    /// Classify `text`, falling back to `General` on any failure.
    pub async fn classify(&self, ctx: &RequestContext, text: &str) -> QueryIntent {
        let Some(classifier) = self.classifier.as_ref() else {
            return QueryIntent::General;
        };
        if text.trim().is_empty() {
            return QueryIntent::General;
        }

        let timeout = self.classify_timeout.unwrap_or(DEFAULT_CLASSIFY_TIMEOUT);
        let outcome = timeout_with_context(
            ctx,
            timeout,
            "query_expander.classify",
            classifier.classify(ctx, text.into()),
        )
        .await;

        match outcome {
            Ok(intent) => intent,
            Err(error) => {
                if let Some(logger) = self.logger.as_ref() {
                    let mut fields = LogFields::new();
                    fields.insert("errorCode".into(), Value::String(error.code.to_string()));
                    fields.insert("reason".into(), Value::String(error.message.clone()));
                    logger.debug(
                        "query.classify_fallback",
                        "Intent classification failed; using general",
                        Some(fields),
                    );
                }
                QueryIntent::General
            },
        }
    }

    /// Normalize and expand without classifying; the intent is `General`.
    ///
    /// The expanded text is final at this point, so retrieval can start while
    /// [`QueryExpander::classify`] runs.
    #[must_use]
    pub fn prepare(&self, query: &str) -> ExpandedQuery {
        let cleaned = normalize_whitespace(query);
        let expanded = expand_query(&cleaned);
        let source_hint = source_hint(&cleaned, QueryIntent::General);

        ExpandedQuery {
            original: query.into(),
            cleaned: cleaned.into_boxed_str(),
            expanded: expanded.into_boxed_str(),
            intent: QueryIntent::General,
            source_hint,
        }
    }

    /// Normalize, expand, and classify a raw query.
    pub async fn analyze(&self, ctx: &RequestContext, query: &str) -> ExpandedQuery {
        let prepared = self.prepare(query);
        let intent = self.classify(ctx, &prepared.cleaned).await;
        prepared.with_intent(intent)
    }
}

impl ExpandedQuery {
    /// Record the classified intent and recompute the source hint.
    #[must_use]
    pub fn with_intent(mut self, intent: QueryIntent) -> Self {
        self.source_hint = source_hint(&self.cleaned, intent);
        self.intent = intent;
        self
    }
}

/// Collapse runs of whitespace to one space and trim the ends.
#[must_use]
pub fn normalize_whitespace(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expand recognized abbreviations and domain terms.
///
/// Every original token is kept. Phrases are appended in table order until no
/// trigger adds anything new, so `expand_query(expand_query(q)) == expand_query(q)`.
#[must_use]
pub fn expand_query(query: &str) -> String {
    let mut text = normalize_whitespace(query);
    if text.is_empty() {
        return text;
    }

    let mut tokens = match_tokens(&text);
    loop {
        let mut appended = false;
        for (trigger, phrases) in EXPANSIONS {
            if !contains_sequence(&tokens, &match_tokens(trigger)) {
                continue;
            }
            for phrase in *phrases {
                let phrase_tokens = match_tokens(phrase);
                if contains_sequence(&tokens, &phrase_tokens) {
                    continue;
                }
                text.push(' ');
                text.push_str(phrase);
                tokens.extend(phrase_tokens);
                appended = true;
            }
        }
        if !appended {
            return text;
        }
    }
}

/// Advisory source hint: keyword match first, then the intent mapping.
#[must_use]
pub fn source_hint(cleaned: &str, intent: QueryIntent) -> Option<SourceType> {
    let tokens = match_tokens(cleaned);
    let by_keyword = SOURCE_KEYWORDS.iter().find_map(|(source_type, keywords)| {
        tokens
            .iter()
            .any(|token| keywords.contains(&token.as_str()))
            .then_some(*source_type)
    });

    by_keyword.or(match intent {
        QueryIntent::Code => Some(SourceType::Git),
        QueryIntent::Issue => Some(SourceType::Jira),
        QueryIntent::Documentation => Some(SourceType::Documentation),
        QueryIntent::General => None,
    })
}

fn match_tokens(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_sequence(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && haystack
            .windows(needle.len())
            .any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_ports::BoxFuture;
    use hybrid_rag_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClassifier {
        outcome: Result<QueryIntent>,
        calls: Arc<AtomicUsize>,
    }

    impl IntentClassifierPort for FixedClassifier {
        fn classify(
            &self,
            _ctx: &RequestContext,
            _text: Box<str>,
        ) -> BoxFuture<'_, Result<QueryIntent>> {
            let outcome = self.outcome.clone();
            let calls = Arc::clone(&self.calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                outcome
            })
        }
    }

    struct StalledClassifier;

    impl IntentClassifierPort for StalledClassifier {
        fn classify(
            &self,
            _ctx: &RequestContext,
            _text: Box<str>,
        ) -> BoxFuture<'_, Result<QueryIntent>> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(QueryIntent::Code)
            })
        }
    }

    fn count_token(text: &str, token: &str) -> usize {
        match_tokens(text).iter().filter(|t| *t == token).count()
    }

    #[test]
    fn api_is_expanded_with_related_phrases() {
        let expanded = expand_query("product requirements for API");
        assert!(expanded.starts_with("product requirements for API"));
        assert!(count_token(&expanded, "api") > 1);
        assert!(expanded.contains("application programming interface"));
        assert!(expanded.contains("PRD"));
    }

    #[test]
    fn whitespace_is_collapsed_and_tokens_kept() {
        assert_eq!(expand_query("  deploy   the\tservice \n"), "deploy the service");
        assert_eq!(expand_query("   "), "");
    }

    #[test]
    fn present_phrases_are_not_appended_again() {
        let expanded = expand_query("db database");
        assert_eq!(expanded, "db database");
    }

    #[test]
    fn expansion_is_idempotent_for_known_terms() {
        let once = expand_query("k8s ci/cd for the auth api");
        let twice = expand_query(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn source_hint_prefers_keywords_over_intent() {
        assert_eq!(
            source_hint("open jira tickets", QueryIntent::Code),
            Some(SourceType::Jira)
        );
        assert_eq!(
            source_hint("how do we deploy", QueryIntent::Code),
            Some(SourceType::Git)
        );
        assert_eq!(source_hint("how do we deploy", QueryIntent::General), None);
    }

    #[tokio::test]
    async fn missing_classifier_yields_general() {
        let ctx = RequestContext::new_request();
        let analysis = QueryExpander::new().analyze(&ctx, "  login  flow ").await;
        assert_eq!(analysis.cleaned.as_ref(), "login flow");
        assert_eq!(analysis.intent, QueryIntent::General);
        assert_eq!(analysis.source_hint, None);
    }

    #[tokio::test]
    async fn classifier_result_drives_source_hint() {
        let calls = Arc::new(AtomicUsize::new(0));
        let expander = QueryExpander::new().with_classifier(Arc::new(FixedClassifier {
            outcome: Ok(QueryIntent::Issue),
            calls: Arc::clone(&calls),
        }));

        let ctx = RequestContext::new_request();
        let analysis = expander.analyze(&ctx, "login fails on safari").await;
        assert_eq!(analysis.intent, QueryIntent::Issue);
        assert_eq!(analysis.source_hint, Some(SourceType::Jira));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn classifier_errors_fall_back_to_general() {
        let expander = QueryExpander::new().with_classifier(Arc::new(FixedClassifier {
            outcome: Err(ErrorEnvelope::unexpected(
                ErrorCode::provider_unavailable(),
                "classifier down",
                ErrorClass::Retriable,
            )),
            calls: Arc::new(AtomicUsize::new(0)),
        }));

        let ctx = RequestContext::new_request();
        assert_eq!(expander.classify(&ctx, "anything").await, QueryIntent::General);
    }

    #[tokio::test]
    async fn slow_classifier_times_out_to_general() {
        let expander = QueryExpander::new()
            .with_classifier(Arc::new(StalledClassifier))
            .with_classify_timeout(Duration::from_millis(10));

        let ctx = RequestContext::new_request();
        assert_eq!(expander.classify(&ctx, "anything").await, QueryIntent::General);
    }

    proptest! {
        #[test]
        fn expansion_reaches_a_fixed_point(
            words in proptest::collection::vec(
                prop_oneof![
                    Just("api".to_string()),
                    Just("PRD".to_string()),
                    Just("product".to_string()),
                    Just("requirements".to_string()),
                    Just("k8s".to_string()),
                    Just("docs".to_string()),
                    "[a-zA-Z0-9]{1,8}",
                ],
                0..12,
            )
        ) {
            let query = words.join("  ");
            let once = expand_query(&query);
            prop_assert_eq!(expand_query(&once), once.clone());
            for word in &words {
                prop_assert!(once.contains(word.as_str()));
            }
        }
    }
}
