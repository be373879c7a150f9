//! In-memory knowledge base with keyword scoring.

use serde::{Deserialize, Serialize};

/// Score weight of a query token found in an entry's tags.
const TAG_WEIGHT: u32 = 3;
/// Score weight of a query token found in an entry's topic.
const TOPIC_WEIGHT: u32 = 2;
/// Score weight of a query token found in an entry's content.
const CONTENT_WEIGHT: u32 = 1;

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "does", "for",
    "from", "have", "how", "i", "in", "is", "it", "me", "my", "of", "on", "or", "our", "so",
    "that", "the", "this", "to", "us", "we", "what", "when", "where", "which", "who", "why",
    "will", "with", "you", "your",
];

/// One knowledge base article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub topic: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl KnowledgeEntry {
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        content: impl Into<String>,
        tags: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            content: content.into(),
            tags: tags.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// 3 per tag hit, 2 per topic hit, 1 per content hit.
    fn score(&self, tokens: &[String]) -> u32 {
        let topic = tokenize(&self.topic);
        let content = tokenize(&self.content);

        tokens
            .iter()
            .map(|token| {
                let mut score = 0;
                if self.tags.iter().any(|tag| tag == token) {
                    score += TAG_WEIGHT;
                }
                if topic.contains(token) {
                    score += TOPIC_WEIGHT;
                }
                if content.contains(token) {
                    score += CONTENT_WEIGHT;
                }
                score
            })
            .sum()
    }
}

/// A search result.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeHit<'a> {
    pub entry: &'a KnowledgeEntry,
    pub score: u32,
}

/// Ordered collection of knowledge entries.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a knowledge base from entries, keeping their order.
    pub fn with_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    /// Append an entry.
    pub fn add(&mut self, entry: KnowledgeEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best matching entries for a query, highest score first.
    ///
    /// Entries scoring zero are dropped. Equal scores keep corpus order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<KnowledgeHit<'_>> {
        let tokens = tokenize(query);
        if tokens.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut hits: Vec<KnowledgeHit<'_>> = self
            .entries
            .iter()
            .map(|entry| KnowledgeHit {
                entry,
                score: entry.score(&tokens),
            })
            .filter(|hit| hit.score > 0)
            .collect();

        // Stable sort keeps corpus order among equal scores.
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    /// The built-in corpus describing the agency.
    pub fn default_corpus() -> Self {
        Self::with_entries(vec![
            KnowledgeEntry::new(
                "services",
                "Services overview",
                "We offer digital marketing, SEO, content creation, social media management, \
                 web design and paid advertising campaigns for small and mid-sized businesses.",
                &["services", "offer", "marketing", "overview"],
            ),
            KnowledgeEntry::new(
                "pricing",
                "Pricing and packages",
                "Starter package from $500 per month, Growth package from $1,500 per month and \
                 Enterprise plans quoted per project. All packages include a monthly report.",
                &["pricing", "price", "cost", "packages", "plans", "quote"],
            ),
            KnowledgeEntry::new(
                "process",
                "How we work",
                "Every engagement starts with a free consultation, followed by an audit, a \
                 strategy proposal, implementation and monthly review meetings.",
                &["process", "consultation", "onboarding", "start", "steps"],
            ),
            KnowledgeEntry::new(
                "seo",
                "SEO services",
                "Our SEO work covers technical audits, keyword research, on-page optimization, \
                 link building and local search listings. Results typically show within three \
                 to six months.",
                &["seo", "search", "ranking", "keywords", "google"],
            ),
            KnowledgeEntry::new(
                "contact",
                "Contact details",
                "Reach the team at hello@example.com or through the contact form. Sales calls \
                 can be booked online any weekday.",
                &["contact", "email", "phone", "call", "reach"],
            ),
            KnowledgeEntry::new(
                "support-hours",
                "Support hours",
                "Support is available Monday to Friday, 9am to 6pm Eastern time. Urgent issues \
                 for Enterprise clients are handled around the clock.",
                &["support", "hours", "help", "availability", "faq"],
            ),
        ])
    }
}

/// Lowercase alphanumeric tokens with stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty() && !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words() {
        assert_eq!(
            tokenize("What is your SEO pricing?"),
            vec!["seo".to_string(), "pricing".to_string()]
        );
        assert!(tokenize("the and of").is_empty());
    }

    #[test]
    fn test_search_ranks_by_weighted_hits() {
        let kb = KnowledgeBase::default_corpus();
        let hits = kb.search("pricing packages", 3);

        assert_eq!(hits[0].entry.id, "pricing");
        // "pricing": tag + topic, "packages": tag + topic + content
        assert_eq!(hits[0].score, 11);
    }

    #[test]
    fn test_search_unrelated_is_empty() {
        let kb = KnowledgeBase::default_corpus();
        assert!(kb.search("quantum chromodynamics", 5).is_empty());
        assert!(kb.search("", 5).is_empty());
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let kb = KnowledgeBase::with_entries(vec![
            KnowledgeEntry::new("first", "Alpha", "shared word", &[]),
            KnowledgeEntry::new("second", "Beta", "shared word", &[]),
        ]);
        let hits = kb.search("shared", 5);
        let ids: Vec<_> = hits.iter().map(|h| h.entry.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_limit() {
        let kb = KnowledgeBase::default_corpus();
        assert_eq!(kb.search("support seo pricing contact", 2).len(), 2);
    }
}
