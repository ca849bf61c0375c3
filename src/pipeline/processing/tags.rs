//! Keyword/stem based topical tagging of events.

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

use crate::constants::{TAG_TAXONOMY, UNCATEGORIZED_TAG};

/// A taxonomy category and the keywords that select it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TagCategory {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered list of categories; output tags follow this order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTaxonomy {
    pub categories: Vec<TagCategory>,
}

impl Default for TagTaxonomy {
    fn default() -> Self {
        Self {
            categories: TAG_TAXONOMY
                .iter()
                .map(|(name, keywords)| TagCategory::new(*name, keywords))
                .collect(),
        }
    }
}

/// Split lower-cased text into word tokens (runs of alphanumerics or `_`).
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect()
}

struct CompiledCategory {
    name: String,
    // Each keyword as a sequence of stems; single words are length 1
    keyword_stems: Vec<Vec<String>>,
}

/// Assigns taxonomy tags from an event's title and description
pub struct TagClassifier {
    stemmer: Stemmer,
    categories: Vec<CompiledCategory>,
}

impl Default for TagClassifier {
    fn default() -> Self {
        Self::new(&TagTaxonomy::default())
    }
}

impl TagClassifier {
    pub fn new(taxonomy: &TagTaxonomy) -> Self {
        let stemmer = Stemmer::create(Algorithm::English);
        let mut categories: Vec<CompiledCategory> = Vec::with_capacity(taxonomy.categories.len());

        for category in &taxonomy.categories {
            let keyword_stems: Vec<Vec<String>> = category
                .keywords
                .iter()
                .map(|keyword| stem_all(&stemmer, &keyword.to_lowercase()))
                .filter(|stems| !stems.is_empty())
                .collect();

            // Repeated category names merge into the first occurrence
            if let Some(existing) = categories.iter_mut().find(|c| c.name == category.name) {
                existing.keyword_stems.extend(keyword_stems);
            } else {
                categories.push(CompiledCategory {
                    name: category.name.clone(),
                    keyword_stems,
                });
            }
        }

        Self { stemmer, categories }
    }

    /// Stems of every token in `text`
    pub fn stems(&self, text: &str) -> Vec<String> {
        stem_all(&self.stemmer, &text.to_lowercase())
    }

    /// Tags for an event, in taxonomy order. Never empty.
    pub fn classify(&self, title: &str, description: &str) -> Vec<String> {
        let doc = self.stems(&format!("{title} {description}"));

        let tags: Vec<String> = self
            .categories
            .iter()
            .filter(|category| {
                category
                    .keyword_stems
                    .iter()
                    .any(|keyword| contains_run(&doc, keyword))
            })
            .map(|category| category.name.clone())
            .collect();

        if tags.is_empty() {
            vec![UNCATEGORIZED_TAG.to_string()]
        } else {
            tags
        }
    }
}

fn stem_all(stemmer: &Stemmer, lowered: &str) -> Vec<String> {
    tokenize(lowered)
        .into_iter()
        .map(|token| stemmer.stem(token).into_owned())
        .collect()
}

/// True when `needle` occurs as a contiguous run inside `haystack`.
fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    match needle.len() {
        0 => false,
        1 => haystack.iter().any(|stem| *stem == needle[0]),
        n => haystack.windows(n).any(|window| window == needle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("zumba, yoga & self-care: 5pm!"),
            vec!["zumba", "yoga", "self", "care", "5pm"]
        );
        assert!(tokenize("  --  ").is_empty());
    }

    #[test]
    fn test_zumba_is_fitness() {
        let classifier = TagClassifier::default();
        let tags = classifier.classify("Zumba class this Friday", "");
        assert!(tags.contains(&"fitness".to_string()), "tags: {tags:?}");
        assert!(!tags.contains(&UNCATEGORIZED_TAG.to_string()));
    }

    #[test]
    fn test_stemmed_forms_match() {
        let classifier = TagClassifier::default();
        // "workshops" and "training" stem to the same roots as the keywords
        let tags = classifier.classify("Resume Workshops", "Hands-on trainings for students");
        assert!(tags.contains(&"career".to_string()), "tags: {tags:?}");
        assert!(tags.contains(&"training".to_string()), "tags: {tags:?}");
    }

    #[test]
    fn test_no_match_is_uncategorized() {
        let classifier = TagClassifier::default();
        let tags = classifier.classify("Parking lot resurfacing", "Lot G closed");
        assert_eq!(tags, vec![UNCATEGORIZED_TAG.to_string()]);
    }

    #[test]
    fn test_multi_word_keywords_need_contiguous_words() {
        let classifier = TagClassifier::new(&TagTaxonomy {
            categories: vec![TagCategory::new("career", &["job fair"])],
        });
        assert_eq!(classifier.classify("Spring Job Fair", ""), vec!["career"]);
        assert_eq!(
            classifier.classify("Fair weather", "no job talk"),
            vec![UNCATEGORIZED_TAG]
        );
    }

    #[test]
    fn test_tags_follow_taxonomy_order_without_duplicates() {
        let classifier = TagClassifier::new(&TagTaxonomy {
            categories: vec![
                TagCategory::new("music", &["concert"]),
                TagCategory::new("social", &["party"]),
                TagCategory::new("music", &["band"]),
            ],
        });
        let tags = classifier.classify("Party with a band", "and a concert");
        assert_eq!(tags, vec!["music", "social"]);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let classifier = TagClassifier::new(&TagTaxonomy {
            categories: vec![TagCategory::new("esports", &["ESports"])],
        });
        assert_eq!(classifier.classify("esports night", ""), vec!["esports"]);
    }
}
