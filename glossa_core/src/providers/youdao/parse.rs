use crate::error::ProviderError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Which optional sections to extract.
#[derive(Debug, Clone, Copy)]
pub struct Sections {
    pub basic: bool,
    pub phrase: bool,
    pub sentence: bool,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            basic: true,
            phrase: true,
            sentence: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YoudaoResult {
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phonetics: Vec<Phonetic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub basic: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phrases: Vec<Phrase>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sentences: Vec<Sentence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phonetic {
    /// "英" / "美", or empty for a single pronunciation
    pub label: String,
    pub ipa: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phrase {
    pub phrase: String,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    pub source: String,
    pub translation: String,
}

fn selector(css: &str) -> Result<Selector, ProviderError> {
    Selector::parse(css).map_err(|e| ProviderError::ParseError(format!("selector {css}: {e}")))
}

fn clean_text(el: ElementRef<'_>) -> String {
    let joined: String = el.text().collect();
    WHITESPACE.replace_all(joined.trim(), " ").into_owned()
}

/// Parse a youdao word page. Fails with [`ProviderError::NoResult`] when the
/// page has no headword and nothing else usable.
pub fn parse_document(html: &str, sections: Sections) -> Result<YoudaoResult, ProviderError> {
    let document = Html::parse_document(html);

    let title_sel = selector("#phrsListTab .keyword")?;
    let pronounce_sel = selector("#phrsListTab .pronounce")?;
    let phonetic_sel = selector(".phonetic")?;
    let basic_sel = selector("#phrsListTab .trans-container > ul > li")?;
    let phrase_sel = selector("#wordGroup p.wordGroup")?;
    let phrase_title_sel = selector(".contentTitle")?;
    let sentence_sel = selector("#bilingual ul li")?;
    let p_sel = selector("p")?;

    let mut result = YoudaoResult {
        title: document
            .select(&title_sel)
            .next()
            .map(clean_text)
            .unwrap_or_default(),
        ..YoudaoResult::default()
    };

    for pronounce in document.select(&pronounce_sel) {
        let Some(ipa) = pronounce.select(&phonetic_sel).next().map(clean_text) else {
            continue;
        };
        let label = pronounce
            .text()
            .next()
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        result.phonetics.push(Phonetic { label, ipa });
    }

    if sections.basic {
        result.basic = document
            .select(&basic_sel)
            .map(clean_text)
            .filter(|s| !s.is_empty())
            .collect();
    }

    if sections.phrase {
        for group in document.select(&phrase_sel) {
            let Some(phrase) = group.select(&phrase_title_sel).next().map(clean_text) else {
                continue;
            };
            let whole = clean_text(group);
            let meaning = whole
                .strip_prefix(phrase.as_str())
                .unwrap_or(&whole)
                .trim()
                .to_string();
            result.phrases.push(Phrase { phrase, meaning });
        }
    }

    if sections.sentence {
        for item in document.select(&sentence_sel) {
            let mut paragraphs = item.select(&p_sel).map(clean_text);
            let (Some(source), Some(translation)) = (paragraphs.next(), paragraphs.next()) else {
                continue;
            };
            result.sentences.push(Sentence {
                source,
                translation,
            });
        }
    }

    if result.title.is_empty() && result.basic.is_empty() && result.phrases.is_empty() {
        return Err(ProviderError::NoResult);
    }

    Ok(result)
}
