use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Literary form assigned to a text by the heuristic detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Poem,
    Letter,
    Fable,
    Tale,
    Chronicle,
    OpinionArticle,
    ArgumentativeEssay,
    Unknown,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Poem => "poem",
            Genre::Letter => "letter",
            Genre::Fable => "fable",
            Genre::Tale => "tale",
            Genre::Chronicle => "chronicle",
            Genre::OpinionArticle => "opinion-article",
            Genre::ArgumentativeEssay => "argumentative-essay",
            Genre::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = String;

    /// Accepts the canonical kebab-case names plus a few aliases, including
    /// the Portuguese genre names the original lexicons came from.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "poem" | "poema" => Ok(Genre::Poem),
            "letter" | "carta" => Ok(Genre::Letter),
            "fable" | "fábula" | "fabula" => Ok(Genre::Fable),
            "tale" | "conto" => Ok(Genre::Tale),
            "chronicle" | "crônica" | "cronica" => Ok(Genre::Chronicle),
            "opinion-article" | "opinion" | "artigo de opinião" => Ok(Genre::OpinionArticle),
            "argumentative-essay" | "essay" | "dissertação" | "dissertacao" => {
                Ok(Genre::ArgumentativeEssay)
            }
            "unknown" | "desconhecido" => Ok(Genre::Unknown),
            other => Err(format!("unknown genre '{other}'")),
        }
    }
}

/// Structural and lexical statistics for a single text. Produced once per
/// evaluation; every field degrades to zero/empty on empty input.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub sentence_count: usize,
    /// Total tokens emitted by the word tokenizer (punctuation included).
    pub word_count: usize,
    pub mean_words_per_sentence: f64,
    /// Distinct lowercase alphabetic tokens.
    pub vocabulary_size: usize,
    /// Distinct / total lowercase alphabetic tokens, as a percentage.
    pub vocabulary_diversity: f64,
    pub paragraphs: Vec<String>,
    pub long_paragraphs: Vec<String>,
    pub long_sentences: Vec<String>,
    /// Top-10 lowercase alphabetic words by count.
    pub top_words: Vec<(String, usize)>,
    /// Words occurring more than twice, in first-occurrence order.
    pub repeated_words: Vec<String>,
    pub lines: Vec<String>,
    /// All lowercase alphabetic tokens, kept for theme matching.
    #[serde(skip)]
    pub alphabetic_words: Vec<String>,
}

/// One genre-specific rubric criterion, scored 0-2.
#[derive(Debug, Clone, Serialize)]
pub struct RubricEntry {
    pub criterion: &'static str,
    pub score: u8,
}

/// The five canonical criteria, each 0-2.
#[derive(Debug, Clone, Serialize)]
pub struct CriterionScores {
    pub structure: u8,
    pub cohesion: u8,
    pub clarity: u8,
    pub vocabulary: u8,
    pub theme_adequacy: u8,
}

impl CriterionScores {
    pub fn total(&self) -> u8 {
        self.structure + self.cohesion + self.clarity + self.vocabulary + self.theme_adequacy
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackBundle {
    /// Sum of the five canonical criteria, 0-10.
    pub final_score: u8,
    pub criteria: CriterionScores,
    /// Genre-flavored rubric, surfaced alongside the canonical criteria but
    /// never folded into the numeric score.
    pub rubric: Vec<RubricEntry>,
    pub comments: Vec<String>,
    pub suggestions: Vec<String>,
    pub genre_comments: Vec<String>,
    pub genre_suggestions: Vec<String>,
    pub rewrite_examples: Vec<String>,
    pub auto_rewrites: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub genre: Genre,
    pub metrics: MetricsReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub genre: Genre,
    pub metrics: MetricsReport,
    pub feedback: FeedbackBundle,
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

struct Thresholds {
    long_sentence_words: usize,
    long_paragraph_words: usize,
    top_word_count: usize,
    repeat_min_count: usize,
    repeat_min_word_len: usize,
    poem_min_lines: usize,
    poem_short_line_words: usize,
    poem_short_line_ratio: f64,
    poem_long_line_words: usize,
    poem_long_line_ratio: f64,
    fable_verb_gap_tokens: usize,
    essay_min_connectives: usize,
    essay_mean_sentence_max: f64,
    essay_min_diversity: f64,
    tale_min_sentences: usize,
    tale_min_vocabulary: usize,
    poem_min_diversity: f64,
    fable_min_sentences: usize,
    fable_min_diversity: f64,
    cohesion_mean_hard: f64,
    cohesion_mean_soft: f64,
    clarity_min_words: usize,
    vocabulary_low_diversity: f64,
    vocabulary_mid_diversity: f64,
    rewrite_window_tokens: usize,
    rewrite_max_suggestions: usize,
}

static TH: Thresholds = Thresholds {
    long_sentence_words: 35,
    long_paragraph_words: 120,
    top_word_count: 10,
    repeat_min_count: 2,
    repeat_min_word_len: 3,
    poem_min_lines: 2,
    poem_short_line_words: 8,
    poem_short_line_ratio: 0.6,
    poem_long_line_words: 10,
    poem_long_line_ratio: 0.4,
    fable_verb_gap_tokens: 5,
    essay_min_connectives: 2,
    essay_mean_sentence_max: 25.0,
    essay_min_diversity: 25.0,
    tale_min_sentences: 5,
    tale_min_vocabulary: 50,
    poem_min_diversity: 20.0,
    fable_min_sentences: 4,
    fable_min_diversity: 20.0,
    cohesion_mean_hard: 36.0,
    cohesion_mean_soft: 26.0,
    clarity_min_words: 80,
    vocabulary_low_diversity: 30.0,
    vocabulary_mid_diversity: 45.0,
    rewrite_window_tokens: 12,
    rewrite_max_suggestions: 3,
};

// ---------------------------------------------------------------------------
// Lexicons and compiled patterns
// ---------------------------------------------------------------------------
// Marker lists carry both the original Portuguese terms and their English
// counterparts. The plain lists use substring matching; only the regex-backed
// rules use word boundaries.

static FABLE_ANIMALS: &[&str] = &[
    "leão",
    "raposa",
    "lobo",
    "corvo",
    "tartaruga",
    "lebre",
    "cervo",
    "gato",
    "cachorro",
    "rato",
    "coelho",
    "água-viva",
    "lion",
    "fox",
    "wolf",
    "crow",
    "tortoise",
    "hare",
    "deer",
    "cat",
    "dog",
    "mouse",
    "rabbit",
    "jellyfish",
];

static MORAL_MARKERS: &[&str] = &[
    "moral:",
    "moraleja",
    "lição",
    "ensinamento",
    "lesson",
    "moral teaching",
];

static SPEECH_VERBS: &[&str] = &[
    "disse",
    "falou",
    "falavam",
    "diz",
    "dizia",
    "pensou",
    "pensaram",
    "said",
    "spoke",
    "thought",
    "used to think",
];

static TALE_MARKERS: &[&str] = &[
    "era uma vez",
    "certa vez",
    "numa noite",
    "um dia",
    "anos depois",
    "once upon a time",
    "one day",
    "one night",
    "years later",
];

static CHRONICLE_MARKERS: &[&str] = &[
    "outro dia",
    "no ônibus",
    "no mercado",
    "cotidiano",
    "manhã seguinte",
    "the other day",
    "on the bus",
    "at the market",
    "daily life",
    "the next morning",
];

static OPINION_MARKERS: &[&str] = &[
    "na minha opinião",
    "defendo que",
    "acredito que",
    "in my opinion",
    "i believe that",
    "i advocate that",
];

static CONNECTIVE_MARKERS: &[&str] = &[
    "portanto",
    "logo",
    "assim",
    "contudo",
    "entretanto",
    "tese",
    "dessa forma",
    "therefore",
    "thus",
    "however",
    "nevertheless",
    "thesis",
];

static NARRATIVE_MARKERS: &[&str] = &[
    "era uma vez",
    "falou",
    "caminhou",
    "história",
    "personagem",
    "once upon a time",
    "spoke",
    "walked",
    "story",
    "character",
];

static CHAPTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(cap[íi]tulo|chapter)\b").unwrap());

static SALUTATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(querido|querida|prezado|prezada|caro|cara|dear|dearest)\b").unwrap()
});

static CLOSING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(atenciosamente|cordialmente|cumprimentos|grato|grata|sincerely|cordially|regards|gratefully)\b",
    )
    .unwrap()
});

// An animal term followed within a few tokens by a speech/thought verb, the
// personification pattern typical of fables.
static PERSONIFICATION_RE: Lazy<Regex> = Lazy::new(|| {
    let animals = FABLE_ANIMALS
        .iter()
        .map(|a| regex::escape(a))
        .collect::<Vec<_>>()
        .join("|");
    let verbs = SPEECH_VERBS
        .iter()
        .map(|v| regex::escape(v))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"\b(?:{animals})\b(?:\s+\w+){{0,{gap}}}\s+(?:{verbs})\b",
        gap = TH.fable_verb_gap_tokens
    ))
    .unwrap()
});

static WORD_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+|[^\w\s]").unwrap());

static SENTENCE_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]["'\u{201D}\u{2019})\]]*(?:\s|$)"#).unwrap());

static PARAGRAPH_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

static THEME_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ---------------------------------------------------------------------------
// Stopwords
// ---------------------------------------------------------------------------

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Portuguese
        "o", "a", "os", "as", "de", "do", "da", "dos", "das", "e", "em", "no", "na", "nos", "nas",
        "um", "uma", "uns", "umas", "por", "para", "com", "se", "que", "mais", "como", "quando",
        "entre", "sob", "sobre", "sem", "sua", "suas", "seu", "seus",
        // English
        "the", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "is", "it", "that",
        "this", "with", "by", "from", "was", "were", "are", "be", "been", "has", "have", "had",
        "not", "no", "do", "does", "did", "will", "would", "could", "should", "can", "if", "then",
        "than", "so", "about", "into", "over", "after", "before", "through", "also", "very",
        "more", "most", "some", "any", "each", "all", "such", "only", "too", "how", "what",
        "which", "who", "when", "where", "why",
    ]
    .into_iter()
    .collect()
});

// Preferred break tokens for the rewrite pass, scanned after punctuation.
static REWRITE_CONJUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "e", "mas", "porém", "contudo", "quando", "enquanto", "porque", "pois", "and", "but",
        "or", "because", "when", "while", "although",
    ]
    .into_iter()
    .collect()
});

// ---------------------------------------------------------------------------
// Tokenization
// ---------------------------------------------------------------------------

fn word_tokenize(text: &str) -> Vec<&str> {
    WORD_TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Punctuation-based sentence segmentation. Sentences keep their terminal
/// punctuation; a trailing fragment without one still counts as a sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut last = 0;
    for m in SENTENCE_BOUNDARY_RE.find_iter(text) {
        let chunk = text[last..m.end()].trim();
        if !chunk.is_empty() {
            sentences.push(chunk.to_string());
        }
        last = m.end();
    }
    let tail = text[last..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Text metrics
// ---------------------------------------------------------------------------

/// Computes the full [`MetricsReport`] for a text. Never fails; empty input
/// yields zero counts and empty lists.
pub fn compute_metrics(text: &str) -> MetricsReport {
    let sentences = split_sentences(text);
    let tokens = word_tokenize(text);

    let sentence_count = sentences.len();
    let word_count = tokens.len();
    let mean_words_per_sentence = if sentence_count > 0 {
        round2(word_count as f64 / sentence_count as f64)
    } else {
        0.0
    };

    let alphabetic_words: Vec<String> = tokens
        .iter()
        .filter(|t| t.chars().all(char::is_alphabetic))
        .map(|t| t.to_lowercase())
        .collect();

    let mut frequencies: HashMap<&str, usize> = HashMap::new();
    for word in &alphabetic_words {
        *frequencies.entry(word.as_str()).or_insert(0) += 1;
    }

    let vocabulary_size = frequencies.len();
    let vocabulary_diversity = if alphabetic_words.is_empty() {
        0.0
    } else {
        round2(vocabulary_size as f64 / alphabetic_words.len() as f64 * 100.0)
    };

    let paragraphs: Vec<String> = PARAGRAPH_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    let long_paragraphs: Vec<String> = paragraphs
        .iter()
        .filter(|p| p.split_whitespace().count() > TH.long_paragraph_words)
        .cloned()
        .collect();

    let long_sentences: Vec<String> = sentences
        .iter()
        .filter(|s| s.split_whitespace().count() > TH.long_sentence_words)
        .cloned()
        .collect();

    let mut top_words: Vec<(String, usize)> = frequencies
        .iter()
        .map(|(w, c)| (w.to_string(), *c))
        .collect();
    top_words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_words.truncate(TH.top_word_count);

    // First-occurrence order keeps the output deterministic.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut repeated_words = Vec::new();
    for word in &alphabetic_words {
        if frequencies[word.as_str()] > TH.repeat_min_count && seen.insert(word.as_str()) {
            repeated_words.push(word.clone());
        }
    }

    let lines: Vec<String> = text.split('\n').map(str::to_string).collect();

    MetricsReport {
        sentence_count,
        word_count,
        mean_words_per_sentence,
        vocabulary_size,
        vocabulary_diversity,
        paragraphs,
        long_paragraphs,
        long_sentences,
        top_words,
        repeated_words,
        lines,
        alphabetic_words,
    }
}

// ---------------------------------------------------------------------------
// Genre detection
// ---------------------------------------------------------------------------

struct GenreCues {
    lower: String,
    lines: Vec<String>,
}

impl GenreCues {
    fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        GenreCues {
            lower: trimmed.to_lowercase(),
            lines: trimmed
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| haystack.contains(m))
}

fn looks_like_poem(cues: &GenreCues) -> bool {
    if cues.lines.len() < TH.poem_min_lines {
        return false;
    }
    let short = cues
        .lines
        .iter()
        .filter(|l| l.split_whitespace().count() <= TH.poem_short_line_words)
        .count();
    short as f64 / cues.lines.len() as f64 >= TH.poem_short_line_ratio
        && !CHAPTER_RE.is_match(&cues.lower)
}

fn looks_like_letter(cues: &GenreCues) -> bool {
    SALUTATION_RE.is_match(&cues.lower) && CLOSING_RE.is_match(&cues.lower)
}

fn looks_like_fable(cues: &GenreCues) -> bool {
    if !contains_any(&cues.lower, FABLE_ANIMALS) {
        return false;
    }
    contains_any(&cues.lower, MORAL_MARKERS) || PERSONIFICATION_RE.is_match(&cues.lower)
}

fn looks_like_tale(cues: &GenreCues) -> bool {
    contains_any(&cues.lower, TALE_MARKERS)
        || (cues.lower.contains("quando") && cues.lower.contains("disse"))
        || (cues.lower.contains("when") && cues.lower.contains("said"))
}

fn looks_like_chronicle(cues: &GenreCues) -> bool {
    contains_any(&cues.lower, CHRONICLE_MARKERS)
}

fn looks_like_opinion_article(cues: &GenreCues) -> bool {
    contains_any(&cues.lower, OPINION_MARKERS)
}

// The essay rule carries a higher evidentiary bar: two distinct connectives
// and no narrative marker, so a single "however" in any genre does not
// misclassify the text.
fn looks_like_argumentative_essay(cues: &GenreCues) -> bool {
    let connectives = CONNECTIVE_MARKERS
        .iter()
        .filter(|m| cues.lower.contains(*m))
        .count();
    connectives >= TH.essay_min_connectives && !contains_any(&cues.lower, NARRATIVE_MARKERS)
}

// Ordered rule table, first match wins. Poem and letter are structurally
// distinctive and go first; fable must precede tale because fable narratives
// often carry tale markers too.
static GENRE_RULES: &[(Genre, fn(&GenreCues) -> bool)] = &[
    (Genre::Poem, looks_like_poem),
    (Genre::Letter, looks_like_letter),
    (Genre::Fable, looks_like_fable),
    (Genre::Tale, looks_like_tale),
    (Genre::Chronicle, looks_like_chronicle),
    (Genre::OpinionArticle, looks_like_opinion_article),
    (Genre::ArgumentativeEssay, looks_like_argumentative_essay),
];

/// Classifies a text into a [`Genre`]. Total and deterministic; returns
/// [`Genre::Unknown`] when no rule matches so the caller can obtain a genre
/// by other means.
pub fn detect_genre(text: &str) -> Genre {
    let cues = GenreCues::from_text(text);
    GENRE_RULES
        .iter()
        .find(|(_, predicate)| predicate(&cues))
        .map(|(genre, _)| *genre)
        .unwrap_or(Genre::Unknown)
}

// ---------------------------------------------------------------------------
// Rubric scoring
// ---------------------------------------------------------------------------

fn essay_rubric(report: &MetricsReport) -> Vec<RubricEntry> {
    let mut structure = 2u8;
    let mut cohesion = 2u8;
    let mut clarity = 2u8;
    if report.mean_words_per_sentence > TH.essay_mean_sentence_max {
        clarity -= 1;
    }
    if !report.long_paragraphs.is_empty() {
        structure -= 1;
    }
    if report.vocabulary_diversity < TH.essay_min_diversity {
        cohesion -= 1;
    }
    vec![
        RubricEntry {
            criterion: "structure",
            score: structure,
        },
        RubricEntry {
            criterion: "cohesion",
            score: cohesion,
        },
        RubricEntry {
            criterion: "clarity",
            score: clarity,
        },
    ]
}

fn tale_rubric(report: &MetricsReport) -> Vec<RubricEntry> {
    let mut creativity = 2u8;
    let mut cohesion = 2u8;
    if report.sentence_count < TH.tale_min_sentences {
        cohesion -= 1;
    }
    if report.vocabulary_size < TH.tale_min_vocabulary {
        creativity -= 1;
    }
    vec![
        RubricEntry {
            criterion: "creativity",
            score: creativity,
        },
        RubricEntry {
            criterion: "cohesion",
            score: cohesion,
        },
    ]
}

fn poem_rubric(report: &MetricsReport) -> Vec<RubricEntry> {
    let mut musicality = 2u8;
    let mut imagery = 2u8;
    // Raw line list on purpose: blank lines count toward the denominator.
    let long_lines = report
        .lines
        .iter()
        .filter(|l| l.split_whitespace().count() > TH.poem_long_line_words)
        .count();
    if long_lines as f64 > report.lines.len() as f64 * TH.poem_long_line_ratio {
        musicality -= 1;
    }
    if report.vocabulary_diversity < TH.poem_min_diversity {
        imagery -= 1;
    }
    vec![
        RubricEntry {
            criterion: "musicality",
            score: musicality,
        },
        RubricEntry {
            criterion: "poetic-imagery",
            score: imagery,
        },
    ]
}

fn fable_rubric(report: &MetricsReport) -> Vec<RubricEntry> {
    let mut morality = 2u8;
    let mut narrative = 2u8;
    if report.sentence_count < TH.fable_min_sentences {
        narrative -= 1;
    }
    if report.vocabulary_diversity < TH.fable_min_diversity {
        morality -= 1;
    }
    vec![
        RubricEntry {
            criterion: "morality",
            score: morality,
        },
        RubricEntry {
            criterion: "narrative",
            score: narrative,
        },
    ]
}

/// Genre-specific rubric. Letter, chronicle, opinion-article and unknown
/// texts have no dedicated rubric and share the argumentative-essay one.
pub fn rubric_scores(genre: Genre, report: &MetricsReport) -> Vec<RubricEntry> {
    match genre {
        Genre::Tale => tale_rubric(report),
        Genre::Poem => poem_rubric(report),
        Genre::Fable => fable_rubric(report),
        _ => essay_rubric(report),
    }
}

// ---------------------------------------------------------------------------
// Sentence rewriting
// ---------------------------------------------------------------------------

fn detokenize(tokens: &[&str]) -> String {
    let s = tokens.join(" ");
    let s = s
        .replace(" ,", ",")
        .replace(" .", ".")
        .replace(" ;", ";")
        .replace(" :", ":");
    let s = s.replace(" ( ", " (").replace(" ) ", ") ");
    let s = s.replace(" ' ", "'");
    let s = s.replace(" !", "!").replace(" ?", "?");
    WHITESPACE_RE.replace_all(&s, " ").trim().to_string()
}

fn ends_terminal(s: &str) -> bool {
    s.ends_with('.') || s.ends_with('?') || s.ends_with('!')
}

fn ensure_terminal(s: String) -> String {
    if ends_terminal(&s) {
        return s;
    }
    let trimmed = s.trim_end_matches(&[',', ';', ':'][..]);
    format!("{trimmed}.")
}

fn capitalize_first(s: String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => s,
    }
}

/// Produces up to three two-part rewrites of overlong sentences (>35 words),
/// in document order. The split point is searched in a window around the
/// token midpoint: first a comma/semicolon/colon, then a conjunction, then
/// the midpoint itself. The seam is repaired with terminal punctuation on the
/// left and capitalization plus terminal punctuation on the right. Words are
/// never reordered.
pub fn suggest_rewrites(text: &str) -> Vec<String> {
    let mut suggestions = Vec::new();

    for sentence in split_sentences(text) {
        let tokens = word_tokenize(&sentence);
        let word_tokens = tokens
            .iter()
            .filter(|t| t.chars().any(char::is_alphanumeric))
            .count();
        if word_tokens <= TH.long_sentence_words {
            continue;
        }

        let mid = tokens.len() / 2;
        let window_start = mid.saturating_sub(TH.rewrite_window_tokens);
        let window_end = (mid + TH.rewrite_window_tokens).min(tokens.len());

        let mut split_idx = None;
        for i in window_start..window_end {
            if matches!(tokens[i], "," | ";" | ":") {
                split_idx = Some(i + 1);
                break;
            }
        }
        if split_idx.is_none() {
            for i in window_start..window_end {
                if REWRITE_CONJUNCTIONS.contains(tokens[i].to_lowercase().as_str()) {
                    split_idx = Some(i + 1);
                    break;
                }
            }
        }
        let split_idx = split_idx.unwrap_or(mid);

        let left = ensure_terminal(detokenize(&tokens[..split_idx]));
        let right = detokenize(&tokens[split_idx..]);
        let suggestion = if right.is_empty() {
            format!("Rewrite suggestion: {left}")
        } else {
            let right = ensure_terminal(capitalize_first(right));
            format!("Rewrite suggestion: {left} {right}")
        };
        suggestions.push(suggestion);

        // The cap is global across all sentences, not per sentence.
        if suggestions.len() >= TH.rewrite_max_suggestions {
            break;
        }
    }

    suggestions
}

// ---------------------------------------------------------------------------
// Feedback generation
// ---------------------------------------------------------------------------

fn filter_repetitions(repeated: &[String]) -> Vec<&String> {
    repeated
        .iter()
        .filter(|w| w.chars().count() >= TH.repeat_min_word_len && !STOPWORDS.contains(w.as_str()))
        .collect()
}

fn genre_guidance(genre: Genre) -> (Vec<String>, Vec<String>) {
    let mut comments = Vec::new();
    let mut suggestions = Vec::new();
    match genre {
        Genre::ArgumentativeEssay => {
            comments.push(
                "Argumentative essay: focus on a clear thesis, supporting arguments, and a coherent conclusion."
                    .to_string(),
            );
            suggestions.push(
                "State an assertive thesis and use connectives to link your arguments."
                    .to_string(),
            );
        }
        Genre::Tale => {
            comments.push(
                "Tale: prioritize plot, the sequence of events, and a memorable ending."
                    .to_string(),
            );
            suggestions.push(
                "Work on scene and character building; cut superfluous description.".to_string(),
            );
        }
        Genre::Poem => {
            comments
                .push("Poem: pay attention to concision, rhythm, and poetic imagery.".to_string());
            suggestions.push(
                "Vary line lengths and use imagery and metaphor to enrich the stanzas."
                    .to_string(),
            );
        }
        Genre::Fable => {
            comments.push(
                "Fable: highlight the animal characters' actions and make the moral explicit."
                    .to_string(),
            );
            suggestions.push(
                "Reinforce the moral in the final sentence and simplify the narrative for impact."
                    .to_string(),
            );
        }
        other => {
            comments.push(format!(
                "Detected genre: {other}. Adjust the text to the general criteria."
            ));
        }
    }
    (comments, suggestions)
}

/// Combines metrics, genre, and an optional theme into the full feedback
/// bundle. Never fails; every branch has a safe default. When `original_text`
/// is absent, the rewrite pass reconstructs the text from the report's lines.
pub fn score_and_feedback(
    report: &MetricsReport,
    genre: Genre,
    theme: &str,
    original_text: Option<&str>,
) -> FeedbackBundle {
    let repeated = filter_repetitions(&report.repeated_words);
    let rubric = rubric_scores(genre, report);
    let (genre_comments, genre_suggestions) = genre_guidance(genre);

    let mut comments: Vec<String> = Vec::new();
    let mut suggestions: Vec<String> = Vec::new();

    // Structure: paragraph count sets the score; long paragraphs only add a
    // comment and a suggestion on top.
    let paragraph_count = report.paragraphs.len();
    let structure = if paragraph_count <= 1 {
        comments.push(
            "Structure: The text is very compact; organize it better into paragraphs.".to_string(),
        );
        0
    } else if paragraph_count == 2 {
        comments.push(
            "Structure: Good attempt, but the paragraphs could still be divided better."
                .to_string(),
        );
        1
    } else {
        comments.push("Structure: Good paragraph organization.".to_string());
        2
    };
    if !report.long_paragraphs.is_empty() {
        comments.push(format!(
            "Structure: There are {} very long paragraphs.",
            report.long_paragraphs.len()
        ));
        suggestions.push("Split the longest paragraphs to make reading easier.".to_string());
    }

    // Cohesion
    let mean = report.mean_words_per_sentence;
    let cohesion = if mean > TH.cohesion_mean_hard {
        comments.push(
            "Cohesion: Many long sentences; extended periods weaken the connection between ideas."
                .to_string(),
        );
        0
    } else if mean > TH.cohesion_mean_soft {
        comments.push(
            "Cohesion: Some long sentences; connectives and punctuation could be improved."
                .to_string(),
        );
        1
    } else {
        comments.push("Cohesion: Good flow between sentences.".to_string());
        2
    };

    // Clarity: the short-text rule hard-sets the score to 0; the repetition
    // and long-sentence decrements still apply afterwards, floored at 0.
    let mut clarity: u8 = 2;
    if report.word_count < TH.clarity_min_words {
        clarity = 0;
        comments
            .push("Clarity: The text is very short; the ideas need more development.".to_string());
    }
    if let Some(first) = repeated.first() {
        clarity = clarity.saturating_sub(1);
        comments.push("Clarity: Some words are repeated; vary your vocabulary.".to_string());
        suggestions.push(format!(
            "Vary repeated words such as '{first}' by using suitable synonyms."
        ));
    }
    if !report.long_sentences.is_empty() {
        clarity = clarity.saturating_sub(1);
        comments.push("Clarity: Some very long sentences make comprehension harder.".to_string());
        suggestions
            .push("Split long sentences into shorter periods to make reading easier.".to_string());
    }

    // Vocabulary
    let diversity = report.vocabulary_diversity;
    let vocabulary = if diversity < TH.vocabulary_low_diversity {
        comments.push("Vocabulary: Little variety; try to diversify word choice.".to_string());
        0
    } else if diversity < TH.vocabulary_mid_diversity {
        comments.push(
            "Vocabulary: Moderate variety; the lexical repertoire could be expanded.".to_string(),
        );
        1
    } else {
        comments.push("Vocabulary: Very good lexical repertoire.".to_string());
        2
    };

    suggestions.extend(genre_suggestions.iter().cloned());

    // Theme adequacy: lexical overlap between the theme words and the text's
    // lowercase word set.
    let theme_adequacy = if theme.trim().is_empty() {
        comments.push(
            "Theme adequacy: No theme provided; evaluation based on the text alone.".to_string(),
        );
        2
    } else {
        let theme_lower = theme.to_lowercase();
        let theme_words: Vec<&str> = THEME_WORD_RE
            .find_iter(&theme_lower)
            .map(|m| m.as_str())
            .collect();
        let text_words: HashSet<&str> =
            report.alphabetic_words.iter().map(String::as_str).collect();
        let matches = theme_words
            .iter()
            .filter(|&&w| text_words.contains(w))
            .count();
        if matches == 0 {
            comments.push("Theme adequacy: Little relation to the given theme.".to_string());
            0
        } else if matches < std::cmp::max(1, theme_words.len() / 2) {
            comments.push(
                "Theme adequacy: Partial relation to the theme; the focus could be sharpened."
                    .to_string(),
            );
            1
        } else {
            comments.push("Theme adequacy: Good relation to the theme.".to_string());
            2
        }
    };

    let criteria = CriterionScores {
        structure,
        cohesion,
        clarity,
        vocabulary,
        theme_adequacy,
    };
    let final_score = criteria.total();

    let mut rewrite_examples = Vec::new();
    if !report.long_sentences.is_empty() {
        rewrite_examples.push("Example: turn one long sentence into two shorter ones.".to_string());
    }
    match genre {
        Genre::Poem => rewrite_examples.push(
            "Example (poem): replace literal description with sensory imagery and vary line lengths."
                .to_string(),
        ),
        Genre::Fable => rewrite_examples
            .push("Example (fable): make the moral explicit in the final sentence.".to_string()),
        Genre::Tale => rewrite_examples.push(
            "Example (tale): add a character detail that explains the motivation for the conflict."
                .to_string(),
        ),
        _ => {}
    }

    let base_text = match original_text {
        Some(text) => text.to_string(),
        None => report.lines.join("\n"),
    };
    let auto_rewrites = suggest_rewrites(&base_text);

    FeedbackBundle {
        final_score,
        criteria,
        rubric,
        comments,
        suggestions,
        genre_comments,
        genre_suggestions,
        rewrite_examples,
        auto_rewrites,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Runs metrics computation and genre detection in one pass.
pub fn analyze(text: &str) -> Analysis {
    Analysis {
        genre: detect_genre(text),
        metrics: compute_metrics(text),
    }
}

/// Full pipeline: metrics, genre detection, scoring and feedback.
pub fn evaluate(text: &str, theme: &str) -> Evaluation {
    let Analysis { genre, metrics } = analyze(text);
    let feedback = score_and_feedback(&metrics, genre, theme, Some(text));
    Evaluation {
        genre,
        metrics,
        feedback,
    }
}
