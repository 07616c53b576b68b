use prose_coach::{
    analyze, compute_metrics, detect_genre, evaluate, rubric_scores, score_and_feedback,
    suggest_rewrites, Genre,
};

// ---------------------------------------------------------------------------
// Genre detection
// ---------------------------------------------------------------------------

#[test]
fn fable_wins_over_tale_marker() {
    // Carries the tale marker "era uma vez", but the fox/crow plus the moral
    // marker match first.
    let text = "Era uma vez uma raposa esperta que enganou um corvo. \
                Moral: a esperteza nem sempre traz recompensa.";
    assert_eq!(detect_genre(text), Genre::Fable);
}

#[test]
fn short_lines_classify_as_poem_before_anything_else() {
    // Fable cues are present, but three short lines satisfy the poem rule
    // and the poem check runs first.
    let text = "A raposa corre\nO corvo canta\nMoral: esperteza vence a força";
    assert_eq!(detect_genre(text), Genre::Poem);
}

#[test]
fn chapter_marker_blocks_poem() {
    let text = "Capítulo um\nA viagem começa\nO mar aberto";
    assert_ne!(detect_genre(text), Genre::Poem);
}

#[test]
fn detects_letter() {
    let text = "Dear Anna, I wanted to thank you for the visit last week and for the \
                kindness you showed everyone here. Sincerely, John.";
    assert_eq!(detect_genre(text), Genre::Letter);
}

#[test]
fn detects_tale() {
    let text = "Once upon a time a boy lived near the sea. He found a lamp buried in \
                the sand one evening.";
    assert_eq!(detect_genre(text), Genre::Tale);
}

#[test]
fn detects_chronicle() {
    let text = "The other day I took the tram downtown and observed people hurrying \
                past the bakery windows.";
    assert_eq!(detect_genre(text), Genre::Chronicle);
}

#[test]
fn detects_opinion_article() {
    let text = "In my opinion, the city should invest in public libraries before \
                anything else.";
    assert_eq!(detect_genre(text), Genre::OpinionArticle);
}

#[test]
fn detects_argumentative_essay_with_two_connectives() {
    let text = "Urban planning shapes public health. Therefore, cities must fund \
                transit. However, budgets remain tight.";
    assert_eq!(detect_genre(text), Genre::ArgumentativeEssay);
}

#[test]
fn narrative_marker_blocks_essay() {
    let text = "Therefore the hero walked on. However, the road was long.";
    assert_ne!(detect_genre(text), Genre::ArgumentativeEssay);
}

#[test]
fn unmarked_text_is_unknown() {
    let text = "The weather forecast promises rain tomorrow afternoon.";
    assert_eq!(detect_genre(text), Genre::Unknown);
}

#[test]
fn genre_parses_from_names_and_aliases() {
    assert_eq!("fable".parse::<Genre>().unwrap(), Genre::Fable);
    assert_eq!("Poema".parse::<Genre>().unwrap(), Genre::Poem);
    assert_eq!(
        "dissertação".parse::<Genre>().unwrap(),
        Genre::ArgumentativeEssay
    );
    assert!("ballad".parse::<Genre>().is_err());
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[test]
fn empty_text_degrades_to_zeroes() {
    let report = compute_metrics("");
    assert_eq!(report.sentence_count, 0);
    assert_eq!(report.word_count, 0);
    assert_eq!(report.mean_words_per_sentence, 0.0);
    assert_eq!(report.vocabulary_size, 0);
    assert_eq!(report.vocabulary_diversity, 0.0);
    assert!(report.paragraphs.is_empty());
    assert!(report.long_paragraphs.is_empty());
    assert!(report.long_sentences.is_empty());
    assert!(report.repeated_words.is_empty());
}

#[test]
fn metrics_on_a_small_text() {
    let report = compute_metrics("One two three. Four five six.");
    assert_eq!(report.sentence_count, 2);
    // Tokenizer tokens, punctuation included.
    assert_eq!(report.word_count, 8);
    assert_eq!(report.mean_words_per_sentence, 4.0);
    assert_eq!(report.vocabulary_size, 6);
    assert_eq!(report.vocabulary_diversity, 100.0);
    assert_eq!(report.paragraphs.len(), 1);
}

#[test]
fn mean_is_zero_exactly_when_no_sentences() {
    for text in ["", "   ", "\n\n"] {
        let report = compute_metrics(text);
        assert_eq!(report.sentence_count, 0, "no sentences in {text:?}");
        assert_eq!(report.mean_words_per_sentence, 0.0);
    }
    let report = compute_metrics("Words here");
    assert!(report.sentence_count > 0);
    assert!(report.mean_words_per_sentence > 0.0);
}

#[test]
fn repeated_and_top_words() {
    let report = compute_metrics("sol sol sol mar mar lua");
    assert_eq!(report.repeated_words, vec!["sol".to_string()]);
    assert_eq!(report.top_words[0], ("sol".to_string(), 3));
    assert_eq!(report.top_words[1], ("mar".to_string(), 2));
    assert_eq!(report.top_words[2], ("lua".to_string(), 1));
}

#[test]
fn paragraphs_split_on_blank_lines() {
    let text = "First paragraph here.\n\nSecond paragraph here.\n   \nThird paragraph here.";
    let report = compute_metrics(text);
    assert_eq!(report.paragraphs.len(), 3);
}

// ---------------------------------------------------------------------------
// Rubric scoring
// ---------------------------------------------------------------------------

#[test]
fn tale_rubric_penalizes_few_sentences_and_small_vocabulary() {
    let report = compute_metrics("O menino saiu. Ele voltou. Tudo mudou.");
    let rubric = rubric_scores(Genre::Tale, &report);
    let creativity = rubric.iter().find(|e| e.criterion == "creativity").unwrap();
    let cohesion = rubric.iter().find(|e| e.criterion == "cohesion").unwrap();
    assert_eq!(cohesion.score, 1, "3 sentences is below the tale minimum");
    assert_eq!(creativity.score, 1, "tiny vocabulary");
}

#[test]
fn poem_rubric_rewards_short_varied_lines() {
    let report = compute_metrics("A chuva cai\nSobre o telhado\nCanta devagar\nNoite adentro");
    let rubric = rubric_scores(Genre::Poem, &report);
    let musicality = rubric.iter().find(|e| e.criterion == "musicality").unwrap();
    let imagery = rubric
        .iter()
        .find(|e| e.criterion == "poetic-imagery")
        .unwrap();
    assert_eq!(musicality.score, 2);
    assert_eq!(imagery.score, 2);
}

#[test]
fn unmapped_genres_fall_back_to_essay_rubric() {
    let report = compute_metrics("Some plain text without much to it.");
    for genre in [Genre::Letter, Genre::Chronicle, Genre::OpinionArticle, Genre::Unknown] {
        let rubric = rubric_scores(genre, &report);
        let names: Vec<&str> = rubric.iter().map(|e| e.criterion).collect();
        assert_eq!(names, vec!["structure", "cohesion", "clarity"]);
    }
}

#[test]
fn rubric_scores_stay_in_range() {
    let report = compute_metrics("Curto.");
    for genre in [Genre::Poem, Genre::Tale, Genre::Fable, Genre::ArgumentativeEssay] {
        for entry in rubric_scores(genre, &report) {
            assert!(entry.score <= 2, "{} out of range", entry.criterion);
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[test]
fn short_text_hard_sets_clarity_to_zero() {
    // Under 80 tokens, one 42-word sentence, "ship" repeated four times: the
    // short-text rule sets clarity to 0 and the two decrements cannot go
    // below the floor.
    let text = "ship sails far beyond ship anchors near harbor ship drifts past \
                lighthouse ship glides under bridges while gulls circle masts rigging \
                creaks slowly sailors watch horizon clouds gather storms threaten \
                voyages endless routes stretch onward tides shift currents pull \
                vessels homeward finally.";
    let report = compute_metrics(text);
    assert!(report.word_count < 80);
    assert!(!report.long_sentences.is_empty());
    assert!(report.repeated_words.contains(&"ship".to_string()));

    let feedback = score_and_feedback(&report, Genre::ArgumentativeEssay, "", Some(text));
    assert_eq!(feedback.criteria.clarity, 0);
    assert_eq!(feedback.criteria.cohesion, 0, "mean words/sentence above 36");
    assert_eq!(feedback.criteria.structure, 0, "single paragraph");
    assert_eq!(feedback.final_score, feedback.criteria.total());
}

#[test]
fn stopword_repetitions_do_not_touch_clarity() {
    // "e" repeats but is both short and a stopword; with enough words and no
    // long sentence, clarity stays at 2.
    let text = "O rio desce a serra e cruza campos largos. Barcos pequenos levam \
                frutas e peixes ao porto velho. Mulheres vendem doces e rendas na \
                praça central. Crianças correm pelas ruas estreitas durante a tarde \
                inteira. Velhos pescadores contam causos antigos perto do cais. \
                Turistas fotografam igrejas coloniais sob o sol forte. Vendedores \
                anunciam tapiocas quentes em voz alta. Meninas empinam pipas \
                coloridas no morro verde. Bandas ensaiam marchas animadas para a \
                festa de junho. Todos esperam ansiosos pela chegada dos navios.";
    let report = compute_metrics(text);
    assert!(report.word_count >= 80);
    assert!(report.long_sentences.is_empty());

    let feedback = score_and_feedback(&report, Genre::Chronicle, "", Some(text));
    assert_eq!(feedback.criteria.clarity, 2);
}

#[test]
fn theme_boundary_with_one_of_three_words() {
    let text = "A cidade debate o ambiente urbano em cada audiência pública.";
    let report = compute_metrics(text);
    // 1 match, threshold max(1, 3/2) = 1; 1 is not below 1, so full marks.
    let feedback = score_and_feedback(&report, Genre::Unknown, "meio ambiente poluição", None);
    assert_eq!(feedback.criteria.theme_adequacy, 2);
}

#[test]
fn theme_partial_match_scores_one() {
    let text = "A floresta guarda silêncio durante a tarde.";
    let report = compute_metrics(text);
    // 1 match of 4 theme words, threshold max(1, 2) = 2.
    let feedback = score_and_feedback(&report, Genre::Unknown, "rio floresta pedra nuvem", None);
    assert_eq!(feedback.criteria.theme_adequacy, 1);
}

#[test]
fn theme_without_overlap_scores_zero() {
    let text = "A floresta guarda silêncio durante a tarde.";
    let report = compute_metrics(text);
    let feedback = score_and_feedback(&report, Genre::Unknown, "galáxia", None);
    assert_eq!(feedback.criteria.theme_adequacy, 0);
}

#[test]
fn missing_theme_scores_two_with_a_note() {
    let text = "A floresta guarda silêncio durante a tarde.";
    let report = compute_metrics(text);
    let feedback = score_and_feedback(&report, Genre::Unknown, "", None);
    assert_eq!(feedback.criteria.theme_adequacy, 2);
    assert!(feedback
        .comments
        .iter()
        .any(|c| c.contains("No theme provided")));
}

#[test]
fn genre_guidance_follows_the_genre() {
    let evaluation = evaluate(
        "Era uma vez uma raposa esperta que enganou um corvo. \
         Moral: a esperteza nem sempre traz recompensa.",
        "",
    );
    assert_eq!(evaluation.genre, Genre::Fable);
    assert!(evaluation.feedback.genre_comments[0].starts_with("Fable:"));
    assert!(evaluation
        .feedback
        .rewrite_examples
        .iter()
        .any(|e| e.contains("(fable)")));
}

#[test]
fn criteria_in_range_and_final_score_is_their_sum() {
    let samples = [
        "",
        "Curto.",
        "Era uma vez uma raposa esperta que enganou um corvo. Moral: a esperteza \
         nem sempre traz recompensa.",
        "Urban planning shapes public health. Therefore, cities must fund transit. \
         However, budgets remain tight.\n\nNew paragraph follows here with more \
         words about policy and funding choices.",
    ];
    for text in samples {
        let evaluation = evaluate(text, "planejamento urbano");
        let c = &evaluation.feedback.criteria;
        for score in [c.structure, c.cohesion, c.clarity, c.vocabulary, c.theme_adequacy] {
            assert!(score <= 2, "criterion out of range for {text:?}");
        }
        assert_eq!(evaluation.feedback.final_score, c.total());
        assert!(evaluation.feedback.final_score <= 10);
    }
}

// ---------------------------------------------------------------------------
// Rewrite suggestions
// ---------------------------------------------------------------------------

#[test]
fn rewrite_splits_after_comma_near_midpoint() {
    // 36 words with a comma three tokens left of the midpoint: the split
    // lands right after the comma, not at the raw midpoint.
    let text = "one two three four five six seven eight nine ten eleven twelve \
                thirteen fourteen fifteen sixteen, seventeen eighteen nineteen twenty \
                alfa bravo charlie delta echo foxtrot golf hotel india juliett kilo \
                lima mike november oscar papa.";
    let suggestions = suggest_rewrites(text);
    assert_eq!(suggestions.len(), 1);
    assert!(
        suggestions[0].contains("sixteen. Seventeen"),
        "expected the seam after the comma, got: {}",
        suggestions[0]
    );
    assert!(!suggestions[0].contains("sixteen,"));
}

#[test]
fn rewrite_falls_back_to_the_midpoint() {
    let text = "one two three four five six seven eight nine ten eleven twelve \
                thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty \
                alfa bravo charlie delta echo foxtrot golf hotel india juliett kilo \
                lima mike november oscar papa.";
    let suggestions = suggest_rewrites(text);
    assert_eq!(suggestions.len(), 1);
    assert!(
        suggestions[0].contains("eighteen. Nineteen"),
        "expected a midpoint split, got: {}",
        suggestions[0]
    );
}

#[test]
fn rewrite_cap_is_global() {
    let sentence = "one two three four five six seven eight nine ten eleven twelve \
                    thirteen fourteen fifteen sixteen seventeen eighteen nineteen \
                    twenty alfa bravo charlie delta echo foxtrot golf hotel india \
                    juliett kilo lima mike november oscar papa. ";
    let text = sentence.repeat(5);
    let suggestions = suggest_rewrites(&text);
    assert_eq!(suggestions.len(), 3);
}

#[test]
fn short_sentences_get_no_rewrites() {
    assert!(suggest_rewrites("A short sentence. Another one here.").is_empty());
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[test]
fn evaluation_is_deterministic() {
    let text = "Era uma vez uma raposa esperta que enganou um corvo. \
                Moral: a esperteza nem sempre traz recompensa.";
    let first = serde_json::to_string(&evaluate(text, "esperteza")).unwrap();
    let second = serde_json::to_string(&evaluate(text, "esperteza")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn json_output_is_valid() {
    let evaluation = evaluate(
        "The other day I took the tram downtown and observed people hurrying \
         past the bakery windows.",
        "cidade",
    );
    let json = serde_json::to_string_pretty(&evaluation).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["genre"], "chronicle");
    assert!(parsed["metrics"]["word_count"].is_number());
    assert!(parsed["feedback"]["final_score"].is_number());
    assert!(parsed["feedback"]["criteria"]["clarity"].is_number());
    assert!(parsed["feedback"]["rubric"].is_array());
    assert!(parsed["feedback"]["auto_rewrites"].is_array());
}

#[test]
fn analyze_exposes_metrics_and_genre_together() {
    let analysis = analyze("Dear Anna, thank you for everything you did. Sincerely, John.");
    assert_eq!(analysis.genre, Genre::Letter);
    assert!(analysis.metrics.word_count > 0);
}
