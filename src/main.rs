use std::io::Read;

use clap::Parser;

use prose_coach::{analyze, score_and_feedback, Evaluation, Genre};

#[derive(Parser)]
#[command(
    name = "prose-coach",
    about = "Genre-aware writing feedback: metrics, rubric scores, and rewrite suggestions",
    version
)]
struct Cli {
    /// File paths to evaluate (reads stdin if none provided)
    files: Vec<String>,

    /// Theme of the writing exercise, used for the theme-adequacy criterion
    #[arg(long, default_value = "")]
    theme: String,

    /// Override the detected genre (poem, letter, fable, tale, chronicle,
    /// opinion-article, argumentative-essay)
    #[arg(long)]
    genre: Option<Genre>,
}

fn run(text: &str, theme: &str, genre_override: Option<Genre>) {
    let analysis = analyze(text);
    let genre = genre_override.unwrap_or(analysis.genre);
    let feedback = score_and_feedback(&analysis.metrics, genre, theme, Some(text));
    let evaluation = Evaluation {
        genre,
        metrics: analysis.metrics,
        feedback,
    };
    println!("{}", serde_json::to_string_pretty(&evaluation).unwrap());
}

fn main() {
    let cli = Cli::parse();

    if cli.files.is_empty() {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .expect("Failed to read stdin");
        run(&input, &cli.theme, cli.genre);
    } else {
        for path in &cli.files {
            let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading {path}: {e}");
                std::process::exit(1);
            });
            run(&text, &cli.theme, cli.genre);
        }
    }
}
