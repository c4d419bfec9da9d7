use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AI-powered nutrition analysis pipeline for diet tracking
#[derive(Parser, Debug)]
#[command(
    name = "mealscope",
    about = "AI-powered nutrition analysis pipeline for diet tracking",
    version,
    long_about = "mealscope analyzes meal photos with vision-capable LLMs, extracts \
                  structured nutrition facts, grounds them in retrieved knowledge, and \
                  generates dietary advice. It also runs disease-risk analysis over \
                  structured medical records or free-text input."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Analyze a meal photo",
        long_about = "Runs the full nutrition analysis pipeline over a meal photo: image \
                      understanding, nutrient extraction, knowledge retrieval, and advice \
                      generation.\n\n\
                      Examples:\n  \
                      mealscope analyze lunch.jpg\n  \
                      mealscope analyze lunch.jpg --preferences '{\"vegetarian\": true}'\n  \
                      mealscope analyze lunch.jpg --stream"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Analyze disease risk for a meal",
        long_about = "Analyzes the health risk a nutrient intake poses for a disease, or \
                      extracts disease/allergen mentions from free text.\n\n\
                      Examples:\n  \
                      mealscope risk --disease Hypertension --nutrition '{\"sodium\": 1200}'\n  \
                      mealscope risk --input 'I have hypertension and a peanut allergy'"
    )]
    Risk(RiskArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(value_name = "IMAGE", help = "Path to the meal photo")]
    pub image: PathBuf,

    #[arg(
        short = 'p',
        long,
        value_name = "JSON",
        help = "User preferences as a JSON object"
    )]
    pub preferences: Option<String>,

    #[arg(
        short = 'k',
        long,
        value_name = "FILE",
        help = "Newline-delimited nutrition facts to seed the knowledge store"
    )]
    pub knowledge_file: Option<PathBuf>,

    #[arg(long, help = "Emit progress as SSE frames on stdout")]
    pub stream: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RiskArgs {
    #[arg(long, value_name = "NAME", help = "Diagnosed disease name")]
    pub disease: Option<String>,

    #[arg(long, value_name = "1-3", help = "Disease severity")]
    pub severity: Option<u8>,

    #[arg(long, value_name = "NAME", help = "Known allergen name")]
    pub allergen: Option<String>,

    #[arg(
        long,
        value_name = "JSON",
        help = "Nutrient intake as a JSON object (calories, sodium, ...)"
    )]
    pub nutrition: Option<String>,

    #[arg(
        short = 'i',
        long,
        value_name = "TEXT",
        help = "Free-text input; when given, only entity extraction runs"
    )]
    pub input: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_args_parse() {
        let args = CliArgs::parse_from(["mealscope", "analyze", "lunch.jpg", "--stream"]);
        match args.command {
            Commands::Analyze(analyze) => {
                assert_eq!(analyze.image, PathBuf::from("lunch.jpg"));
                assert!(analyze.stream);
            }
            _ => panic!("expected analyze command"),
        }
    }

    #[test]
    fn test_risk_args_parse() {
        let args = CliArgs::parse_from([
            "mealscope",
            "risk",
            "--disease",
            "Hypertension",
            "--severity",
            "2",
        ]);
        match args.command {
            Commands::Risk(risk) => {
                assert_eq!(risk.disease.as_deref(), Some("Hypertension"));
                assert_eq!(risk.severity, Some(2));
                assert!(risk.input.is_none());
            }
            _ => panic!("expected risk command"),
        }
    }
}
