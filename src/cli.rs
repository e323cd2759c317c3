use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the AI-estimated meal JSON file
    #[arg(short, long)]
    pub meal_file: String,

    /// Pretty-print the corrected meal JSON
    #[arg(long)]
    pub pretty: bool,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
