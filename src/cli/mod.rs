// src/cli/mod.rs
pub mod commands;
pub mod render;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "scene-speak", version, about = "Analyze videos and chat about them")]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "SCENE_SPEAK_API_URL")]
    pub api_url: Option<String>,

    /// Delay between status polls, in milliseconds
    #[arg(long, global = true, env = "SCENE_SPEAK_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account (prompts for the password)
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Sign in with email and password, or with a Google ID token
    Login(LoginArgs),
    Logout,
    /// Show who is signed in
    Whoami,
    /// Submit a video, a YouTube link or a question, then chat about the result
    Analyze {
        /// Local video file to upload
        #[arg(long, short)]
        file: Option<PathBuf>,
        /// YouTube URL, prompt or free text
        text: Vec<String>,
    },
    /// List previous analyses
    History {
        /// Only show jobs whose title contains this text
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Continue the conversation of a previous analysis
    Resume { job_id: String },
    /// Single-shot endpoints without a conversation
    #[command(subcommand)]
    Legacy(LegacyCommand),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long, required_unless_present = "google_id_token", conflicts_with = "google_id_token")]
    pub email: Option<String>,

    #[arg(long)]
    pub google_id_token: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum LegacyCommand {
    /// Upload a video and wait for it to be processed
    Upload { path: PathBuf },
    /// Ask a question about an uploaded file
    Generate { file_id: String, prompt: String },
    /// Analyze a YouTube video in one request
    Youtube { url: String, prompt: Option<String> },
}
