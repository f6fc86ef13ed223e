use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vydra")]
#[command(author, version, about = "Self-hosted web service for downloading videos at a chosen quality", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web service (the default when no command is given)
    Serve {
        /// Port to listen on (overrides WEB_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (overrides WEB_HOST)
        #[arg(long)]
        host: Option<String>,
    },

    /// Check that yt-dlp, ffmpeg and ffprobe are available and print their versions
    Doctor,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
