use clap::{Parser, Subcommand};
use std::path::PathBuf;
use topicforge::models::LengthLevel;

#[derive(Parser, Debug)]
#[command(name = "topicforge")]
#[command(about = "Topic queue and content-generation client", long_about = None)]
pub struct Cli {
    /// Configuration file (overrides TOPICFORGE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Service base URL (overrides client.base_url)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit topic titles for bulk generation
    Submit(SubmitArgs),
    /// Re-queue a failed topic
    Retry(TopicIdArgs),
    /// Print the current bulk-processing status
    Status,
    /// Follow bulk-processing status as it changes
    Watch(WatchArgs),
    /// List all topics
    Topics,
    /// Show one topic
    Topic(TopicIdArgs),
    /// Delete one topic
    Delete(TopicIdArgs),
    /// Remove failed topics on the server
    Cleanup,
    /// Print dashboard statistics
    Stats,
    /// Generate content for a topic across platforms
    Generate(GenerateArgs),
    /// Show a content job's status
    Job(JobArgs),
    /// Fetch a job's results
    Results(ResultsArgs),
    /// Fetch every stored result for a topic
    TopicResults(TopicResultsArgs),
}

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    /// Topic titles; blank ones are ignored
    pub topics: Vec<String>,

    /// Read titles from a file, one per line ("-" for stdin)
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// Topics generated per batch (defaults to ingest.default_batch_size)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct TopicIdArgs {
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct WatchArgs {
    /// Poll GET /status instead of subscribing to the event stream
    #[arg(long)]
    pub poll: bool,

    /// Stop after this many snapshots
    #[arg(long)]
    pub count: Option<usize>,

    /// Stop at the first snapshot reporting no processing in progress
    #[arg(long)]
    pub until_idle: bool,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    pub topic_id: i64,

    /// Target such as instagram-story or linkedin-post (repeatable)
    #[arg(long = "target", short = 't', required = true)]
    pub targets: Vec<String>,

    #[arg(long)]
    pub include_images: bool,

    #[arg(long, default_value_t = LengthLevel::Standard)]
    pub length_level: LengthLevel,

    /// Regenerate even if content already exists
    #[arg(long)]
    pub force: bool,

    #[arg(long)]
    pub length_hint: Option<u32>,

    #[arg(long)]
    pub brand_name: Option<String>,

    #[arg(long)]
    pub brand_handle: Option<String>,

    #[arg(long)]
    pub brand_tone: Option<String>,

    #[arg(long)]
    pub brand_website: Option<String>,

    /// Brand hashtag (repeatable)
    #[arg(long = "hashtag")]
    pub hashtags: Vec<String>,

    /// Print the submitted job and exit without waiting
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(clap::Args, Debug)]
pub struct JobArgs {
    pub job_id: String,

    /// Poll until the job reaches a terminal status
    #[arg(long)]
    pub wait: bool,
}

#[derive(clap::Args, Debug)]
pub struct ResultsArgs {
    pub job_id: String,

    /// Print results as received, without normalization
    #[arg(long)]
    pub raw: bool,
}

#[derive(clap::Args, Debug)]
pub struct TopicResultsArgs {
    pub topic_id: i64,

    #[arg(long)]
    pub raw: bool,
}
