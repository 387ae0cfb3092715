//! Subcommand handlers. Results go to stdout as JSON, logs to stderr.

use serde::Serialize;
use std::error::Error;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::cli::{
    Commands, GenerateArgs, JobArgs, SubmitArgs, TopicResultsArgs, WatchArgs,
};
use topicforge::config::{Config, FanoutConfig};
use topicforge::fanout::StatusFanout;
use topicforge::jobs::{CancellationToken, ContentJobs, PollError, PollOutcome};
use topicforge::models::{BrandConfig, GenerateAllRequest, GenerationOptions, ResultsResponse};
use topicforge::normalize::{NormalizedResult, normalize_all};
use topicforge::topics::{TopicQueue, parse_topic_lines};
use topicforge::transport::ApiClient;
use topicforge::validation::validate_job_id;

type CommandResult = Result<(), Box<dyn Error + Send + Sync>>;

pub async fn run(command: Commands, config: Config) -> CommandResult {
    let api = ApiClient::new(&config.client)?;
    let topics = TopicQueue::new(api.clone(), config.ingest.clone());
    let jobs = ContentJobs::new(api.clone(), config.polling.clone());

    match command {
        Commands::Submit(args) => submit(&topics, args).await?,
        Commands::Retry(args) => print_json(&topics.retry_topic(args.id).await?)?,
        Commands::Status => print_json(&topics.status().await?)?,
        Commands::Watch(args) => watch(api.clone(), &config.fanout, args).await?,
        Commands::Topics => print_json(&topics.list_topics().await?)?,
        Commands::Topic(args) => print_json(&topics.get_topic(args.id).await?)?,
        Commands::Delete(args) => print_json(&topics.delete_topic(args.id).await?)?,
        Commands::Cleanup => print_json(&topics.cleanup().await?)?,
        Commands::Stats => print_json(&topics.stats().await?)?,
        Commands::Generate(args) => generate(&jobs, args).await?,
        Commands::Job(args) => job(&jobs, args).await?,
        Commands::Results(args) => results(jobs.job_results(&args.job_id).await?, args.raw)?,
        Commands::TopicResults(TopicResultsArgs { topic_id, raw }) => {
            results(jobs.topic_results(topic_id).await?, raw)?
        }
    }

    debug!(metrics = ?api.metrics().snapshot(), "Command finished");
    Ok(())
}

async fn submit(topics: &TopicQueue, args: SubmitArgs) -> CommandResult {
    let mut titles = args.topics;
    if let Some(path) = &args.file {
        titles.extend(parse_topic_lines(&read_input(path)?));
    }

    let batch_size = args.batch_size.unwrap_or_else(|| topics.default_batch_size());
    print_json(&topics.submit_topics(titles, batch_size).await?)
}

fn read_input(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}

async fn watch(api: ApiClient, config: &FanoutConfig, args: WatchArgs) -> CommandResult {
    let fanout = if args.poll {
        StatusFanout::polling(api, config)
    } else {
        StatusFanout::sse(api, config)
    };
    let mut subscription = fanout.subscribe();
    fanout.connect();

    let cancel = cancel_on_shutdown();
    let mut seen = 0usize;

    loop {
        let update = tokio::select! {
            _ = cancel.cancelled() => break,
            update = subscription.next() => update,
        };
        let Some(update) = update else {
            break;
        };

        print_json(&*update)?;
        seen += 1;

        if args.count.is_some_and(|count| seen >= count) {
            break;
        }
        if args.until_idle && !update.snapshot.is_processing {
            info!("Processing finished");
            break;
        }
    }

    fanout.disconnect().await;
    Ok(())
}

async fn generate(jobs: &ContentJobs, args: GenerateArgs) -> CommandResult {
    let request = GenerateAllRequest::builder()
        .topic_id(args.topic_id)
        .target_platforms(args.targets)
        .brand(BrandConfig {
            name: args.brand_name,
            handle: args.brand_handle,
            tone: args.brand_tone,
            website: args.brand_website,
            hashtags: args.hashtags,
        })
        .options(GenerationOptions {
            include_images: args.include_images,
            max_length_levels: args.length_level,
            force: args.force,
            length_hint: args.length_hint,
        })
        .build();

    if args.no_wait {
        let response = jobs.generate_all(&request).await?;
        #[derive(Serialize)]
        struct Submitted<'a> {
            #[serde(flatten)]
            response: &'a topicforge::models::GenerateAllResponse,
            dropped: Vec<String>,
        }
        return print_json(&Submitted {
            dropped: response.dropped_targets(&request),
            response: &response,
        });
    }

    let cancel = cancel_on_shutdown();
    let report = jobs
        .run(&request, &cancel, |status| {
            info!(
                job_id = %status.job_id,
                done = status.progress.done,
                total = status.progress.total,
                "Generating"
            );
        })
        .await?;

    if report.malformed_count() > 0 {
        warn!(count = report.malformed_count(), "Some results could not be normalized");
    }
    print_json(&report)
}

async fn job(jobs: &ContentJobs, args: JobArgs) -> CommandResult {
    if !args.wait {
        return print_json(&jobs.job_status(&args.job_id).await?);
    }

    validate_job_id(&args.job_id)?;

    let cancel = cancel_on_shutdown();
    let outcome = jobs
        .poller()
        .poll_until_terminal(&args.job_id, &cancel, |status| {
            info!(
                done = status.progress.done,
                total = status.progress.total,
                "Waiting for job"
            );
        })
        .await?;

    match outcome {
        PollOutcome::Finished(status) => print_json(&status),
        PollOutcome::Cancelled { .. } | PollOutcome::Superseded => Err(PollError::Cancelled.into()),
    }
}

#[derive(Serialize)]
struct NormalizedResults {
    results: Vec<NormalizedResult>,
    errors: Vec<serde_json::Value>,
}

fn results(response: ResultsResponse, raw: bool) -> CommandResult {
    if raw {
        return print_json(&response);
    }

    print_json(&NormalizedResults {
        results: normalize_all(&response.results),
        errors: response.errors,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Token cancelled on Ctrl+C or SIGTERM
fn cancel_on_shutdown() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        token.cancel();
    });
    cancel
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
