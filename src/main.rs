use anyhow::{bail, Context};
use blogstore::{config::Config, Article, Database, SortField, TimeMs};
use std::io::Read;

const DEFAULT_COUNT: u32 = 10;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Print the newest articles as JSON lines.
    List { count: u32 },
    /// Save stdin as a new article dated now.
    Post { title: String },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    match args {
        [] => Ok(Command::List {
            count: DEFAULT_COUNT,
        }),
        [cmd, title] if cmd == "post" => {
            if title.trim().is_empty() {
                bail!("article title must not be empty");
            }
            Ok(Command::Post {
                title: title.clone(),
            })
        }
        [cmd, ..] if cmd == "post" => bail!("usage: blogstore post TITLE < CONTENT"),
        [count] => {
            let count = count
                .parse::<u32>()
                .with_context(|| format!("invalid article count: {}", count))?;
            Ok(Command::List { count })
        }
        _ => bail!("usage: blogstore [COUNT] | blogstore post TITLE < CONTENT"),
    }
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;

    let content = match &command {
        Command::Post { .. } => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read article content from stdin")?;
            Some(buf)
        }
        Command::List { .. } => None,
    };

    let config = Config::from_env().context("Configuration error")?;

    let mut db = Database::new(&config);
    db.open().await.context("Failed to initialize database")?;

    let articles = match db.articles() {
        Ok(repo) => match &command {
            Command::List { count } => repo.list_page(SortField::Date, false, 0, *count).await,
            Command::Post { title } => {
                let draft = Article::new(title.as_str(), content.unwrap_or_default(), TimeMs::now());
                repo.save(&draft)
                    .await
                    .map(|saved| saved.into_iter().collect())
            }
        },
        Err(e) => Err(e),
    };

    // Close before reporting so the config is flushed either way.
    db.close().await;

    for article in articles.context("Database operation failed")? {
        println!("{}", serde_json::to_string(&article)?);
    }
    Ok(())
}
