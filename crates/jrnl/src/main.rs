//! jrnl - terminal journal viewer with an offline entry cache

mod app;
mod commands;
mod net;
mod terminal;
mod tls;

use anyhow::Result;
use clap::Parser;
use journalcache::{
    CacheConfig, CacheStorage, OfflineCache, Request, DEFAULT_CACHE_NAME, DEFAULT_ENTRIES_URL,
};
use journalnav::{Command, Dispatcher, EntryList, MemoryViewPort, Navigator, PageDescriptor};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::commands::Input;
use crate::net::HttpFetcher;
use crate::tls::TlsConfig;

type Worker = OfflineCache<Arc<HttpFetcher>>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Origin used to build history URLs
    #[arg(long, default_value = "http://localhost:8080")]
    origin: String,

    /// Entries endpoint (JSON array of entries)
    #[arg(long, default_value = DEFAULT_ENTRIES_URL)]
    entries_url: String,

    /// Directory holding cache generations
    #[arg(long, default_value = "./data/cache")]
    cache_dir: String,

    /// Cache generation name
    #[arg(long, default_value = DEFAULT_CACHE_NAME)]
    cache_name: String,

    /// Extra URL to store at install (repeatable)
    #[arg(long = "seed")]
    seeds: Vec<String>,

    /// PEM bundle of trusted CA certificates
    #[arg(long, default_value = "/etc/ssl/certs/ca-certificates.crt")]
    ca_file: String,

    /// Initial URL fragment, e.g. "#entry3"
    #[arg(long, default_value = "")]
    start: String,

    /// Skip offline cache registration
    #[arg(long)]
    no_offline: bool,

    /// Network timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

impl Args {
    fn start_url(&self) -> String {
        let fragment = self.start.trim_start_matches('#');
        if fragment.is_empty() {
            self.origin.clone()
        } else {
            format!("{}#{}", self.origin, fragment)
        }
    }

    fn cache_config(&self) -> CacheConfig {
        let mut seed_urls = vec![self.entries_url.clone()];
        for url in &self.seeds {
            if !seed_urls.contains(url) {
                seed_urls.push(url.clone());
            }
        }
        CacheConfig {
            cache_name: self.cache_name.clone(),
            seed_urls,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    info!("Starting jrnl v{}", env!("CARGO_PKG_VERSION"));
    info!("Origin: {}", args.origin);
    info!("Entries: {}", args.entries_url);

    let tls = match TlsConfig::from_ca_file(&args.ca_file) {
        Ok(tls) => tls,
        Err(e) => {
            warn!("TLS disabled: {:#}", e);
            TlsConfig::disabled()
        }
    };
    if !tls.is_enabled() {
        warn!("https:// URLs will fail");
    }
    let fetcher = Arc::new(HttpFetcher::new(tls, Duration::from_secs(args.timeout_secs)));

    let start_url = args.start_url();

    let offline = if args.no_offline {
        info!("Offline cache disabled");
        None
    } else {
        match CacheStorage::open_dir(&args.cache_dir) {
            Ok(storage) => Some((storage, args.cache_config())),
            Err(e) => {
                warn!("Offline cache unavailable, cannot open {}: {}", args.cache_dir, e);
                None
            }
        }
    };
    let app::Session { worker, entries } =
        app::open_session(Arc::clone(&fetcher), offline, &args.entries_url, &start_url).await;

    let mut navigator = Navigator::new(MemoryViewPort::new(&start_url), entries, &args.origin);

    // The initial document is already in history
    let initial = PageDescriptor::from_url(&start_url).ok();
    if let Err(e) = navigator.transition(initial, true) {
        warn!("Cannot open {}: {}", start_url, e);
    }

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(read_input(tx));

    run(&mut navigator, worker.as_ref(), rx).await?;

    info!("Bye");
    Ok(())
}

async fn read_input(tx: mpsc::Sender<Input>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match commands::parse(&line) {
                Ok(Some(input)) => {
                    if tx.send(input).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(msg) => println!("{}", msg),
            },
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        }
    }
    debug!("Input closed");
}

async fn run(
    navigator: &mut Navigator<MemoryViewPort, EntryList>,
    worker: Option<&Worker>,
    mut rx: mpsc::Receiver<Input>,
) -> Result<()> {
    let mut dispatcher = Dispatcher::new();
    redraw(navigator)?;
    println!("Type 'help' for commands.");

    while let Some(input) = rx.recv().await {
        let mut stdout = io::stdout().lock();
        let mut dirty = true;

        match input {
            Input::Navigate(page) => dispatcher.enqueue(Command::Navigate(Some(page))),
            Input::Back | Input::Forward => {
                match app::traverse(navigator, &mut dispatcher, input == Input::Back) {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        writeln!(stdout, "{}", e)?;
                        dirty = false;
                    }
                    None => {
                        writeln!(stdout, "(nowhere to go)")?;
                        dirty = false;
                    }
                }
            }
            Input::List => {}
            Input::History => {
                terminal::render_history(&mut stdout, navigator.view().history())?;
                dirty = false;
            }
            Input::Stats => {
                print_stats(&mut stdout, worker)?;
                dirty = false;
            }
            Input::Help => {
                writeln!(stdout, "{}", commands::HELP)?;
                dirty = false;
            }
            Input::Quit => break,
        }

        for e in dispatcher.dispatch_all(navigator) {
            writeln!(stdout, "{}", e)?;
            dirty = false;
        }
        drop(stdout);

        if dirty {
            redraw(navigator)?;
        }
    }
    Ok(())
}

fn redraw(navigator: &Navigator<MemoryViewPort, EntryList>) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    terminal::render(&mut stdout, navigator.view(), navigator.entries())?;
    stdout.flush()
}

fn print_stats<W: Write>(out: &mut W, worker: Option<&Worker>) -> io::Result<()> {
    let worker = match worker {
        Some(worker) => worker,
        None => return writeln!(out, "offline cache: not registered"),
    };

    let stats = worker.stats();
    writeln!(out, "offline cache: {} ({})", worker.config().cache_name, worker.state())?;
    writeln!(
        out,
        "hits: {}  misses: {}  network: {}  seeded: {}  hit ratio: {:.1}%",
        stats.hits(),
        stats.misses(),
        stats.network_fetches(),
        stats.seeded(),
        stats.hit_ratio() * 100.0
    )?;
    if let Some(store) = worker.store() {
        for url in store.keys() {
            let request = Request::get(url.as_str());
            match store.stored_at(&request) {
                Some(at) => writeln!(out, "  {}  stored {}", url, at.to_rfc3339())?,
                None => writeln!(out, "  {}", url)?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_url() {
        let mut args = Args::parse_from(["jrnl"]);
        assert_eq!(args.start_url(), "http://localhost:8080");

        args.start = "#entry3".to_string();
        assert_eq!(args.start_url(), "http://localhost:8080#entry3");

        args.start = "settings".to_string();
        assert_eq!(args.start_url(), "http://localhost:8080#settings");
    }

    #[test]
    fn test_cache_config_dedups_seeds() {
        let args = Args::parse_from([
            "jrnl",
            "--entries-url",
            "http://a.test/entries",
            "--seed",
            "http://a.test/entries",
            "--seed",
            "http://a.test/style.css",
            "--cache-name",
            "journal-cache-v2",
        ]);
        let config = args.cache_config();
        assert_eq!(config.cache_name, "journal-cache-v2");
        assert_eq!(
            config.seed_urls,
            vec!["http://a.test/entries", "http://a.test/style.css"]
        );
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["jrnl"]);
        assert_eq!(args.cache_config(), CacheConfig::default());
        assert!(!args.no_offline);
        assert_eq!(args.timeout_secs, 10);
    }

    #[test]
    fn test_print_stats_without_worker() {
        let mut out = Vec::new();
        print_stats(&mut out, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "offline cache: not registered\n");
    }
}
