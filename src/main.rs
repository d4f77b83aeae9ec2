use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use learnify::config::parse_page_size;
use learnify::{
    AppConfig, BookmarkEngine, BookmarkStore, Bookmarkable, Community, Course, EntityKind,
    JsonFileBookmarkStore, ListFilter, ListView, QuizHistory, Resource, Searchable, newest_first,
    render_strip,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "learnify")]
#[command(about = "Browse Learnify catalogs with search, bookmarks and pagination")]
struct Cli {
    /// Directory holding the bookmark store (overrides LEARNIFY_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one page of a catalog listing
    List(ListArgs),
    /// Change a bookmark
    Bookmark {
        #[arg(value_enum)]
        action: BookmarkAction,
        #[arg(long)]
        kind: EntityKind,
        #[arg(long)]
        id: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// List bookmarked ids
    Bookmarks {
        #[arg(long)]
        kind: EntityKind,
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, value_enum)]
    kind: ListKind,
    /// JSON catalog with `courses`, `resources`, `quizzes` and `communities` arrays
    #[arg(long)]
    catalog: PathBuf,
    #[arg(long)]
    user: Option<String>,
    #[arg(long, default_value = "")]
    search: String,
    /// Only show bookmarked entries
    #[arg(long)]
    bookmarked: bool,
    /// Only show entries created by the user
    #[arg(long)]
    mine: bool,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long, value_parser = parse_page_size_arg)]
    page_size: Option<usize>,
    /// Emit the page as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListKind {
    Course,
    Resource,
    Quiz,
    Community,
}

#[derive(Clone, Copy, ValueEnum)]
enum BookmarkAction {
    Add,
    Remove,
    Toggle,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    courses: Vec<Course>,
    #[serde(default)]
    resources: Vec<Resource>,
    #[serde(default)]
    quizzes: Vec<QuizHistory>,
    #[serde(default)]
    communities: Vec<Community>,
}

/// One-line rendering of a catalog entry for text output.
trait Summary {
    fn summary(&self) -> String;
}

impl Summary for Course {
    fn summary(&self) -> String {
        match self.average_rating {
            Some(rating) => format!("{} ({rating:.1}/5 from {})", self.title, self.total_ratings),
            None => self.title.clone(),
        }
    }
}

impl Summary for Resource {
    fn summary(&self) -> String {
        format!("{} - {}", self.name, self.file_url)
    }
}

impl Summary for QuizHistory {
    fn summary(&self) -> String {
        format!(
            "{}: {}/{} ({}%)",
            self.topic,
            self.score,
            self.total_questions,
            self.percentage()
        )
    }
}

impl Summary for Community {
    fn summary(&self) -> String {
        if self.tags.is_empty() {
            self.title.clone()
        } else {
            format!("{} [{}]", self.title, self.tags.join(", "))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let store: Arc<dyn BookmarkStore> =
        Arc::new(JsonFileBookmarkStore::new(config.bookmarks_path()));

    match cli.command {
        Command::List(args) => run_list(&config, store, args).await,
        Command::Bookmark {
            action,
            kind,
            id,
            user,
        } => {
            let user = resolve_user(&config, user)?;
            let engine = BookmarkEngine::new(store);
            engine
                .load(&user, kind)
                .await
                .context("failed to load bookmarks")?;

            let bookmarked = match action {
                BookmarkAction::Add => engine.add_bookmark(&id).await.map(|()| true),
                BookmarkAction::Remove => engine.remove_bookmark(&id).await.map(|()| false),
                BookmarkAction::Toggle => engine.toggle_bookmark(&id).await,
            }
            .with_context(|| format!("failed to update bookmark '{id}'"))?;

            info!(user = %user, %kind, id = %id, bookmarked, "bookmark updated");
            println!("{kind} {id}: {}", if bookmarked { "bookmarked" } else { "not bookmarked" });
            Ok(())
        }
        Command::Bookmarks { kind, user } => {
            let user = resolve_user(&config, user)?;
            let engine = BookmarkEngine::new(store);
            engine
                .load(&user, kind)
                .await
                .context("failed to load bookmarks")?;
            for id in engine.bookmarks() {
                println!("{id}");
            }
            Ok(())
        }
    }
}

async fn run_list(config: &AppConfig, store: Arc<dyn BookmarkStore>, args: ListArgs) -> Result<()> {
    check_list_filters(args.kind, args.bookmarked, args.mine)?;
    let catalog = read_catalog(&args.catalog).await?;
    let user = args.user.clone().or_else(|| config.default_user.clone());

    match args.kind {
        ListKind::Course => list_bookmarkable(config, store, user, &args, catalog.courses).await,
        ListKind::Resource => {
            list_bookmarkable(config, store, user, &args, catalog.resources).await
        }
        ListKind::Quiz => list_bookmarkable(config, store, user, &args, catalog.quizzes).await,
        ListKind::Community => {
            let view = build_view(config, &args, None, catalog.communities, Vec::new())?;
            print_view(&view, &args, |_| false)
        }
    }
}

/// Reject filters the listed kind has no data for.
fn check_list_filters(kind: ListKind, bookmarked: bool, mine: bool) -> Result<()> {
    match kind {
        ListKind::Community if bookmarked || mine => {
            bail!("communities cannot be filtered by bookmarks or owner")
        }
        // Quiz history entries carry no creator.
        ListKind::Quiz if mine => bail!("quizzes cannot be filtered by owner"),
        _ => Ok(()),
    }
}

async fn list_bookmarkable<T>(
    config: &AppConfig,
    store: Arc<dyn BookmarkStore>,
    user: Option<String>,
    args: &ListArgs,
    items: Vec<T>,
) -> Result<()>
where
    T: Bookmarkable + Summary + Clone + Serialize,
{
    if (args.bookmarked || args.mine) && user.is_none() {
        bail!("--bookmarked and --mine need a user (pass --user or set LEARNIFY_USER)");
    }

    let engine = BookmarkEngine::new(store);
    if let Some(user) = &user {
        // A failed load shows the listing without bookmarks instead of aborting.
        if let Err(err) = engine.load(user, T::KIND).await {
            warn!(error = %err, "continuing without bookmarks");
            eprintln!("warning: {err}");
        }
    }

    let owner = if args.mine { user } else { None };
    let view = build_view(config, args, owner, items, engine.bookmarks())?;
    print_view(&view, args, |id| engine.is_bookmarked(id))
}

fn build_view<T: Searchable + Clone>(
    config: &AppConfig,
    args: &ListArgs,
    owner: Option<String>,
    mut items: Vec<T>,
    bookmarks: Vec<String>,
) -> Result<ListView<T>> {
    newest_first(&mut items);

    let mut filter = ListFilter::new()
        .search(args.search.clone())
        .bookmarked_only(args.bookmarked);
    filter.owner = owner;

    let mut view = ListView::new(args.page_size.unwrap_or(config.page_size))?;
    view.set_bookmarks(bookmarks);
    view.set_filter(filter);
    view.set_items(items);
    view.go_to_page(args.page);
    Ok(view)
}

fn print_view<T, F>(view: &ListView<T>, args: &ListArgs, is_bookmarked: F) -> Result<()>
where
    T: Searchable + Summary + Clone + Serialize,
    F: Fn(&str) -> bool,
{
    if args.json {
        let rendered = serde_json::to_string_pretty(&view.snapshot())
            .context("failed to serialize page")?;
        println!("{rendered}");
        return Ok(());
    }

    if view.filtered_len() == 0 {
        println!(
            "{}",
            if view.filter().bookmarked_only {
                "No bookmarked entries found"
            } else {
                "No entries found"
            }
        );
        return Ok(());
    }

    for item in view.current_items() {
        let marker = if is_bookmarked(item.entity_id()) { "*" } else { " " };
        println!("{marker} {:<12} {}", item.entity_id(), item.summary());
    }

    let pages = view.pages();
    if pages.shows_controls() {
        let prev = if pages.has_previous_page() { "<" } else { " " };
        let next = if pages.has_next_page() { ">" } else { " " };
        println!(
            "\n{prev} {} {next}",
            render_strip(&pages.page_strip(), pages.current_page())
        );
    }
    println!(
        "{} of {} entries, page {} of {}",
        view.current_items().len(),
        view.filtered_len(),
        view.current_page(),
        view.total_pages()
    );
    Ok(())
}

async fn read_catalog(path: &Path) -> Result<CatalogFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse catalog {}", path.display()))
}

fn resolve_user(config: &AppConfig, user: Option<String>) -> Result<String> {
    user.or_else(|| config.default_user.clone())
        .ok_or_else(|| anyhow!("no user given (pass --user or set LEARNIFY_USER)"))
}

fn parse_page_size_arg(raw: &str) -> std::result::Result<usize, String> {
    parse_page_size(raw).map_err(|err| format!("{err:#}"))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("learnify=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
