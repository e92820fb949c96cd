use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use blogtool::cli::{self, Context, GitMode, NewPostArgs, NewPostOutcome, RefreshArgs};
use blogtool::config::load_config;
use blogtool::domain::{format_date, parse_date};
use blogtool::git::{Git2Repository, Repository};
use blogtool::ui;

#[derive(clap::Parser)]
#[command(
    name = "blogtool",
    about = "Create and maintain blog post drafts in a git repository"
)]
struct Args {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct GlobalOpts {
    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase logging (repeat for more)")]
    verbose: u8,

    #[arg(short = 'M', long, global = true, help = "Branch drafts are created from")]
    main_branch: Option<String>,

    #[arg(short = 'P', long, global = true, help = "Directory holding post files")]
    post_directory: Option<PathBuf>,

    #[arg(short = 'C', long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new post
    Newpost(NewpostCmd),
    /// List draft branches
    Lsdraft,
    /// Move the posts on a draft branch to a new date
    Refresh(RefreshCmd),
    /// Print version information
    Version,
}

#[derive(clap::Args)]
struct NewpostCmd {
    #[arg(short, long = "tag", help = "Tag the post (repeatable)")]
    tags: Vec<String>,

    #[arg(short, long = "category", help = "Categorize the post (repeatable)")]
    categories: Vec<String>,

    #[arg(short, long, value_parser = parse_date_arg, help = "Publish date (YYYY-MM-DD), default today")]
    date: Option<NaiveDate>,

    #[arg(short, long, help = "Use this slug instead of deriving one from the title")]
    slug: Option<String>,

    #[arg(short = 'D', long, help = "Mark the post as a draft")]
    draft: bool,

    #[arg(short, long, help = "Create a draft branch and commit the post")]
    git: bool,

    #[arg(short = 'G', long, help = "Stage the post without branching or committing")]
    git_add_only: bool,

    #[arg(short = 'S', long, help = "Print the post instead of writing it")]
    stdout: bool,

    #[arg(short, long, help = "Ordering weight")]
    weight: Option<i64>,

    #[arg(long, help = "Maximum length of a derived slug")]
    max_length: Option<usize>,

    title: String,
}

#[derive(clap::Args)]
struct RefreshCmd {
    #[arg(short, long, value_parser = parse_date_arg, help = "New date (YYYY-MM-DD), default today")]
    date: Option<NaiveDate>,

    #[arg(default_value = "HEAD", help = "Draft branch or slug")]
    draft_name: String,
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

fn main() {
    let args = Args::parse();
    init_logging(args.global.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&e.to_string());
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Version => {
            println!("blogtool {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Newpost(cmd) => run_newpost(&open_context(args.global)?, cmd),
        Command::Lsdraft => run_lsdraft(&open_context(args.global)?),
        Command::Refresh(cmd) => run_refresh(&open_context(args.global)?, cmd),
    }
}

fn open_context(global: GlobalOpts) -> Result<Context<Git2Repository>> {
    let repo = Git2Repository::open(".")?;
    let workdir = repo.workdir()?;
    let config = load_config(global.config.as_deref(), &workdir)?
        .with_overrides(global.main_branch, global.post_directory)
        .resolve(&workdir)?;

    log::debug!("using {:?}", config);
    Ok(Context::new(repo, config))
}

fn run_newpost(ctx: &Context<Git2Repository>, cmd: NewpostCmd) -> Result<()> {
    let git = if cmd.git {
        GitMode::Commit
    } else if cmd.git_add_only {
        GitMode::AddOnly
    } else {
        GitMode::None
    };

    let args = NewPostArgs {
        title: cmd.title,
        tags: cmd.tags,
        categories: cmd.categories,
        date: cmd.date,
        slug: cmd.slug,
        draft: cmd.draft,
        weight: cmd.weight,
        max_slug_length: cmd.max_length,
        stdout: cmd.stdout,
        git,
    };

    match cli::newpost(ctx, &args)? {
        NewPostOutcome::Printed(text) => print!("{}", text),
        NewPostOutcome::Written { path, .. } => println!("{}", path.display()),
    }

    Ok(())
}

fn run_lsdraft(ctx: &Context<Git2Repository>) -> Result<()> {
    let drafts = cli::lsdraft(ctx)?;
    println!("{}", drafts.join("\n"));
    Ok(())
}

fn run_refresh(ctx: &Context<Git2Repository>, cmd: RefreshCmd) -> Result<()> {
    let args = RefreshArgs {
        draft_name: Some(cmd.draft_name),
        date: cmd.date,
    };

    let outcome = cli::refresh(ctx, &args)?;

    for (from, to) in &outcome.renamed {
        ui::display_rename(from, to);
    }

    match outcome.commit {
        Some(oid) => ui::display_success(&format!(
            "{} updated to date {} ({:.7})",
            outcome.branch,
            format_date(outcome.date),
            oid
        )),
        None => ui::display_status(&format!(
            "{} already dated {}",
            outcome.branch,
            format_date(outcome.date)
        )),
    }

    Ok(())
}
