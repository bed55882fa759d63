mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use client_core::{load_settings, load_settings_from};
use shared::protocol::{
    NewPost, NewProfessor, NewStudent, PostChanges, PostFilter, ProfessorChanges, StudentChanges,
};
use tracing_subscriber::EnvFilter;

use crate::commands::{App, Credentials};

#[derive(Parser, Debug)]
#[command(name = "blog", about = "Browse and manage the classroom blog")]
struct Cli {
    /// Settings file; defaults to ./blog.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the configured API base url.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Sign-in email for commands that change records.
    #[arg(long, global = true)]
    user: Option<String>,
    #[arg(long, global = true)]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Checks that the backend answers.
    Health,
    /// Verifies --user/--password and prints the signed-in user.
    Login,
    Posts {
        #[command(subcommand)]
        action: PostAction,
    },
    Professors {
        #[command(subcommand)]
        action: ProfessorAction,
    },
    Students {
        #[command(subcommand)]
        action: StudentAction,
    },
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Keep loading pages until the last one.
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    term: String,
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    id: String,
    /// Listing page the record is on.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

#[derive(Subcommand, Debug)]
enum PostAction {
    List {
        #[command(flatten)]
        paging: PageArgs,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        subject: Option<String>,
    },
    Search(SearchArgs),
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
enum ProfessorAction {
    List(PageArgs),
    Search(SearchArgs),
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        subject: Option<String>,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
enum StudentAction {
    List(PageArgs),
    Search(SearchArgs),
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long = "class")]
        class_name: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long = "class")]
        class_name: Option<String>,
    },
    Delete(DeleteArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings(),
    };
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    let credentials = match (cli.user, cli.password) {
        (Some(email), Some(password)) => Some(Credentials { email, password }),
        _ => None,
    };
    let app = App::new(&settings, credentials)?;

    match cli.command {
        Command::Health => app.health().await,
        Command::Login => app.login().await,
        Command::Posts { action } => run_posts(&app, action).await,
        Command::Professors { action } => run_professors(&app, action).await,
        Command::Students { action } => run_students(&app, action).await,
    }
}

async fn run_posts(app: &App, action: PostAction) -> Result<()> {
    let posts = app.client.posts();
    match action {
        PostAction::List {
            paging,
            author,
            subject,
        } => {
            let filters = PostFilter { author, subject }
                .into_pairs(&app.filter_keys);
            app.list(posts, paging.page, paging.all, filters).await
        }
        PostAction::Search(args) => app.search(posts, &args.term, args.all).await,
        PostAction::Show { id } => app.show(posts, &id).await,
        PostAction::Create {
            title,
            body,
            author,
            subject,
            tags,
        } => {
            let draft = NewPost {
                title,
                body,
                author,
                subject,
                tags,
            };
            app.create(posts, draft).await
        }
        PostAction::Update {
            id,
            title,
            body,
            author,
            subject,
            tags,
        } => {
            let changes = PostChanges {
                title,
                body,
                author,
                subject,
                tags,
            };
            app.update(posts, &id, changes).await
        }
        PostAction::Delete(args) => app.delete(posts, &args.id, args.page).await,
    }
}

async fn run_professors(app: &App, action: ProfessorAction) -> Result<()> {
    let professors = app.client.professors();
    match action {
        ProfessorAction::List(paging) => {
            app.list(professors, paging.page, paging.all, Vec::new())
                .await
        }
        ProfessorAction::Search(args) => app.search(professors, &args.term, args.all).await,
        ProfessorAction::Show { id } => app.show(professors, &id).await,
        ProfessorAction::Create {
            name,
            email,
            subject,
        } => {
            let draft = NewProfessor {
                name,
                email,
                subject,
            };
            app.create(professors, draft).await
        }
        ProfessorAction::Update {
            id,
            name,
            email,
            subject,
        } => {
            let changes = ProfessorChanges {
                name,
                email,
                subject,
            };
            app.update(professors, &id, changes).await
        }
        ProfessorAction::Delete(args) => app.delete(professors, &args.id, args.page).await,
    }
}

async fn run_students(app: &App, action: StudentAction) -> Result<()> {
    let students = app.client.students();
    match action {
        StudentAction::List(paging) => {
            app.list(students, paging.page, paging.all, Vec::new())
                .await
        }
        StudentAction::Search(args) => app.search(students, &args.term, args.all).await,
        StudentAction::Show { id } => app.show(students, &id).await,
        StudentAction::Create {
            name,
            email,
            class_name,
        } => {
            let draft = NewStudent {
                name,
                email,
                class_name,
            };
            app.create(students, draft).await
        }
        StudentAction::Update {
            id,
            name,
            email,
            class_name,
        } => {
            let changes = StudentChanges {
                name,
                email,
                class_name,
            };
            app.update(students, &id, changes).await
        }
        StudentAction::Delete(args) => app.delete(students, &args.id, args.page).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "blog",
            "posts",
            "list",
            "--page",
            "2",
            "--author",
            "Prof. Ana",
            "--api-url",
            "http://localhost:4000",
        ])
        .expect("parse");
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:4000"));
        match cli.command {
            Command::Posts {
                action:
                    PostAction::List {
                        paging, author, ..
                    },
            } => {
                assert_eq!(paging.page, 2);
                assert!(!paging.all);
                assert_eq!(author.as_deref(), Some("Prof. Ana"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn tags_split_on_commas() {
        let cli = Cli::try_parse_from([
            "blog",
            "posts",
            "create",
            "--title",
            "Fractions",
            "--body",
            "Halves and quarters",
            "--author",
            "Ana",
            "--tags",
            "math,basics",
        ])
        .expect("parse");
        match cli.command {
            Command::Posts {
                action: PostAction::Create { tags, .. },
            } => assert_eq!(tags, Some(vec!["math".to_string(), "basics".to_string()])),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn student_class_uses_short_flag_name() {
        let cli = Cli::try_parse_from(["blog", "students", "update", "s1", "--class", "9B"])
            .expect("parse");
        match cli.command {
            Command::Students {
                action: StudentAction::Update { class_name, .. },
            } => assert_eq!(class_name.as_deref(), Some("9B")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
