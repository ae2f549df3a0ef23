//! Plume - compose and publish Bluesky posts from the terminal
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow, bail};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use plume::api::bluesky::{BlueskyClient, DEFAULT_PDS_URL};
use plume::compose::{SubmitRequest, locale, submit};
use plume::media::{Attachment, ImageAsset, MAX_IMAGES};
use plume::{Account, Config, Database};

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args)? {
        Command::Run => plume::app::run(),
        Command::Auth => block_on(auth_flow()),
        Command::Post(post) => block_on(post_cli(post)),
        Command::Drafts => list_drafts(),
        Command::Accounts => list_accounts(),
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    tokio::runtime::Runtime::new()?.block_on(future)
}

/// An image given on the command line
#[derive(Debug, PartialEq, Eq)]
struct ImageArg {
    path: PathBuf,
    alt: Option<String>,
}

/// Arguments of `plume post`
#[derive(Debug, PartialEq, Eq)]
struct PostArgs {
    text: String,
    images: Vec<ImageArg>,
    lang: Option<String>,
}

/// CLI commands
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run,
    Auth,
    Post(PostArgs),
    Drafts,
    Accounts,
    Help,
    Version,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some(command) = args.first() else {
        return Ok(Command::Run);
    };

    match command.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),
        "auth" | "login" => Ok(Command::Auth),
        "drafts" => Ok(Command::Drafts),
        "accounts" => Ok(Command::Accounts),
        "post" => parse_post_args(&args[1..]).map(Command::Post),
        other => Err(anyhow!(
            "Unknown command: {other}\nRun 'plume --help' for usage"
        )),
    }
}

fn parse_post_args(args: &[String]) -> Result<PostArgs> {
    let mut text = None;
    let mut images: Vec<ImageArg> = Vec::new();
    let mut lang = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--image" | "-i" => {
                let path = iter.next().context("--image needs a path")?;
                images.push(ImageArg {
                    path: PathBuf::from(path),
                    alt: None,
                });
            }
            "--alt" | "-a" => {
                let alt = iter.next().context("--alt needs a description")?;
                let image = images
                    .last_mut()
                    .context("--alt must follow an --image")?;
                image.alt = Some(alt.clone());
            }
            "--lang" | "-l" => {
                lang = Some(iter.next().context("--lang needs a language code")?.clone());
            }
            _ if text.is_none() => text = Some(arg.clone()),
            other => bail!("Unexpected argument: {other}"),
        }
    }

    if images.len() > MAX_IMAGES {
        bail!("You can attach at most {} images", MAX_IMAGES);
    }

    Ok(PostArgs {
        text: text.unwrap_or_default(),
        images,
        lang,
    })
}

fn print_help() {
    let config_path = Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"🪶 Plume - compose Bluesky posts from the terminal

USAGE:
    plume                              Launch the composer
    plume [COMMAND]

COMMANDS:
    auth                               Log in with a Bluesky app password

    post <text> [OPTIONS]              Publish a post
      Options:
        -i, --image <path>             Attach an image (up to {max})
        -a, --alt <text>               Describe the preceding image
        -l, --lang <code>              Language of the post (default: from locale)
      Examples:
        plume post "Hello Bluesky!"
        plume post "Sunset" --image ~/sunset.jpg --alt "Orange sky over the sea"

    drafts                             List saved drafts
    accounts                           List configured accounts

OPTIONS:
    -h, --help                         Show this help message
    -v, --version                      Show version information

KEYBINDINGS (composer):
      Ctrl+S        Post
      Ctrl+O        Attach image
      Ctrl+L        Describe selected image
      Ctrl+X        Remove selected image
      Alt+←/→       Select image
      Ctrl+D        Drafts
      Ctrl+T        Theme
      F1            Help
      Esc           Cancel

CONFIG:
    {config}
"#,
        max = MAX_IMAGES,
        config = config_path
    );
}

fn print_version() {
    println!("plume {}", plume::VERSION);
}

fn prompt(message: &str) -> Result<String> {
    println!("{message}");
    print!("> ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn auth_flow() -> Result<()> {
    println!("🦋 Logging in to Bluesky\n");
    let handle = prompt("Enter your handle (e.g., you.bsky.social):")?;

    let pds_input = prompt("\nEnter your PDS URL (press Enter for default bsky.social):")?;
    let pds_url = if pds_input.is_empty() {
        DEFAULT_PDS_URL.to_string()
    } else if pds_input.starts_with("http") {
        pds_input
    } else {
        format!("https://{}", pds_input)
    };

    let password = prompt(
        "\nEnter your app password\n(Create one at https://bsky.app/settings/app-passwords):",
    )?;

    let client = BlueskyClient::login_with_pds(&handle, &password, &pds_url).await?;
    let profile = client.get_profile().await.ok();

    let mut account = Account::new(
        client.handle(),
        client.did(),
        profile
            .as_ref()
            .and_then(|p| p.display_name.as_deref())
            .unwrap_or_default(),
        &pds_url,
    );
    account.avatar_url = profile.and_then(|p| p.avatar);

    let db = Database::open()?;
    let existing = db.get_accounts()?;
    if let Some(old) = existing.iter().find(|a| a.did == account.did) {
        // Logging in again replaces the stored account
        account.is_default = old.is_default;
        plume::auth::delete_credentials(old)?;
        db.delete_account(old.id)?;
    } else {
        account.is_default = existing.is_empty();
    }
    db.insert_account(&account)?;
    plume::auth::store_credentials(&account, &password)?;

    println!("\n✓ Logged in as {}", account.full_handle());
    println!("✓ Account saved (PDS: {})", account.pds_url);
    Ok(())
}

async fn post_cli(args: PostArgs) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open()?;

    let account = db
        .get_default_account()?
        .ok_or_else(|| anyhow!("No account configured. Run: plume auth"))?;
    let password = plume::auth::get_credentials(&account)?
        .ok_or_else(|| anyhow!("No credentials found for {}", account.full_handle()))?;
    let client = plume::api::get_client(&account, &password).await?;

    let mut images = Vec::with_capacity(args.images.len());
    for image in args.images {
        let mut attachment = Attachment::new(ImageAsset::open(&image.path)?);
        attachment.alt = image.alt;
        images.push(attachment);
    }

    let langs = match args.lang {
        Some(lang) => vec![lang],
        None => locale::post_languages(&config),
    };

    let request = SubmitRequest {
        text: args.text,
        images,
        langs,
    };
    if request.text.trim().is_empty() && request.images.is_empty() {
        bail!("Nothing to post");
    }

    println!("🦋 Posting as {}...", account.full_handle());
    let outcome = match submit(&client, request, config.compress_options()).await {
        Ok(outcome) => outcome,
        Err(e) => match e.detail() {
            Some(detail) => bail!("{e}: {detail}"),
            None => return Err(e.into()),
        },
    };
    db.update_account_last_used(account.id)?;

    println!("✓ Posted: {}", outcome.post.web_url(client.handle()));
    Ok(())
}

fn list_drafts() -> Result<()> {
    let db = Database::open()?;
    let drafts = db.get_drafts()?;

    if drafts.is_empty() {
        println!("No saved drafts.");
        return Ok(());
    }

    println!("Saved drafts:\n");
    for draft in drafts {
        let images = if draft.images.is_empty() {
            String::new()
        } else {
            format!("  [{} image(s)]", draft.images.len())
        };
        println!(
            "  {}  {}{}",
            draft.updated_at.format("%Y-%m-%d %H:%M"),
            draft.preview(60),
            images
        );
    }

    Ok(())
}

fn list_accounts() -> Result<()> {
    let db = Database::open()?;
    let accounts = db.get_accounts()?;

    if accounts.is_empty() {
        println!("No accounts configured.");
        println!("\nAdd an account with:");
        println!("  plume auth");
        return Ok(());
    }

    println!("Configured accounts:\n");

    for account in accounts {
        let has_password = plume::auth::has_credentials(&account);
        println!("{}", account_summary(&account, has_password));
    }

    Ok(())
}

fn account_summary(account: &Account, has_password: bool) -> String {
    let default_marker = if account.is_default { " (default)" } else { "" };
    let password_note = if has_password {
        ""
    } else {
        "\n    ⚠ No saved app password, run `plume auth` again"
    };
    format!(
        "  🦋 {} {}{}\n    DID: {}\n    PDS: {}{}",
        account.name(),
        account.full_handle(),
        default_marker,
        account.did,
        account.pds_url,
        password_note
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_no_args_runs_tui() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Run);
        assert_eq!(parse_args(&args(&["--version"])).unwrap(), Command::Version);
    }

    #[test]
    fn test_post_with_images() {
        let cmd = parse_args(&args(&[
            "post", "hello", "--image", "a.jpg", "--alt", "first", "-i", "b.png", "--lang",
            "pt",
        ]))
        .unwrap();

        assert_eq!(
            cmd,
            Command::Post(PostArgs {
                text: "hello".to_string(),
                images: vec![
                    ImageArg {
                        path: PathBuf::from("a.jpg"),
                        alt: Some("first".to_string()),
                    },
                    ImageArg {
                        path: PathBuf::from("b.png"),
                        alt: None,
                    },
                ],
                lang: Some("pt".to_string()),
            })
        );
    }

    #[test]
    fn test_alt_needs_image() {
        assert!(parse_args(&args(&["post", "hi", "--alt", "x"])).is_err());
    }

    #[test]
    fn test_too_many_images() {
        let mut list = vec!["post", "hi"];
        for _ in 0..5 {
            list.extend(["--image", "x.png"]);
        }
        assert!(parse_args(&args(&list)).is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_args(&args(&["timeline"])).is_err());
    }

    #[test]
    fn test_account_summary_flags_missing_password() {
        let mut account = Account::new("alice.bsky.social", "did:plc:alice", "", DEFAULT_PDS_URL);
        account.is_default = true;

        let with = account_summary(&account, true);
        assert!(with.contains("@alice.bsky.social (default)"));
        assert!(with.contains("DID: did:plc:alice"));
        assert!(!with.contains("No saved app password"));

        let without = account_summary(&account, false);
        assert!(without.contains("No saved app password"));
    }
}
