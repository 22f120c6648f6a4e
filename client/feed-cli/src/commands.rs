//! Sub-commands and their execution

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use feed_client::display::relative_time;
use feed_client::{
    ClientConfig, ClientError, FeedClient, FeedScope, FeedStateManager, ImageUpload,
    MemorySession, Post, PostId, Profile, ProfileUpdate, SignupRequest,
};

#[derive(Debug, Parser)]
#[command(name = "feed-cli", version, about = "Command-line client for the social feed API")]
#[command(after_help = "Configuration comes from FEED_CLIENT_* variables \
(FEED_CLIENT_TOKEN, FEED_CLIENT_API_BASE_URL, ...).")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// A post addressed inside one feed
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct PostTarget {
    pub post_id: PostId,

    /// Feed holding the post: global, saved or user:<id>
    #[arg(long = "in", value_parser = parse_scope, default_value = "global")]
    pub scope: FeedScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create an account and print the token exports
    Signup {
        username: String,
        email: String,
        password: String,
    },
    /// Sign in and print the token exports
    Login {
        username_or_email: String,
        password: String,
    },
    /// Show who the configured token belongs to
    Whoami,
    /// Global feed
    Feed,
    /// Saved posts
    Saved,
    /// Posts by one user
    ProfileFeed { user_id: i64 },
    Post {
        #[arg(default_value = "")]
        text: String,
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    Edit {
        post_id: PostId,
        #[arg(default_value = "")]
        text: String,
        /// Existing image URL to keep attached
        #[arg(long = "keep")]
        keep: Vec<String>,
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        #[arg(long = "in", value_parser = parse_scope, default_value = "global")]
        scope: FeedScope,
    },
    Delete {
        #[command(flatten)]
        target: PostTarget,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    Like(PostTarget),
    Save(PostTarget),
    Share(PostTarget),
    Comments { post_id: PostId },
    Comment {
        post_id: PostId,
        text: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Follow { username: String },
    Unfollow { username: String },
    Suggestions,
    Search { query: String },
    /// Show a profile; the viewer's own when no username is given
    Profile { username: Option<String> },
    /// Update the viewer's profile; unset options stay unchanged
    ProfileUpdate {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        avatar: Option<PathBuf>,
        #[arg(long)]
        background: Option<PathBuf>,
    },
    Conversations {
        #[arg(long)]
        watch: bool,
    },
    Chat {
        username: String,
        #[arg(long)]
        watch: bool,
    },
    Send { username: String, text: String },
    Notifications {
        #[arg(long)]
        watch: bool,
    },
}

fn parse_scope(raw: &str) -> std::result::Result<FeedScope, String> {
    match raw {
        "global" => Ok(FeedScope::Global),
        "saved" => Ok(FeedScope::Saved),
        other => match other.strip_prefix("user:") {
            Some(id) => id
                .parse()
                .map(FeedScope::Profile)
                .map_err(|_| format!("invalid user id: {}", id)),
            None => Err(format!(
                "unknown scope: {} (expected global, saved or user:<id>)",
                other
            )),
        },
    }
}

async fn read_image(path: &Path) -> Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImageUpload::new(file_name, bytes))
}

async fn read_images(paths: &[PathBuf]) -> Result<Vec<ImageUpload>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        images.push(read_image(path).await?);
    }
    Ok(images)
}

/// Blocks on stdin; call through `spawn_blocking`
fn ask_confirmation(post: &Post) -> bool {
    print!("Delete post {} (\"{}\")? [y/N] ", post.id, preview(&post.text));
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

async fn read_optional_image(path: Option<&Path>) -> Result<Option<ImageUpload>> {
    match path {
        Some(path) => Ok(Some(read_image(path).await?)),
        None => Ok(None),
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 40;
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > MAX {
        format!("{}...", line.chars().take(MAX).collect::<String>())
    } else {
        line.to_string()
    }
}

fn print_post(post: &Post) {
    let now = Local::now().naive_local();
    let when = post
        .created_at
        .map(|t| relative_time(t, now))
        .unwrap_or_default();
    println!(
        "#{} @{} ({}) {}",
        post.id, post.author.username, post.author.display_name, when
    );
    if let Some(original) = &post.shared_from {
        println!("  shared from @{}: {}", original.author.username, preview(&original.text));
    }
    if !post.text.is_empty() {
        println!("  {}", post.text);
    }
    for url in &post.attached_image_urls {
        println!("  [image] {}", url);
    }
    println!(
        "  {} likes{} | {} comments | {} shares{}",
        post.like_count,
        if post.viewer_has_liked { " (you)" } else { "" },
        post.comment_count,
        post.share_count,
        if post.viewer_has_saved { " | saved" } else { "" },
    );
}

fn print_if_present(feed: &FeedStateManager, post_id: PostId) {
    if let Some(post) = feed.get(post_id) {
        print_post(&post);
    }
}

fn print_profile(profile: &Profile) {
    println!("@{} {}", profile.username, profile.display_name);
    if let Some(bio) = &profile.bio {
        println!("  {}", bio);
    }
    println!(
        "  {} posts | {} followers | {} following{}",
        profile.posts_count,
        profile.followers_count,
        profile.following_count,
        if profile.is_following { " | you follow" } else { "" },
    );
    println!("  avatar: {}", profile.avatar_url);
    println!("  background: {}", profile.background_url);
}

async fn loaded_feed(client: &FeedClient, scope: FeedScope) -> Result<FeedStateManager> {
    let feed = client.feed(scope);
    feed.refresh().await.context("Failed to load feed")?;
    Ok(feed)
}

/// Block until Ctrl-C, then let the caller drop its poller
async fn wait_for_interrupt() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Stopping");
    Ok(())
}

async fn confirm_delete(feed: &FeedStateManager, post_id: PostId) -> Result<bool> {
    let post = feed
        .get(post_id)
        .with_context(|| format!("Post {} is not in this feed", post_id))?;
    tokio::task::spawn_blocking(move || ask_confirmation(&post))
        .await
        .context("Confirmation prompt failed")
}

fn print_exports(token: &str, username: Option<&str>) {
    println!("export FEED_CLIENT_TOKEN={}", token);
    if let Some(username) = username {
        println!("export FEED_CLIENT_USERNAME={}", username);
    }
}

async fn show_feed(client: &FeedClient, scope: FeedScope) -> Result<()> {
    let feed = loaded_feed(client, scope).await?;
    if feed.is_empty() {
        println!("No posts.");
    }
    for post in feed.posts() {
        print_post(&post);
    }
    Ok(())
}

pub async fn run(command: Command, config: &ClientConfig) -> Result<()> {
    let session = Arc::new(MemorySession::from_config(config));
    let client = FeedClient::new(config, session.clone()).context("Failed to build API client")?;

    match command {
        Command::Signup {
            username,
            email,
            password,
        } => {
            let auth = client
                .api()
                .signup(SignupRequest {
                    username,
                    email,
                    password,
                })
                .await
                .context("Signup failed")?;
            print_exports(&auth.token, auth.username.as_deref());
        }
        Command::Login {
            username_or_email,
            password,
        } => {
            let auth = client
                .api()
                .login(&username_or_email, &password)
                .await
                .context("Login failed")?;
            print_exports(&auth.token, auth.username.as_deref());
        }
        Command::Whoami => {
            let me = client
                .api()
                .current_user()
                .await
                .context("Failed to load the signed-in user")?;
            println!(
                "@{} <{}>",
                me.username.as_deref().unwrap_or("?"),
                me.email.as_deref().unwrap_or("no email")
            );
        }
        Command::Feed => show_feed(&client, FeedScope::Global).await?,
        Command::Saved => show_feed(&client, FeedScope::Saved).await?,
        Command::ProfileFeed { user_id } => show_feed(&client, FeedScope::Profile(user_id)).await?,
        Command::Post { text, images } => {
            let feed = client.feed(FeedScope::Global);
            let images = read_images(&images).await?;
            let post = feed.create(&text, images).await.context("Failed to create post")?;
            print_post(&post);
        }
        Command::Edit {
            post_id,
            text,
            keep,
            images,
            scope,
        } => {
            let feed = loaded_feed(&client, scope).await?;
            let images = read_images(&images).await?;
            let post = feed
                .edit(post_id, &text, keep, images)
                .await
                .context("Failed to edit post")?;
            print_post(&post);
        }
        Command::Delete { target, yes } => {
            let post_id = target.post_id;
            let feed = loaded_feed(&client, target.scope).await?;
            let confirmed = yes || confirm_delete(&feed, post_id).await?;
            match feed.delete(post_id, &move |_: &Post| confirmed).await {
                Ok(()) => println!("Deleted post {}", post_id),
                Err(ClientError::NotConfirmed) => println!("Kept post {}", post_id),
                Err(e) => return Err(e).context("Failed to delete post"),
            }
        }
        Command::Like(target) => {
            let feed = loaded_feed(&client, target.scope).await?;
            let liked = feed
                .toggle_like(target.post_id)
                .await
                .context("Failed to like post")?;
            println!("{}", if liked { "Liked" } else { "Unliked" });
            print_if_present(&feed, target.post_id);
        }
        Command::Save(target) => {
            let feed = loaded_feed(&client, target.scope).await?;
            let saved = feed
                .toggle_save(target.post_id)
                .await
                .context("Failed to save post")?;
            println!("{}", if saved { "Saved" } else { "Unsaved" });
            print_if_present(&feed, target.post_id);
        }
        Command::Share(target) => {
            let feed = loaded_feed(&client, target.scope).await?;
            feed.share(target.post_id)
                .await
                .context("Failed to share post")?;
            println!("Shared");
            print_if_present(&feed, target.post_id);
        }
        Command::Comments { post_id } => {
            let thread = client.comments(post_id);
            thread.load().await.context("Failed to load comments")?;
            let now = Local::now().naive_local();
            for comment in thread.comments() {
                let when = comment
                    .created_at
                    .map(|t| relative_time(t, now))
                    .unwrap_or_default();
                println!("#{} @{} {}: {}", comment.id, comment.author.username, when, comment.text);
                if let Some(url) = comment.image_url {
                    println!("  [image] {}", url);
                }
            }
        }
        Command::Comment {
            post_id,
            text,
            image,
        } => {
            let feed = loaded_feed(&client, FeedScope::Global).await?;
            let image = read_optional_image(image.as_deref()).await?;
            let comment = feed
                .add_comment(post_id, &text, image)
                .await
                .context("Failed to add comment")?;
            println!("Comment #{} added", comment.id);
            if let Some(post) = feed.get(post_id) {
                println!("Post now has {} comments", post.comment_count);
            }
        }
        Command::Follow { username } => {
            client.follows().follow(&username).await.context("Failed to follow")?;
            println!("Following @{}", username.trim());
        }
        Command::Unfollow { username } => {
            client.follows().unfollow(&username).await.context("Failed to unfollow")?;
            println!("Unfollowed @{}", username.trim());
        }
        Command::Suggestions => {
            let follows = client.follows();
            follows.load().await.context("Failed to load followed users")?;
            for user in follows.suggestions().await.context("Failed to load suggestions")? {
                let marker = if follows.is_following(&user.username) { " (following)" } else { "" };
                println!("@{} {}{}", user.username, user.display_name, marker);
            }
        }
        Command::Search { query } => {
            for user in client.follows().search(&query).await.context("Search failed")? {
                println!("@{} {}", user.username, user.display_name);
            }
        }
        Command::Profile { username } => {
            let profile = client
                .profiles()
                .load(username.as_deref())
                .await
                .context("Failed to load profile")?;
            print_profile(&profile);
        }
        Command::ProfileUpdate {
            name,
            bio,
            website,
            location,
            avatar,
            background,
        } => {
            let update = ProfileUpdate {
                full_name: name,
                bio,
                website,
                location,
                profile_image: read_optional_image(avatar.as_deref()).await?,
                background_image: read_optional_image(background.as_deref()).await?,
            };
            let profile = client
                .profiles()
                .update(update)
                .await
                .context("Failed to update profile")?;
            print_profile(&profile);
        }
        Command::Conversations { watch } => {
            let inbox = client.conversations();
            if watch {
                let mut updates = inbox.subscribe();
                let _poller = inbox.start_polling(client.poll_interval());
                tokio::select! {
                    result = wait_for_interrupt() => result?,
                    _ = async {
                        while updates.changed().await.is_ok() {
                            let conversations = updates.borrow_and_update().clone();
                            println!("--- {} conversations", conversations.len());
                            for c in conversations {
                                println!("@{}: {}", c.other_user.username, c.last_message_text);
                            }
                        }
                    } => {}
                }
            } else {
                inbox.refresh().await.context("Failed to load conversations")?;
                for c in inbox.current() {
                    let unread = if c.last_message_read { "" } else { " *" };
                    println!("@{}: {}{}", c.other_user.username, c.last_message_text, unread);
                }
            }
        }
        Command::Chat { username, watch } => {
            let chat = client.conversation(username);
            if watch {
                let mut updates = chat.subscribe();
                let _poller = chat.start_polling(client.poll_interval());
                tokio::select! {
                    result = wait_for_interrupt() => result?,
                    _ = async {
                        while updates.changed().await.is_ok() {
                            let messages = updates.borrow_and_update().clone();
                            println!("--- {} messages", messages.len());
                            for m in messages {
                                println!("@{}: {}", m.sender.username, m.text);
                            }
                        }
                    } => {}
                }
            } else {
                chat.refresh().await.context("Failed to load conversation")?;
                for m in chat.current() {
                    println!("@{}: {}", m.sender.username, m.text);
                }
            }
        }
        Command::Send { username, text } => {
            let chat = client.conversation(username);
            let message = chat.send(&text).await.context("Failed to send message")?;
            println!("Sent #{} to @{}", message.id, chat.username());
        }
        Command::Notifications { watch } => {
            let notifications = client.notifications();
            if watch {
                let mut updates = notifications.subscribe();
                let _poller = notifications.start_polling(client.poll_interval());
                tokio::select! {
                    result = wait_for_interrupt() => result?,
                    _ = async {
                        while updates.changed().await.is_ok() {
                            let items = updates.borrow_and_update().clone();
                            let unread = items.iter().filter(|n| !n.read).count();
                            println!("--- {} notifications ({} unread)", items.len(), unread);
                        }
                    } => {}
                }
            } else {
                notifications
                    .refresh()
                    .await
                    .context("Failed to load notifications")?;
                for n in notifications.current() {
                    let unread = if n.read { "" } else { " *" };
                    println!("[{}] @{} {}{}", n.kind, n.actor.username, n.message, unread);
                }
                println!("{} unread", notifications.unread_count());
            }
        }
    }

    if *session.login_required().borrow() {
        bail!("Session rejected by the server; run `feed-cli login` again");
    }
    Ok(())
}
