use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use moodboard::clients::{
    entities::MoodInput,
    errors::{Error, Result},
    recommender::RecommendationApi,
};
use moodboard::config::{Config, ConfigBuilder};
use moodboard::{Moodboard, PlaylistFlow};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

#[derive(Parser)]
#[command(name = "moodboard")]
#[command(version, about = "Song recommendations from a mood or a picture", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print recommendations for a mood or an image and exit
    Recommend {
        /// Mood in letters and spaces, e.g. "rainy day"
        #[arg(long, required_unless_present = "image", conflicts_with = "image")]
        mood: Option<String>,
        /// Picture to read the mood from
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Interactive board: submit, like, dislike and save to a playlist
    Session {},
    /// Connect a Spotify account for playlist creation
    Login {},
    /// Forget the stored Spotify session
    Logout {},
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    info!("Building config ...");
    let config = ConfigBuilder::new().build()?;

    match cli.command {
        Commands::Recommend { mood, image } => recommend(config, mood, image).await,
        Commands::Session {} => session(config).await,
        Commands::Login {} => {
            let flow = PlaylistFlow::new(config.spotify, config.store);
            login(&flow, &mut Prompt::stdin()).await
        }
        Commands::Logout {} => {
            PlaylistFlow::new(config.spotify, config.store)
                .logout()
                .await?;
            println!("Spotify session removed");
            Ok(())
        }
    }
}

async fn read_input(mood: Option<String>, image: Option<PathBuf>) -> Result<MoodInput> {
    match (mood, image) {
        (_, Some(path)) => read_image(&path).await,
        (Some(mood), None) => Ok(MoodInput::Text(mood)),
        (None, None) => Err(Error::InvalidMood(moodboard::mood::EMPTY_MOOD.into())),
    }
}

async fn read_image(path: &Path) -> Result<MoodInput> {
    let bytes = tokio::fs::read(path).await?;
    debug!("Read {} bytes from {path:?}", bytes.len());
    Ok(MoodInput::Image(bytes))
}

async fn recommend(config: Config, mood: Option<String>, image: Option<PathBuf>) -> Result<()> {
    let mut board = Moodboard::new(config.recommender);
    board.submit(read_input(mood, image).await?).await?;
    print_board(&board);
    Ok(())
}

fn print_board<A: RecommendationApi>(board: &Moodboard<A>) {
    if let Some(mood) = board.interpreted_mood() {
        println!("Mood interpreted as: {mood}");
    }
    if board.songs().is_empty() {
        println!("No songs on the board");
        return;
    }
    for (i, song) in board.songs().iter().enumerate() {
        println!("{:>3}. {song}  {}", i + 1, song.url);
    }
}

/// Line-based reader over stdin shared by the session loop and the login prompt.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn stdin() -> Self {
        Prompt {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self.lines.next_line().await?)
    }
}

async fn login(flow: &PlaylistFlow, prompt: &mut Prompt) -> Result<()> {
    let url = flow.authorize_url()?;
    authorize(flow, prompt, &url).await
}

async fn authorize(flow: &PlaylistFlow, prompt: &mut Prompt, url: &str) -> Result<()> {
    println!("Opening Spotify authorization page:\n  {url}");
    if let Err(e) = webbrowser::open(url) {
        warn!("Could not open a browser: {e}");
    }
    let Some(redirect) = prompt
        .ask("Paste the URL you were redirected to: ")
        .await?
    else {
        return Err(Error::Authorization("no redirect URL given".into()));
    };
    let user = flow.complete_authorization(&redirect).await?;
    println!(
        "Connected to Spotify as {}",
        user.as_deref().unwrap_or("unknown user")
    );
    Ok(())
}

async fn save_playlist<A: RecommendationApi>(
    board: &Moodboard<A>,
    flow: &PlaylistFlow,
    prompt: &mut Prompt,
    name: &str,
) -> Result<()> {
    let url = match flow.save(board, name).await {
        Err(Error::AuthorizationRequired { url }) => {
            authorize(flow, prompt, &url).await?;
            flow.save(board, name).await?
        }
        res => res?,
    };
    println!("Playlist '{name}' created: {url}");
    if let Err(e) = webbrowser::open(&url) {
        warn!("Could not open a browser: {e}");
    }
    Ok(())
}

const HELP: &str = "\
Commands:
  mood <text>       recommendations for a mood
  image <path>      recommendations for a picture
  like <n>          add songs similar to song n
  dislike <n>       replace song n
  list              show the board
  playlist [name]   save the board to Spotify
  login | logout    manage the Spotify session
  quit";

async fn session(config: Config) -> Result<()> {
    let mut board = Moodboard::new(config.recommender);
    let flow = PlaylistFlow::new(config.spotify, config.store);
    let mut prompt = Prompt::stdin();
    println!("{HELP}");

    while let Some(line) = prompt.ask("> ").await? {
        let (command, arg) = match line.trim().split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (line.trim(), ""),
        };
        let res = match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{HELP}");
                Ok(())
            }
            "list" => {
                print_board(&board);
                Ok(())
            }
            "mood" => board.submit(MoodInput::Text(arg.to_owned())).await,
            "image" => match read_image(Path::new(arg)).await {
                Ok(input) => board.submit(input).await,
                Err(e) => Err(e),
            },
            "like" => match position(arg) {
                Ok(i) => board.like(i).await.map(|added| {
                    println!("Added {added} songs");
                }),
                Err(e) => Err(e),
            },
            "dislike" => match position(arg) {
                Ok(i) => board.dislike(i).await.map(|replaced| {
                    if !replaced {
                        println!("No other song found, keeping it");
                    }
                }),
                Err(e) => Err(e),
            },
            "playlist" => {
                let name = if arg.is_empty() {
                    board.default_playlist_name()
                } else {
                    arg.to_owned()
                };
                save_playlist(&board, &flow, &mut prompt, &name).await
            }
            "login" => login(&flow, &mut prompt).await,
            "logout" => flow.logout().await,
            other => {
                println!("Unknown command '{other}', type help");
                Ok(())
            }
        };
        match res {
            Ok(()) if matches!(command, "mood" | "image" | "like" | "dislike") => {
                print_board(&board);
            }
            Ok(()) => {}
            Err(e) => println!("Error: {e}"),
        }
    }
    Ok(())
}

// 1-based position as shown by print_board
fn position(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(Error::InvalidInput(format!("'{arg}' is not a song number"))),
    }
}
