//! Terminal client for manual testing: forwards stdin lines to the server and
//! prints every notification it receives.

use clap::Parser;
use log::{info, warn};
use shared::Notification;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port
    #[clap(short, long, default_value = "8080")]
    port: u16,
}

fn describe(notification: &Notification) -> String {
    match notification {
        Notification::IncorrectName => "Incorrect name, try another one".to_string(),
        Notification::UsedName => "Name already used, try another one".to_string(),
        Notification::Lobby { user_name, games } => {
            format!("Welcome {}, {} game(s) declared", user_name, games.len())
        }
        Notification::GamesList { games } => {
            let games: Vec<String> = games
                .iter()
                .map(|g| {
                    format!(
                        "#{} {} {} {} x{} by {} [{}]",
                        g.id,
                        g.style,
                        g.language,
                        g.difficulty,
                        g.rounds,
                        g.creator,
                        g.players.join(", ")
                    )
                })
                .collect();
            format!("Games: {}", games.join(" | "))
        }
        Notification::GameDeleted => "The game was deleted".to_string(),
        Notification::GameStart { game, manager } => {
            format!("Game {} started, managed by {}", game.id, manager)
        }
        Notification::RoundStart { round, words } => {
            format!("Round {}: {}", round, words.join(" "))
        }
        Notification::WordClaimed { word, user_name } => format!("{} caught {}", user_name, word),
        Notification::PlayerLeft { user_name, manager } => {
            format!("{} left, {} is the manager", user_name, manager)
        }
        Notification::RoundEnd {
            round,
            scores,
            game_over,
            ..
        } => {
            let scores: Vec<String> = scores
                .iter()
                .map(|s| format!("{} {} words {:.1} wpm", s.user_name, s.points, s.speed))
                .collect();
            format!(
                "Round {} over{}: {}",
                round,
                if *game_over { ", game over" } else { "" },
                scores.join(", ")
            )
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let address = format!("{}:{}", args.host, args.port);
    let stream = TcpStream::connect(&address).await?;
    info!("Connected to {}, type 'connect <name>' to start", address);

    let (reader, mut writer) = stream.into_split();
    let mut server_lines = BufReader::new(reader).lines();
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = server_lines.next_line() => {
                let Some(line) = line? else {
                    info!("Server closed the connection");
                    break;
                };
                match serde_json::from_str::<Notification>(&line) {
                    Ok(notification) => println!("{}", describe(&notification)),
                    Err(e) => warn!("Unexpected message '{}': {}", line, e),
                }
            }
            line = stdin_lines.next_line() => {
                let Some(mut line) = line? else {
                    break;
                };
                line.push('\n');
                writer.write_all(line.as_bytes()).await?;
            }
        }
    }

    Ok(())
}
