use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use shared::{ClientMessage, ServerMessage, DEFAULT_ROOM};
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Scripted player that joins a room and rolls whenever it holds the turn
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    #[arg(short, long, default_value = DEFAULT_ROOM)]
    room: String,

    #[arg(short, long, default_value = "Tester")]
    name: String,

    /// Player id, generated when omitted
    #[arg(long)]
    id: Option<String>,

    /// Number of rolls before leaving
    #[arg(long, default_value_t = 5)]
    rolls: u32,
}

fn encode(message: &ClientMessage) -> Result<Message, serde_json::Error> {
    Ok(Message::Text(serde_json::to_string(message)?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let player_id = args
        .id
        .unwrap_or_else(|| format!("test-{:06x}", rand::random::<u32>() & 0xff_ffff));

    let url = format!("ws://{}:{}/ws", args.host, args.port);
    println!("Connecting to {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    write
        .send(encode(&ClientMessage::Resume {
            player_id: player_id.clone(),
            name: args.name.clone(),
            room: args.room.clone(),
        })?)
        .await?;
    println!("Joined room {} as {} ({})", args.room, args.name, player_id);

    let mut rolls = 0;
    while let Some(frame) = read.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => {
                println!("Server closed the connection");
                break;
            }
            _ => continue,
        };

        match serde_json::from_str::<ServerMessage>(&text) {
            Ok(ServerMessage::YourTurn { can_roll: true }) => {
                // Give other clients a moment to see the announcement
                sleep(Duration::from_millis(500)).await;
                println!("Rolling ({}/{})", rolls + 1, args.rolls);
                write.send(encode(&ClientMessage::Roll)?).await?;
                rolls += 1;
            }
            Ok(ServerMessage::Move {
                player_id: mover,
                from,
                to,
                dice,
            }) => {
                println!("  {} moved {} -> {} with {:?}", mover, from, to, dice);
                if mover == player_id && rolls >= args.rolls {
                    break;
                }
            }
            Ok(ServerMessage::Event { text }) => println!("Event: {}", text),
            Ok(ServerMessage::ServerLog { text }) => println!("Log: {}", text),
            Ok(other) => println!("Received: {:?}", other),
            Err(e) => println!("Failed to decode {}: {}", text, e),
        }
    }

    println!("Sending leave request");
    let _ = write.send(encode(&ClientMessage::Leave)?).await;
    let _ = write.close().await;

    println!("Test client finished");
    Ok(())
}
