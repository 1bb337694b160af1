use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::mpsc;

use rust_room_chat::config::{self, AppConfig};
use rust_room_chat::network::{ChatClient, RoomApi, WebSocketConnector};
use rust_room_chat::ui::ChatApp;
use rust_room_chat::ui::state::JoinForm;

#[derive(Parser)]
#[command(
    name = "rust_room_chat",
    version,
    about = "Room-based chat client for a STOMP over WebSocket backend"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Backend base URL, overrides the config file and CHAT_BACKEND_URL
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,
    /// Pre-fill the user name on the join screen
    #[arg(long)]
    user: Option<String>,
    /// Pre-fill the room id on the join screen
    #[arg(long)]
    room: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config).with_env_overrides();
    if let Some(backend_url) = cli.backend_url {
        app_config.backend_url = backend_url;
    }

    let form = JoinForm {
        user_name: cli.user.unwrap_or_default(),
        room_id: cli.room.unwrap_or_default(),
    };

    run_client(app_config, form)?;
    Ok(())
}

fn run_client(app_config: AppConfig, form: JoinForm) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Tạo các kênh giao tiếp (Channels)
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    // 2. Khởi tạo Network Task trước, lỗi cấu hình thì dừng luôn
    let client = RoomApi::new(&app_config)
        .and_then(|api| ChatClient::new(event_tx, cmd_rx, api, WebSocketConnector, &app_config))
        .inspect_err(|err| log::error!("Network client could not start: {err}"))?;
    tokio::spawn(client.run());

    // 3. Khởi chạy UI (Chạy trên Main Thread)
    let options = eframe::NativeOptions::default();
    let mut event_rx = Some(event_rx);

    eframe::run_native(
        "Rust Room Chat",
        options,
        Box::new(move |cc| {
            let event_receiver = event_rx
                .take()
                .expect("ChatApp should only be initialized once");

            log::info!("Client started against {}", app_config.backend_url);

            Ok(Box::new(ChatApp::new(cc, cmd_tx.clone(), event_receiver, form.clone())))
        }),
    )?;
    Ok(())
}
