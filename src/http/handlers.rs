//! Route handlers.
//!
//! Handlers only log; they run inside the request span opened by the
//! capture middleware, so their records are correlated with it.

use axum::{body::Bytes, extract::Path, Json};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Acknowledgement returned by `POST /api/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    pub message: String,
    pub received_data: String,
}

impl SubmitAck {
    pub fn new(received_data: String) -> Self {
        Self {
            message: "Data received successfully".to_string(),
            received_data,
        }
    }
}

/// Roll a six-sided die.
pub fn roll_die() -> u8 {
    rand::thread_rng().gen_range(1..=6)
}

/// Log line for a roll. An empty name counts as anonymous.
pub fn roll_message(player: Option<&str>, result: u8) -> String {
    match player.filter(|p| !p.is_empty()) {
        Some(player) => format!("{player} is rolling the dice: {result}"),
        None => format!("Anonymous player is rolling the dice: {result}"),
    }
}

fn roll_for(player: Option<&str>) -> String {
    let result = roll_die();
    let message = roll_message(player, result);
    match player.filter(|p| !p.is_empty()) {
        Some(player) => tracing::info!(player, result, "{message}"),
        None => tracing::info!(player = "anonymous", result, "{message}"),
    }
    result.to_string()
}

/// `GET /rolldice`
pub async fn roll_dice() -> String {
    roll_for(None)
}

/// `GET /rolldice/{player}`
pub async fn roll_dice_for_player(Path(player): Path<String>) -> String {
    roll_for(Some(&player))
}

/// `POST /api/submit`
pub async fn submit(body: Bytes) -> Json<SubmitAck> {
    let body = String::from_utf8_lossy(&body).into_owned();
    tracing::info!(payload = %body, "Received POST request with payload: {body}");
    Json(SubmitAck::new(body))
}
