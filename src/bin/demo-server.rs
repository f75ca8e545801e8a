//! Stand-in backend for trying the chat client locally.
//!
//! `POST /ask` answers after a short delay with one of a few canned sentences;
//! `GET /health` reports liveness.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ANSWER_DELAY: Duration = Duration::from_millis(500);

const SAMPLE_RESPONSES: [&str; 5] = [
    "I'm your RapidScale AI assistant. I can help you with data analysis, insights, and answering your questions.",
    "That's a great question! Based on the data, I would recommend focusing on scalability and performance optimization.",
    "I've analyzed your request and here are the key insights: Real-time processing is crucial for modern AI applications.",
    "Let me help you with that. The best approach would be to implement a microservices architecture for better scalability.",
    "Excellent! I can see you're interested in AI solutions. RapidScale offers enterprise-grade infrastructure with 99.9% uptime.",
];

#[derive(Parser)]
#[command(name = "demo-server")]
#[command(about = "Canned-answer backend for the RapidScale chat client")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,
}

#[derive(Deserialize)]
struct AskBody {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
struct AskReply {
    answer: String,
}

#[derive(Serialize)]
struct HealthReply {
    status: &'static str,
    message: &'static str,
}

fn answer_for(question: Option<&str>) -> String {
    match question.map(str::trim).filter(|q| !q.is_empty()) {
        Some(question) => {
            let sentence = SAMPLE_RESPONSES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(SAMPLE_RESPONSES[0]);
            format!("You asked: \"{}\". {}", question, sentence)
        }
        None => SAMPLE_RESPONSES[0].to_string(),
    }
}

async fn ask(Json(body): Json<AskBody>) -> Json<AskReply> {
    info!(question = body.question.as_deref().unwrap_or(""), "received question");
    tokio::time::sleep(ANSWER_DELAY).await;
    Json(AskReply {
        answer: answer_for(body.question.as_deref()),
    })
}

async fn health() -> Json<HealthReply> {
    Json(HealthReply {
        status: "healthy",
        message: "RapidScale AI Backend is running",
    })
}

async fn log_request(request: Request, next: Next) -> Response {
    info!("{} {}", request.method(), request.uri().path());
    next.run(request).await
}

fn app_router() -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/health", get(health))
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();
    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Backend server running on http://{}", addr);
    info!("POST endpoint: http://{}/ask", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app_router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_echoes_question() {
        let answer = answer_for(Some("What is RapidScale?"));
        assert!(answer.starts_with("You asked: \"What is RapidScale?\". "));
        assert!(SAMPLE_RESPONSES.iter().any(|s| answer.ends_with(s)));
    }

    #[test]
    fn test_missing_question_gets_first_sample() {
        assert_eq!(answer_for(None), SAMPLE_RESPONSES[0]);
        assert_eq!(answer_for(Some("  ")), SAMPLE_RESPONSES[0]);
    }

    #[tokio::test]
    async fn test_server_speaks_the_chat_protocol() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app_router()).await });

        let client = rapidscale_chat::AskClient::new(
            &format!("http://{}/ask", addr),
            Duration::from_secs(5),
        )
        .unwrap();

        let reply = client.ask("ping").await.unwrap();
        let text = rapidscale_chat::display_text(&reply);
        assert!(text.starts_with("You asked: \"ping\"."));

        let health = client.health().await.unwrap();
        assert_eq!(health.status, "healthy");
    }
}
