use crate::commands::build_service;
use crate::server;
use crate::utils::{get_allowed_origins, get_port};
use std::sync::Arc;

pub async fn run(port: Option<u16>) {
    let port = port.unwrap_or_else(get_port);
    println!("🚀 Starting priceforecast server on port {}", port);

    let service = match build_service() {
        Ok(service) => service,
        Err(e) => {
            eprintln!("❌ Failed to initialize forecast service: {}", e);
            std::process::exit(1);
        }
    };

    let config = service.config();
    println!("📈 Data source: {}", service.source_name());
    println!(
        "🧠 Model: LSTM({}) -> LSTM({}) -> Dense({}) -> Dense(1), window {}, horizon {}",
        config.first_lstm_units, config.second_lstm_units, config.dense_units, config.window_length, config.horizon
    );
    println!(
        "⚙️  Training: {} epoch(s), batch size {}, learning rate {}",
        config.epochs, config.batch_size, config.learning_rate
    );

    if let Err(e) = server::serve(Arc::new(service), port, get_allowed_origins()).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
