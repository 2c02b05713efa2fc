use crate::commands::build_service;
use crate::models::{ForecastPoint, ForecastRequest};
use std::time::Instant;

pub async fn run(ticker: String, start: String, json: bool) {
    let service = match build_service() {
        Ok(service) => service,
        Err(e) => {
            eprintln!("❌ Failed to initialize forecast service: {}", e);
            std::process::exit(1);
        }
    };

    if !json {
        println!("🔮 Forecasting {} from history starting {}", ticker.trim().to_uppercase(), start);
    }

    let started = Instant::now();
    let request = ForecastRequest::new(ticker, start);

    let forecast = match service.generate(&request).await {
        Ok(forecast) => forecast,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(if e.status_code().is_server_error() { 1 } else { 2 });
        }
    };

    if json {
        match serde_json::to_string_pretty(&forecast.points) {
            Ok(body) => println!("{}", body),
            Err(e) => {
                eprintln!("❌ Failed to serialize forecast: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!(
        "✅ Trained on {} daily closes in {:.1}s",
        forecast.history_points,
        started.elapsed().as_secs_f64()
    );
    print!("{}", format_table(&forecast.points));
}

/// Two-column date/price table
fn format_table(points: &[ForecastPoint]) -> String {
    let mut out = String::from("Date          Price\n");
    for point in points {
        out.push_str(&format!("{}  {:>10.2}\n", point.date.format("%Y-%m-%d"), point.price));
    }
    out
}
